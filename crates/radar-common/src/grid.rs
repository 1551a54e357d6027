//! Regular planar grid definitions.
//!
//! A grid is centred on a point in the (rotated, planar-approximated)
//! lon/lat system, has square cells of a fixed size in meters and a fixed
//! number of cells per axis. Everything else (corners, per-axis reference
//! coordinates, the cell a coordinate falls in) is derived here so the
//! binning code and the distance queries agree on the same edges.

use crate::error::{GridResult, RadarGridError};
use crate::geo::meters_to_degrees;
use serde::{Deserialize, Serialize};

/// Specification of a regular grid around a center point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Center longitude (degrees)
    pub center_lon: f64,
    /// Center latitude (degrees)
    pub center_lat: f64,
    /// Cell size (meters)
    pub resolution_m: f64,
    /// Number of cells along the longitude axis
    pub lon_cells: usize,
    /// Number of cells along the latitude axis
    pub lat_cells: usize,
}

impl GridSpec {
    /// Create a new grid specification. Validation happens in [`GridGeometry::new`].
    pub fn new(
        center_lon: f64,
        center_lat: f64,
        resolution_m: f64,
        lon_cells: usize,
        lat_cells: usize,
    ) -> Self {
        Self {
            center_lon,
            center_lat,
            resolution_m,
            lon_cells,
            lat_cells,
        }
    }

    /// Shape as `(lon_cells, lat_cells)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lon_cells, self.lat_cells)
    }

    /// Check all invariants.
    pub fn validate(&self) -> GridResult<()> {
        if !(self.resolution_m.is_finite() && self.resolution_m > 0.0) {
            return Err(RadarGridError::invalid_grid(format!(
                "resolution must be a positive number of meters, got {}",
                self.resolution_m
            )));
        }
        if self.lon_cells == 0 || self.lat_cells == 0 {
            return Err(RadarGridError::invalid_grid(format!(
                "shape must be positive in both dimensions, got ({}, {})",
                self.lon_cells, self.lat_cells
            )));
        }
        if !(self.center_lon.is_finite() && self.center_lat.is_finite()) {
            return Err(RadarGridError::invalid_grid(format!(
                "center must be finite, got ({}, {})",
                self.center_lon, self.center_lat
            )));
        }
        Ok(())
    }
}

/// Degree bounds of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCorners {
    pub lon_start: f64,
    pub lon_end: f64,
    pub lat_start: f64,
    pub lat_end: f64,
}

impl GridCorners {
    fn from_spec(spec: &GridSpec) -> Self {
        let half_lon = meters_to_degrees(spec.resolution_m * spec.lon_cells as f64) / 2.0;
        let half_lat = meters_to_degrees(spec.resolution_m * spec.lat_cells as f64) / 2.0;
        Self {
            lon_start: spec.center_lon - half_lon,
            lon_end: spec.center_lon + half_lon,
            lat_start: spec.center_lat - half_lat,
            lat_end: spec.center_lat + half_lat,
        }
    }

    /// Extent along the longitude axis (degrees).
    pub fn width(&self) -> f64 {
        self.lon_end - self.lon_start
    }

    /// Extent along the latitude axis (degrees).
    pub fn height(&self) -> f64 {
        self.lat_end - self.lat_start
    }

    /// Half-open containment: start inclusive, end exclusive.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_start && lon < self.lon_end && lat >= self.lat_start && lat < self.lat_end
    }
}

/// Grid axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lon,
    Lat,
}

/// Which coordinate represents a cell along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellReference {
    /// Cell centers: `start + (k + 0.5) * res`. Agrees with the binning rule.
    #[default]
    Center,
    /// Inclusive linspace from the first corner to the last one.
    Edges,
}

impl CellReference {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "edges" | "linspace" => Self::Edges,
            _ => Self::Center,
        }
    }
}

/// Per-axis reference coordinates of every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCoordinates {
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub reference: CellReference,
}

impl GridCoordinates {
    /// Shape as `(lon_cells, lat_cells)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lon.len(), self.lat.len())
    }

    /// Reference coordinate of cell `(i, j)` as `(lon, lat)`.
    pub fn cell(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        Some((*self.lon.get(j)?, *self.lat.get(i)?))
    }
}

/// Validated grid with its derived quantities.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    spec: GridSpec,
    corners: GridCorners,
    resolution_deg: f64,
}

impl GridGeometry {
    /// Validate `spec` and derive corners and angular resolution.
    pub fn new(spec: GridSpec) -> GridResult<Self> {
        spec.validate()?;
        let corners = GridCorners::from_spec(&spec);
        if !(corners.lon_end > corners.lon_start && corners.lat_end > corners.lat_start) {
            return Err(RadarGridError::invalid_grid(format!(
                "degenerate corners {:?} for {:?}",
                corners, spec
            )));
        }
        Ok(Self {
            spec,
            corners,
            resolution_deg: meters_to_degrees(spec.resolution_m),
        })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn corners(&self) -> &GridCorners {
        &self.corners
    }

    /// Cell size in degrees.
    pub fn resolution_degrees(&self) -> f64 {
        self.resolution_deg
    }

    /// Shape as `(lon_cells, lat_cells)`.
    pub fn shape(&self) -> (usize, usize) {
        self.spec.shape()
    }

    pub fn lon_dim(&self) -> usize {
        self.spec.lon_cells
    }

    pub fn lat_dim(&self) -> usize {
        self.spec.lat_cells
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        self.spec.lon_cells * self.spec.lat_cells
    }

    fn axis_params(&self, axis: Axis) -> (f64, f64, usize) {
        match axis {
            Axis::Lon => (self.corners.lon_start, self.corners.lon_end, self.spec.lon_cells),
            Axis::Lat => (self.corners.lat_start, self.corners.lat_end, self.spec.lat_cells),
        }
    }

    /// Lower edge of cell `k` along `axis`.
    ///
    /// `k == count` yields the nominal upper edge of the last cell.
    #[inline]
    pub fn cell_edge(&self, axis: Axis, k: usize) -> f64 {
        let (start, _, _) = self.axis_params(axis);
        start + k as f64 * self.resolution_deg
    }

    /// Cell index along `axis` for coordinate `c`, or `None` when outside.
    ///
    /// Bins are closed below and open above. The floored quotient is
    /// corrected against [`Self::cell_edge`] so a coordinate equal to an
    /// edge always lands in the cell starting at that edge.
    pub fn axis_index(&self, axis: Axis, c: f64) -> Option<usize> {
        let (start, end, count) = self.axis_params(axis);
        if !c.is_finite() || c < start || c >= end {
            return None;
        }

        let mut k = ((c - start) / self.resolution_deg).floor() as i64;
        if k > 0 && c < start + k as f64 * self.resolution_deg {
            k -= 1;
        }
        if c >= start + (k + 1) as f64 * self.resolution_deg {
            k += 1;
        }

        if k < 0 || k >= count as i64 {
            None
        } else {
            Some(k as usize)
        }
    }

    /// Cell `(i, j)` = (lat row, lon column) containing the point.
    pub fn cell_of(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        let j = self.axis_index(Axis::Lon, lon)?;
        let i = self.axis_index(Axis::Lat, lat)?;
        Some((i, j))
    }

    /// Row-major flat cell position containing the point.
    pub fn flat_cell_of(&self, lon: f64, lat: f64) -> Option<usize> {
        self.cell_of(lon, lat)
            .map(|(i, j)| i * self.spec.lon_cells + j)
    }

    /// Center of cell `(i, j)` as `(lon, lat)`.
    pub fn cell_center(&self, i: usize, j: usize) -> (f64, f64) {
        (
            self.corners.lon_start + (j as f64 + 0.5) * self.resolution_deg,
            self.corners.lat_start + (i as f64 + 0.5) * self.resolution_deg,
        )
    }

    /// Reference coordinates of every cell along both axes.
    pub fn coordinates(&self, reference: CellReference) -> GridCoordinates {
        GridCoordinates {
            lon: self.axis_coordinates(Axis::Lon, reference),
            lat: self.axis_coordinates(Axis::Lat, reference),
            reference,
        }
    }

    fn axis_coordinates(&self, axis: Axis, reference: CellReference) -> Vec<f64> {
        let (start, end, count) = self.axis_params(axis);
        match reference {
            CellReference::Center => (0..count)
                .map(|k| start + (k as f64 + 0.5) * self.resolution_deg)
                .collect(),
            CellReference::Edges => linspace(start, end, count),
        }
    }
}

/// `count` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            let mut values: Vec<f64> = (0..count).map(|k| start + k as f64 * step).collect();
            values[count - 1] = end;
            values
        }
    }
}
