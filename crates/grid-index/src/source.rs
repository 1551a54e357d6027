//! Radar data sources.
//!
//! The regridding core never sees vendor formats. Readers for those formats
//! live elsewhere and hand over a [`RadarSource`]: validated sample
//! coordinates plus one value per sample.

use radar_common::{GridResult, RadarGridError};

/// Coordinates of every source sample, row-major over `(rows, cols)`.
///
/// For a polar sweep rows are rays and columns are range bins. The flat
/// position of `(row, col)` is `row * cols + col`, and that position is what
/// an [`crate::IndexMatrix`] records.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceGeometry {
    lon: Vec<f64>,
    lat: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl SourceGeometry {
    /// Create from full 2-D longitude and latitude arrays.
    pub fn new(lon: Vec<f64>, lat: Vec<f64>, rows: usize, cols: usize) -> GridResult<Self> {
        let expected = rows.checked_mul(cols).ok_or_else(|| {
            RadarGridError::shape_mismatch(
                "source shape",
                "rows * cols within usize",
                format!("{}x{}", rows, cols),
            )
        })?;
        if lon.len() != expected {
            return Err(RadarGridError::shape_mismatch(
                "source longitudes",
                format!("{} ({}x{})", expected, rows, cols),
                lon.len(),
            ));
        }
        if lat.len() != expected {
            return Err(RadarGridError::shape_mismatch(
                "source latitudes",
                format!("{} ({}x{})", expected, rows, cols),
                lat.len(),
            ));
        }
        Ok(Self {
            lon,
            lat,
            rows,
            cols,
        })
    }

    /// Create from a 2-D longitude array and a 1-D latitude array that is
    /// broadcast along the trailing axis (one latitude per column).
    pub fn with_broadcast_lat(
        lon: Vec<f64>,
        lat_axis: &[f64],
        rows: usize,
        cols: usize,
    ) -> GridResult<Self> {
        if lat_axis.len() != cols {
            return Err(RadarGridError::shape_mismatch(
                "broadcast latitudes",
                cols,
                lat_axis.len(),
            ));
        }
        let len = rows.checked_mul(cols).ok_or_else(|| {
            RadarGridError::shape_mismatch(
                "source shape",
                "rows * cols within usize",
                format!("{}x{}", rows, cols),
            )
        })?;
        let lat = lat_axis.iter().copied().cycle().take(len).collect();
        Self::new(lon, lat, rows, cols)
    }

    /// Create from flat coordinate lists (a single row).
    pub fn from_points(lon: Vec<f64>, lat: Vec<f64>) -> GridResult<Self> {
        let cols = lon.len();
        Self::new(lon, lat, 1, cols)
    }

    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.lon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lon.is_empty()
    }

    /// Iterate `(lon, lat)` pairs in flat order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lon.iter().copied().zip(self.lat.iter().copied())
    }

    /// Convert a flat position back into `(row, col)`.
    pub fn position_of(&self, flat: usize) -> Option<(usize, usize)> {
        if flat >= self.len() || self.cols == 0 {
            return None;
        }
        Some((flat / self.cols, flat % self.cols))
    }

    /// Stable CRC32 over the shape and the coordinate bit patterns.
    ///
    /// Used in cache keys so that two radars sharing a name and parameters
    /// but differing in geometry never share an index matrix.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&(self.rows as u64).to_le_bytes());
        hasher.update(&(self.cols as u64).to_le_bytes());
        for v in &self.lon {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        for v in &self.lat {
            hasher.update(&v.to_bits().to_le_bytes());
        }
        hasher.finalize()
    }
}

/// Anything that can provide sample coordinates and co-indexed values.
pub trait RadarSource {
    /// Radar identifier, part of the index cache key.
    fn name(&self) -> &str;

    /// Sample coordinates in the grid's coordinate system.
    fn coordinates(&self) -> &SourceGeometry;

    /// One value per sample, same flat order as [`Self::coordinates`].
    fn values(&self) -> &[f32];

    /// Azimuthal resolution factor applied upstream.
    fn res_factor(&self) -> u32 {
        1
    }

    /// Angular offset (degrees) applied upstream.
    fn offset_deg(&self) -> f64 {
        0.0
    }

    /// Site location in the grid's coordinate system, if known.
    fn site(&self) -> Option<(f64, f64)> {
        None
    }

    /// Antenna elevation angle (degrees), if known.
    fn elevation_deg(&self) -> Option<f64> {
        None
    }
}

/// In-memory sweep.
#[derive(Debug, Clone)]
pub struct SweepSource {
    name: String,
    geometry: SourceGeometry,
    values: Vec<f32>,
    res_factor: u32,
    offset_deg: f64,
    site: Option<(f64, f64)>,
    elevation_deg: Option<f64>,
}

impl SweepSource {
    /// Create a sweep, checking that values and coordinates line up.
    pub fn new(
        name: impl Into<String>,
        geometry: SourceGeometry,
        values: Vec<f32>,
    ) -> GridResult<Self> {
        check_values(&geometry, &values)?;
        Ok(Self {
            name: name.into(),
            geometry,
            values,
            res_factor: 1,
            offset_deg: 0.0,
            site: None,
            elevation_deg: None,
        })
    }

    pub fn with_res_factor(mut self, res_factor: u32) -> Self {
        self.res_factor = res_factor;
        self
    }

    pub fn with_offset_deg(mut self, offset_deg: f64) -> Self {
        self.offset_deg = offset_deg;
        self
    }

    pub fn with_site(mut self, lon: f64, lat: f64) -> Self {
        self.site = Some((lon, lat));
        self
    }

    pub fn with_elevation_deg(mut self, elevation_deg: f64) -> Self {
        self.elevation_deg = Some(elevation_deg);
        self
    }

    /// Replace the values with a new snapshot from the same geometry.
    pub fn replace_values(&mut self, values: Vec<f32>) -> GridResult<()> {
        check_values(&self.geometry, &values)?;
        self.values = values;
        Ok(())
    }
}

fn check_values(geometry: &SourceGeometry, values: &[f32]) -> GridResult<()> {
    if values.len() != geometry.len() {
        let (rows, cols) = geometry.shape();
        return Err(RadarGridError::shape_mismatch(
            "source values",
            format!("{} ({}x{})", geometry.len(), rows, cols),
            values.len(),
        ));
    }
    Ok(())
}

impl RadarSource for SweepSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn coordinates(&self) -> &SourceGeometry {
        &self.geometry
    }

    fn values(&self) -> &[f32] {
        &self.values
    }

    fn res_factor(&self) -> u32 {
        self.res_factor
    }

    fn offset_deg(&self) -> f64 {
        self.offset_deg
    }

    fn site(&self) -> Option<(f64, f64)> {
        self.site
    }

    fn elevation_deg(&self) -> Option<f64> {
        self.elevation_deg
    }
}
