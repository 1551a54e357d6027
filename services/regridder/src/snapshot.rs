//! JSON snapshots of radar sweeps and the JSON result of regridding them.

use grid_index::{GridField, GridResult, SourceGeometry, SweepSource};
use radar_common::{CellReference, GridCorners};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One sweep as exported by a reader.
///
/// `lat` holds either one latitude per sample or one per column, in which
/// case it is broadcast over all rows.
#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// `null` marks a missing measurement.
    pub values: Vec<Option<f32>>,
    #[serde(default = "default_res_factor")]
    pub res_factor: u32,
    #[serde(default)]
    pub offset_deg: f64,
    #[serde(default)]
    pub site: Option<[f64; 2]>,
    #[serde(default)]
    pub elevation_deg: Option<f64>,
}

fn default_res_factor() -> u32 {
    1
}

impl Snapshot {
    pub fn from_json_file(path: impl AsRef<Path>) -> GridResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Validate and convert into a [`SweepSource`].
    pub fn into_source(self) -> GridResult<SweepSource> {
        let geometry = if self.lat.len() == self.cols && self.rows != 1 {
            SourceGeometry::with_broadcast_lat(self.lon, &self.lat, self.rows, self.cols)?
        } else {
            SourceGeometry::new(self.lon, self.lat, self.rows, self.cols)?
        };
        let values = self
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f32::NAN))
            .collect();

        let mut source = SweepSource::new(self.name, geometry, values)?
            .with_res_factor(self.res_factor)
            .with_offset_deg(self.offset_deg);
        if let Some([lon, lat]) = self.site {
            source = source.with_site(lon, lat);
        }
        if let Some(elevation) = self.elevation_deg {
            source = source.with_elevation_deg(elevation);
        }
        Ok(source)
    }
}

/// Regridded field plus the grid it lives on.
#[derive(Debug, Serialize)]
pub struct RegridOutput<T> {
    /// Radar name, or `"b - a"` for a difference.
    pub name: String,
    pub corners: GridCorners,
    pub resolution_m: f64,
    pub cell_reference: CellReference,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    pub valid_cells: usize,
    /// Reflectivity (dBZ) or beam height (m).
    pub field: GridField<T>,
}
