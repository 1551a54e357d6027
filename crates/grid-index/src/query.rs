//! Per-cell geometric queries against the grid's reference coordinates.

use crate::beam::BeamHeightModel;
use radar_common::{degrees_to_meters, GridCoordinates, GridField};

/// Planar distance in meters from every cell's reference point to `(lon, lat)`.
pub fn distance_to(coords: &GridCoordinates, lon: f64, lat: f64) -> GridField<f64> {
    let (lon_dim, lat_dim) = coords.shape();
    GridField::from_fn(lon_dim, lat_dim, |i, j| {
        let dx = degrees_to_meters(coords.lon[j] - lon);
        let dy = degrees_to_meters(coords.lat[i] - lat);
        (dx * dx + dy * dy).sqrt()
    })
}

/// `true` where the distance exceeds `max_range_m`.
///
/// A distance equal to the range is kept. NaN compares false and is kept too.
pub fn mask_beyond(distance: &GridField<f64>, max_range_m: f64) -> GridField<bool> {
    distance.map(|&d| d > max_range_m)
}

/// Beam height for every cell given its distance to the site.
pub fn beam_height<M: BeamHeightModel + ?Sized>(
    distance: &GridField<f64>,
    elevation_deg: f64,
    model: &M,
) -> GridField<f64> {
    distance.map(|&d| model.height(d, elevation_deg))
}
