//! Conversion between linear distances and angular differences.
//!
//! Uses the small field-of-view approximation 1° = 60 NM = 60 × 1852 m.
//! Every other module converts through these functions so the constant
//! lives in exactly one place.

/// Meters in one nautical mile.
pub const METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// Meters per degree of arc (60 nautical miles).
pub const METERS_PER_DEGREE: f64 = 60.0 * METERS_PER_NAUTICAL_MILE;

/// Convert a distance in meters to an angular difference in degrees.
#[inline]
pub fn meters_to_degrees(distance_m: f64) -> f64 {
    distance_m / METERS_PER_DEGREE
}

/// Convert an angular difference in degrees to a distance in meters.
#[inline]
pub fn degrees_to_meters(degrees: f64) -> f64 {
    degrees * METERS_PER_DEGREE
}

/// Element-wise [`meters_to_degrees`].
pub fn meters_to_degrees_slice(distances_m: &[f64]) -> Vec<f64> {
    distances_m.iter().map(|&d| meters_to_degrees(d)).collect()
}

/// Element-wise [`degrees_to_meters`].
pub fn degrees_to_meters_slice(degrees: &[f64]) -> Vec<f64> {
    degrees.iter().map(|&d| degrees_to_meters(d)).collect()
}
