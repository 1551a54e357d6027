//! Common types and utilities shared across the radar regridding crates.

pub mod error;
pub mod field;
pub mod geo;
pub mod grid;

pub use error::{GridResult, RadarGridError};
pub use field::GridField;
pub use geo::{degrees_to_meters, meters_to_degrees, METERS_PER_DEGREE};
pub use grid::{Axis, CellReference, GridCoordinates, GridCorners, GridGeometry, GridSpec};
