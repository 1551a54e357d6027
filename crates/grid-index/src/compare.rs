//! Cell-wise operations for comparing two resampled fields.

use radar_common::{GridField, GridResult};
use std::ops::Sub;

/// Cell value used for masked cells.
pub trait MissingValue: Copy {
    const MISSING: Self;
}

impl MissingValue for f32 {
    const MISSING: Self = f32::NAN;
}

impl MissingValue for f64 {
    const MISSING: Self = f64::NAN;
}

/// `b - a` for every cell.
pub fn difference<T>(a: &GridField<T>, b: &GridField<T>) -> GridResult<GridField<T>>
where
    T: Copy + Sub<Output = T>,
{
    a.zip_with(b, |&x, &y| y - x)
}

/// Raise finite values below `threshold` to `threshold`.
///
/// Reflectivity below the rain threshold is noise; flooring both fields
/// before differencing keeps "no rain" from showing up as a difference.
pub fn floor_below(field: &GridField<f32>, threshold: f32) -> GridField<f32> {
    field.map(|&v| if v < threshold { threshold } else { v })
}

/// Set masked cells to NaN.
pub fn apply_mask<T: MissingValue>(
    field: &GridField<T>,
    mask: &GridField<bool>,
) -> GridResult<GridField<T>> {
    field.zip_with(mask, |&v, &masked| if masked { T::MISSING } else { v })
}
