//! Grid-shaped value containers.

use crate::error::{GridResult, RadarGridError};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A value per grid cell, stored row-major.
///
/// Row `i` is the `i`-th latitude cell (south to north), column `j` the
/// `j`-th longitude cell (west to east). The flat position of cell `(i, j)`
/// is `i * lon_dim + j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridField<T> {
    lon_dim: usize,
    lat_dim: usize,
    data: Vec<T>,
}

impl<T> GridField<T> {
    /// Wrap existing row-major data.
    pub fn new(lon_dim: usize, lat_dim: usize, data: Vec<T>) -> GridResult<Self> {
        if data.len() != lon_dim * lat_dim {
            return Err(RadarGridError::shape_mismatch(
                "grid field data",
                format!("{} ({}x{})", lon_dim * lat_dim, lon_dim, lat_dim),
                data.len(),
            ));
        }
        Ok(Self {
            lon_dim,
            lat_dim,
            data,
        })
    }

    /// Build a field by evaluating `f(i, j)` for every cell.
    pub fn from_fn(lon_dim: usize, lat_dim: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(lon_dim * lat_dim);
        for i in 0..lat_dim {
            for j in 0..lon_dim {
                data.push(f(i, j));
            }
        }
        Self {
            lon_dim,
            lat_dim,
            data,
        }
    }

    /// Number of longitude cells (columns).
    pub fn lon_dim(&self) -> usize {
        self.lon_dim
    }

    /// Number of latitude cells (rows).
    pub fn lat_dim(&self) -> usize {
        self.lat_dim
    }

    /// Shape as `(lon_dim, lat_dim)`, matching [`crate::GridSpec::shape`].
    pub fn shape(&self) -> (usize, usize) {
        (self.lon_dim, self.lat_dim)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the field has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at lat row `i`, lon column `j`.
    pub fn get(&self, i: usize, j: usize) -> Option<&T> {
        if i >= self.lat_dim || j >= self.lon_dim {
            return None;
        }
        self.data.get(i * self.lon_dim + j)
    }

    /// Row-major values.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consume the field, returning the row-major values.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Iterate over rows (one slice per latitude cell).
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.data.chunks(self.lon_dim.max(1))
    }

    /// Apply `f` to every cell.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> GridField<U> {
        GridField {
            lon_dim: self.lon_dim,
            lat_dim: self.lat_dim,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Combine two fields of identical shape cell by cell.
    pub fn zip_with<U, V>(
        &self,
        other: &GridField<U>,
        mut f: impl FnMut(&T, &U) -> V,
    ) -> GridResult<GridField<V>> {
        if self.shape() != other.shape() {
            return Err(RadarGridError::shape_mismatch(
                "grid field",
                format!("{:?}", self.shape()),
                format!("{:?}", other.shape()),
            ));
        }
        Ok(GridField {
            lon_dim: self.lon_dim,
            lat_dim: self.lat_dim,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(a, b)| f(a, b))
                .collect(),
        })
    }
}

impl GridField<f32> {
    /// Number of cells holding a non-NaN value.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

impl GridField<f64> {
    /// Number of cells holding a non-NaN value.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }
}

impl GridField<bool> {
    /// Number of `true` cells.
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&b| b).count()
    }
}

impl<T> Index<(usize, usize)> for GridField<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(
            i < self.lat_dim && j < self.lon_dim,
            "cell ({}, {}) outside {}x{} grid",
            i,
            j,
            self.lon_dim,
            self.lat_dim
        );
        &self.data[i * self.lon_dim + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_length() {
        let err = GridField::new(3, 2, vec![0.0f32; 5]).unwrap_err();
        assert!(matches!(err, RadarGridError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_row_major_layout() {
        let field = GridField::from_fn(3, 2, |i, j| i * 10 + j);
        assert_eq!(field.as_slice(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(field[(1, 2)], 12);
        assert_eq!(field.get(1, 0), Some(&10));
        assert_eq!(field.get(2, 0), None);
        assert_eq!(field.get(0, 3), None);
        assert_eq!(field.shape(), (3, 2));
        assert_eq!(field.rows().count(), 2);
    }

    #[test]
    fn test_zip_with_shape_mismatch() {
        let a = GridField::from_fn(2, 2, |_, _| 1.0f32);
        let b = GridField::from_fn(2, 3, |_, _| 1.0f32);
        assert!(a.zip_with(&b, |x, y| x + y).is_err());
    }

    #[test]
    fn test_valid_count() {
        let field = GridField::new(2, 1, vec![f32::NAN, 3.0]).unwrap();
        assert_eq!(field.valid_count(), 1);

        let heights = GridField::new(3, 1, vec![f64::NAN, 10.0, 20.0]).unwrap();
        assert_eq!(heights.valid_count(), 2);
    }

    #[test]
    fn test_serializes_nan_as_null() {
        let field = GridField::new(2, 1, vec![f32::NAN, 1.5]).unwrap();
        let json = serde_json::to_string(&field).unwrap();
        assert!(json.contains("[null,1.5]"), "{}", json);
    }
}
