//! Resampling source values onto the grid with a precomputed index matrix.

use crate::index::IndexMatrix;
use radar_common::{GridField, GridResult, RadarGridError};
use rayon::prelude::*;

/// Mean of the source values recorded for every cell.
///
/// Cells without samples are NaN. A NaN sample makes its cell NaN.
/// Sums are accumulated in f64 and only the final mean is rounded to f32,
/// the precision of the input values.
///
/// # Arguments
/// * `matrix` - Index matrix built for the source geometry
/// * `values` - One value per source sample, flat row-major order
pub fn apply(matrix: &IndexMatrix, values: &[f32]) -> GridResult<GridField<f32>> {
    if values.len() != matrix.source_len() {
        let (rows, cols) = matrix.source_shape();
        return Err(RadarGridError::shape_mismatch(
            "resample values",
            format!("{} ({}x{})", matrix.source_len(), rows, cols),
            values.len(),
        ));
    }

    let mut output = vec![f32::NAN; matrix.cell_count()];
    output
        .par_iter_mut()
        .enumerate()
        .for_each(|(cell, out)| {
            let positions = matrix.cell_flat(cell);
            if positions.is_empty() {
                return;
            }
            let sum: f64 = positions.iter().map(|&p| values[p] as f64).sum();
            *out = (sum / positions.len() as f64) as f32;
        });

    GridField::new(matrix.lon_dim(), matrix.lat_dim(), output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceGeometry;
    use radar_common::{GridGeometry, GridSpec};

    fn small_grid() -> GridGeometry {
        GridGeometry::new(GridSpec::new(0.0, 0.0, 1000.0, 4, 4)).unwrap()
    }

    #[test]
    fn test_single_sample_scenario() {
        let source = SourceGeometry::from_points(vec![0.0], vec![0.0]).unwrap();
        let matrix = IndexMatrix::build(&small_grid(), &source);
        let field = apply(&matrix, &[42.0]).unwrap();

        assert_eq!(field[(2, 2)], 42.0);
        assert_eq!(field.valid_count(), 1);
    }

    #[test]
    fn test_mean_of_two_samples() {
        let source =
            SourceGeometry::from_points(vec![0.001, 0.002], vec![0.001, 0.002]).unwrap();
        let matrix = IndexMatrix::build(&small_grid(), &source);
        let field = apply(&matrix, &[10.0, 20.0]).unwrap();
        assert_eq!(field[(2, 2)], 15.0);
    }

    #[test]
    fn test_mean_accumulates_beyond_f32_precision() {
        // 2^24 + 1 + 1 loses both ones when summed in f32
        let source = SourceGeometry::from_points(
            vec![0.001, 0.002, 0.003],
            vec![0.001, 0.002, 0.003],
        )
        .unwrap();
        let matrix = IndexMatrix::build(&small_grid(), &source);
        let field = apply(&matrix, &[16_777_216.0, 1.0, 1.0]).unwrap();
        assert_eq!(field[(2, 2)], 5_592_406.0);
    }

    #[test]
    fn test_nan_sample_poisons_cell() {
        let source =
            SourceGeometry::from_points(vec![0.001, 0.002], vec![0.001, 0.002]).unwrap();
        let matrix = IndexMatrix::build(&small_grid(), &source);
        let field = apply(&matrix, &[10.0, f32::NAN]).unwrap();
        assert!(field[(2, 2)].is_nan());
    }

    #[test]
    fn test_wrong_value_count() {
        let source = SourceGeometry::from_points(vec![0.0, 0.0], vec![0.0, 0.0]).unwrap();
        let matrix = IndexMatrix::build(&small_grid(), &source);
        assert!(matches!(
            apply(&matrix, &[1.0]),
            Err(RadarGridError::ShapeMismatch { .. })
        ));
    }
}
