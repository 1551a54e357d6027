//! Tests for grid geometry, binning edges and geo conversion.

use radar_common::grid::Axis;
use radar_common::{
    degrees_to_meters, meters_to_degrees, CellReference, GridGeometry, GridSpec, RadarGridError,
};
use test_utils::{assert_approx_eq, fixtures};

fn geometry(fixture: (f64, f64, f64, usize, usize)) -> GridGeometry {
    let (lon, lat, res, nx, ny) = fixture;
    GridGeometry::new(GridSpec::new(lon, lat, res, nx, ny)).unwrap()
}

// ============================================================================
// Construction tests
// ============================================================================

#[test]
fn test_small_grid_corners() {
    let grid = geometry(fixtures::grid::SMALL_4X4);
    let c = grid.corners();
    assert_approx_eq!(c.lon_start, -0.017_998_56, 1e-7);
    assert_approx_eq!(c.lon_end, 0.017_998_56, 1e-7);
    assert_eq!(c.lon_start, -c.lon_end);
    assert!(c.lon_end > c.lon_start);
    assert!(c.lat_end > c.lat_start);
}

#[test]
fn test_rectangular_grid_extent() {
    let grid = geometry(fixtures::grid::RECTANGULAR);
    let c = grid.corners();
    assert_approx_eq!(degrees_to_meters(c.width()), 12.0 * 500.0, 1e-6);
    assert_approx_eq!(degrees_to_meters(c.height()), 7.0 * 500.0, 1e-6);
    assert_eq!(grid.shape(), (12, 7));
    assert_eq!(grid.cell_count(), 84);
}

#[test]
fn test_invalid_grid_is_configuration_error() {
    let err = GridGeometry::new(GridSpec::new(0.0, 0.0, 250.0, 0, 10)).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, RadarGridError::InvalidGridSpec(_)));
}

// ============================================================================
// Binning tests
// ============================================================================

#[test]
fn test_every_lower_edge_maps_to_its_cell() {
    let grid = geometry(fixtures::grid::PATTERN_AREA);
    for k in 0..grid.lon_dim() {
        assert_eq!(grid.axis_index(Axis::Lon, grid.cell_edge(Axis::Lon, k)), Some(k));
    }
    for k in 0..grid.lat_dim() {
        assert_eq!(grid.axis_index(Axis::Lat, grid.cell_edge(Axis::Lat, k)), Some(k));
    }
}

#[test]
fn test_just_below_edge_maps_to_previous_cell() {
    let grid = geometry(fixtures::grid::RECTANGULAR);
    let edge = grid.cell_edge(Axis::Lon, 5);
    let below = edge - grid.resolution_degrees() * 1e-6;
    assert_eq!(grid.axis_index(Axis::Lon, below), Some(4));
}

#[test]
fn test_upper_corners_are_outside() {
    let grid = geometry(fixtures::grid::RECTANGULAR);
    let c = *grid.corners();
    assert_eq!(grid.cell_of(c.lon_end, c.lat_start), None);
    assert_eq!(grid.cell_of(c.lon_start, c.lat_end), None);
    assert_eq!(grid.cell_of(c.lon_start, c.lat_start), Some((0, 0)));
}

#[test]
fn test_flat_cell_is_row_major() {
    let grid = geometry(fixtures::grid::RECTANGULAR);
    let (lon, lat) = grid.cell_center(3, 9);
    assert_eq!(grid.flat_cell_of(lon, lat), Some(3 * 12 + 9));
}

// ============================================================================
// Coordinate tests
// ============================================================================

#[test]
fn test_coordinates_strictly_increasing() {
    let grid = geometry(fixtures::grid::PATTERN_AREA);
    for reference in [CellReference::Center, CellReference::Edges] {
        let coords = grid.coordinates(reference);
        assert_eq!(coords.lon.len(), grid.lon_dim());
        assert_eq!(coords.lat.len(), grid.lat_dim());
        assert!(coords.lon.windows(2).all(|w| w[1] > w[0]));
        assert!(coords.lat.windows(2).all(|w| w[1] > w[0]));
    }
}

#[test]
fn test_center_spacing_equals_resolution() {
    let grid = geometry(fixtures::grid::RECTANGULAR);
    let coords = grid.coordinates(CellReference::Center);
    for w in coords.lon.windows(2) {
        assert_approx_eq!(w[1] - w[0], meters_to_degrees(500.0), 1e-12);
    }
}
