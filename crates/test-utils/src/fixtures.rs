//! Common test fixtures for radar regridding tests.
//!
//! Plain tuples and constants so this crate stays free of workspace
//! dependencies.

/// Grid definitions as `(center_lon, center_lat, resolution_m, lon_cells, lat_cells)`.
pub mod grid {
    /// 4x4 grid of 1 km cells centred on the origin
    pub const SMALL_4X4: (f64, f64, f64, usize, usize) = (0.0, 0.0, 1000.0, 4, 4);

    /// 250 m grid over a 20 km radius area in rotated-pole coordinates
    pub const PATTERN_AREA: (f64, f64, f64, usize, usize) = (0.2311, -0.3685, 250.0, 160, 160);

    /// Non-square grid to catch lon/lat axis mix-ups
    pub const RECTANGULAR: (f64, f64, f64, usize, usize) = (1.5, -2.25, 500.0, 12, 7);

    /// Single 1 km cell
    pub const SINGLE_CELL: (f64, f64, f64, usize, usize) = (0.0, 0.0, 1000.0, 1, 1);
}

/// Sweep geometries as `(nrays, nbins, bin_m)`.
pub mod sweep {
    /// National weather service C-band sweep: 1 deg rays, 600 bins of 250 m
    pub const DWD_LIKE: (usize, usize, f64) = (360, 600, 250.0);

    /// X-band short-range sweep: 1 deg rays, 333 bins of 60 m
    pub const PATTERN_LIKE: (usize, usize, f64) = (360, 333, 60.0);

    /// Tiny sweep for exhaustive checks
    pub const TINY: (usize, usize, f64) = (8, 5, 300.0);
}

/// Radar identifiers used in cache keys.
pub mod radars {
    pub const BOO: &str = "boo";
    pub const HHG: &str = "hhg";
    pub const TEST: &str = "test";
}
