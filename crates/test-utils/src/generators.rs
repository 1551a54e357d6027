//! Test data generators for synthetic radar sweeps.
//!
//! Sweeps are laid out the way polar radar data arrives: one row per ray
//! (azimuth), one column per range bin, row-major. Geometry is returned as
//! east/north offsets in meters from the site so callers can convert to
//! degrees with the library's own conversion.

/// East and north offsets (meters) of every bin center of a polar sweep.
///
/// Ray `a` points at azimuth `a * 360 / nrays` degrees clockwise from north.
/// Bin `b` sits at range `(b + 0.5) * bin_m`.
///
/// # Example
///
/// ```
/// use test_utils::polar_offsets_m;
///
/// let (east, north) = polar_offsets_m(4, 2, 100.0);
/// assert_eq!(east.len(), 8);
/// // ray 0 points north
/// assert!(east[0].abs() < 1e-9);
/// assert!((north[0] - 50.0).abs() < 1e-9);
/// ```
pub fn polar_offsets_m(nrays: usize, nbins: usize, bin_m: f64) -> (Vec<f64>, Vec<f64>) {
    let mut east = Vec::with_capacity(nrays * nbins);
    let mut north = Vec::with_capacity(nrays * nbins);
    for ray in 0..nrays {
        let azimuth = (ray as f64 * 360.0 / nrays as f64).to_radians();
        let (sin, cos) = azimuth.sin_cos();
        for bin in 0..nbins {
            let range = (bin as f64 + 0.5) * bin_m;
            east.push(range * sin);
            north.push(range * cos);
        }
    }
    (east, north)
}

/// Creates a reflectivity sweep (dBZ) with a deterministic storm pattern.
///
/// Background values sit between -10 and 5 dBZ; roughly a quarter of the
/// bins carry echoes up to 60 dBZ.
pub fn create_reflectivity_sweep(nrays: usize, nbins: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(nrays * nbins);
    for ray in 0..nrays {
        for bin in 0..nbins {
            let hash = simple_hash(bin as u32, ray as u32, seed);
            let dbz = if hash % 4 == 0 {
                (hash % 6000) as f32 / 100.0
            } else {
                -10.0 + (hash % 1500) as f32 / 100.0
            };
            data.push(dbz);
        }
    }
    data
}

/// Creates a sweep whose value encodes its position: `ray * 1000 + bin`.
///
/// Makes it easy to check which source sample ended up where.
pub fn create_position_sweep(nrays: usize, nbins: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(nrays * nbins);
    for ray in 0..nrays {
        for bin in 0..nbins {
            data.push((ray * 1000 + bin) as f32);
        }
    }
    data
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Creates a sweep filled with a constant value.
pub fn create_constant_sweep(nrays: usize, nbins: usize, value: f32) -> Vec<f32> {
    vec![value; nrays * nbins]
}

/// Creates a sweep with NaN at the given `(ray, bin)` positions, zeros elsewhere.
pub fn create_sweep_with_nans(
    nrays: usize,
    nbins: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; nrays * nbins];
    for &(ray, bin) in nan_positions {
        if ray < nrays && bin < nbins {
            data[ray * nbins + bin] = f32::NAN;
        }
    }
    data
}
