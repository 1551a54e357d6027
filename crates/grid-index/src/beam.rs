//! Radar beam height above ground.

/// Earth radius used by the effective earth model (meters).
pub const EARTH_RADIUS_M: f64 = 6_370_040.0;

/// Standard refraction factor for the effective earth radius.
pub const STANDARD_REFRACTION: f64 = 4.0 / 3.0;

/// Height of the beam center at a given range and elevation.
pub trait BeamHeightModel {
    /// Height in meters for `range_m` meters along the ground and
    /// `elevation_deg` degrees antenna elevation.
    fn height(&self, range_m: f64, elevation_deg: f64) -> f64;
}

impl<F> BeamHeightModel for F
where
    F: Fn(f64, f64) -> f64,
{
    fn height(&self, range_m: f64, elevation_deg: f64) -> f64 {
        self(range_m, elevation_deg)
    }
}

/// 4/3 effective earth radius model.
///
/// `h = sqrt(r² + (ke·Re)² + 2·r·ke·Re·sin θ) − ke·Re + site_altitude`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectiveEarthModel {
    pub earth_radius_m: f64,
    pub refraction: f64,
    pub site_altitude_m: f64,
}

impl Default for EffectiveEarthModel {
    fn default() -> Self {
        Self {
            earth_radius_m: EARTH_RADIUS_M,
            refraction: STANDARD_REFRACTION,
            site_altitude_m: 0.0,
        }
    }
}

impl EffectiveEarthModel {
    pub fn with_site_altitude(site_altitude_m: f64) -> Self {
        Self {
            site_altitude_m,
            ..Self::default()
        }
    }

    /// Effective earth radius in meters.
    pub fn effective_radius(&self) -> f64 {
        self.refraction * self.earth_radius_m
    }
}

impl BeamHeightModel for EffectiveEarthModel {
    fn height(&self, range_m: f64, elevation_deg: f64) -> f64 {
        let ke_re = self.effective_radius();
        let sin_el = elevation_deg.to_radians().sin();
        (range_m * range_m + ke_re * ke_re + 2.0 * range_m * ke_re * sin_el).sqrt() - ke_re
            + self.site_altitude_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_range_is_site_altitude() {
        let model = EffectiveEarthModel::with_site_altitude(120.0);
        assert!((model.height(0.0, 0.5) - 120.0).abs() < 1e-6);
    }

    #[test]
    fn test_flat_beam_rises_with_curvature() {
        let model = EffectiveEarthModel::default();
        // r²/(2 keRe) for a horizontal beam
        let r = 100_000.0;
        let expected = r * r / (2.0 * model.effective_radius());
        assert!((model.height(r, 0.0) - expected).abs() < 1.0);
    }

    #[test]
    fn test_height_increases_with_elevation() {
        let model = EffectiveEarthModel::default();
        let low = model.height(50_000.0, 0.5);
        let high = model.height(50_000.0, 1.5);
        assert!(high > low);
        // ~ r·sin θ dominates at moderate range
        assert!((low - (50_000.0 * 0.5f64.to_radians().sin() + 147.0)).abs() < 5.0);
    }

    #[test]
    fn test_closure_model() {
        let flat = |r: f64, el: f64| r * el.to_radians().tan();
        assert!((flat.height(1000.0, 45.0) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_nan_propagates() {
        let model = EffectiveEarthModel::default();
        assert!(model.height(f64::NAN, 0.5).is_nan());
    }
}
