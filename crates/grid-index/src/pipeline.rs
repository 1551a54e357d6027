//! Regridding of radar sources onto a configured grid.

use crate::beam::BeamHeightModel;
use crate::cache::{IndexCache, IndexCacheKey};
use crate::config::GridConfig;
use crate::index::IndexMatrix;
use crate::source::RadarSource;
use crate::{query, resample};
use radar_common::{GridCoordinates, GridField, GridGeometry, GridResult, RadarGridError};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Resamples sources onto one grid, reusing cached index matrices.
pub struct Regridder {
    config: GridConfig,
    geometry: GridGeometry,
    coordinates: GridCoordinates,
    cache: IndexCache,
}

impl Regridder {
    /// Validate `config` and derive the grid geometry.
    pub fn new(config: GridConfig, cache: IndexCache) -> GridResult<Self> {
        config.validate()?;
        let geometry = config.geometry()?;
        let coordinates = geometry.coordinates(config.cell_reference);
        Ok(Self {
            config,
            geometry,
            coordinates,
            cache,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn coordinates(&self) -> &GridCoordinates {
        &self.coordinates
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Cache key for `source` on this grid.
    pub fn cache_key<S: RadarSource + ?Sized>(&self, source: &S) -> IndexCacheKey {
        let key = IndexCacheKey::new(source.name(), &self.geometry)
            .with_res_factor(source.res_factor())
            .with_offset_deg(source.offset_deg());
        if self.cache.uses_fingerprint() {
            key.with_source_fingerprint(source.coordinates())
        } else {
            key
        }
    }

    /// Index matrix for `source`, loaded or built through the cache.
    pub fn index_for<S: RadarSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> GridResult<Arc<IndexMatrix>> {
        let key = self.cache_key(source);
        self.cache
            .load_or_build(&key, &self.geometry, source.coordinates())
    }

    /// Resample the current values of `source` onto the grid.
    #[instrument(skip_all, fields(radar = source.name()))]
    pub fn regrid<S: RadarSource + ?Sized>(&mut self, source: &S) -> GridResult<GridField<f32>> {
        let matrix = self.index_for(source)?;
        let field = resample::apply(&matrix, source.values())?;
        debug!(
            valid_cells = field.valid_count(),
            cells = field.len(),
            "Regridded sweep"
        );
        Ok(field)
    }

    /// Distance in meters from every cell to `(lon, lat)`.
    pub fn distance_to(&self, lon: f64, lat: f64) -> GridField<f64> {
        query::distance_to(&self.coordinates, lon, lat)
    }

    /// Distance in meters from every cell to the configured site.
    pub fn site_distance(&self) -> GridField<f64> {
        let (lon, lat) = self.config.site();
        self.distance_to(lon, lat)
    }

    /// Cells beyond the configured maximum range from the site.
    pub fn range_mask(&self) -> GridField<bool> {
        query::mask_beyond(&self.site_distance(), self.config.max_range_m)
    }

    /// Beam height over every cell for a radar at `site` scanning at
    /// `elevation_deg`.
    pub fn beam_height<M: BeamHeightModel + ?Sized>(
        &self,
        site: (f64, f64),
        elevation_deg: f64,
        model: &M,
    ) -> GridField<f64> {
        let distance = self.distance_to(site.0, site.1);
        query::beam_height(&distance, elevation_deg, model)
    }

    /// Beam height over every cell for the site and elevation reported by
    /// `source`. Both must be known.
    pub fn source_beam_height<S, M>(&self, source: &S, model: &M) -> GridResult<GridField<f64>>
    where
        S: RadarSource + ?Sized,
        M: BeamHeightModel + ?Sized,
    {
        let site = source.site().ok_or_else(|| {
            RadarGridError::config(format!("radar '{}' has no site", source.name()))
        })?;
        let elevation = source.elevation_deg().ok_or_else(|| {
            RadarGridError::config(format!("radar '{}' has no elevation", source.name()))
        })?;
        Ok(self.beam_height(site, elevation, model))
    }
}
