//! Radar sweep regridding with cached index matrices.
//!
//! Resamples polar radar measurements onto a shared regular grid so that
//! different instruments can be compared cell by cell. The expensive part,
//! working out which source samples fall into which cell, is done once per
//! (grid, radar geometry) pair and persisted; every new snapshot from the
//! same radar then only needs a linear pass over its values.
//!
//! # Architecture
//!
//! ```text
//! GridConfig ──► GridGeometry ──► GridCoordinates ──► query::{distance_to, mask_beyond, beam_height}
//!                     │
//! RadarSource ────────┤
//!                     ▼
//!          IndexCache::load_or_build(key)
//!                     │
//!                     ├─► memory hit (LRU)
//!                     ├─► disk hit: decode + shape check
//!                     └─► miss: IndexMatrix::build + atomic persist
//!                     │
//!                     ▼
//!          resample::apply(matrix, values) ──► GridField<f32>
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_index::{GridConfig, IndexCache, IndexCacheConfig, Regridder};
//!
//! let config = GridConfig::from_yaml_file("grid.yaml")?;
//! let cache = IndexCache::new(&IndexCacheConfig::from_env())?;
//! let mut regridder = Regridder::new(config, cache)?;
//!
//! let field = regridder.regrid(&sweep)?;
//! let mask = regridder.range_mask();
//! ```

pub mod beam;
pub mod cache;
pub mod compare;
pub mod config;
pub mod index;
pub mod pipeline;
pub mod query;
pub mod resample;
pub mod source;

// Re-export commonly used types at crate root
pub use beam::{BeamHeightModel, EffectiveEarthModel};
pub use cache::{IndexCache, IndexCacheKey, IndexCacheStats};
pub use config::{GridConfig, IndexCacheConfig};
pub use index::IndexMatrix;
pub use pipeline::Regridder;
pub use radar_common::{GridField, GridGeometry, GridResult, GridSpec, RadarGridError};
pub use source::{RadarSource, SourceGeometry, SweepSource};
