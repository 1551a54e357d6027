//! Configuration for grids and the index cache.

use radar_common::{CellReference, GridGeometry, GridResult, GridSpec, RadarGridError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default maximum radar range in meters (600 bins of 250 m).
pub const DEFAULT_MAX_RANGE_M: f64 = 150_000.0;

/// Grid definition plus the query parameters that go with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Center longitude (degrees)
    pub center_lon: f64,

    /// Center latitude (degrees)
    pub center_lat: f64,

    /// Cell size in meters.
    pub resolution_m: f64,

    /// Number of cells as `[lon, lat]`.
    pub shape: [usize; 2],

    /// Cells farther than this from the site are masked.
    #[serde(default = "default_max_range")]
    pub max_range_m: f64,

    /// Radar site `[lon, lat]`. Defaults to the grid center.
    #[serde(default)]
    pub site: Option<[f64; 2]>,

    /// Coordinate reported for each cell along an axis.
    #[serde(default)]
    pub cell_reference: CellReference,
}

fn default_max_range() -> f64 {
    DEFAULT_MAX_RANGE_M
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> GridResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RadarGridError::config(format!("{} has invalid value '{}'", name, value)))
}

impl GridConfig {
    /// Grid with the given definition and default range, site and reference.
    pub fn new(center_lon: f64, center_lat: f64, resolution_m: f64, shape: [usize; 2]) -> Self {
        Self {
            center_lon,
            center_lat,
            resolution_m,
            shape,
            max_range_m: DEFAULT_MAX_RANGE_M,
            site: None,
            cell_reference: CellReference::Center,
        }
    }

    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> GridResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&text).map_err(|e| match e {
            RadarGridError::Config(msg) => {
                RadarGridError::config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> GridResult<Self> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| RadarGridError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `GRID_*` environment variables.
    ///
    /// The grid definition (`GRID_CENTER_LON`, `GRID_CENTER_LAT`,
    /// `GRID_RESOLUTION_M`, `GRID_LON_CELLS`, `GRID_LAT_CELLS`) is required;
    /// range, site and cell reference fall back to their defaults.
    pub fn from_env() -> GridResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GridResult<Self> {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| RadarGridError::config(format!("{} is not set", name)))
        };

        let mut config = Self::new(
            parse_var("GRID_CENTER_LON", &required("GRID_CENTER_LON")?)?,
            parse_var("GRID_CENTER_LAT", &required("GRID_CENTER_LAT")?)?,
            parse_var("GRID_RESOLUTION_M", &required("GRID_RESOLUTION_M")?)?,
            [
                parse_var("GRID_LON_CELLS", &required("GRID_LON_CELLS")?)?,
                parse_var("GRID_LAT_CELLS", &required("GRID_LAT_CELLS")?)?,
            ],
        );

        if let Some(val) = lookup("GRID_MAX_RANGE_M") {
            config.max_range_m = parse_var("GRID_MAX_RANGE_M", &val)?;
        }

        if let (Some(lon), Some(lat)) = (lookup("GRID_SITE_LON"), lookup("GRID_SITE_LAT")) {
            config.site = Some([
                parse_var("GRID_SITE_LON", &lon)?,
                parse_var("GRID_SITE_LAT", &lat)?,
            ]);
        }

        if let Some(val) = lookup("GRID_CELL_REFERENCE") {
            config.cell_reference = CellReference::from_str(&val);
        }

        config.validate()?;
        Ok(config)
    }

    /// The grid part of the configuration.
    pub fn spec(&self) -> GridSpec {
        GridSpec::new(
            self.center_lon,
            self.center_lat,
            self.resolution_m,
            self.shape[0],
            self.shape[1],
        )
    }

    /// Validated geometry for this configuration.
    pub fn geometry(&self) -> GridResult<GridGeometry> {
        GridGeometry::new(self.spec())
    }

    /// Radar site, falling back to the grid center.
    pub fn site(&self) -> (f64, f64) {
        match self.site {
            Some([lon, lat]) => (lon, lat),
            None => (self.center_lon, self.center_lat),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GridResult<()> {
        self.spec().validate()?;

        if self.max_range_m.is_nan() || self.max_range_m < 0.0 {
            return Err(RadarGridError::config(format!(
                "max_range_m must be >= 0, got {}",
                self.max_range_m
            )));
        }

        if let Some([lon, lat]) = self.site {
            if !(lon.is_finite() && lat.is_finite()) {
                return Err(RadarGridError::config(format!(
                    "site must be finite, got [{}, {}]",
                    lon, lat
                )));
            }
        }

        Ok(())
    }
}

/// Configuration for [`crate::IndexCache`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCacheConfig {
    /// Directory holding `.ridx` files.
    pub cache_dir: PathBuf,

    /// Matrices kept in memory (0 disables the memory layer).
    pub memory_entries: usize,

    /// Include a CRC32 of the source coordinates in every key.
    pub fingerprint: bool,
}

impl Default for IndexCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./index_matrix"),
            memory_entries: 8,
            fingerprint: true,
        }
    }
}

impl IndexCacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("INDEX_CACHE_DIR") {
            config.cache_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("INDEX_CACHE_MEMORY_ENTRIES") {
            if let Ok(entries) = val.parse() {
                config.memory_entries = entries;
            }
        }

        if let Ok(val) = std::env::var("INDEX_CACHE_FINGERPRINT") {
            config.fingerprint = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Config rooted at `dir` with the other fields at their defaults.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> GridResult<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(RadarGridError::config("cache_dir must not be empty"));
        }
        Ok(())
    }
}
