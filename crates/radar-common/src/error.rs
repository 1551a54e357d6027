//! Error types for radar regridding.

use thiserror::Error;

/// Result type alias using RadarGridError.
pub type GridResult<T> = Result<T, RadarGridError>;

/// Primary error type for grid construction, indexing and resampling.
#[derive(Debug, Error)]
pub enum RadarGridError {
    // === Configuration Errors ===
    #[error("Invalid grid specification: {0}")]
    InvalidGridSpec(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Data Errors ===
    #[error("Shape mismatch for {what}: expected {expected}, found {found}")]
    ShapeMismatch {
        what: String,
        expected: String,
        found: String,
    },

    // === Cache Errors ===
    #[error("Corrupt index cache '{key}': expected shape {expected}, found {found}")]
    CorruptIndexCache {
        key: String,
        expected: String,
        found: String,
    },

    #[error("Invalid index cache format: {0}")]
    InvalidCacheFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RadarGridError {
    /// Create an InvalidGridSpec error.
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGridSpec(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(
        what: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Create a CorruptIndexCache error.
    pub fn corrupt_cache(
        key: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::CorruptIndexCache {
            key: key.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// True for errors that stem from configuration rather than data or storage.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidGridSpec(_) | Self::Config(_))
    }
}

impl From<serde_json::Error> for RadarGridError {
    fn from(err: serde_json::Error) -> Self {
        RadarGridError::Config(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_cache_message_carries_shapes() {
        let err = RadarGridError::corrupt_cache("idx_a", "4x4", "3x4");
        let msg = err.to_string();
        assert!(msg.contains("idx_a"));
        assert!(msg.contains("4x4"));
        assert!(msg.contains("3x4"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_invalid_grid_is_configuration() {
        assert!(RadarGridError::invalid_grid("resolution must be > 0").is_configuration());
        assert!(RadarGridError::config("bad yaml").is_configuration());
    }
}
