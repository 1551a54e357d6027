//! Two-level cache for index matrices.
//!
//! Building an [`IndexMatrix`] means binning every sample of a sweep, which
//! is by far the most expensive step of regridding. Matrices are therefore
//! kept in a small in-memory LRU and persisted as `.ridx` files, keyed by
//! everything that influences the mapping.
//!
//! Lookup order:
//! 1. Memory (LRU)
//! 2. Disk (decode, verify shape, promote to memory)
//! 3. Build, persist atomically, insert into memory

use crate::config::IndexCacheConfig;
use crate::index::IndexMatrix;
use crate::source::SourceGeometry;
use lru::LruCache;
use radar_common::{GridCorners, GridGeometry, GridResult, RadarGridError};
use std::fmt;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// File extension of persisted matrices.
pub const CACHE_FILE_EXTENSION: &str = "ridx";

/// Everything that determines an index matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexCacheKey {
    pub radar: String,
    pub corners: GridCorners,
    pub resolution_m: f64,
    pub lon_dim: usize,
    pub lat_dim: usize,
    pub res_factor: u32,
    pub offset_deg: f64,
    /// CRC32 of the source coordinates, when enabled.
    pub fingerprint: Option<u32>,
}

impl IndexCacheKey {
    pub fn new(radar: impl Into<String>, geometry: &GridGeometry) -> Self {
        let (lon_dim, lat_dim) = geometry.shape();
        Self {
            radar: radar.into(),
            corners: *geometry.corners(),
            resolution_m: geometry.spec().resolution_m,
            lon_dim,
            lat_dim,
            res_factor: 1,
            offset_deg: 0.0,
            fingerprint: None,
        }
    }

    pub fn with_res_factor(mut self, res_factor: u32) -> Self {
        self.res_factor = res_factor;
        self
    }

    pub fn with_offset_deg(mut self, offset_deg: f64) -> Self {
        self.offset_deg = offset_deg;
        self
    }

    pub fn with_source_fingerprint(mut self, source: &SourceGeometry) -> Self {
        self.fingerprint = Some(source.fingerprint());
        self
    }

    /// File name encoding every key field.
    ///
    /// Floats use the shortest round-trip representation and the radar name
    /// is percent-escaped, so distinct keys never share a name.
    pub fn file_name(&self) -> String {
        let c = &self.corners;
        let mut name = format!(
            "index_matrix_{}_{}_{}_{}_{}_{}_{}x{}_{}_{}",
            escape_component(&self.radar),
            c.lon_start,
            c.lon_end,
            c.lat_start,
            c.lat_end,
            self.resolution_m,
            self.lon_dim,
            self.lat_dim,
            self.res_factor,
            self.offset_deg,
        );
        if let Some(fp) = self.fingerprint {
            name.push_str(&format!("_{:08x}", fp));
        }
        name.push('.');
        name.push_str(CACHE_FILE_EXTENSION);
        name
    }
}

impl fmt::Display for IndexCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} @ {} m (res_factor {}, offset {})",
            self.radar, self.lon_dim, self.lat_dim, self.resolution_m, self.res_factor,
            self.offset_deg
        )
    }
}

fn escape_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexCacheStats {
    pub memory_hits: u64,
    pub disk_hits: u64,
    pub builds: u64,
    pub memory_entries: usize,
}

impl IndexCacheStats {
    /// Fraction of lookups that did not need a build.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.disk_hits;
        let total = hits + self.builds;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

/// Memory + disk cache of index matrices.
pub struct IndexCache {
    dir: PathBuf,
    memory: Option<LruCache<String, Arc<IndexMatrix>>>,
    fingerprint: bool,
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    builds: AtomicU64,
}

impl IndexCache {
    /// Open the cache described by `config`, creating the directory.
    pub fn new(config: &IndexCacheConfig) -> GridResult<Self> {
        config.validate()?;
        let mut cache = Self::open(&config.cache_dir, config.memory_entries)?;
        cache.fingerprint = config.fingerprint;
        Ok(cache)
    }

    /// Open a cache rooted at `dir` keeping up to `memory_entries` matrices
    /// in memory.
    pub fn open(dir: impl Into<PathBuf>, memory_entries: usize) -> GridResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), memory_entries, "Opened index cache");
        Ok(Self {
            dir,
            memory: NonZeroUsize::new(memory_entries).map(LruCache::new),
            fingerprint: true,
            memory_hits: AtomicU64::new(0),
            disk_hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether keys should carry a source fingerprint.
    pub fn uses_fingerprint(&self) -> bool {
        self.fingerprint
    }

    /// Location of the file for `key`.
    pub fn path_for(&self, key: &IndexCacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// True if `key` is held in memory or on disk.
    pub fn contains(&self, key: &IndexCacheKey) -> bool {
        let in_memory = self
            .memory
            .as_ref()
            .map(|m| m.contains(&key.file_name()))
            .unwrap_or(false);
        in_memory || self.path_for(key).is_file()
    }

    /// Read and decode the persisted matrix for `key`, if any.
    pub fn load(&self, key: &IndexCacheKey) -> GridResult<Option<IndexMatrix>> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        IndexMatrix::from_bytes(&bytes).map(Some)
    }

    /// Persist `matrix` for `key`.
    ///
    /// Written to a temporary file in the cache directory and renamed into
    /// place, so readers see either the old file, no file, or the complete
    /// new one.
    pub fn store(&self, key: &IndexCacheKey, matrix: &IndexMatrix) -> GridResult<PathBuf> {
        let path = self.path_for(key);
        let tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            matrix.write_to(&mut writer)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| RadarGridError::Io(e.error))?;

        info!(
            key = %key,
            path = %path.display(),
            bytes = matrix.byte_size(),
            "Persisted index matrix"
        );
        Ok(path)
    }

    /// Return the matrix for `key`, building and persisting it on a miss.
    ///
    /// Entries whose grid or source shape differs from the request are
    /// reported as [`RadarGridError::CorruptIndexCache`] rather than rebuilt.
    pub fn load_or_build(
        &mut self,
        key: &IndexCacheKey,
        geometry: &GridGeometry,
        source: &SourceGeometry,
    ) -> GridResult<Arc<IndexMatrix>> {
        let name = key.file_name();

        if let Some(memory) = self.memory.as_mut() {
            if let Some(matrix) = memory.get(&name) {
                verify_shape(&name, matrix, geometry, source)?;
                self.memory_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Index matrix memory hit");
                return Ok(Arc::clone(matrix));
            }
        }

        if let Some(matrix) = self.load(key)? {
            verify_shape(&name, &matrix, geometry, source)?;
            self.disk_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Index matrix disk hit");
            return Ok(self.remember(name, matrix));
        }

        info!(key = %key, samples = source.len(), "Building index matrix");
        let matrix = IndexMatrix::build(geometry, source);
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.store(key, &matrix)?;
        Ok(self.remember(name, matrix))
    }

    fn remember(&mut self, name: String, matrix: IndexMatrix) -> Arc<IndexMatrix> {
        let matrix = Arc::new(matrix);
        if let Some(memory) = self.memory.as_mut() {
            memory.put(name, Arc::clone(&matrix));
        }
        matrix
    }

    /// Drop `key` from memory and disk.
    pub fn invalidate(&mut self, key: &IndexCacheKey) -> GridResult<bool> {
        let name = key.file_name();
        let in_memory = self
            .memory
            .as_mut()
            .and_then(|m| m.pop(&name))
            .is_some();
        let on_disk = match std::fs::remove_file(self.dir.join(&name)) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        Ok(in_memory || on_disk)
    }

    /// Empty the memory layer. Files on disk are kept.
    pub fn clear_memory(&mut self) {
        if let Some(memory) = self.memory.as_mut() {
            memory.clear();
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> IndexCacheStats {
        IndexCacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.disk_hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            memory_entries: self.memory.as_ref().map(|m| m.len()).unwrap_or(0),
        }
    }
}

fn verify_shape(
    name: &str,
    matrix: &IndexMatrix,
    geometry: &GridGeometry,
    source: &SourceGeometry,
) -> GridResult<()> {
    if matrix.shape() == geometry.shape() && matrix.source_shape() == source.shape() {
        return Ok(());
    }
    let expected = format!(
        "grid {:?}, source {:?}",
        geometry.shape(),
        source.shape()
    );
    let found = format!(
        "grid {:?}, source {:?}",
        matrix.shape(),
        matrix.source_shape()
    );
    warn!(key = name, %expected, %found, "Index cache entry has wrong shape");
    Err(RadarGridError::corrupt_cache(name, expected, found))
}
