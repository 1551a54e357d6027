//! Cell-to-sample index matrices.
//!
//! An [`IndexMatrix`] records, for every grid cell, the flat positions of
//! the source samples whose coordinates fall into that cell. It is built
//! with one counting pass and one fill pass over the source (compressed
//! sparse row layout), so construction is linear in the number of samples
//! and independent of how many cells stay empty.
//!
//! # Binary format
//!
//! Little-endian, versioned:
//!
//! ```text
//! "RIDX" | version u32 | lat_dim u64 | lon_dim u64 | src_rows u64 | src_cols u64
//! offsets: (lat_dim * lon_dim + 1) x u64
//! indices: offsets[last] x u64
//! ```

use crate::source::SourceGeometry;
use radar_common::{GridField, GridGeometry, GridResult, RadarGridError};
use std::io::Write;
use tracing::debug;

/// Magic bytes at the start of every serialized matrix.
pub const MAGIC: &[u8; 4] = b"RIDX";

/// Current serialization version.
pub const FORMAT_VERSION: u32 = 1;

const HEADER_LEN: usize = 4 + 4 + 4 * 8;

/// Grid-shaped mapping from cells to source sample positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMatrix {
    lon_dim: usize,
    lat_dim: usize,
    source_rows: usize,
    source_cols: usize,
    /// `offsets[c]..offsets[c + 1]` is the slice of `indices` for flat cell `c`
    offsets: Vec<usize>,
    /// Source positions, ascending within each cell
    indices: Vec<usize>,
}

impl IndexMatrix {
    /// Bin every source sample into the grid.
    ///
    /// Samples outside the grid (or with non-finite coordinates) are dropped
    /// without error.
    pub fn build(geometry: &GridGeometry, source: &SourceGeometry) -> Self {
        const DROPPED: usize = usize::MAX;

        let cell_count = geometry.cell_count();
        let mut counts = vec![0usize; cell_count];
        let mut assignment = Vec::with_capacity(source.len());

        for (lon, lat) in source.points() {
            match geometry.flat_cell_of(lon, lat) {
                Some(cell) => {
                    counts[cell] += 1;
                    assignment.push(cell);
                }
                None => assignment.push(DROPPED),
            }
        }

        let mut offsets = Vec::with_capacity(cell_count + 1);
        let mut running = 0usize;
        offsets.push(0);
        for &count in &counts {
            running += count;
            offsets.push(running);
        }

        let mut cursor = offsets[..cell_count].to_vec();
        let mut indices = vec![0usize; running];
        for (position, &cell) in assignment.iter().enumerate() {
            if cell != DROPPED {
                indices[cursor[cell]] = position;
                cursor[cell] += 1;
            }
        }

        let (source_rows, source_cols) = source.shape();
        let matrix = Self {
            lon_dim: geometry.lon_dim(),
            lat_dim: geometry.lat_dim(),
            source_rows,
            source_cols,
            offsets,
            indices,
        };

        debug!(
            samples = source.len(),
            assigned = matrix.assigned_count(),
            dropped = source.len() - matrix.assigned_count(),
            cells = cell_count,
            empty_cells = matrix.empty_cell_count(),
            "Built index matrix"
        );

        matrix
    }

    pub fn lon_dim(&self) -> usize {
        self.lon_dim
    }

    pub fn lat_dim(&self) -> usize {
        self.lat_dim
    }

    /// Grid shape as `(lon_dim, lat_dim)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lon_dim, self.lat_dim)
    }

    /// Source shape as `(rows, cols)`.
    pub fn source_shape(&self) -> (usize, usize) {
        (self.source_rows, self.source_cols)
    }

    /// Number of source samples the matrix was built for.
    pub fn source_len(&self) -> usize {
        self.source_rows * self.source_cols
    }

    /// Number of grid cells.
    pub fn cell_count(&self) -> usize {
        self.lon_dim * self.lat_dim
    }

    /// Total number of recorded positions (in-bounds samples).
    pub fn assigned_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of cells without any sample.
    pub fn empty_cell_count(&self) -> usize {
        self.offsets.windows(2).filter(|w| w[0] == w[1]).count()
    }

    /// Source positions in cell `(i, j)` (lat row, lon column).
    pub fn cell(&self, i: usize, j: usize) -> &[usize] {
        if i >= self.lat_dim || j >= self.lon_dim {
            return &[];
        }
        self.cell_flat(i * self.lon_dim + j)
    }

    /// Source positions in the flat (row-major) cell `cell`.
    #[inline]
    pub fn cell_flat(&self, cell: usize) -> &[usize] {
        match (self.offsets.get(cell), self.offsets.get(cell + 1)) {
            (Some(&start), Some(&end)) => &self.indices[start..end],
            _ => &[],
        }
    }

    /// Iterate over every cell's positions in row-major cell order.
    pub fn cells(&self) -> impl Iterator<Item = &[usize]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.indices[w[0]..w[1]])
    }

    /// Number of samples per cell.
    pub fn counts(&self) -> GridField<usize> {
        GridField::from_fn(self.lon_dim, self.lat_dim, |i, j| self.cell(i, j).len())
    }

    /// Convert a recorded flat position into a `(row, col)` source tuple.
    pub fn source_position(&self, flat: usize) -> Option<(usize, usize)> {
        if flat >= self.source_len() {
            return None;
        }
        Some((flat / self.source_cols, flat % self.source_cols))
    }

    /// Size in bytes when serialized.
    pub fn byte_size(&self) -> usize {
        HEADER_LEN + (self.offsets.len() + self.indices.len()) * 8
    }

    /// Header dimensions, offsets and indices as the `u64` words that
    /// follow magic and version in the serialized form.
    fn words(&self) -> impl Iterator<Item = u64> + '_ {
        [self.lat_dim, self.lon_dim, self.source_rows, self.source_cols]
            .into_iter()
            .chain(self.offsets.iter().copied())
            .chain(self.indices.iter().copied())
            .map(|v| v as u64)
    }

    /// Serialize into a writer.
    pub fn write_to<W: Write>(&self, mut writer: W) -> GridResult<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        for word in self.words() {
            writer.write_all(&word.to_le_bytes())?;
        }
        Ok(())
    }

    /// Serialize to bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_size());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        for word in self.words() {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Deserialize from bytes, validating structure before allocating.
    pub fn from_bytes(bytes: &[u8]) -> GridResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(format_error(format!(
                "truncated header: {} bytes",
                bytes.len()
            )));
        }
        if &bytes[0..4] != MAGIC {
            return Err(format_error("invalid magic bytes"));
        }
        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != FORMAT_VERSION {
            return Err(format_error(format!("unsupported version {}", version)));
        }

        let lat_dim = read_usize(bytes, 8)?;
        let lon_dim = read_usize(bytes, 16)?;
        let source_rows = read_usize(bytes, 24)?;
        let source_cols = read_usize(bytes, 32)?;

        let cell_count = lat_dim
            .checked_mul(lon_dim)
            .ok_or_else(|| format_error("grid dimensions overflow"))?;
        let source_len = source_rows
            .checked_mul(source_cols)
            .ok_or_else(|| format_error("source dimensions overflow"))?;

        let offsets_end = cell_count
            .checked_add(1)
            .and_then(|n| n.checked_mul(8))
            .and_then(|n| n.checked_add(HEADER_LEN))
            .ok_or_else(|| format_error("offset table overflow"))?;
        if bytes.len() < offsets_end {
            return Err(format_error(format!(
                "expected at least {} bytes for {} cells, got {}",
                offsets_end,
                cell_count,
                bytes.len()
            )));
        }

        let total = read_usize(bytes, offsets_end - 8)?;
        let expected = total
            .checked_mul(8)
            .and_then(|n| n.checked_add(offsets_end))
            .ok_or_else(|| format_error("index table overflow"))?;
        if bytes.len() != expected {
            return Err(format_error(format!(
                "expected {} bytes, got {}",
                expected,
                bytes.len()
            )));
        }

        let mut offsets = Vec::with_capacity(cell_count + 1);
        let mut previous = 0usize;
        for k in 0..=cell_count {
            let offset = read_usize(bytes, HEADER_LEN + k * 8)?;
            if (k == 0 && offset != 0) || offset < previous {
                return Err(format_error(format!("offset table not monotonic at cell {}", k)));
            }
            previous = offset;
            offsets.push(offset);
        }

        let mut indices = Vec::with_capacity(total);
        for k in 0..total {
            let index = read_usize(bytes, offsets_end + k * 8)?;
            if index >= source_len {
                return Err(format_error(format!(
                    "source position {} outside {}x{} source",
                    index, source_rows, source_cols
                )));
            }
            indices.push(index);
        }

        Ok(Self {
            lon_dim,
            lat_dim,
            source_rows,
            source_cols,
            offsets,
            indices,
        })
    }
}

fn format_error(msg: impl Into<String>) -> RadarGridError {
    RadarGridError::InvalidCacheFormat(msg.into())
}

fn read_usize(bytes: &[u8], offset: usize) -> GridResult<usize> {
    let chunk = bytes
        .get(offset..offset + 8)
        .ok_or_else(|| format_error(format!("unexpected end of data at byte {}", offset)))?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(chunk);
    usize::try_from(u64::from_le_bytes(buf))
        .map_err(|_| format_error(format!("value at byte {} exceeds usize", offset)))
}
