//! Named column tables and the persisted artifact holding them.
//!
//! The artifact is an ordered [`TableSet`]. Each [`Table`] has typed columns
//! plus an ordered header of key/value cards (`prov0`, `prov1`, ..., `time`)
//! and free-form comments. Serialization uses rkyv so the output of a large
//! survey loads back without parsing.

use std::path::Path;

use rkyv::{Archive, Deserialize, Serialize};
use tracing::info;

use crate::catalog::basename;

// ── Index width policy ──────────────────────────────────────────────────────

/// Signed integer width used to store an index column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntWidth {
    I16,
    I32,
    I64,
}

/// Smallest signed width able to hold `max_value`.
pub fn select_int_width(max_value: u64) -> IntWidth {
    if max_value <= i16::MAX as u64 {
        IntWidth::I16
    } else if max_value <= i32::MAX as u64 {
        IntWidth::I32
    } else {
        IntWidth::I64
    }
}

// ── Columns ─────────────────────────────────────────────────────────────────

/// Typed storage for a single column.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub enum ColumnData {
    F64(Vec<f64>),
    F32(Vec<f32>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
}

impl ColumnData {
    /// Store non-negative indices in the narrowest width that fits their maximum.
    pub fn from_indices(indices: &[usize]) -> Self {
        Self::from_indices_at_least(indices, IntWidth::I16)
    }

    /// Like [`ColumnData::from_indices`], but never narrower than `min_width`.
    pub fn from_indices_at_least(indices: &[usize], min_width: IntWidth) -> Self {
        let max = indices.iter().copied().max().unwrap_or(0) as u64;
        match select_int_width(max).max(min_width) {
            IntWidth::I16 => ColumnData::I16(indices.iter().map(|&i| i as i16).collect()),
            IntWidth::I32 => ColumnData::I32(indices.iter().map(|&i| i as i32).collect()),
            IntWidth::I64 => ColumnData::I64(indices.iter().map(|&i| i as i64).collect()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::F64(v) => v.len(),
            ColumnData::F32(v) => v.len(),
            ColumnData::I16(v) => v.len(),
            ColumnData::I32(v) => v.len(),
            ColumnData::I64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of an integer column, `None` for floating-point columns.
    pub fn int_width(&self) -> Option<IntWidth> {
        match self {
            ColumnData::I16(_) => Some(IntWidth::I16),
            ColumnData::I32(_) => Some(IntWidth::I32),
            ColumnData::I64(_) => Some(IntWidth::I64),
            ColumnData::F64(_) | ColumnData::F32(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            ColumnData::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            ColumnData::F32(v) => Some(v),
            _ => None,
        }
    }

    /// Integer column widened to `i64`, whatever its stored width.
    pub fn to_i64_vec(&self) -> Option<Vec<i64>> {
        match self {
            ColumnData::I16(v) => Some(v.iter().map(|&x| x as i64).collect()),
            ColumnData::I32(v) => Some(v.iter().map(|&x| x as i64).collect()),
            ColumnData::I64(v) => Some(v.clone()),
            ColumnData::F64(_) | ColumnData::F32(_) => None,
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// One ordered key/value header entry.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct HeaderCard {
    pub key: String,
    pub value: String,
}

// ── Tables ──────────────────────────────────────────────────────────────────

/// A named table of equal-length columns with header metadata.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub header: Vec<HeaderCard>,
    pub comments: Vec<String>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            header: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Append a column.
    pub fn with_column(mut self, name: impl Into<String>, data: ColumnData) -> Self {
        self.columns.push(Column {
            name: name.into(),
            data,
        });
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Record the basenames of `files` as `prov0`, `prov1`, ... cards.
    pub fn with_provenance<S: AsRef<str>>(mut self, files: &[S]) -> Self {
        for (i, file) in files.iter().enumerate() {
            self.set_card(format!("prov{i}"), basename(file.as_ref()));
        }
        self
    }

    /// Set a header card, replacing any existing card with the same key.
    pub fn set_card(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.header.iter_mut().find(|c| c.key == key) {
            Some(card) => card.value = value,
            None => self.header.push(HeaderCard { key, value }),
        }
    }

    pub fn card(&self, key: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|c| c.key == key)
            .map(|c| c.value.as_str())
    }

    /// Provenance basenames in `prov<i>` order.
    pub fn provenance(&self) -> Vec<&str> {
        (0..)
            .map_while(|i| self.card(&format!("prov{i}")))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.data)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Row count (all columns share it; zero for a column-less table).
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }
}

/// Ordered set of tables forming one output artifact.
#[derive(Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize)]
pub struct TableSet {
    pub tables: Vec<Table>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: Table) {
        self.tables.push(table);
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Serialize the table set to bytes using rkyv.
    pub fn to_rkyv_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map_err(|e| anyhow::anyhow!("rkyv serialization failed: {}", e))?;
        Ok(bytes.to_vec())
    }

    /// Deserialize a table set from rkyv bytes.
    pub fn from_rkyv_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        // File buffers carry no alignment guarantee.
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| anyhow::anyhow!("rkyv deserialization failed: {}", e))
    }

    /// Save the table set to a file using rkyv.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = self.to_rkyv_bytes()?;
        std::fs::write(path, &bytes)?;
        info!("Saved {} tables to {} ({} bytes)", self.len(), path.display(), bytes.len());
        Ok(())
    }

    /// Load a table set from an rkyv file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let set = Self::from_rkyv_bytes(&bytes)?;
        info!("Loaded {} tables from {}", set.len(), path.display());
        Ok(set)
    }
}
