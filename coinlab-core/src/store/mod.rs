//! Feature-table persistence.
//!
//! Layout: `{root}/{name}.{csv|parquet}` plus `{root}/{name}.{ext}.meta.json`.
//!
//! - Atomic writes (write to `.tmp`, rename into place)
//! - Column contract checked on load (missing column is an error)
//! - Nulls round-trip as nulls in both formats

pub mod csv_table;
pub mod meta;
pub mod parquet_table;
pub mod schema;

use crate::domain::FeatureRow;
use crate::features::FeatureTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub use meta::{Provenance, TableMeta};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("missing expected column '{column}'")]
    MissingColumn { column: String },

    #[error("row {row}: cannot parse {column} value '{value}'")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("unrecognized table format for '{0}' (expected .csv or .parquet)")]
    UnknownFormat(String),

    #[error("metadata error: {0}")]
    Meta(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Parquet,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Parquet => "parquet",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, StoreError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("csv") => Ok(TableFormat::Csv),
            Some("parquet") => Ok(TableFormat::Parquet),
            _ => Err(StoreError::UnknownFormat(path.display().to_string())),
        }
    }
}

impl std::str::FromStr for TableFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "parquet" => Ok(TableFormat::Parquet),
            other => Err(StoreError::UnknownFormat(other.to_string())),
        }
    }
}

/// Where a table landed.
#[derive(Debug, Clone)]
pub struct SavedTable {
    pub path: PathBuf,
    pub meta_path: PathBuf,
    pub meta: TableMeta,
}

/// Reads and writes feature tables under one directory.
pub struct FeatureStore {
    root: PathBuf,
}

impl FeatureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `crypto_data_{YYYYmmdd_HHMMSS}.{ext}`
    pub fn timestamped_name(at: DateTime<Utc>, format: TableFormat) -> String {
        format!("crypto_data_{}.{}", at.format("%Y%m%d_%H%M%S"), format.extension())
    }

    fn meta_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    /// Write `table` as `file_name` (format from its extension) plus the sidecar.
    pub fn save(
        &self,
        table: &FeatureTable,
        file_name: &str,
        provenance: &Provenance,
    ) -> Result<SavedTable, StoreError> {
        fs::create_dir_all(&self.root).map_err(|e| StoreError::io(&self.root, e))?;

        let path = self.root.join(file_name);
        let format = TableFormat::from_path(&path)?;
        let tmp_path = path.with_extension(format!("{}.tmp", format.extension()));

        match format {
            TableFormat::Csv => {
                let file = fs::File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
                csv_table::write_rows(BufWriter::new(file), &table.rows)?;
            }
            TableFormat::Parquet => parquet_table::write_parquet(&tmp_path, &table.rows)?,
        }

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            StoreError::io(&path, e)
        })?;

        let meta = TableMeta::describe(file_name, table, provenance);
        let meta_path = Self::meta_path(&path);
        let json = serde_json::to_string_pretty(&meta)
            .map_err(|e| StoreError::Meta(format!("serialize: {e}")))?;
        fs::write(&meta_path, json).map_err(|e| StoreError::io(&meta_path, e))?;

        info!(path = %path.display(), rows = table.len(), "feature table saved");

        Ok(SavedTable {
            path,
            meta_path,
            meta,
        })
    }

    /// Load `file_name` relative to the store root.
    pub fn load(&self, file_name: &str) -> Result<Vec<FeatureRow>, StoreError> {
        load_path(&self.root.join(file_name))
    }

    /// Read the sidecar for `file_name`.
    pub fn read_meta(&self, file_name: &str) -> Result<TableMeta, StoreError> {
        let meta_path = Self::meta_path(&self.root.join(file_name));
        let content = fs::read_to_string(&meta_path).map_err(|e| StoreError::io(&meta_path, e))?;
        serde_json::from_str(&content).map_err(|e| StoreError::Meta(format!("parse: {e}")))
    }
}

/// Load a table from an explicit path, format chosen by extension.
pub fn load_path(path: &Path) -> Result<Vec<FeatureRow>, StoreError> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => {
            let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
            csv_table::read_rows(BufReader::new(file))
        }
        TableFormat::Parquet => parquet_table::read_parquet(path),
    }
}
