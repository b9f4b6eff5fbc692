// src/store/mod.rs

//! Flat-file backed tables: the append-only attempt log and the
//! read-only association rule table.

use std::path::PathBuf;

use thiserror::Error;

pub mod attempts;
pub mod rules;

pub use attempts::AttemptStore;
pub use rules::RuleTable;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} is missing required columns: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StoreError::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Fails with `MissingColumns` unless every `required` name is in `headers`.
pub(crate) fn require_columns(
    path: &std::path::Path,
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<(), StoreError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(StoreError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        })
    }
}
