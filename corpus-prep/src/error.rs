//! Error type for corpus preparation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading the rules table or writing the expanded corpus.
#[derive(Debug, Error)]
pub enum PrepError {
    /// The file could not be opened or created.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table is malformed or a row could not be decoded.
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A required column is missing from the header.
    #[error("{path}: missing column `{column}`")]
    MissingColumn { path: PathBuf, column: &'static str },
}

pub type Result<T> = std::result::Result<T, PrepError>;
