//! Unified error types for the crate.

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSONL parsing errors (with line context).
    #[error("parse error: {0}")]
    Parse(String),

    /// CSV reading/writing errors.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding matrix is not index-aligned with the corpus.
    #[error("embedding matrix has {rows} rows but corpus has {corpus} entries")]
    MatrixMismatch { rows: usize, corpus: usize },

    /// Embedding input was empty or contained a blank text.
    #[error("empty embedding input: {0}")]
    EmptyInput(String),

    /// A corpus row violates the non-empty question/answer invariant.
    #[error("invalid corpus row {row}: {reason}")]
    InvalidRow { row: usize, reason: &'static str },

    /// Remote embedding provider failures (wrapped).
    #[error(transparent)]
    Provider(#[from] AiLlmError),

    /// Generic error from anyhow chain.
    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}
