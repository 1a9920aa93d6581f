//! Persistent embedding matrix cache.
//!
//! File layout (little-endian):
//!
//! | offset | size            | field                         |
//! |--------|-----------------|-------------------------------|
//! | 0      | 8               | magic `WRBEMB02`              |
//! | 8      | 8               | rows (`u64`)                  |
//! | 16     | 8               | dim (`u64`)                   |
//! | 24     | 32              | blake3 corpus fingerprint     |
//! | 56     | 32              | blake3 of the model name      |
//! | 88     | rows * dim * 4  | `f32` values, row-major       |
//!
//! A file is only reused when its row count and fingerprint match the
//! current corpus and it was built by the same embedding model. Anything
//! else is a miss and triggers a rebuild.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{corpus::Corpus, embed::Embedder, errors::RagError, matrix::EmbeddingMatrix};

const MAGIC: &[u8; 8] = b"WRBEMB02";
const HEADER_LEN: usize = 8 + 8 + 8 + 32 + 32;

/// Why a persisted matrix was not reused.
#[derive(Debug, Error)]
enum Stale {
    #[error("cannot read cache file: {0}")]
    Unreadable(io::Error),
    #[error("file is shorter than the header")]
    Truncated,
    #[error("unknown magic or format version")]
    BadMagic,
    #[error("payload is {got} bytes, header implies {want}")]
    PayloadSize { got: usize, want: usize },
    #[error("matrix has {rows} rows, corpus has {corpus}")]
    RowCount { rows: usize, corpus: usize },
    #[error("corpus fingerprint changed")]
    Fingerprint,
    #[error("built by a different embedding model")]
    Model,
    #[error("header shape {rows}x{dim} is invalid")]
    Shape { rows: u64, dim: u64 },
    #[error("non-finite value at index {0}")]
    NonFinite(usize),
}

/// Embedding cache bound to one file path.
#[derive(Clone, Debug)]
pub struct EmbeddingCache {
    path: PathBuf,
}

impl EmbeddingCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the persisted matrix for `corpus`, computing and persisting it
    /// first if the file is missing or stale.
    ///
    /// An empty corpus yields an empty matrix without calling the embedder.
    ///
    /// # Errors
    /// Embedding failures and I/O errors while writing the new file.
    pub async fn load_or_build(
        &self,
        corpus: &Corpus,
        embedder: &Embedder,
    ) -> Result<EmbeddingMatrix, RagError> {
        let model = embedder.model_name();
        if let Some(m) = self.load(corpus, model) {
            return Ok(m);
        }

        let matrix = if corpus.is_empty() {
            EmbeddingMatrix::default()
        } else {
            info!(rows = corpus.len(), model, "building embedding matrix");
            embedder.embed(&corpus.questions()).await?
        };

        self.store(corpus, model, &matrix)?;
        Ok(matrix)
    }

    /// Reads and validates the matrix persisted for `corpus` by `model`.
    /// Any problem is logged and reported as `None`.
    pub fn load(&self, corpus: &Corpus, model: &str) -> Option<EmbeddingMatrix> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "embedding cache not found");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), reason = %Stale::Unreadable(e), "embedding cache miss");
                return None;
            }
        };

        match decode(&bytes, corpus, &model_key(model)) {
            Ok(m) => {
                info!(
                    path = %self.path.display(),
                    rows = m.rows(),
                    dim = m.dim(),
                    model,
                    "embedding cache hit"
                );
                Some(m)
            }
            Err(reason) => {
                warn!(path = %self.path.display(), %reason, "embedding cache miss");
                None
            }
        }
    }

    /// Persists `matrix` for `corpus`, tagged with the `model` that built it.
    ///
    /// Written to a temporary file in the target directory and renamed into
    /// place, so readers see either the old file or the complete new one.
    ///
    /// # Errors
    /// [`RagError::MatrixMismatch`] if the matrix is not aligned with the
    /// corpus; [`RagError::Io`] on filesystem failures.
    pub fn store(
        &self,
        corpus: &Corpus,
        model: &str,
        matrix: &EmbeddingMatrix,
    ) -> Result<(), RagError> {
        if matrix.rows() != corpus.len() {
            return Err(RagError::MatrixMismatch {
                rows: matrix.rows(),
                corpus: corpus.len(),
            });
        }

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let bytes = encode(matrix, &corpus.fingerprint(), &model_key(model));
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| RagError::Io(e.error))?;

        debug!(
            path = %self.path.display(),
            rows = matrix.rows(),
            dim = matrix.dim(),
            bytes = bytes.len(),
            "embedding cache written"
        );
        Ok(())
    }

    /// Deletes the persisted file. A missing file is not an error.
    ///
    /// # Errors
    /// [`RagError::Io`] for failures other than "not found".
    pub fn invalidate(&self) -> Result<(), RagError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "embedding cache removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn model_key(model: &str) -> [u8; 32] {
    *blake3::hash(model.as_bytes()).as_bytes()
}

fn encode(matrix: &EmbeddingMatrix, fingerprint: &[u8; 32], model: &[u8; 32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + matrix.as_slice().len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(matrix.rows() as u64).to_le_bytes());
    out.extend_from_slice(&(matrix.dim() as u64).to_le_bytes());
    out.extend_from_slice(fingerprint);
    out.extend_from_slice(model);
    for v in matrix.as_slice() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn decode(bytes: &[u8], corpus: &Corpus, model: &[u8; 32]) -> Result<EmbeddingMatrix, Stale> {
    let (header, payload) = bytes.split_at_checked(HEADER_LEN).ok_or(Stale::Truncated)?;
    let (magic, rest) = header.split_at(8);
    if magic != MAGIC {
        return Err(Stale::BadMagic);
    }
    let (rows_raw, rest) = rest.split_at(8);
    let (dim_raw, rest) = rest.split_at(8);
    let (fingerprint, model_raw) = rest.split_at(32);
    let rows_u64 = u64::from_le_bytes(rows_raw.try_into().map_err(|_| Stale::Truncated)?);
    let dim_u64 = u64::from_le_bytes(dim_raw.try_into().map_err(|_| Stale::Truncated)?);

    let shape = Stale::Shape {
        rows: rows_u64,
        dim: dim_u64,
    };
    let (Ok(rows), Ok(dim)) = (usize::try_from(rows_u64), usize::try_from(dim_u64)) else {
        return Err(shape);
    };
    if rows > 0 && dim == 0 {
        return Err(shape);
    }

    if rows != corpus.len() {
        return Err(Stale::RowCount {
            rows,
            corpus: corpus.len(),
        });
    }
    if fingerprint != corpus.fingerprint().as_slice() {
        return Err(Stale::Fingerprint);
    }
    if model_raw != model.as_slice() {
        return Err(Stale::Model);
    }

    let want = rows
        .checked_mul(dim)
        .and_then(|n| n.checked_mul(4))
        .ok_or(shape)?;
    if payload.len() != want {
        return Err(Stale::PayloadSize {
            got: payload.len(),
            want,
        });
    }

    let mut data = Vec::with_capacity(rows * dim);
    for (i, chunk) in payload.chunks_exact(4).enumerate() {
        let v = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !v.is_finite() {
            return Err(Stale::NonFinite(i));
        }
        data.push(v);
    }

    if rows == 0 {
        return Ok(EmbeddingMatrix::default());
    }
    EmbeddingMatrix::new(rows, dim, data).map_err(|_| Stale::Shape {
        rows: rows_u64,
        dim: dim_u64,
    })
}
