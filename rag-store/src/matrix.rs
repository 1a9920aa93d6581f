//! Dense row-major embedding matrix.

use crate::errors::RagError;

/// Embeddings for a corpus, one row per corpus entry, all rows of width `dim`.
///
/// Stored as a single flat buffer. An empty matrix has `rows == 0` and
/// `dim == 0`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Wraps a flat buffer.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`] if `data.len() != rows * dim`, or if
    /// rows are present with a zero dimension.
    pub fn new(rows: usize, dim: usize, data: Vec<f32>) -> Result<Self, RagError> {
        let want = rows.checked_mul(dim).ok_or_else(|| {
            RagError::Config(format!("matrix shape {rows}x{dim} overflows"))
        })?;
        if data.len() != want {
            return Err(RagError::VectorSizeMismatch {
                got: data.len(),
                want,
            });
        }
        if rows > 0 && dim == 0 {
            return Err(RagError::VectorSizeMismatch { got: 0, want: 1 });
        }
        Ok(Self { rows, dim, data })
    }

    /// Stacks vectors into a matrix. Every vector must share the first one's length.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`] for ragged or zero-length rows.
    pub fn from_rows(vectors: Vec<Vec<f32>>) -> Result<Self, RagError> {
        let Some(dim) = vectors.first().map(Vec::len) else {
            return Ok(Self::default());
        };
        let rows = vectors.len();
        let mut data = Vec::with_capacity(rows * dim);
        for v in vectors {
            if v.len() != dim {
                return Err(RagError::VectorSizeMismatch {
                    got: v.len(),
                    want: dim,
                });
            }
            data.extend_from_slice(&v);
        }
        Self::new(rows, dim, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Row `i`, or `None` past the end.
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.rows {
            return None;
        }
        let start = i * self.dim;
        self.data.get(start..start + self.dim)
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on 0; an empty matrix has no data anyway.
        self.data.chunks_exact(self.dim.max(1))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stacks_rows_in_order() {
        let m = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!((m.rows(), m.dim()), (2, 2));
        assert_eq!(m.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(m.row(2), None);
        assert_eq!(m.iter_rows().count(), 2);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = EmbeddingMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 1, want: 2 }));
    }

    #[test]
    fn empty_matrix_is_valid() {
        let m = EmbeddingMatrix::from_rows(Vec::new()).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.iter_rows().count(), 0);
        assert!(EmbeddingMatrix::new(0, 0, Vec::new()).is_ok());
    }

    #[test]
    fn flat_buffer_length_is_checked() {
        assert!(EmbeddingMatrix::new(2, 3, vec![0.0; 5]).is_err());
        assert!(EmbeddingMatrix::new(1, 0, Vec::new()).is_err());
    }
}
