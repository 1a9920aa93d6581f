//! Vector similarity functions.
//!
//! All functions return "larger is closer" scores so callers can rank
//! uniformly regardless of the underlying metric.

use crate::{config::DistanceKind, errors::RagError, matrix::EmbeddingMatrix};

/// Dot product. Slices must have equal length.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Cosine similarity in `[-1, 1]`. A zero-norm side yields `0.0`.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let na = dot(a, a).sqrt();
    let nb = dot(b, b).sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Negated L2 distance, in `(-inf, 0]`.
pub fn neg_euclid(a: &[f32], b: &[f32]) -> f32 {
    -a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Scores `query` against every row of `matrix`.
///
/// # Errors
/// [`RagError::VectorSizeMismatch`] if the query width differs from the
/// matrix width. An empty matrix yields an empty vector.
pub fn score_rows(
    query: &[f32],
    matrix: &EmbeddingMatrix,
    kind: DistanceKind,
) -> Result<Vec<f32>, RagError> {
    if matrix.is_empty() {
        return Ok(Vec::new());
    }
    if query.len() != matrix.dim() {
        return Err(RagError::VectorSizeMismatch {
            got: query.len(),
            want: matrix.dim(),
        });
    }
    let f: fn(&[f32], &[f32]) -> f32 = match kind {
        DistanceKind::Cosine => cosine,
        DistanceKind::Dot => dot,
        DistanceKind::Euclid => neg_euclid,
    };
    Ok(matrix.iter_rows().map(|row| f(query, row)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_norm_is_zero_not_nan() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn orthogonal_and_opposite() {
        assert!(cosine(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine(&[1.0, 1.0], &[-2.0, -2.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn euclid_is_negated_distance() {
        assert!((neg_euclid(&[0.0, 0.0], &[3.0, 4.0]) + 5.0).abs() < 1e-6);
        assert_eq!(neg_euclid(&[1.0, 1.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn score_rows_checks_width() {
        let m = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let s = score_rows(&[1.0, 0.0], &m, DistanceKind::Cosine).unwrap();
        assert_eq!(s.len(), 2);
        assert!((s[0] - 1.0).abs() < 1e-6);

        let err = score_rows(&[1.0, 0.0, 0.0], &m, DistanceKind::Dot).unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 3, want: 2 }));

        let empty = EmbeddingMatrix::default();
        assert!(score_rows(&[1.0], &empty, DistanceKind::Cosine).unwrap().is_empty());
    }

    fn nonzero_vec() -> impl Strategy<Value = Vec<f32>> {
        prop::collection::vec(-100.0f32..100.0, 1..32)
            .prop_filter("non-zero norm", |v| v.iter().any(|x| x.abs() > 1e-3))
    }

    proptest! {
        #[test]
        fn self_cosine_is_one(v in nonzero_vec()) {
            prop_assert!((cosine(&v, &v) - 1.0).abs() < 1e-5);
        }

        #[test]
        fn cosine_is_symmetric(
            (a, b) in (1usize..32).prop_flat_map(|n| (
                prop::collection::vec(-100.0f32..100.0, n),
                prop::collection::vec(-100.0f32..100.0, n),
            ))
        ) {
            prop_assert_eq!(cosine(&a, &b), cosine(&b, &a));
        }
    }
}
