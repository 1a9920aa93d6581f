//! Retrieval: score the corpus, keep the best row per answer, rank, cut.

use std::{cmp::Ordering, collections::HashMap};

use tracing::{debug, trace};

use crate::{
    config::SimilarityStrategy,
    corpus::Corpus,
    embed::Embedder,
    errors::RagError,
    matrix::EmbeddingMatrix,
    record::{RetrievalResult, ScoredCandidate},
};

/// Returns the `top_n` most similar corpus rows for `question`, at most one
/// per distinct answer, in descending similarity.
///
/// An empty corpus or `top_n == 0` yields an empty result without embedding
/// the question.
///
/// # Errors
/// - [`RagError::MatrixMismatch`] if `matrix` is not aligned with `corpus`
/// - [`RagError::EmptyInput`] for a blank question
/// - embedding and width-mismatch errors
pub async fn find_top(
    question: &str,
    corpus: &Corpus,
    matrix: &EmbeddingMatrix,
    embedder: &Embedder,
    top_n: usize,
    strategy: SimilarityStrategy,
) -> Result<RetrievalResult, RagError> {
    trace!("retrieve::find_top top_n={top_n} strategy={strategy:?}");
    if corpus.is_empty() || top_n == 0 {
        return Ok(RetrievalResult::default());
    }
    if matrix.rows() != corpus.len() {
        return Err(RagError::MatrixMismatch {
            rows: matrix.rows(),
            corpus: corpus.len(),
        });
    }

    let query = embedder.embed_one(question).await?;
    let scores = embedder.similarity(&query, matrix, strategy)?;
    let result = rank_unique_answers(corpus, &scores, top_n);

    debug!(
        candidates = result.len(),
        best = result.top().map(|c| c.similarity),
        "retrieval done"
    );
    Ok(result)
}

/// Deduplicates rows by answer and ranks them.
///
/// - Groups keep first-appearance order of their answer.
/// - Within a group the first maximal row wins; a later row replaces it only
///   when strictly greater. A NaN score is replaced by any number.
/// - Groups are stably sorted by descending score with NaN last, then cut to
///   `top_n`.
///
/// `scores` must be index-aligned with `corpus`; extra scores are ignored.
pub fn rank_unique_answers(corpus: &Corpus, scores: &[f32], top_n: usize) -> RetrievalResult {
    let mut best: Vec<(usize, f32)> = Vec::new();
    let mut slot: HashMap<&str, usize> = HashMap::new();

    for (i, (row, &score)) in corpus.rows().iter().zip(scores).enumerate() {
        match slot.get(row.answer.as_str()) {
            Some(&g) => {
                let current = best[g].1;
                if score > current || (current.is_nan() && !score.is_nan()) {
                    best[g] = (i, score);
                }
            }
            None => {
                slot.insert(row.answer.as_str(), best.len());
                best.push((i, score));
            }
        }
    }

    best.sort_by(|a, b| descending_nan_last(a.1, b.1));
    best.truncate(top_n);

    let candidates = best
        .into_iter()
        .filter_map(|(i, similarity)| {
            corpus.get(i).map(|row| ScoredCandidate {
                question: row.question.clone(),
                answer: row.answer.clone(),
                similarity,
            })
        })
        .collect();
    RetrievalResult::new(candidates)
}

fn descending_nan_last(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::CorpusRow;
    use proptest::prelude::*;

    fn corpus(rows: &[(&str, &str)]) -> Corpus {
        Corpus::new(
            rows.iter()
                .map(|(q, a)| CorpusRow {
                    question: (*q).into(),
                    answer: (*a).into(),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn keeps_best_variant_per_answer() {
        let c = corpus(&[("q1", "A"), ("q2", "B"), ("q3", "A"), ("q4", "C")]);
        let r = rank_unique_answers(&c, &[0.2, 0.5, 0.9, 0.1], 3);
        let got: Vec<_> = r.candidates().iter().map(|c| c.question.as_str()).collect();
        assert_eq!(got, vec!["q3", "q2", "q4"]);
    }

    #[test]
    fn ties_keep_first_appearance() {
        let c = corpus(&[("q1", "A"), ("q2", "A"), ("q3", "B")]);
        let r = rank_unique_answers(&c, &[0.7, 0.7, 0.7], 5);
        let got: Vec<_> = r.candidates().iter().map(|c| c.question.as_str()).collect();
        assert_eq!(got, vec!["q1", "q3"]);
    }

    #[test]
    fn nan_sorts_last_and_is_replaced() {
        let c = corpus(&[("q1", "A"), ("q2", "B"), ("q3", "B")]);
        let r = rank_unique_answers(&c, &[f32::NAN, f32::NAN, -0.4], 3);
        assert_eq!(r.len(), 2);
        assert_eq!(r.candidates()[0].question, "q3");
        assert!(r.candidates()[1].similarity.is_nan());
    }

    #[test]
    fn never_pads_and_respects_zero() {
        let c = corpus(&[("q1", "A"), ("q2", "A")]);
        assert_eq!(rank_unique_answers(&c, &[0.1, 0.2], 3).len(), 1);
        assert!(rank_unique_answers(&c, &[0.1, 0.2], 0).is_empty());
    }

    fn scored_corpus() -> impl Strategy<Value = (Vec<(String, String)>, Vec<f32>, usize)> {
        (1usize..40).prop_flat_map(|n| {
            (
                prop::collection::vec(("q[a-z]{1,4}", "a[0-5]"), n),
                prop::collection::vec(-1.0f32..1.0, n),
                0usize..8,
            )
        })
    }

    proptest! {
        #[test]
        fn ranking_is_bounded_unique_and_sorted((rows, scores, top_n) in scored_corpus()) {
            let c = Corpus::new(
                rows.into_iter()
                    .map(|(question, answer)| CorpusRow { question, answer })
                    .collect(),
            ).unwrap();
            let r = rank_unique_answers(&c, &scores, top_n);

            prop_assert!(r.len() <= top_n);
            prop_assert!(r.len() <= c.distinct_answers());

            let mut answers: Vec<_> = r.candidates().iter().map(|c| c.answer.as_str()).collect();
            answers.sort_unstable();
            answers.dedup();
            prop_assert_eq!(answers.len(), r.len());

            for w in r.candidates().windows(2) {
                prop_assert!(w[0].similarity >= w[1].similarity);
            }
        }
    }
}
