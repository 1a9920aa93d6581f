//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// One question variant and the answer it maps to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusRow {
    pub question: String,
    pub answer: String,
}

/// A retrieved question/answer pair with its similarity to the query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub question: String,
    pub answer: String,
    pub similarity: f32,
}

/// Retrieval output: sorted by descending similarity, at most one
/// candidate per distinct answer.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RetrievalResult {
    candidates: Vec<ScoredCandidate>,
}

impl RetrievalResult {
    /// Wraps candidates that are already ranked and deduplicated.
    pub fn new(candidates: Vec<ScoredCandidate>) -> Self {
        Self { candidates }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Best candidate, if any.
    pub fn top(&self) -> Option<&ScoredCandidate> {
        self.candidates.first()
    }

    pub fn candidates(&self) -> &[ScoredCandidate] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<ScoredCandidate> {
        self.candidates
    }
}
