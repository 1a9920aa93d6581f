//! Knowledge base for the rules assistant: corpus, embeddings, retrieval.
//!
//! This crate provides a clean API to:
//! - Load the expanded question/answer corpus (CSV or JSONL)
//! - Embed it once and persist the matrix, reusing it while the corpus is unchanged
//! - Retrieve the top-N answers for a question, one candidate per distinct answer
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod cache;
mod config;
mod corpus;
mod embed;
mod errors;
mod io_jsonl;
mod matrix;
mod record;
mod retrieve;
pub mod similarity;

use std::path::Path;

pub use cache::EmbeddingCache;
pub use config::{DistanceKind, EmbeddingBackend, RagConfig, SimilarityStrategy};
pub use corpus::Corpus;
#[cfg(feature = "local-embeddings")]
pub use embed::local::FastEmbedder;
pub use embed::service::{ServiceEmbedder, ServiceEmbedderConfig};
pub use embed::{EmbedFuture, Embedder, EmbeddingsProvider};
pub use errors::RagError;
pub use matrix::EmbeddingMatrix;
pub use record::{CorpusRow, RetrievalResult, ScoredCandidate};
pub use retrieve::{find_top, rank_unique_answers};

use tracing::{debug, info, trace};

/// High-level facade over a loaded corpus and its embedding matrix.
///
/// This is the single entry point recommended for application code.
pub struct KnowledgeBase {
    corpus: Corpus,
    matrix: EmbeddingMatrix,
    embedder: Embedder,
}

impl KnowledgeBase {
    /// Loads the corpus and its embeddings, building the cache if needed.
    ///
    /// # Errors
    /// Corpus I/O and validation errors, embedding failures, cache write errors.
    pub async fn open(
        corpus_path: impl AsRef<Path>,
        cache: &EmbeddingCache,
        embedder: Embedder,
    ) -> Result<Self, RagError> {
        trace!("KnowledgeBase::open corpus={:?}", corpus_path.as_ref());
        let corpus = Corpus::load(corpus_path)?;
        let matrix = cache.load_or_build(&corpus, &embedder).await?;
        info!(
            rows = corpus.len(),
            dim = matrix.dim(),
            model = embedder.model_name(),
            "knowledge base ready"
        );
        Self::from_parts(corpus, matrix, embedder)
    }

    /// Assembles a knowledge base from already-loaded parts.
    ///
    /// # Errors
    /// [`RagError::MatrixMismatch`] if the matrix is not aligned with the corpus.
    pub fn from_parts(
        corpus: Corpus,
        matrix: EmbeddingMatrix,
        embedder: Embedder,
    ) -> Result<Self, RagError> {
        if matrix.rows() != corpus.len() {
            return Err(RagError::MatrixMismatch {
                rows: matrix.rows(),
                corpus: corpus.len(),
            });
        }
        Ok(Self {
            corpus,
            matrix,
            embedder,
        })
    }

    /// Retrieves the best candidates for `question`. See [`find_top`].
    ///
    /// # Errors
    /// Embedding failures or a blank question.
    pub async fn find_top(
        &self,
        question: &str,
        top_n: usize,
        strategy: SimilarityStrategy,
    ) -> Result<RetrievalResult, RagError> {
        debug!("KnowledgeBase::find_top top_n={top_n}");
        retrieve::find_top(
            question,
            &self.corpus,
            &self.matrix,
            &self.embedder,
            top_n,
            strategy,
        )
        .await
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn matrix(&self) -> &EmbeddingMatrix {
        &self.matrix
    }

    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }
}
