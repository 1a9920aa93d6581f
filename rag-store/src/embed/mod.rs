//! Embedding abstraction and the process-wide [`Embedder`] handle.

use std::{future::Future, pin::Pin, sync::Arc};

use tracing::{debug, trace};

use crate::{
    config::{DistanceKind, SimilarityStrategy},
    errors::RagError,
    matrix::EmbeddingMatrix,
    similarity,
};

#[cfg(feature = "local-embeddings")]
pub mod local;
pub mod service;

/// Boxed future returned by [`EmbeddingsProvider::embed_batch`].
pub type EmbedFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RagError>> + Send + 'a>>;

/// Asynchronous embedding provider.
///
/// Async is required because most real providers (Ollama, OpenAI, etc.)
/// perform HTTP requests. Local models run on the blocking pool.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embeds `texts`, returning one vector per input in input order.
    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a>;

    /// Similarity function the model was trained for.
    fn native_similarity(&self) -> DistanceKind;

    /// Model identifier. Logged, and stored with cached matrices.
    fn model_name(&self) -> &str;
}

/// Shared embedding handle.
///
/// Constructed once at startup around a loaded provider and passed by
/// reference to the cache and the retriever. Cloning shares the provider.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingsProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingsProvider>) -> Self {
        Self { provider }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn native_similarity(&self) -> DistanceKind {
        self.provider.native_similarity()
    }

    /// Embeds a non-empty list of non-blank texts into a matrix, one row per
    /// text in input order.
    ///
    /// # Errors
    /// - [`RagError::EmptyInput`] for an empty list or a blank text
    /// - [`RagError::VectorSizeMismatch`] if the provider returns the wrong
    ///   number of vectors or vectors of differing width
    /// - provider errors as-is
    pub async fn embed(&self, texts: &[&str]) -> Result<EmbeddingMatrix, RagError> {
        if texts.is_empty() {
            return Err(RagError::EmptyInput("no texts to embed".into()));
        }
        if let Some(i) = texts.iter().position(|t| t.trim().is_empty()) {
            return Err(RagError::EmptyInput(format!("text #{} is blank", i + 1)));
        }

        trace!(count = texts.len(), model = self.model_name(), "embedding batch");
        let vectors = self.provider.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::VectorSizeMismatch {
                got: vectors.len(),
                want: texts.len(),
            });
        }

        let matrix = EmbeddingMatrix::from_rows(vectors)?;
        debug!(rows = matrix.rows(), dim = matrix.dim(), "embedded batch");
        Ok(matrix)
    }

    /// Embeds a single text.
    ///
    /// # Errors
    /// Same as [`Embedder::embed`].
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let m = self.embed(&[text]).await?;
        Ok(m.row(0).map(<[f32]>::to_vec).unwrap_or_default())
    }

    /// Scores `query` against every row of `matrix` using `strategy`.
    ///
    /// # Errors
    /// [`RagError::VectorSizeMismatch`] on a width mismatch.
    pub fn similarity(
        &self,
        query: &[f32],
        matrix: &EmbeddingMatrix,
        strategy: SimilarityStrategy,
    ) -> Result<Vec<f32>, RagError> {
        let kind = match strategy {
            SimilarityStrategy::ModelNative => self.native_similarity(),
            SimilarityStrategy::Cosine => DistanceKind::Cosine,
        };
        similarity::score_rows(query, matrix, kind)
    }
}

impl std::fmt::Debug for Embedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Embedder")
            .field("model", &self.model_name())
            .field("native_similarity", &self.native_similarity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Maps each text to `[len, 1.0]`; `Dot` native so strategies differ.
    struct LenProvider;

    impl EmbeddingsProvider for LenProvider {
        fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a> {
            Box::pin(async move {
                Ok(texts
                    .iter()
                    .map(|t| vec![t.chars().count() as f32, 1.0])
                    .collect())
            })
        }

        fn native_similarity(&self) -> DistanceKind {
            DistanceKind::Dot
        }

        fn model_name(&self) -> &str {
            "len"
        }
    }

    /// Returns one vector too few.
    struct ShortProvider;

    impl EmbeddingsProvider for ShortProvider {
        fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a> {
            Box::pin(async move { Ok(vec![vec![1.0]; texts.len().saturating_sub(1)]) })
        }

        fn native_similarity(&self) -> DistanceKind {
            DistanceKind::Cosine
        }

        fn model_name(&self) -> &str {
            "short"
        }
    }

    #[tokio::test]
    async fn embeds_in_input_order() {
        let e = Embedder::new(Arc::new(LenProvider));
        let m = e.embed(&["a", "abc", "ab"]).await.unwrap();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.row(1), Some(&[3.0, 1.0][..]));
        assert_eq!(e.embed_one("abcd").await.unwrap(), vec![4.0, 1.0]);
    }

    #[tokio::test]
    async fn empty_or_blank_input_is_rejected() {
        let e = Embedder::new(Arc::new(LenProvider));
        assert!(matches!(e.embed(&[]).await, Err(RagError::EmptyInput(_))));
        assert!(matches!(e.embed(&["ok", "  "]).await, Err(RagError::EmptyInput(_))));
    }

    #[tokio::test]
    async fn provider_count_mismatch_is_an_error() {
        let e = Embedder::new(Arc::new(ShortProvider));
        assert!(matches!(
            e.embed(&["a", "b"]).await,
            Err(RagError::VectorSizeMismatch { got: 1, want: 2 })
        ));
    }

    #[test]
    fn strategy_selects_scoring_function() {
        let e = Embedder::new(Arc::new(LenProvider));
        let m = EmbeddingMatrix::from_rows(vec![vec![2.0, 0.0]]).unwrap();
        let native = e.similarity(&[3.0, 0.0], &m, SimilarityStrategy::ModelNative).unwrap();
        let cosine = e.similarity(&[3.0, 0.0], &m, SimilarityStrategy::Cosine).unwrap();
        assert_eq!(native, vec![6.0]);
        assert!((cosine[0] - 1.0).abs() < 1e-6);
    }
}
