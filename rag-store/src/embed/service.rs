//! Remote embedding provider backed by the shared LLM service.
//!
//! Sends one request per text through the service's embedding profile
//! (Ollama `/api/embeddings` or OpenAI `/v1/embeddings`), a bounded number
//! at a time.

use std::sync::Arc;

use ai_llm_service::LlmServiceProfiles;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info};

use crate::{
    config::DistanceKind,
    embed::{EmbedFuture, EmbeddingsProvider},
    errors::RagError,
};

/// Configuration for the service-backed embedder.
#[derive(Clone)]
pub struct ServiceEmbedderConfig {
    pub svc: Arc<LlmServiceProfiles>,
    /// Similarity function native to the remote model.
    pub native_similarity: DistanceKind,
    /// Expected embedding dimension; checked on every vector when set.
    pub dim: Option<usize>,
    /// Maximum in-flight requests.
    pub concurrency: usize,
}

/// Embedding provider over [`LlmServiceProfiles::embed`].
#[derive(Clone)]
pub struct ServiceEmbedder {
    svc: Arc<LlmServiceProfiles>,
    model: String,
    native: DistanceKind,
    dim: Option<usize>,
    concurrency: usize,
}

impl ServiceEmbedder {
    /// Construct a new embedder from configuration.
    ///
    /// # Errors
    /// [`RagError::Config`] if the service has no embedding profile.
    pub fn new(cfg: ServiceEmbedderConfig) -> Result<Self, RagError> {
        let (_, _, embedding) = cfg.svc.profiles();
        let model = embedding
            .map(|p| p.model.clone())
            .ok_or_else(|| RagError::Config("LLM service has no embedding profile".into()))?;

        info!(
            model = %model,
            native_similarity = %cfg.native_similarity,
            dim = ?cfg.dim,
            concurrency = cfg.concurrency,
            "service embedder ready"
        );

        Ok(Self {
            svc: cfg.svc,
            model,
            native: cfg.native_similarity,
            dim: cfg.dim,
            concurrency: cfg.concurrency.max(1),
        })
    }
}

impl EmbeddingsProvider for ServiceEmbedder {
    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a> {
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_owned()).collect();
        let svc = Arc::clone(&self.svc);
        let dim = self.dim;
        let limit = self.concurrency;

        Box::pin(async move {
            debug!(total = owned.len(), concurrency = limit, "service embedder: batch");

            // `buffered` keeps results in input order.
            let vectors: Vec<Vec<f32>> = stream::iter(owned)
                .map(move |text| embed_checked(Arc::clone(&svc), text, dim))
                .buffered(limit)
                .try_collect()
                .await?;

            Ok(vectors)
        })
    }

    fn native_similarity(&self) -> DistanceKind {
        self.native
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Embeds one text and checks its width against `dim`.
async fn embed_checked(
    svc: Arc<LlmServiceProfiles>,
    text: String,
    dim: Option<usize>,
) -> Result<Vec<f32>, RagError> {
    let v = svc.embed(&text).await?;
    match dim {
        Some(want) if v.len() != want => Err(RagError::VectorSizeMismatch { got: v.len(), want }),
        _ => Ok(v),
    }
}
