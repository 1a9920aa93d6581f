//! In-process sentence embeddings via `fastembed` (ONNX Runtime).
//!
//! The model is loaded once at construction. Inference is CPU-bound and runs
//! on tokio's blocking pool.

use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use crate::{
    config::DistanceKind,
    embed::{EmbedFuture, EmbeddingsProvider},
    errors::RagError,
};

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Local all-MiniLM-L6-v2 embedder (384 dimensions, cosine-native).
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
}

impl FastEmbedder {
    /// Loads the model, downloading it into the fastembed cache on first use.
    ///
    /// # Errors
    /// [`RagError::Internal`] if the model cannot be loaded.
    pub fn new() -> Result<Self, RagError> {
        let model = TextEmbedding::try_new(InitOptions::new(EmbeddingModel::AllMiniLML6V2))
            .context("failed to initialize local embedding model")?;
        info!(model = MODEL_NAME, "local embedding model loaded");
        Ok(Self {
            model: Arc::new(Mutex::new(model)),
        })
    }
}

impl EmbeddingsProvider for FastEmbedder {
    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a> {
        let owned: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();
        let model = Arc::clone(&self.model);
        Box::pin(async move {
            let vectors = tokio::task::spawn_blocking(move || {
                let mut model = model
                    .lock()
                    .map_err(|_| anyhow!("embedding model lock poisoned"))?;
                model.embed(owned, None).context("failed to embed texts")
            })
            .await
            .context("embedding task panicked")??;
            Ok(vectors)
        })
    }

    fn native_similarity(&self) -> DistanceKind {
        DistanceKind::Cosine
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}
