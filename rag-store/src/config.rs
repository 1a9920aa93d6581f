//! Runtime configuration for corpus, cache and retrieval.

use std::{fmt, path::PathBuf, str::FromStr};

use crate::errors::RagError;

/// Similarity function native to an embedding model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine similarity (recommended for most embeddings).
    Cosine,
    /// Dot product (equal to cosine for L2-normalised vectors).
    Dot,
    /// Euclidean distance, scored as its negation so larger is closer.
    Euclid,
}

impl FromStr for DistanceKind {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" | "cos" => Ok(Self::Cosine),
            "dot" => Ok(Self::Dot),
            "euclid" | "euclidean" | "l2" => Ok(Self::Euclid),
            other => Err(RagError::Config(format!(
                "unknown similarity function `{other}` (expected cosine, dot or euclid)"
            ))),
        }
    }
}

impl fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cosine => "cosine",
            Self::Dot => "dot",
            Self::Euclid => "euclid",
        };
        f.write_str(s)
    }
}

/// How query/corpus similarity is computed for a retrieval call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SimilarityStrategy {
    /// Use whatever the embedding model declares as its native function.
    #[default]
    ModelNative,
    /// Explicit cosine similarity regardless of the model.
    Cosine,
}

impl FromStr for SimilarityStrategy {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "model" | "model_native" => Ok(Self::ModelNative),
            "cosine" | "cos" => Ok(Self::Cosine),
            other => Err(RagError::Config(format!(
                "unknown similarity strategy `{other}` (expected native or cosine)"
            ))),
        }
    }
}

/// Which embedding backend produces vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Remote model through the shared LLM service (Ollama or OpenAI-compatible).
    Service,
    /// In-process ONNX model (feature `local-embeddings`).
    Local,
}

/// Configuration for corpus loading, embedding and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Expanded `question,answer` corpus (`.csv` or `.jsonl`).
    pub corpus_path: PathBuf,
    /// Persisted embedding matrix.
    pub embeddings_path: PathBuf,
    /// Default number of candidates returned by retrieval.
    pub top_n: usize,
    /// Default similarity strategy.
    pub similarity: SimilarityStrategy,
    /// Embedding backend.
    pub backend: EmbeddingBackend,
    /// Similarity function native to the configured model.
    pub native_similarity: DistanceKind,
    /// Expected embedding dimension, if known.
    pub embedding_dim: Option<usize>,
    /// Parallel requests for remote embedding.
    pub embedding_concurrency: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("data/expanded_rules.csv"),
            embeddings_path: PathBuf::from("data/question_embeddings.bin"),
            top_n: 3,
            similarity: SimilarityStrategy::ModelNative,
            backend: EmbeddingBackend::Service,
            native_similarity: DistanceKind::Cosine,
            embedding_dim: None,
            embedding_concurrency: 8,
        }
    }
}

impl RagConfig {
    /// Builds the config from environment variables, falling back to defaults.
    ///
    /// Reads `RAG_CORPUS_PATH`, `RAG_EMBEDDINGS_PATH`, `RAG_TOP_N`,
    /// `RAG_SIMILARITY`, `EMBEDDING_PROVIDER`, `EMBEDDING_SIMILARITY`,
    /// `EMBEDDING_DIM` and `EMBEDDING_CONCURRENCY`.
    ///
    /// # Errors
    /// Returns [`RagError::Config`] for unparsable values.
    pub fn from_env() -> Result<Self, RagError> {
        let d = Self::default();
        let cfg = Self {
            corpus_path: env_opt("RAG_CORPUS_PATH").map(PathBuf::from).unwrap_or(d.corpus_path),
            embeddings_path: env_opt("RAG_EMBEDDINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.embeddings_path),
            top_n: env_parse("RAG_TOP_N")?.unwrap_or(d.top_n),
            similarity: env_parse("RAG_SIMILARITY")?.unwrap_or(d.similarity),
            backend: match env_opt("EMBEDDING_PROVIDER").as_deref().map(str::trim) {
                Some("fastembed") | Some("local") => EmbeddingBackend::Local,
                _ => EmbeddingBackend::Service,
            },
            native_similarity: env_parse("EMBEDDING_SIMILARITY")?.unwrap_or(d.native_similarity),
            embedding_dim: env_parse("EMBEDDING_DIM")?,
            embedding_concurrency: env_parse("EMBEDDING_CONCURRENCY")?
                .unwrap_or(d.embedding_concurrency),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.corpus_path.as_os_str().is_empty() {
            return Err(RagError::Config("corpus_path is empty".into()));
        }
        if self.embeddings_path.as_os_str().is_empty() {
            return Err(RagError::Config("embeddings_path is empty".into()));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Config("embedding_concurrency must be > 0".into()));
        }
        if self.embedding_dim == Some(0) {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        Ok(())
    }
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>, RagError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    env_opt(name)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| RagError::Config(format!("{name}: {e}")))
        })
        .transpose()
}
