use std::fmt;

use crate::error_handler::ConfigError;

/// Backend used for chat completions or embeddings.
///
/// `OpenAI` covers every OpenAI-compatible REST API, including OpenRouter,
/// which is the default chat backend of the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// OpenAI-compatible API (`/v1/chat/completions`, `/v1/embeddings`).
    OpenAI,
    /// Local Ollama runtime (`/api/chat`, `/api/embeddings`).
    Ollama,
}

impl LlmProvider {
    /// Parses the value of `LLM_KIND` / `EMBEDDING_PROVIDER`.
    ///
    /// Accepts `openai`, `openrouter`, `chatgpt` and `ollama` (case-insensitive).
    ///
    /// # Errors
    /// Returns [`ConfigError::UnsupportedProvider`] for anything else.
    pub fn parse(kind: &str) -> Result<Self, ConfigError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "openai" | "openrouter" | "chatgpt" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAI => f.write_str("OpenAI"),
            Self::Ollama => f.write_str("Ollama"),
        }
    }
}
