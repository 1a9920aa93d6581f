//! Client for a local Ollama server: `/api/chat` and `/api/embeddings`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::http::{ChatMessage, JsonCall, base_url, chat_messages};
use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, ProviderError, ProviderErrorKind};

pub type Result<T> = std::result::Result<T, AiLlmError>;

/// Local models can be slow to load on first call.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Client for one Ollama model config.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embeddings: String,
}

impl OllamaService {
    /// # Errors
    /// - `InvalidProvider` unless `cfg.provider` is Ollama
    /// - `InvalidEndpoint` unless the endpoint is an http(s) URL
    /// - [`AiLlmError::HttpTransport`] if reqwest cannot build the client
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(LlmProvider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        let base = base_url(LlmProvider::Ollama, &cfg.endpoint)?;
        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            url_chat: format!("{base}/api/chat"),
            url_embeddings: format!("{base}/api/embeddings"),
            cfg,
            timeout,
        })
    }

    fn call<'a>(&'a self, url: &'a str, expected: &'static str) -> JsonCall<'a> {
        JsonCall {
            client: &self.client,
            provider: LlmProvider::Ollama,
            url,
            timeout: self.timeout,
            expected,
        }
    }

    /// Non-streaming chat. Sampling maps onto Ollama `options`, with
    /// `max_tokens` sent as `num_predict`.
    ///
    /// # Errors
    /// Transport, status and decode errors; `EmptyChoices` for a blank reply.
    #[instrument(level = "debug", skip_all, fields(model = %self.cfg.model))]
    pub async fn chat(&self, prompt: &str, system: Option<&str>) -> Result<String> {
        let body = ChatRequest::from_cfg(&self.cfg, prompt, system);
        let out: ChatResponse = self.call(&self.url_chat, "message.content").send(&body).await?;

        out.message
            .map(|m| m.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ProviderError::new(LlmProvider::Ollama, ProviderErrorKind::EmptyChoices).into()
            })
    }

    /// Embeds one input.
    ///
    /// # Errors
    /// Transport, status and decode errors.
    #[instrument(level = "debug", skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };
        let out: EmbeddingsResponse = self
            .call(&self.url_embeddings, "embedding: number[]")
            .send(&body)
            .await?;
        Ok(out.embedding)
    }
}

/* ==========================
Wire types
========================== */

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: Options,
}

impl<'a> ChatRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            model: &cfg.model,
            messages: chat_messages(prompt, system),
            stream: false,
            options: Options {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                num_predict: cfg.max_tokens,
                frequency_penalty: cfg.frequency_penalty,
                presence_penalty: cfg.presence_penalty,
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}
