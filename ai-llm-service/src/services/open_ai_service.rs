//! OpenAI-compatible client for chat completions and embeddings.
//!
//! Speaks the OpenAI REST shape, which OpenRouter also serves, against
//! `{endpoint}/v1/chat/completions` and `{endpoint}/v1/embeddings`.
//! Calls are non-streaming and never retried.

use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::{ChatMessage, JsonCall, base_url, chat_messages};
use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ProviderError, ProviderErrorKind},
};

/// Timeout used when the config does not set one.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client for one OpenAI-compatible model config.
///
/// Holds a `reqwest::Client` with the bearer header and timeout baked in.
#[derive(Debug)]
pub struct OpenAiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_chat: String,
    url_embeddings: String,
}

impl OpenAiService {
    /// Builds the client.
    ///
    /// # Errors
    /// - `InvalidProvider` unless `cfg.provider` is OpenAI
    /// - `MissingApiKey` without `cfg.api_key`
    /// - `InvalidEndpoint` unless the endpoint is an http(s) URL
    /// - [`AiLlmError::HttpTransport`] if reqwest cannot build the client
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        let fail = |kind| AiLlmError::from(ProviderError::new(LlmProvider::OpenAI, kind));

        if cfg.provider != LlmProvider::OpenAI {
            return Err(fail(ProviderErrorKind::InvalidProvider));
        }
        let api_key = cfg
            .api_key
            .as_deref()
            .ok_or_else(|| fail(ProviderErrorKind::MissingApiKey))?;
        let base = base_url(LlmProvider::OpenAI, &cfg.endpoint)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| fail(ProviderErrorKind::Decode(format!("API key is not a header value: {e}"))))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        info!(
            model = %cfg.model,
            endpoint = %base,
            timeout_secs = timeout.as_secs(),
            "openai-compatible client ready"
        );

        Ok(Self {
            url_chat: format!("{base}/v1/chat/completions"),
            url_embeddings: format!("{base}/v1/embeddings"),
            client,
            cfg,
            timeout,
        })
    }

    fn call<'a>(&'a self, url: &'a str, expected: &'static str) -> JsonCall<'a> {
        JsonCall {
            client: &self.client,
            provider: LlmProvider::OpenAI,
            url,
            timeout: self.timeout,
            expected,
        }
    }

    /// One chat completion: optional `system` message, then the user `prompt`.
    /// Every sampling field set in the config is sent; unset ones are omitted.
    ///
    /// Returns the first non-blank choice, trimmed.
    ///
    /// # Errors
    /// Transport, status and decode errors (see `JsonCall::send`), plus
    /// `EmptyChoices` when no choice carries text.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatCompletionRequest::from_cfg(&self.cfg, prompt, system);

        let out: ChatCompletionResponse = self
            .call(&self.url_chat, "choices[0].message.content")
            .send(&body)
            .await?;

        let content = out
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .find(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::new(LlmProvider::OpenAI, ProviderErrorKind::EmptyChoices))?;

        debug!(
            model = %self.cfg.model,
            total_tokens = out.usage.and_then(|u| u.total_tokens),
            answer_chars = content.chars().count(),
            latency_ms = started.elapsed().as_millis(),
            "chat completion done"
        );
        Ok(content)
    }

    /// Embeds one input via `/v1/embeddings`.
    ///
    /// # Errors
    /// Transport, status and decode errors; `Decode` for an empty `data` list.
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };
        let out: EmbeddingsResponse = self
            .call(&self.url_embeddings, "data[0].embedding")
            .send(&body)
            .await?;

        out.data.into_iter().next().map(|d| d.embedding).ok_or_else(|| {
            ProviderError::new(
                LlmProvider::OpenAI,
                ProviderErrorKind::Decode("embeddings response has no `data`".into()),
            )
            .into()
        })
    }
}

/* ===========================================================================
Wire types
======================================================================== */

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
}

impl<'a> ChatCompletionRequest<'a> {
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            model: &cfg.model,
            messages: chat_messages(prompt, system),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            top_p: cfg.top_p,
            frequency_penalty: cfg.frequency_penalty,
            presence_penalty: cfg.presence_penalty,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}
