//! Request plumbing shared by the provider clients.

use std::time::{Duration, Instant};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::{
    config::llm_provider::LlmProvider,
    error_handler::{
        AiLlmError, HttpError, ProviderError, ProviderErrorKind, classify_transport, make_snippet,
    },
};

/// One chat turn as both APIs expect it.
#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// `[system?, user]` message list.
pub(crate) fn chat_messages<'a>(prompt: &'a str, system: Option<&'a str>) -> Vec<ChatMessage<'a>> {
    system
        .map(|content| ChatMessage {
            role: "system",
            content,
        })
        .into_iter()
        .chain(std::iter::once(ChatMessage {
            role: "user",
            content: prompt,
        }))
        .collect()
}

/// Returns the endpoint without surrounding blanks and trailing slashes.
///
/// # Errors
/// `InvalidEndpoint` unless it is an http(s) URL.
pub(crate) fn base_url(provider: LlmProvider, endpoint: &str) -> Result<String, AiLlmError> {
    let trimmed = endpoint.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ProviderError::new(
            provider,
            ProviderErrorKind::InvalidEndpoint(endpoint.to_string()),
        )
        .into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// A JSON POST against one provider endpoint.
pub(crate) struct JsonCall<'a> {
    pub client: &'a reqwest::Client,
    pub provider: LlmProvider,
    pub url: &'a str,
    pub timeout: Duration,
    /// Shape hint put into decode errors, e.g. `choices[0].message.content`.
    pub expected: &'static str,
}

impl JsonCall<'_> {
    /// Sends `body` and decodes a 2xx answer as `R`.
    ///
    /// # Errors
    /// - [`AiLlmError::Timeout`] / [`AiLlmError::HttpTransport`] from the client
    /// - `HttpStatus` with a body snippet for non-2xx answers
    /// - `Decode` when the body is not the expected JSON
    pub async fn send<B, R>(&self, body: &B) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        debug!(provider = %self.provider, "POST {}", self.url);

        let resp = self
            .client
            .post(self.url)
            .json(body)
            .send()
            .await
            .map_err(|e| classify_transport(e, self.timeout))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| classify_transport(e, self.timeout))?;

        if !status.is_success() {
            let snippet = make_snippet(&text);
            error!(
                %status,
                url = self.url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "provider returned non-success status"
            );
            return Err(ProviderError::new(
                self.provider,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: self.url.to_string(),
                    snippet,
                }),
            )
            .into());
        }

        serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, url = self.url, "undecodable provider response");
            AiLlmError::from(ProviderError::new(
                self.provider,
                ProviderErrorKind::Decode(format!("{e}; expected `{}`", self.expected)),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_goes_first_when_present() {
        let with = chat_messages("q", Some("s"));
        assert_eq!(with.len(), 2);
        assert_eq!((with[0].role, with[0].content), ("system", "s"));
        assert_eq!((with[1].role, with[1].content), ("user", "q"));
        assert_eq!(chat_messages("q", None).len(), 1);
    }

    #[test]
    fn base_url_drops_trailing_slashes_and_rejects_bare_hosts() {
        assert_eq!(
            base_url(LlmProvider::OpenAI, " https://openrouter.ai/api// ").unwrap(),
            "https://openrouter.ai/api"
        );
        assert!(base_url(LlmProvider::Ollama, "localhost:11434").is_err());
        assert!(base_url(LlmProvider::Ollama, "").is_err());
    }
}
