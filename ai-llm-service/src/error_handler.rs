//! Errors for `ai-llm-service`.
//!
//! [`AiLlmError`] is the only error callers see. Setup problems are grouped
//! under [`ConfigError`], upstream problems under [`ProviderError`]. The env
//! and validation helpers used by `config` live here as well.
//!
//! Every message carries an `[AI LLM Service]` tag.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::llm_provider::LlmProvider;

pub type Result<T> = std::result::Result<T, AiLlmError>;

/// Maximum number of characters of an upstream body kept in error messages.
const SNIPPET_CHARS: usize = 240;

/// Any failure of this crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider-level failures: bad status, undecodable payload, etc.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// reqwest failed before a status was read (refused, reset, TLS, ...).
    #[error("[AI LLM Service] HTTP transport failed: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// The client timeout elapsed.
    #[error("[AI LLM Service] no answer within {0:?}")]
    Timeout(Duration),
}

/* ----------------------------- Config ----------------------------------- */

/// Bad or missing settings, detected before any request is sent.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("[AI LLM Service] {0} must be set")]
    MissingVar(&'static str),

    /// A numeric variable did not parse.
    #[error("[AI LLM Service] {var} is not a valid {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_TIMEOUT_SECS`).
        var: &'static str,
        /// Expected type, e.g. `u64`.
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND` / `EMBEDDING_PROVIDER`.
    #[error("[AI LLM Service] unknown provider `{0}`")]
    UnsupportedProvider(String),

    /// A string variable is malformed.
    #[error("[AI LLM Service] {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `LLM_ENDPOINT`).
        var: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A sampling value is NaN or outside its range.
    #[error("[AI LLM Service] {field} must be within {detail}")]
    OutOfRange {
        /// Config field, e.g. `temperature`.
        field: &'static str,
        /// Description of the expected range.
        detail: &'static str,
    },

    /// An embedding call was made but no embedding profile is configured.
    #[error("[AI LLM Service] no embedding profile configured")]
    NoEmbeddingProfile,

    /// A chat call was made on an embedding-only service.
    #[error("[AI LLM Service] no chat profile configured")]
    NoChatProfile,
}

/* ----------------------------- Provider --------------------------------- */

/// Non-2xx response details.
#[derive(Debug)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

/// What went wrong while talking to a provider.
#[non_exhaustive]
#[derive(Debug)]
pub enum ProviderErrorKind {
    /// The config targets a different provider than the service.
    InvalidProvider,
    /// The provider requires a bearer credential and none was configured.
    MissingApiKey,
    /// The endpoint is empty or does not start with http/https.
    InvalidEndpoint(String),
    /// Upstream answered with a non-successful status.
    HttpStatus(HttpError),
    /// The payload could not be decoded as expected.
    Decode(String),
    /// The completion had no choices or no content.
    EmptyChoices,
}

/// Provider-scoped error: which backend failed and how.
#[derive(Debug)]
pub struct ProviderError {
    pub provider: LlmProvider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: LlmProvider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.provider;
        match &self.kind {
            ProviderErrorKind::InvalidProvider => {
                write!(f, "[AI LLM Service] {p}: config targets another provider")
            }
            ProviderErrorKind::MissingApiKey => {
                write!(f, "[AI LLM Service] {p}: API key is required")
            }
            ProviderErrorKind::InvalidEndpoint(e) => {
                write!(f, "[AI LLM Service] {p}: invalid endpoint: {e}")
            }
            ProviderErrorKind::HttpStatus(h) => write!(
                f,
                "[AI LLM Service] {p}: HTTP {} from {}: {}",
                h.status, h.url, h.snippet
            ),
            ProviderErrorKind::Decode(msg) => {
                write!(f, "[AI LLM Service] {p}: decode error: {msg}")
            }
            ProviderErrorKind::EmptyChoices => {
                write!(f, "[AI LLM Service] {p}: response has no content")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Trims an upstream body to a log-friendly snippet.
pub fn make_snippet(body: &str) -> String {
    body.trim().chars().take(SNIPPET_CHARS).collect()
}

/// Maps a reqwest failure to [`AiLlmError::Timeout`] when it was a timeout,
/// and to [`AiLlmError::HttpTransport`] otherwise.
pub fn classify_transport(err: reqwest::Error, timeout: Duration) -> AiLlmError {
    if err.is_timeout() {
        AiLlmError::Timeout(timeout)
    } else {
        AiLlmError::HttpTransport(err)
    }
}

/* ------------------------------ Env ------------------------------------ */

/// Reads a variable; unset and blank both give `None`.
pub fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Reads and parses an optional numeric variable.
///
/// # Errors
/// [`ConfigError::InvalidNumber`] when the value is set but does not parse.
pub fn env_num<T: FromStr>(name: &'static str) -> Result<Option<T>> {
    env_opt(name)
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| {
                AiLlmError::from(ConfigError::InvalidNumber {
                    var: name,
                    reason: std::any::type_name::<T>(),
                })
            })
        })
        .transpose()
}

/* --------------------------- Validation --------------------------------- */

/// # Errors
/// [`ConfigError::InvalidFormat`] unless `value` is an http(s) URL.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(());
    }
    Err(ConfigError::InvalidFormat {
        var,
        reason: "expected an http:// or https:// URL",
    }
    .into())
}

/// Checks `min <= value <= max`; NaN and infinities fail.
///
/// # Errors
/// [`ConfigError::OutOfRange`] with `detail` describing the range.
pub fn validate_range_f32(
    field: &'static str,
    value: f32,
    (min, max): (f32, f32),
    detail: &'static str,
) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        return Ok(());
    }
    Err(ConfigError::OutOfRange { field, detail }.into())
}
