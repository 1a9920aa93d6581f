//! Default LLM configs loaded from environment variables.
//!
//! Two chat profiles share one target (provider, endpoint, model, credential)
//! and differ only in sampling parameters:
//!
//! - **basic**    → conservative, stays strictly within the retrieved context
//! - **creative** → warmer sampling, longer answers
//!
//! A third profile, **embedding**, describes a remote embedding model.
//!
//! # Environment variables
//!
//! Chat:
//! - `LLM_KIND`            = `openai` (default, any OpenAI-compatible API) or `ollama`
//! - `LLM_ENDPOINT`        = API base (default `https://openrouter.ai/api`)
//! - `LLM_MODEL`           = model id (default `google/gemma-3-27b-it:free`)
//! - `OPENROUTER_API_KEY` or `OPENAI_API_KEY` = bearer credential (required for `openai`)
//! - `LLM_TIMEOUT_SECS`    = request timeout (default 30)
//!
//! Embedding:
//! - `EMBEDDING_PROVIDER`  = `ollama` (default) or `openai`
//! - `EMBEDDING_MODEL`     = model id (default `all-minilm`)
//! - `EMBEDDING_ENDPOINT`  = API base for `openai` (falls back to `LLM_ENDPOINT`)
//! - `OLLAMA_URL` or `OLLAMA_PORT` = Ollama endpoint (default `http://localhost:11434`)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_num, env_opt, validate_http_endpoint, validate_range_f32,
    },
};

/// Default OpenAI-compatible API base (OpenRouter).
pub const DEFAULT_LLM_ENDPOINT: &str = "https://openrouter.ai/api";
/// Default chat model.
pub const DEFAULT_LLM_MODEL: &str = "google/gemma-3-27b-it:free";
/// Default request timeout for chat calls.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
/// Default Ollama endpoint.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
/// Default embedding model (all-MiniLM-L6-v2 as packaged by Ollama).
pub const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";

/// Where chat requests go; shared by the basic and creative profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTarget {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl ChatTarget {
    /// Resolves the chat target strictly from environment.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
    /// - [`ConfigError::MissingVar`] if an OpenAI-compatible target has no key
    /// - [`ConfigError::InvalidFormat`] if the endpoint is not http(s)
    /// - [`ConfigError::InvalidNumber`] if `LLM_TIMEOUT_SECS` is not a number
    pub fn from_env() -> Result<Self, AiLlmError> {
        let provider = LlmProvider::parse(&env_opt("LLM_KIND").unwrap_or_else(|| "openai".into()))?;
        let timeout_secs = env_num::<u64>("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);
        let model = env_opt("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string());

        let (endpoint, api_key) = match provider {
            LlmProvider::OpenAI => {
                let endpoint =
                    env_opt("LLM_ENDPOINT").unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.to_string());
                validate_http_endpoint("LLM_ENDPOINT", &endpoint)?;
                let key = env_opt("OPENROUTER_API_KEY")
                    .or_else(|| env_opt("OPENAI_API_KEY"))
                    .ok_or(ConfigError::MissingVar(
                        "OPENROUTER_API_KEY or OPENAI_API_KEY",
                    ))?;
                (endpoint, Some(key))
            }
            LlmProvider::Ollama => (ollama_endpoint()?, None),
        };

        Ok(Self {
            provider,
            model,
            endpoint,
            api_key,
            timeout_secs,
        })
    }
}

/// Resolves the Ollama endpoint from environment.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. [`DEFAULT_OLLAMA_URL`]
///
/// # Errors
/// - [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid
/// - [`ConfigError::InvalidFormat`] if `OLLAMA_URL` is not http(s)
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = env_opt("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url);
    }
    if let Some(port) = env_num::<u16>("OLLAMA_PORT")? {
        return Ok(format!("http://localhost:{port}"));
    }
    Ok(DEFAULT_OLLAMA_URL.to_string())
}

/// Builds the **basic** profile: context-only answers.
///
/// # Defaults
/// - `temperature = 0.3`, `max_tokens = 700`, `top_p = 0.9`
/// - `frequency_penalty = 0.1`, `presence_penalty = 0.1`
pub fn basic_profile(target: &ChatTarget) -> LlmModelConfig {
    chat_profile(target, 0.3, 700, 0.9)
}

/// Builds the **creative** profile: may add clearly-labelled general advice.
///
/// # Defaults
/// - `temperature = 0.8`, `max_tokens = 900`, `top_p = 0.7`
/// - `frequency_penalty = 0.1`, `presence_penalty = 0.1`
pub fn creative_profile(target: &ChatTarget) -> LlmModelConfig {
    chat_profile(target, 0.8, 900, 0.7)
}

fn chat_profile(target: &ChatTarget, temperature: f32, max_tokens: u32, top_p: f32) -> LlmModelConfig {
    LlmModelConfig {
        provider: target.provider,
        model: target.model.clone(),
        endpoint: target.endpoint.clone(),
        api_key: target.api_key.clone(),
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        top_p: Some(top_p),
        frequency_penalty: Some(0.1),
        presence_penalty: Some(0.1),
        timeout_secs: Some(target.timeout_secs),
    }
}

/// Loads both chat profiles from environment.
///
/// # Errors
/// See [`ChatTarget::from_env`].
pub fn config_chat_profiles() -> Result<(LlmModelConfig, LlmModelConfig), AiLlmError> {
    let target = ChatTarget::from_env()?;
    let basic = basic_profile(&target);
    let creative = creative_profile(&target);
    validate_sampling(&basic)?;
    validate_sampling(&creative)?;
    Ok((basic, creative))
}

/// Constructs the remote **embedding** profile.
///
/// # Env
/// - `EMBEDDING_PROVIDER` (`ollama` by default, or `openai`)
/// - `EMBEDDING_MODEL` (default [`DEFAULT_EMBEDDING_MODEL`])
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
///
/// # Errors
/// Same classes as [`ChatTarget::from_env`].
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let provider =
        LlmProvider::parse(&env_opt("EMBEDDING_PROVIDER").unwrap_or_else(|| "ollama".into()))?;
    let model =
        env_opt("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

    let (endpoint, api_key) = match provider {
        LlmProvider::Ollama => (ollama_endpoint()?, None),
        LlmProvider::OpenAI => {
            let endpoint = env_opt("EMBEDDING_ENDPOINT")
                .or_else(|| env_opt("LLM_ENDPOINT"))
                .unwrap_or_else(|| DEFAULT_LLM_ENDPOINT.to_string());
            validate_http_endpoint("EMBEDDING_ENDPOINT", &endpoint)?;
            let key = env_opt("OPENAI_API_KEY")
                .or_else(|| env_opt("OPENROUTER_API_KEY"))
                .ok_or(ConfigError::MissingVar(
                    "OPENAI_API_KEY or OPENROUTER_API_KEY",
                ))?;
            (endpoint, Some(key))
        }
    };

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        frequency_penalty: None,
        presence_penalty: None,
        timeout_secs: Some(30),
    })
}

/// Checks sampling parameters against the ranges accepted by chat APIs.
///
/// # Errors
/// [`ConfigError::OutOfRange`] for the first offending field.
pub fn validate_sampling(cfg: &LlmModelConfig) -> Result<(), AiLlmError> {
    let checks = [
        ("temperature", cfg.temperature, (0.0, 2.0), "[0, 2]"),
        ("top_p", cfg.top_p, (0.0, 1.0), "[0, 1]"),
        ("frequency_penalty", cfg.frequency_penalty, (-2.0, 2.0), "[-2, 2]"),
        ("presence_penalty", cfg.presence_penalty, (-2.0, 2.0), "[-2, 2]"),
    ];
    for (field, value, range, detail) in checks {
        if let Some(v) = value {
            validate_range_f32(field, v, range, detail)?;
        }
    }
    Ok(())
}
