use crate::config::llm_provider::LlmProvider;

/// Configuration for one LLM model invocation profile.
///
/// Sampling fields map 1:1 onto the chat-completion request body; `None`
/// means "omit from the request and let the provider decide".
///
/// # Examples
///
/// ```
/// use ai_llm_service::{LlmModelConfig, LlmProvider};
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::OpenAI,
///     model: "google/gemma-3-27b-it:free".to_string(),
///     endpoint: "https://openrouter.ai/api".to_string(),
///     api_key: Some("sk-or-...".to_string()),
///     max_tokens: Some(700),
///     temperature: Some(0.3),
///     top_p: Some(0.9),
///     frequency_penalty: Some(0.1),
///     presence_penalty: Some(0.1),
///     timeout_secs: Some(30),
/// };
/// assert_eq!(cfg.provider, LlmProvider::OpenAI);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"google/gemma-3-27b-it:free"`).
    pub model: String,

    /// Base URL of the API; service paths are appended to it.
    pub endpoint: String,

    /// Bearer credential for authenticated providers.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Penalty for repeating frequent tokens.
    pub frequency_penalty: Option<f32>,

    /// Penalty for tokens already present in the text.
    pub presence_penalty: Option<f32>,

    /// Request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
