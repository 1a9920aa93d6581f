//! Shared LLM service for the rules assistant.
//!
//! - [`config`]: model configs and env-driven defaults for the `basic`,
//!   `creative` and `embedding` profiles.
//! - [`services`]: thin HTTP clients for OpenAI-compatible APIs (OpenRouter by
//!   default) and Ollama.
//! - [`service_profiles`]: one shared handle that owns the profiles and caches
//!   clients.
//! - [`error_handler`]: unified [`AiLlmError`] plus env/validation helpers.

pub mod config;
pub mod error_handler;
pub mod service_profiles;
pub mod services;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use service_profiles::LlmServiceProfiles;
