//! Shared LLM service with three profiles: `basic`, `creative`, and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Caches underlying HTTP clients per full config, sampling included.
//! - The embedding profile is optional: local embedders do not need one.
//! - Chat profiles are optional too: an embedding-only service can index
//!   without a chat credential.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmModelConfig, LlmProvider, LlmServiceProfiles};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ai_llm_service::AiLlmError> {
//!     let basic = LlmModelConfig {
//!         provider: LlmProvider::Ollama,
//!         model: "gemma3:27b".into(),
//!         endpoint: "http://localhost:11434".into(),
//!         api_key: None,
//!         max_tokens: Some(700),
//!         temperature: Some(0.3),
//!         top_p: Some(0.9),
//!         frequency_penalty: Some(0.1),
//!         presence_penalty: Some(0.1),
//!         timeout_secs: Some(30),
//!     };
//!     let creative = LlmModelConfig { temperature: Some(0.8), ..basic.clone() };
//!
//!     let svc = Arc::new(LlmServiceProfiles::new(basic, creative, None));
//!     let txt = svc.generate_basic("Сколько игроков в команде?", None).await?;
//!     println!("{txt}");
//!     Ok(())
//! }
//! ```

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError},
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Shared service that manages the **basic**, **creative** and optional
/// **embedding** profiles.
///
/// Internally, it caches Ollama/OpenAI clients keyed by their configuration to
/// avoid recreating HTTP clients on each call.
pub struct LlmServiceProfiles {
    basic: Option<LlmModelConfig>,
    creative: Option<LlmModelConfig>,
    embedding: Option<LlmModelConfig>,

    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmServiceProfiles {
    /// Creates a new service. Clients are built lazily on first use.
    pub fn new(
        basic: LlmModelConfig,
        creative: LlmModelConfig,
        embedding: Option<LlmModelConfig>,
    ) -> Self {
        Self {
            basic: Some(basic),
            creative: Some(creative),
            embedding,
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a service that can only embed. Chat calls fail with
    /// [`ConfigError::NoChatProfile`].
    pub fn with_embedding_only(embedding: LlmModelConfig) -> Self {
        Self {
            basic: None,
            creative: None,
            embedding: Some(embedding),
            ollama: RwLock::new(HashMap::new()),
            openai: RwLock::new(HashMap::new()),
        }
    }

    /// Generates text using the **basic** profile.
    ///
    /// # Errors
    /// - [`ConfigError::NoChatProfile`] for an embedding-only service
    /// - any [`AiLlmError`] from client construction or generation
    pub async fn generate_basic(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        self.generate_with(self.basic.as_ref(), prompt, system).await
    }

    /// Generates text using the **creative** profile.
    ///
    /// # Errors
    /// Same as [`LlmServiceProfiles::generate_basic`].
    pub async fn generate_creative(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        self.generate_with(self.creative.as_ref(), prompt, system).await
    }

    /// Computes an embedding using the **embedding** profile.
    ///
    /// # Errors
    /// - [`ConfigError::NoEmbeddingProfile`] if the service was built without one
    /// - any [`AiLlmError`] from the provider call
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let cfg = self
            .embedding
            .as_ref()
            .ok_or(ConfigError::NoEmbeddingProfile)?;
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                cli.embeddings(input).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.embeddings(input).await
            }
        }
    }

    /// Returns references to the current profiles `(basic, creative, embedding)`.
    pub fn profiles(
        &self,
    ) -> (
        Option<&LlmModelConfig>,
        Option<&LlmModelConfig>,
        Option<&LlmModelConfig>,
    ) {
        (
            self.basic.as_ref(),
            self.creative.as_ref(),
            self.embedding.as_ref(),
        )
    }

    /* --------------------- Internals --------------------- */

    async fn generate_with(
        &self,
        cfg: Option<&LlmModelConfig>,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, AiLlmError> {
        let cfg = cfg.ok_or(ConfigError::NoChatProfile)?;
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                cli.chat(prompt, system).await
            }
            LlmProvider::OpenAI => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.generate(prompt, system).await
            }
        }
    }

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.ollama.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let mut w = self.openai.write().await;
        if let Some(cli) = w.get(&key) {
            return Ok(cli.clone());
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        w.insert(key, cli.clone());
        Ok(cli)
    }
}

/// Internal cache key to identify unique client configs.
///
/// Sampling parameters are part of the key because each service carries its
/// config into the request body. Floats are compared by bit pattern.
#[derive(Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
    max_tokens: Option<u32>,
    sampling: [Option<u32>; 4],
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
            max_tokens: cfg.max_tokens,
            sampling: [
                cfg.temperature.map(f32::to_bits),
                cfg.top_p.map(f32::to_bits),
                cfg.frequency_penalty.map(f32::to_bits),
                cfg.presence_penalty.map(f32::to_bits),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(temperature: f32) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: "gemma3:27b".into(),
            endpoint: "http://localhost:11434".into(),
            api_key: None,
            max_tokens: Some(700),
            temperature: Some(temperature),
            top_p: Some(0.9),
            frequency_penalty: Some(0.1),
            presence_penalty: Some(0.1),
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn sampling_is_part_of_the_client_key() {
        assert!(ClientKey::from(&cfg(0.3)) != ClientKey::from(&cfg(0.8)));
        assert!(ClientKey::from(&cfg(0.3)) == ClientKey::from(&cfg(0.3)));
    }

    #[tokio::test]
    async fn embed_without_profile_is_a_config_error() {
        let svc = LlmServiceProfiles::new(cfg(0.3), cfg(0.8), None);
        let err = svc.embed("текст").await.unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::NoEmbeddingProfile)
        ));
    }

    #[tokio::test]
    async fn embedding_only_service_refuses_chat() {
        let svc = LlmServiceProfiles::with_embedding_only(cfg(0.0));
        let err = svc.generate_creative("q", None).await.unwrap_err();
        assert!(matches!(err, AiLlmError::Config(ConfigError::NoChatProfile)));
        assert!(svc.profiles().2.is_some());
    }

    #[tokio::test]
    async fn clients_are_cached_per_profile() {
        let svc = LlmServiceProfiles::new(cfg(0.3), cfg(0.8), None);
        let a = svc.get_or_init_ollama(&cfg(0.3)).await.unwrap();
        let b = svc.get_or_init_ollama(&cfg(0.3)).await.unwrap();
        let c = svc.get_or_init_ollama(&cfg(0.8)).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn invalid_endpoint_surfaces_instead_of_panicking() {
        let mut bad = cfg(0.3);
        bad.endpoint = "localhost:11434".into();
        let svc = LlmServiceProfiles::new(bad, cfg(0.8), None);
        assert!(svc.generate_basic("q", None).await.is_err());
    }
}
