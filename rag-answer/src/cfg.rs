//! Runtime configuration loaded from environment variables.

use std::time::Duration;

/// Default budget for one answer rewrite.
pub const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);

/// Config bag for the composer. All fields have defaults via `from_env`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposerConfig {
    /// Upper bound on the whole rewrite call.
    pub llm_timeout: Duration,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }
}

impl ComposerConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// Reads `LLM_TIMEOUT_SECS`; unparsable or zero values keep the default.
    ///
    /// # Example
    /// ```
    /// # use rag_answer::cfg::ComposerConfig;
    /// let cfg = ComposerConfig::from_env();
    /// assert!(cfg.llm_timeout.as_secs() >= 1);
    /// ```
    pub fn from_env() -> Self {
        let secs = parse("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT.as_secs());
        Self {
            llm_timeout: Duration::from_secs(if secs == 0 {
                DEFAULT_LLM_TIMEOUT.as_secs()
            } else {
                secs
            }),
        }
    }
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}
