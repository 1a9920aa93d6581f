//! Typed error for the rag-answer crate.

use std::time::Duration;

use ai_llm_service::AiLlmError;
use thiserror::Error;

/// Why an answer rewrite did not produce text.
///
/// The composer never returns these to its caller; they end up in logs and
/// turn into the fallback answer.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// Errors from the underlying LLM service.
    #[error("LLM error: {0}")]
    Llm(#[from] AiLlmError),

    /// The rewrite did not finish within the composer's budget.
    #[error("LLM rewrite timed out after {0:?}")]
    Timeout(Duration),

    /// The model answered with nothing but whitespace.
    #[error("LLM returned an empty answer")]
    EmptyAnswer,

    /// No model is configured for this process.
    #[error("LLM unavailable: {0}")]
    Unavailable(String),
}
