//! Response composition for the rules assistant.
//!
//! Public API: [`ResponseComposer::compose`]. It turns a retrieval result
//! into a [`RagResponse`]: `no_results` with suggestions when nothing was
//! found, otherwise `success` with the top answer cut for display and,
//! optionally, an LLM rewrite of the top candidates. A failed or slow
//! rewrite is replaced by a deterministic answer built from the top
//! candidate; composition itself never fails.

pub mod cfg;
mod error;
mod llm;
pub mod prompt;

mod api_types;

pub use api_types::{ComposeOptions, NoResultsResponse, RagResponse, SuccessResponse};

pub use error::ComposeError;

pub use llm::{AnswerEnhancer, EnhanceFuture, EnhanceRequest, LlmEnhancer, UnavailableEnhancer};

pub use prompt::PromptProfile;

use std::time::{Duration, Instant};

use cfg::ComposerConfig;
use rag_store::RetrievalResult;
use tracing::{debug, info, warn};

/// Message returned when retrieval finds nothing.
pub const NO_RESULTS_MESSAGE: &str = "Извините, не нашёл подходящего ответа в базе знаний.";
/// Suggestions returned with [`NO_RESULTS_MESSAGE`].
pub const NO_RESULTS_SUGGESTIONS: [&str; 2] =
    ["Попробуйте переформулировать вопрос", "Упростите запрос"];

/// Builds [`RagResponse`]s. Holds only the rewrite time budget.
#[derive(Clone, Debug)]
pub struct ResponseComposer {
    llm_timeout: Duration,
}

impl Default for ResponseComposer {
    fn default() -> Self {
        Self::from_config(&ComposerConfig::default())
    }
}

impl ResponseComposer {
    pub fn new(llm_timeout: Duration) -> Self {
        Self { llm_timeout }
    }

    pub fn from_config(cfg: &ComposerConfig) -> Self {
        Self::new(cfg.llm_timeout)
    }

    /// Composes the response for `question` from `retrieval`.
    ///
    /// - Empty retrieval: `no_results`; `enhancer` is not called.
    /// - Otherwise `success` with `confidence` and `full_answer` from the top
    ///   candidate.
    /// - With `opts.use_llm`, the top candidates are sent to `enhancer` under
    ///   the time budget. On success `llm_enhanced` holds the rewrite and
    ///   `context_used` the number of candidates sent. On any failure
    ///   `llm_enhanced` holds the fallback answer and `llm_failed` is set.
    ///
    /// # Example
    /// ```
    /// # use rag_answer::{ComposeOptions, ResponseComposer, RagResponse, UnavailableEnhancer};
    /// # use rag_store::RetrievalResult;
    /// # #[tokio::main] async fn main() {
    /// let composer = ResponseComposer::default();
    /// let resp = composer
    ///     .compose(
    ///         "Как удалить учебник?",
    ///         &RetrievalResult::default(),
    ///         ComposeOptions::default(),
    ///         &UnavailableEnhancer::new("offline"),
    ///     )
    ///     .await;
    /// assert!(matches!(resp, RagResponse::NoResults(_)));
    /// # }
    /// ```
    pub async fn compose(
        &self,
        question: &str,
        retrieval: &RetrievalResult,
        opts: ComposeOptions,
        enhancer: &dyn AnswerEnhancer,
    ) -> RagResponse {
        let Some(top) = retrieval.top() else {
            info!("no candidates retrieved");
            return RagResponse::NoResults(NoResultsResponse {
                message: NO_RESULTS_MESSAGE.to_string(),
                suggestions: NO_RESULTS_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
            });
        };

        let mut resp = SuccessResponse {
            confidence: top.similarity,
            full_answer: prompt::truncate_chars(&top.answer, prompt::DISPLAY_CHARS),
            llm_enhanced: None,
            llm_failed: false,
            context_used: None,
        };

        if !opts.use_llm {
            debug!(confidence = top.similarity, "composed without rewrite");
            return RagResponse::Success(resp);
        }

        let candidates = retrieval.candidates();
        let context_used = candidates.len().min(prompt::CONTEXT_CANDIDATES);
        let context = prompt::render_context(candidates);
        let req = EnhanceRequest {
            question,
            context: &context,
            profile: PromptProfile::from_creative(opts.creative),
        };

        let started = Instant::now();
        let outcome = match tokio::time::timeout(self.llm_timeout, enhancer.enhance(req)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(Ok(_)) => Err(ComposeError::EmptyAnswer),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ComposeError::Timeout(self.llm_timeout)),
        };

        match outcome {
            Ok(text) => {
                info!(
                    profile = ?req.profile,
                    context_used,
                    latency_ms = started.elapsed().as_millis(),
                    "answer rewritten"
                );
                resp.llm_enhanced = Some(text);
                resp.context_used = Some(context_used);
            }
            Err(error) => {
                warn!(
                    %error,
                    latency_ms = started.elapsed().as_millis(),
                    "answer rewrite failed, using fallback"
                );
                resp.llm_enhanced = Some(prompt::fallback_answer(top));
                resp.llm_failed = true;
            }
        }

        RagResponse::Success(resp)
    }
}
