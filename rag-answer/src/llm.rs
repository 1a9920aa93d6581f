//! Answer rewrite capability.
//!
//! The composer only sees [`AnswerEnhancer`]; [`LlmEnhancer`] is the
//! production implementation over the shared LLM service.

use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::LlmServiceProfiles;
use tracing::debug;

use crate::{
    error::ComposeError,
    prompt::{PromptProfile, build_user_prompt},
};

/// Boxed future returned by [`AnswerEnhancer::enhance`].
pub type EnhanceFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ComposeError>> + Send + 'a>>;

/// Everything a rewrite needs.
#[derive(Clone, Copy, Debug)]
pub struct EnhanceRequest<'a> {
    pub question: &'a str,
    /// Rendered context blocks (see [`crate::prompt::render_context`]).
    pub context: &'a str,
    pub profile: PromptProfile,
}

/// Rewrites retrieved context into a final answer.
pub trait AnswerEnhancer: Send + Sync {
    fn enhance<'a>(&'a self, req: EnhanceRequest<'a>) -> EnhanceFuture<'a>;
}

/// Enhancer backed by the `basic`/`creative` profiles of the LLM service.
///
/// # Example
/// ```no_run
/// # use std::sync::Arc;
/// # use ai_llm_service::LlmServiceProfiles;
/// # use rag_answer::{AnswerEnhancer, EnhanceRequest, LlmEnhancer, PromptProfile};
/// # async fn demo(svc: Arc<LlmServiceProfiles>) {
/// let enhancer = LlmEnhancer::new(svc);
/// let out = enhancer
///     .enhance(EnhanceRequest {
///         question: "Как удалить учебник?",
///         context: "[Источник 1]:\nВопрос: ...",
///         profile: PromptProfile::Basic,
///     })
///     .await;
/// # let _ = out;
/// # }
/// ```
#[derive(Clone)]
pub struct LlmEnhancer {
    svc: Arc<LlmServiceProfiles>,
}

impl LlmEnhancer {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl AnswerEnhancer for LlmEnhancer {
    fn enhance<'a>(&'a self, req: EnhanceRequest<'a>) -> EnhanceFuture<'a> {
        Box::pin(async move {
            let system = req.profile.system_prompt();
            let user = build_user_prompt(req.context, req.question);
            debug!(
                profile = ?req.profile,
                prompt_chars = user.chars().count(),
                "requesting answer rewrite"
            );

            let out = match req.profile {
                PromptProfile::Basic => self.svc.generate_basic(&user, Some(system)).await?,
                PromptProfile::Creative => self.svc.generate_creative(&user, Some(system)).await?,
            };

            let out = out.trim();
            if out.is_empty() {
                return Err(ComposeError::EmptyAnswer);
            }
            Ok(out.to_string())
        })
    }
}

/// Stand-in used when no model could be configured; every call fails with
/// the stored reason, so responses carry the fallback answer.
#[derive(Clone, Debug)]
pub struct UnavailableEnhancer {
    reason: String,
}

impl UnavailableEnhancer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl AnswerEnhancer for UnavailableEnhancer {
    fn enhance<'a>(&'a self, _req: EnhanceRequest<'a>) -> EnhanceFuture<'a> {
        Box::pin(async move { Err(ComposeError::Unavailable(self.reason.clone())) })
    }
}
