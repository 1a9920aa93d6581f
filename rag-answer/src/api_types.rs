//! Public API types re-used by external crates (e.g., the CLI layer).

use serde::{Deserialize, Serialize};

/// Per-request switches for [`crate::ResponseComposer::compose`].
///
/// # Example
/// ```
/// use rag_answer::ComposeOptions;
/// let opts = ComposeOptions { use_llm: true, creative: false };
/// assert!(opts.use_llm);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComposeOptions {
    /// Ask the language model to rewrite the retrieved answer.
    pub use_llm: bool,
    /// Use the creative prompt profile instead of the basic one.
    pub creative: bool,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            use_llm: true,
            creative: false,
        }
    }
}

/// Response returned to the caller, tagged by `status`.
///
/// ```
/// use rag_answer::{NoResultsResponse, RagResponse};
/// let r = RagResponse::NoResults(NoResultsResponse {
///     message: "нет".into(),
///     suggestions: vec![],
/// });
/// let json = serde_json::to_value(&r).unwrap();
/// assert_eq!(json["status"], "no_results");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RagResponse {
    Success(SuccessResponse),
    NoResults(NoResultsResponse),
}

impl RagResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Retrieval found at least one candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    /// Similarity of the top candidate.
    pub confidence: f32,
    /// Top candidate's answer, cut to 500 characters plus `...` when longer.
    pub full_answer: String,
    /// Model rewrite, or the fallback answer when the model failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_enhanced: Option<String>,
    /// Present (and `true`) only when `llm_enhanced` holds the fallback.
    #[serde(default, skip_serializing_if = "is_false")]
    pub llm_failed: bool,
    /// Number of candidates given to the model as context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_used: Option<usize>,
}

/// Retrieval found nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoResultsResponse {
    pub message: String,
    pub suggestions: Vec<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}
