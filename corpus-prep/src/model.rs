//! Rules table row.

use serde::Deserialize;

/// One rule from the source table.
///
/// `alternative_questions` is a `;`-separated list and may be empty or
/// absent from the table entirely.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SourceRule {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub alternative_questions: Option<String>,
}

impl SourceRule {
    /// Non-blank, trimmed alternative phrasings in their listed order.
    pub fn alternatives(&self) -> impl Iterator<Item = &str> {
        self.alternative_questions
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|q| !q.is_empty())
    }
}
