//! Rule expansion: one corpus row per question variant.

use rag_store::CorpusRow;
use tracing::{debug, warn};

use crate::model::SourceRule;

/// Expands rules into corpus rows.
///
/// For each rule, in order: the trimmed primary question, then every
/// non-blank trimmed alternative. All variants share the rule's answer.
/// Rules with a blank question or answer are skipped with a warning, since
/// they would violate the corpus invariants downstream.
pub fn expand(rules: &[SourceRule]) -> Vec<CorpusRow> {
    let mut out = Vec::with_capacity(rules.len() * 2);

    for (i, rule) in rules.iter().enumerate() {
        let question = rule.question.trim();
        let answer = rule.answer.trim();
        if question.is_empty() || answer.is_empty() {
            warn!(
                rule = i + 1,
                blank_question = question.is_empty(),
                blank_answer = answer.is_empty(),
                "skipping incomplete rule"
            );
            continue;
        }

        out.push(CorpusRow {
            question: question.to_string(),
            answer: answer.to_string(),
        });
        for alt in rule.alternatives() {
            out.push(CorpusRow {
                question: alt.to_string(),
                answer: answer.to_string(),
            });
        }
    }

    debug!(rules = rules.len(), rows = out.len(), "rules expanded");
    out
}
