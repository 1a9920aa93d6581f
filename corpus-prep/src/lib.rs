//! Offline corpus preparation.
//!
//! Turns the rules table (`question,answer,alternative_questions`) into the
//! flat `question,answer` corpus the knowledge base embeds: one row per
//! question variant, variants of a rule sharing its answer.

mod error;
mod expand;
mod io;
mod model;

use std::path::Path;

pub use error::{PrepError, Result};
pub use expand::expand;
pub use io::{read_source_csv, write_expanded_csv};
pub use model::SourceRule;

use tracing::info;

/// Counts reported by [`prepare`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrepSummary {
    /// Rules read from the source table.
    pub rules: usize,
    /// Rows written to the expanded corpus.
    pub rows: usize,
}

/// Reads `source`, expands it and writes the corpus to `out`.
///
/// # Errors
/// Any [`PrepError`] from reading or writing.
#[tracing::instrument(level = "info", skip_all, fields(source = %source.display(), out = %out.display()))]
pub fn prepare(source: &Path, out: &Path) -> Result<PrepSummary> {
    let rules = read_source_csv(source)?;
    let rows = expand(&rules);
    write_expanded_csv(out, &rows)?;

    let summary = PrepSummary {
        rules: rules.len(),
        rows: rows.len(),
    };
    info!(rules = summary.rules, rows = summary.rows, "corpus prepared");
    Ok(summary)
}
