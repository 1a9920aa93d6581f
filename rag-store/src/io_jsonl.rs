//! JSONL reader for corpus rows.
//!
//! Each non-empty line is one object `{"question": "...", "answer": "..."}`.
//! Parsing is strict: the first malformed line fails the whole read.

use std::io::{BufRead, BufReader, Read};

use serde::Deserialize;
use tracing::debug;

use crate::errors::RagError;
use crate::record::CorpusRow;

#[derive(Deserialize)]
struct StrictRow {
    question: String,
    answer: String,
}

/// Reads corpus rows from JSONL.
///
/// - Empty lines are skipped.
/// - Line numbers in errors are 1-based.
///
/// # Errors
/// - [`RagError::Io`] if the input cannot be read.
/// - [`RagError::Parse`] if any line fails strict deserialization.
pub fn read_rows<R: Read>(input: R) -> Result<Vec<CorpusRow>, RagError> {
    let reader = BufReader::new(input);

    let mut out = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let r: StrictRow = serde_json::from_str(&line)
            .map_err(|e| RagError::Parse(format!("line {} parse error: {}", i + 1, e)))?;

        out.push(CorpusRow {
            question: r.question,
            answer: r.answer,
        });
    }

    debug!(rows = out.len(), "loaded JSONL corpus rows");
    Ok(out)
}
