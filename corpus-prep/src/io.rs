//! CSV readers and writers for the rules table and the expanded corpus.

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
};

use rag_store::CorpusRow;
use tracing::info;

use crate::{
    error::{PrepError, Result},
    model::SourceRule,
};

/// Reads the rules table (`question,answer[,alternative_questions]`).
///
/// # Errors
/// - [`PrepError::Io`] if the file cannot be opened
/// - [`PrepError::MissingColumn`] if `question` or `answer` is absent
/// - [`PrepError::Csv`] for malformed rows
pub fn read_source_csv(path: &Path) -> Result<Vec<SourceRule>> {
    let file = File::open(path).map_err(|source| PrepError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rules = read_source(file, path)?;
    info!(path = %path.display(), rules = rules.len(), "rules table loaded");
    Ok(rules)
}

fn read_source<R: Read>(input: R, path: &Path) -> Result<Vec<SourceRule>> {
    let csv_err = |source| PrepError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let headers = reader.headers().map_err(csv_err)?;
    for column in ["question", "answer"] {
        if !headers.iter().any(|h| h.trim() == column) {
            return Err(PrepError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }

    reader
        .deserialize::<SourceRule>()
        .map(|r| r.map_err(csv_err))
        .collect()
}

/// Writes the expanded corpus as `question,answer` CSV with a header.
///
/// Parent directories are created as needed.
///
/// # Errors
/// [`PrepError::Io`] or [`PrepError::Csv`] on write failures.
pub fn write_expanded_csv(path: &Path, rows: &[CorpusRow]) -> Result<()> {
    let io_err = |source| PrepError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(io_err)?;
    }

    let file = File::create(path).map_err(io_err)?;
    write_rows(BufWriter::new(file), rows).map_err(|source| PrepError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    info!(path = %path.display(), rows = rows.len(), "expanded corpus written");
    Ok(())
}

fn write_rows<W: Write>(out: W, rows: &[CorpusRow]) -> std::result::Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["question", "answer"])?;
    for r in rows {
        writer.write_record([r.question.as_str(), r.answer.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternative_column_may_be_absent() {
        let data = "question,answer\nq1,a1\n";
        let rules = read_source(data.as_bytes(), Path::new("mem.csv")).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].alternative_questions, None);
    }

    #[test]
    fn missing_answer_column_is_reported() {
        let data = "question,reply\nq1,a1\n";
        let err = read_source(data.as_bytes(), Path::new("mem.csv")).unwrap_err();
        assert!(matches!(err, PrepError::MissingColumn { column: "answer", .. }));
    }

    #[test]
    fn writer_quotes_commas() {
        let mut buf = Vec::new();
        write_rows(
            &mut buf,
            &[CorpusRow {
                question: "Можно ли, не входя, править?".into(),
                answer: "Да".into(),
            }],
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "question,answer\n\"Можно ли, не входя, править?\",Да\n");
    }
}
