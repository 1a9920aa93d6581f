//! The question/answer corpus: loading, validation and identity.

use std::{fs::File, io::Read, path::Path};

use tracing::info;

use crate::{errors::RagError, io_jsonl, record::CorpusRow};

/// Ordered, immutable list of question variants.
///
/// Row order is significant: the embedding matrix is index-aligned with it,
/// and ties in retrieval resolve by it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Corpus {
    rows: Vec<CorpusRow>,
}

impl Corpus {
    /// Builds a corpus, rejecting rows with a blank question or answer.
    ///
    /// Questions are trimmed; answers are kept verbatim since they are
    /// returned to the caller as-is.
    ///
    /// # Errors
    /// [`RagError::InvalidRow`] with the 1-based row number.
    pub fn new(rows: Vec<CorpusRow>) -> Result<Self, RagError> {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, r)| {
                let question = r.question.trim();
                if question.is_empty() {
                    return Err(RagError::InvalidRow {
                        row: i + 1,
                        reason: "question is blank",
                    });
                }
                if r.answer.trim().is_empty() {
                    return Err(RagError::InvalidRow {
                        row: i + 1,
                        reason: "answer is blank",
                    });
                }
                Ok(CorpusRow {
                    question: question.to_string(),
                    answer: r.answer,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    /// Loads the corpus from disk. `.jsonl` files are read as JSON lines,
    /// everything else as a `question,answer` CSV with a header.
    ///
    /// # Errors
    /// I/O, CSV/JSONL parse errors and [`RagError::InvalidRow`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let is_jsonl = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jsonl"));

        let rows = if is_jsonl {
            io_jsonl::read_rows(file)?
        } else {
            read_csv_rows(file)?
        };
        let corpus = Self::new(rows)?;

        info!(
            path = %path.display(),
            rows = corpus.len(),
            answers = corpus.distinct_answers(),
            "corpus loaded"
        );
        Ok(corpus)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[CorpusRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&CorpusRow> {
        self.rows.get(index)
    }

    /// Questions in corpus order; the texts that get embedded.
    pub fn questions(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.question.as_str()).collect()
    }

    /// Number of distinct answers.
    pub fn distinct_answers(&self) -> usize {
        let mut answers: Vec<&str> = self.rows.iter().map(|r| r.answer.as_str()).collect();
        answers.sort_unstable();
        answers.dedup();
        answers.len()
    }

    /// Content digest over all rows in order.
    ///
    /// Fields are length-prefixed so that moving text between question and
    /// answer (or between rows) changes the digest.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.rows.len() as u64).to_le_bytes());
        for r in &self.rows {
            for field in [&r.question, &r.answer] {
                hasher.update(&(field.len() as u64).to_le_bytes());
                hasher.update(field.as_bytes());
            }
        }
        *hasher.finalize().as_bytes()
    }
}

/// Reads `question,answer` rows from CSV with a header line.
///
/// Extra columns are ignored.
fn read_csv_rows<R: Read>(input: R) -> Result<Vec<CorpusRow>, RagError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let mut rows = Vec::new();
    for rec in reader.deserialize::<CorpusRow>() {
        rows.push(rec?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(q: &str, a: &str) -> CorpusRow {
        CorpusRow {
            question: q.into(),
            answer: a.into(),
        }
    }

    #[test]
    fn blank_fields_are_rejected_with_row_number() {
        let err = Corpus::new(vec![row("q", "a"), row("  ", "a")]).unwrap_err();
        assert!(matches!(err, RagError::InvalidRow { row: 2, .. }));

        let err = Corpus::new(vec![row("q", "\t")]).unwrap_err();
        assert!(matches!(err, RagError::InvalidRow { row: 1, reason: "answer is blank" }));
    }

    #[test]
    fn answers_are_stored_verbatim() {
        let c = Corpus::new(vec![row("  Можно ли удалить книгу? ", "\n Нет.  ")]).unwrap();
        assert_eq!(c.rows()[0].question, "Можно ли удалить книгу?");
        assert_eq!(c.rows()[0].answer, "\n Нет.  ");
    }

    #[test]
    fn fingerprint_tracks_content_and_order() {
        let a = Corpus::new(vec![row("q1", "a"), row("q2", "a")]).unwrap();
        let same = Corpus::new(vec![row("q1", "a"), row("q2", "a")]).unwrap();
        let swapped = Corpus::new(vec![row("q2", "a"), row("q1", "a")]).unwrap();
        let shifted = Corpus::new(vec![row("q1a", "a"), row("q2", "a")]).unwrap();

        assert_eq!(a.fingerprint(), same.fingerprint());
        assert_ne!(a.fingerprint(), swapped.fingerprint());
        assert_ne!(a.fingerprint(), shifted.fingerprint());
        assert_ne!(a.fingerprint(), Corpus::default().fingerprint());
    }

    #[test]
    fn csv_rows_are_read_with_header_and_quotes() {
        let data = "question,answer\n\"Можно ли, не регистрируясь, править?\",Да.\nВторой,Ответ\n";
        let rows = read_csv_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].question, "Можно ли, не регистрируясь, править?");
        assert_eq!(rows[1].answer, "Ответ");
    }

    #[test]
    fn counts_distinct_answers() {
        let c = Corpus::new(vec![row("q1", "a"), row("q2", "b"), row("q3", "a")]).unwrap();
        assert_eq!(c.distinct_answers(), 2);
        assert_eq!(c.questions(), vec!["q1", "q2", "q3"]);
    }
}
