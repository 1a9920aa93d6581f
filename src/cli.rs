use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "wikirules-rag", version)]
#[command(about = "Answers questions about the Russian Wikibooks rules", long_about = None)]
pub struct Cli {
    /// Debug logs and retrieved candidates on stderr.
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Expand the rules table (question, answer, alternative questions) into
    /// one `question,answer` row per phrasing.
    Prepare {
        /// Source rules CSV; defaults to RAG_SOURCE_PATH.
        #[arg(long)]
        source: Option<PathBuf>,
        /// Output corpus; defaults to RAG_CORPUS_PATH.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Embed the corpus and persist the matrix.
    Index {
        /// Drop the persisted matrix first.
        #[arg(long, action = ArgAction::SetTrue)]
        rebuild: bool,
    },
    /// Answer a question and print the response as JSON.
    Ask(AskArgs),
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question text; several words are joined with spaces.
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Number of distinct answers to retrieve; defaults to RAG_TOP_N.
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Force cosine similarity instead of the model's native one.
    #[arg(long, action = ArgAction::SetTrue)]
    pub cosine: bool,

    /// Skip the LLM rewrite.
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_llm: bool,

    /// Allow clearly-labelled general advice when the rules are silent.
    #[arg(long, action = ArgAction::SetTrue)]
    pub creative: bool,
}

impl AskArgs {
    pub fn question_text(&self) -> String {
        self.question.join(" ").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_joins_words_and_reads_flags() {
        let cli = Cli::parse_from([
            "wikirules-rag",
            "ask",
            "Как",
            "удалить",
            "учебник?",
            "--top-n",
            "5",
            "--no-llm",
            "-v",
        ]);
        assert!(cli.verbose);
        let Command::Ask(args) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(args.question_text(), "Как удалить учебник?");
        assert_eq!(args.top_n, Some(5));
        assert!(args.no_llm);
        assert!(!args.creative && !args.cosine);
    }

    #[test]
    fn prepare_paths_are_optional() {
        let cli = Cli::parse_from(["wikirules-rag", "prepare", "--out", "x.csv"]);
        match cli.command {
            Command::Prepare { source, out } => {
                assert!(source.is_none());
                assert_eq!(out, Some(PathBuf::from("x.csv")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ask_requires_a_question() {
        assert!(Cli::try_parse_from(["wikirules-rag", "ask"]).is_err());
    }
}
