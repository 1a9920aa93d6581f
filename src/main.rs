mod cli;
mod telemetry;

use std::{path::PathBuf, sync::Arc};

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_chat_profiles, config_embedding},
};
use anyhow::{Context, bail};
use clap::Parser;
use rag_answer::{
    AnswerEnhancer, ComposeOptions, LlmEnhancer, ResponseComposer, UnavailableEnhancer,
    cfg::ComposerConfig,
};
use rag_store::{
    Embedder, EmbeddingBackend, EmbeddingCache, KnowledgeBase, RagConfig, ServiceEmbedder,
    ServiceEmbedderConfig, SimilarityStrategy,
};
use tracing::{info, warn};

use crate::cli::{AskArgs, Cli, Command};

const DEFAULT_SOURCE_PATH: &str = "data/ruwikibooks_rules.csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine: every variable has a default or is reported later.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init(cli.verbose)?;

    let cfg = RagConfig::from_env().context("invalid retrieval configuration")?;

    match cli.command {
        Command::Prepare { source, out } => prepare(&cfg, source, out),
        Command::Index { rebuild } => index(&cfg, rebuild).await,
        Command::Ask(args) => ask(&cfg, args, cli.verbose).await,
    }
}

fn prepare(cfg: &RagConfig, source: Option<PathBuf>, out: Option<PathBuf>) -> anyhow::Result<()> {
    let source = source
        .or_else(|| std::env::var_os("RAG_SOURCE_PATH").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_PATH));
    let out = out.unwrap_or_else(|| cfg.corpus_path.clone());

    let summary = corpus_prep::prepare(&source, &out)
        .with_context(|| format!("failed to prepare corpus from {}", source.display()))?;
    info!(
        rules = summary.rules,
        rows = summary.rows,
        out = %out.display(),
        "prepare finished"
    );
    Ok(())
}

async fn index(cfg: &RagConfig, rebuild: bool) -> anyhow::Result<()> {
    let cache = EmbeddingCache::new(&cfg.embeddings_path);
    if rebuild {
        cache
            .invalidate()
            .with_context(|| format!("failed to remove {}", cache.path().display()))?;
    }

    let embedder = build_embedder(cfg, None)?;
    let kb = KnowledgeBase::open(&cfg.corpus_path, &cache, embedder)
        .await
        .context("failed to open knowledge base")?;
    info!(
        rows = kb.corpus().len(),
        dim = kb.matrix().dim(),
        path = %cache.path().display(),
        "index ready"
    );
    Ok(())
}

async fn ask(cfg: &RagConfig, args: AskArgs, verbose: bool) -> anyhow::Result<()> {
    let question = args.question_text();
    if question.is_empty() {
        bail!("question is empty");
    }

    let opts = ComposeOptions {
        use_llm: !args.no_llm,
        creative: args.creative,
    };
    let top_n = args.top_n.unwrap_or(cfg.top_n);
    let strategy = if args.cosine {
        SimilarityStrategy::Cosine
    } else {
        cfg.similarity
    };

    let (svc, enhancer) = if opts.use_llm {
        match config_chat_profiles() {
            Ok((basic, creative)) => {
                let embedding = match cfg.backend {
                    EmbeddingBackend::Service => {
                        Some(config_embedding().context("invalid embedding configuration")?)
                    }
                    EmbeddingBackend::Local => None,
                };
                let svc = Arc::new(LlmServiceProfiles::new(basic, creative, embedding));
                let enhancer: Box<dyn AnswerEnhancer> = Box::new(LlmEnhancer::new(svc.clone()));
                (Some(svc), enhancer)
            }
            Err(e) => {
                warn!(error = %e, "chat model unavailable, answers will use the fallback");
                let enhancer: Box<dyn AnswerEnhancer> =
                    Box::new(UnavailableEnhancer::new(e.to_string()));
                (None, enhancer)
            }
        }
    } else {
        let enhancer: Box<dyn AnswerEnhancer> = Box::new(UnavailableEnhancer::new("disabled"));
        (None, enhancer)
    };

    let embedder = build_embedder(cfg, svc)?;
    let cache = EmbeddingCache::new(&cfg.embeddings_path);
    let kb = KnowledgeBase::open(&cfg.corpus_path, &cache, embedder)
        .await
        .context("failed to open knowledge base")?;

    let retrieval = kb
        .find_top(&question, top_n, strategy)
        .await
        .context("retrieval failed")?;

    if verbose {
        eprintln!("retrieved {} candidate(s):", retrieval.len());
        for (i, c) in retrieval.candidates().iter().enumerate() {
            eprintln!("  {}. [{:.4}] {}", i + 1, c.similarity, c.question);
        }
    }

    let composer = ResponseComposer::from_config(&ComposerConfig::from_env());
    let resp = composer
        .compose(&question, &retrieval, opts, enhancer.as_ref())
        .await;

    println!(
        "{}",
        serde_json::to_string_pretty(&resp).context("failed to serialize response")?
    );
    Ok(())
}

/// Builds the embedder for the configured backend, reusing `svc` when it
/// already carries an embedding profile.
fn build_embedder(cfg: &RagConfig, svc: Option<Arc<LlmServiceProfiles>>) -> anyhow::Result<Embedder> {
    match cfg.backend {
        EmbeddingBackend::Service => {
            let svc = match svc.filter(|s| s.profiles().2.is_some()) {
                Some(svc) => svc,
                None => {
                    let embedding =
                        config_embedding().context("invalid embedding configuration")?;
                    Arc::new(LlmServiceProfiles::with_embedding_only(embedding))
                }
            };
            let provider = ServiceEmbedder::new(ServiceEmbedderConfig {
                svc,
                native_similarity: cfg.native_similarity,
                dim: cfg.embedding_dim,
                concurrency: cfg.embedding_concurrency,
            })?;
            Ok(Embedder::new(Arc::new(provider)))
        }
        EmbeddingBackend::Local => local_embedder(),
    }
}

#[cfg(feature = "local-embeddings")]
fn local_embedder() -> anyhow::Result<Embedder> {
    let provider = rag_store::FastEmbedder::new().context("failed to load local embedding model")?;
    Ok(Embedder::new(Arc::new(provider)))
}

#[cfg(not(feature = "local-embeddings"))]
fn local_embedder() -> anyhow::Result<Embedder> {
    bail!("EMBEDDING_PROVIDER=fastembed needs a build with the `local-embeddings` feature")
}
