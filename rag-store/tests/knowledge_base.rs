//! Cache reuse, rebuild and retrieval through the public API.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rag_store::{
    Corpus, CorpusRow, DistanceKind, EmbedFuture, Embedder, EmbeddingCache, EmbeddingsProvider,
    KnowledgeBase, RagError, SimilarityStrategy, find_top,
};

const DIM: usize = 64;

/// Deterministic character-trigram hashing embedder that counts its calls.
#[derive(Default)]
struct TrigramEmbedder {
    calls: AtomicUsize,
}

fn trigram_vector(text: &str) -> Vec<f32> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let mut v = vec![0.0f32; DIM];
    for w in chars.windows(3) {
        let mut h: u32 = 2166136261;
        for c in w {
            h ^= *c as u32;
            h = h.wrapping_mul(16777619);
        }
        v[h as usize % DIM] += 1.0;
    }
    v
}

impl EmbeddingsProvider for TrigramEmbedder {
    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(texts.iter().map(|t| trigram_vector(t)).collect()) })
    }

    fn native_similarity(&self) -> DistanceKind {
        DistanceKind::Cosine
    }

    fn model_name(&self) -> &str {
        "trigram-test"
    }
}

fn rows(pairs: &[(&str, &str)]) -> Vec<CorpusRow> {
    pairs
        .iter()
        .map(|(q, a)| CorpusRow {
            question: (*q).into(),
            answer: (*a).into(),
        })
        .collect()
}

fn rules() -> Corpus {
    Corpus::new(rows(&[
        ("Как удалить учебник новичка?", "Обратитесь к администратору."),
        ("Можно ли удалить книгу новичка?", "Обратитесь к администратору."),
        ("Как загрузить изображение?", "Используйте страницу загрузки файлов."),
        ("Где обсуждать правила?", "На странице обсуждения правил."),
    ]))
    .unwrap()
}

#[tokio::test]
async fn second_build_reuses_file_without_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("emb.bin");
    let cache = EmbeddingCache::new(&path);
    let provider = Arc::new(TrigramEmbedder::default());
    let embedder = Embedder::new(provider.clone());
    let corpus = rules();

    let first = cache.load_or_build(&corpus, &embedder).await.unwrap();
    let bytes_first = std::fs::read(&path).unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let second = cache.load_or_build(&corpus, &embedder).await.unwrap();
    let bytes_second = std::fs::read(&path).unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(first, second);
    assert_eq!(bytes_first, bytes_second);
}

#[tokio::test]
async fn changed_corpus_forces_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EmbeddingCache::new(dir.path().join("emb.bin"));
    let provider = Arc::new(TrigramEmbedder::default());
    let embedder = Embedder::new(provider.clone());

    cache.load_or_build(&rules(), &embedder).await.unwrap();

    // Row count changes.
    let mut grown = rules().rows().to_vec();
    grown.extend(rows(&[("Кто такие администраторы?", "Участники с расширенными правами.")]));
    let grown = Corpus::new(grown).unwrap();
    let m = cache.load_or_build(&grown, &embedder).await.unwrap();
    assert_eq!(m.rows(), 5);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    // Same row count, edited text.
    let mut edited = grown.rows().to_vec();
    edited[4].answer = "Участники с флагом администратора.".into();
    let edited = Corpus::new(edited).unwrap();
    cache.load_or_build(&edited, &embedder).await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

/// Same hashing at a wider width under another model name.
#[derive(Default)]
struct WideTrigramEmbedder {
    calls: AtomicUsize,
}

impl EmbeddingsProvider for WideTrigramEmbedder {
    fn embed_batch<'a>(&'a self, texts: &'a [&'a str]) -> EmbedFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = trigram_vector(t);
                    v.resize(DIM * 2, 0.5);
                    v
                })
                .collect())
        })
    }

    fn native_similarity(&self) -> DistanceKind {
        DistanceKind::Cosine
    }

    fn model_name(&self) -> &str {
        "trigram-wide"
    }
}

#[tokio::test]
async fn switching_embedding_model_forces_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EmbeddingCache::new(dir.path().join("emb.bin"));
    let corpus = rules();

    let narrow = Embedder::new(Arc::new(TrigramEmbedder::default()));
    let m = cache.load_or_build(&corpus, &narrow).await.unwrap();
    assert_eq!(m.dim(), DIM);

    let wide_provider = Arc::new(WideTrigramEmbedder::default());
    let wide = Embedder::new(wide_provider.clone());
    let m = cache.load_or_build(&corpus, &wide).await.unwrap();
    assert_eq!(wide_provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(m.dim(), DIM * 2);

    let r = find_top("Как удалить учебник?", &corpus, &m, &wide, 2, SimilarityStrategy::Cosine)
        .await
        .unwrap();
    assert_eq!(r.len(), 2);

    // The rebuilt file now belongs to the wide model.
    cache.load_or_build(&corpus, &wide).await.unwrap();
    assert_eq!(wide_provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_corpus_builds_empty_matrix_and_retrieves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let cache = EmbeddingCache::new(dir.path().join("emb.bin"));
    let provider = Arc::new(TrigramEmbedder::default());
    let embedder = Embedder::new(provider.clone());
    let corpus = Corpus::default();

    let m = cache.load_or_build(&corpus, &embedder).await.unwrap();
    assert!(m.is_empty());
    assert!(cache.path().exists());

    let r = find_top("что угодно", &corpus, &m, &embedder, 3, SimilarityStrategy::Cosine)
        .await
        .unwrap();
    assert!(r.is_empty());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn single_row_corpus_returns_exactly_one_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let corpus_path = dir.path().join("expanded.csv");
    std::fs::write(
        &corpus_path,
        "question,answer\nКак удалить учебник новичка?,Обратитесь к администратору.\n",
    )
    .unwrap();

    let kb = KnowledgeBase::open(
        &corpus_path,
        &EmbeddingCache::new(dir.path().join("emb.bin")),
        Embedder::new(Arc::new(TrigramEmbedder::default())),
    )
    .await
    .unwrap();

    let r = kb
        .find_top("Как удалить книгу новичка?", 3, SimilarityStrategy::ModelNative)
        .await
        .unwrap();
    assert_eq!(r.len(), 1);
    let top = r.top().unwrap();
    assert_eq!(top.answer, "Обратитесь к администратору.");
    assert!(top.similarity > 0.0 && top.similarity <= 1.0 + 1e-6);
}

#[tokio::test]
async fn variants_of_one_answer_collapse() {
    let corpus = rules();
    let embedder = Embedder::new(Arc::new(TrigramEmbedder::default()));
    let matrix = embedder.embed(&corpus.questions()).await.unwrap();

    let r = find_top(
        "Как удалить книгу новичка?",
        &corpus,
        &matrix,
        &embedder,
        10,
        SimilarityStrategy::Cosine,
    )
    .await
    .unwrap();

    assert_eq!(r.len(), 3);
    assert_eq!(r.top().unwrap().answer, "Обратитесь к администратору.");
}

#[tokio::test]
async fn misaligned_matrix_is_rejected() {
    let corpus = rules();
    let embedder = Embedder::new(Arc::new(TrigramEmbedder::default()));
    let matrix = embedder.embed(&["один вопрос"]).await.unwrap();

    let err = find_top("вопрос", &corpus, &matrix, &embedder, 3, SimilarityStrategy::Cosine)
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::MatrixMismatch { rows: 1, corpus: 4 }));
}
