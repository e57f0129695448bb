//! In-memory vector index over the disaster-response manuals.
//!
//! Built once at startup (or restored from disk) and read-only afterwards.
//! Persisted as a single `index.json` inside the index directory.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::chunk::{ChunkConfig, split_text};
use super::embed::Embedder;
use crate::error::KnowledgeError;

const INDEX_FILE: &str = "index.json";

/// One plain-text manual read from disk.
#[derive(Debug, Clone)]
pub struct ManualDocument {
    /// File name, kept as chunk metadata.
    pub source: String,
    pub text: String,
}

/// An embedded chunk of a manual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A search hit.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a IndexedChunk,
    pub score: f32,
}

/// The embedded manual corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeIndex {
    pub model: String,
    pub built_at: DateTime<Utc>,
    pub dimension: usize,
    chunks: Vec<IndexedChunk>,
}

impl KnowledgeIndex {
    /// Assemble an index, checking every embedding has the same dimension.
    pub fn new(model: impl Into<String>, chunks: Vec<IndexedChunk>) -> Result<Self, KnowledgeError> {
        let dimension = chunks.first().map(|c| c.embedding.len()).unwrap_or(0);
        if let Some(bad) = chunks.iter().find(|c| c.embedding.len() != dimension) {
            return Err(KnowledgeError::EmbeddingFailed {
                reason: format!(
                    "embedding dimension mismatch in {}: expected {dimension}, got {}",
                    bad.source,
                    bad.embedding.len()
                ),
            });
        }
        Ok(Self {
            model: model.into(),
            built_at: Utc::now(),
            dimension,
            chunks,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[IndexedChunk] {
        &self.chunks
    }

    /// The `k` chunks most similar to `query` by cosine similarity.
    /// Equal scores keep corpus order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                chunk,
                score: cosine_similarity(query, &chunk.embedding),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Write `index.json` into `dir`, creating the directory.
    pub async fn save(&self, dir: &Path) -> Result<(), KnowledgeError> {
        tokio::fs::create_dir_all(dir).await?;
        let json = serde_json::to_vec(self)?;
        tokio::fs::write(dir.join(INDEX_FILE), json).await?;
        info!(path = %dir.display(), chunks = self.len(), "Knowledge index saved");
        Ok(())
    }

    /// Read `index.json` from `dir`.
    pub async fn load(dir: &Path) -> Result<Self, KnowledgeError> {
        let path = dir.join(INDEX_FILE);
        let bytes = tokio::fs::read(&path).await?;
        let index: Self = serde_json::from_slice(&bytes).map_err(|e| KnowledgeError::CorruptIndex {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        if index.chunks.iter().any(|c| c.embedding.len() != index.dimension) {
            return Err(KnowledgeError::CorruptIndex {
                path,
                reason: format!("chunk dimension differs from declared {}", index.dimension),
            });
        }
        info!(path = %dir.display(), chunks = index.len(), model = %index.model, "Knowledge index loaded");
        Ok(index)
    }
}

/// Cosine similarity; 0.0 when either vector is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Read every `*.txt` file directly under `dir`, sorted by name.
/// Unreadable files are skipped.
pub async fn read_manuals(dir: &Path) -> Result<Vec<ManualDocument>, KnowledgeError> {
    if !tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(KnowledgeError::ManualsMissing(dir.to_path_buf()));
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("txt") && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                info!(file = %source, "Reading manual");
                documents.push(ManualDocument { source, text });
            }
            Err(e) => warn!(file = %source, error = %e, "Skipping unreadable manual"),
        }
    }
    Ok(documents)
}

/// Chunk and embed the manuals in `dir`.
pub async fn build_index(
    dir: &Path,
    chunking: &ChunkConfig,
    embedder: &dyn Embedder,
) -> Result<KnowledgeIndex, KnowledgeError> {
    let documents = read_manuals(dir).await?;
    if documents.is_empty() {
        return Err(KnowledgeError::NoDocuments(dir.to_path_buf()));
    }

    info!(documents = documents.len(), "Splitting manuals");
    let mut sources = Vec::new();
    let mut texts = Vec::new();
    for doc in &documents {
        for chunk in split_text(&doc.text, chunking) {
            sources.push(doc.source.clone());
            texts.push(chunk);
        }
    }
    if texts.is_empty() {
        return Err(KnowledgeError::NoDocuments(dir.to_path_buf()));
    }
    info!(chunks = texts.len(), "Embedding manual chunks");

    let embeddings = embedder.embed_documents(texts.clone()).await?;
    let chunks = sources
        .into_iter()
        .zip(texts)
        .zip(embeddings)
        .map(|((source, text), embedding)| IndexedChunk {
            source,
            text,
            embedding,
        })
        .collect();

    KnowledgeIndex::new(embedder.model_name(), chunks)
}

/// Restore the index from `index_dir` if it exists, otherwise build it from
/// `manuals_dir` and save it.
pub async fn load_or_build(
    index_dir: &Path,
    manuals_dir: &Path,
    chunking: &ChunkConfig,
    embedder: &dyn Embedder,
) -> Result<KnowledgeIndex, KnowledgeError> {
    if tokio::fs::metadata(index_dir).await.is_ok() {
        info!(path = %index_dir.display(), "Loading existing knowledge index");
        return KnowledgeIndex::load(index_dir).await;
    }

    info!(path = %manuals_dir.display(), "Building knowledge index from manuals");
    let index = build_index(manuals_dir, chunking, embedder).await?;
    index.save(index_dir).await?;
    Ok(index)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic embedder: counts keyword hits along fixed axes.
    pub(crate) struct KeywordEmbedder {
        pub calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        pub(crate) fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn vector(text: &str) -> Vec<f32> {
            ["지진", "호우", "화재"]
                .iter()
                .map(|k| text.matches(k).count() as f32)
                .chain(std::iter::once(0.01))
                .collect()
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, KnowledgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, KnowledgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::vector(text))
        }

        fn model_name(&self) -> &str {
            "keyword-test"
        }
    }

    fn write_manuals(dir: &Path) {
        std::fs::write(dir.join("earthquake.txt"), "지진 발생 시 탁자 아래로 몸을 피합니다.").unwrap();
        std::fs::write(dir.join("flood.txt"), "호우 시 저지대를 피하고 높은 곳으로 이동합니다.").unwrap();
        std::fs::write(dir.join("notes.md"), "화재 화재 화재").unwrap();
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let chunks = vec![
            IndexedChunk { source: "a".into(), text: "a".into(), embedding: vec![1.0, 0.0] },
            IndexedChunk { source: "b".into(), text: "b".into(), embedding: vec![1.0] },
        ];
        assert!(KnowledgeIndex::new("m", chunks).is_err());
    }

    #[tokio::test]
    async fn build_reads_only_txt_files() {
        let dir = tempfile::tempdir().unwrap();
        write_manuals(dir.path());
        let embedder = KeywordEmbedder::new();

        let index = build_index(dir.path(), &ChunkConfig::default(), &embedder).await.unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.model, "keyword-test");
        assert_eq!(index.chunks()[0].source, "earthquake.txt");
    }

    #[tokio::test]
    async fn search_ranks_by_similarity() {
        let dir = tempfile::tempdir().unwrap();
        write_manuals(dir.path());
        let embedder = KeywordEmbedder::new();
        let index = build_index(dir.path(), &ChunkConfig::default(), &embedder).await.unwrap();

        let query = embedder.embed_query("호우 대응").await.unwrap();
        let hits = index.search(&query, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.source, "flood.txt");
    }

    #[tokio::test]
    async fn missing_manuals_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = KeywordEmbedder::new();
        let err = build_index(&dir.path().join("nope"), &ChunkConfig::default(), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::ManualsMissing(_)));
    }

    #[tokio::test]
    async fn empty_manuals_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = KeywordEmbedder::new();
        let err = build_index(dir.path(), &ChunkConfig::default(), &embedder)
            .await
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::NoDocuments(_)));
    }

    #[tokio::test]
    async fn load_or_build_saves_then_reloads_without_embedding() {
        let manuals = tempfile::tempdir().unwrap();
        write_manuals(manuals.path());
        let store = tempfile::tempdir().unwrap();
        let index_dir = store.path().join("knowledge_index");

        let embedder = KeywordEmbedder::new();
        let built = load_or_build(&index_dir, manuals.path(), &ChunkConfig::default(), &embedder)
            .await
            .unwrap();
        assert!(index_dir.join(INDEX_FILE).exists());
        let calls_after_build = embedder.calls.load(Ordering::SeqCst);

        let loaded = load_or_build(&index_dir, manuals.path(), &ChunkConfig::default(), &embedder)
            .await
            .unwrap();
        assert_eq!(loaded.len(), built.len());
        assert_eq!(loaded.dimension, built.dimension);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_build);
    }

    #[tokio::test]
    async fn corrupt_index_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"{not json").unwrap();
        let err = KnowledgeIndex::load(dir.path()).await.unwrap_err();
        assert!(matches!(err, KnowledgeError::CorruptIndex { .. }));
    }
}
