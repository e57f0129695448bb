//! Disaster-response knowledge base.
//!
//! Manuals are split, embedded and indexed once at startup. The resulting
//! [`KnowledgeBase`] is read-only and shared by the guidance generator.

pub mod chunk;
pub mod embed;
pub mod generator;
pub mod index;

pub use embed::{Embedder, UpstageEmbedder};
pub use generator::{GuidanceGenerator, KnowledgeBase};
pub use index::KnowledgeIndex;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{KnowledgeConfig, UpstageConfig};
use crate::llm::{LlmProvider, create_provider};
use chunk::ChunkConfig;

/// Load or build the knowledge base. Any failure leaves the service without
/// one, which the generator reports in every message.
pub async fn bootstrap(
    upstage: Option<&UpstageConfig>,
    config: &KnowledgeConfig,
) -> Option<Arc<KnowledgeBase>> {
    let Some(upstage) = upstage else {
        warn!("UPSTAGE_API_KEY not set, guidance generation disabled");
        return None;
    };

    let embedder: Arc<dyn Embedder> = Arc::new(UpstageEmbedder::new(
        upstage.api_key.clone(),
        upstage.api_base.clone(),
        upstage.embedding_model.clone(),
    ));
    let llm = match create_provider(upstage) {
        Ok(llm) => llm,
        Err(e) => {
            warn!(error = %e, "Chat provider unavailable, guidance generation disabled");
            return None;
        }
    };

    build(embedder, llm, config).await
}

/// Assemble a knowledge base from explicit backends.
pub async fn build(
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmProvider>,
    config: &KnowledgeConfig,
) -> Option<Arc<KnowledgeBase>> {
    let chunking = ChunkConfig {
        chunk_size: config.chunk_size,
        chunk_overlap: config.chunk_overlap,
    };

    match index::load_or_build(
        &config.index_path,
        &config.manuals_dir,
        &chunking,
        embedder.as_ref(),
    )
    .await
    {
        Ok(index) => {
            info!(chunks = index.len(), model = %index.model, "Knowledge base ready");
            Some(Arc::new(KnowledgeBase::new(index, embedder, llm, config.top_k)))
        }
        Err(e) => {
            warn!(error = %e, "Knowledge base unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::LlmError;
    use crate::knowledge::index::tests::KeywordEmbedder;
    use crate::llm::provider::{CompletionRequest, CompletionResponse};

    struct NoLlm;

    #[async_trait]
    impl LlmProvider for NoLlm {
        fn model_name(&self) -> &str {
            "none"
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::RequestFailed {
                provider: "none".into(),
                reason: "no model".into(),
            })
        }
    }

    #[tokio::test]
    async fn no_upstage_config_means_no_knowledge() {
        assert!(bootstrap(None, &KnowledgeConfig::default()).await.is_none());
    }

    #[tokio::test]
    async fn missing_manuals_means_no_knowledge() {
        let dir = tempfile::tempdir().unwrap();
        let config = KnowledgeConfig {
            index_path: dir.path().join("index"),
            manuals_dir: dir.path().join("missing"),
            ..KnowledgeConfig::default()
        };
        let kb = build(Arc::new(KeywordEmbedder::new()), Arc::new(NoLlm), &config).await;
        assert!(kb.is_none());
        assert!(!config.index_path.exists());
    }

    #[tokio::test]
    async fn builds_from_manuals() {
        let dir = tempfile::tempdir().unwrap();
        let manuals = dir.path().join("how-to-s");
        std::fs::create_dir(&manuals).unwrap();
        std::fs::write(manuals.join("fire.txt"), "화재 시 젖은 수건으로 코와 입을 막습니다.").unwrap();
        let config = KnowledgeConfig {
            index_path: dir.path().join("index"),
            manuals_dir: manuals,
            ..KnowledgeConfig::default()
        };

        let kb = build(Arc::new(KeywordEmbedder::new()), Arc::new(NoLlm), &config)
            .await
            .unwrap();
        assert_eq!(kb.index().len(), 1);
        assert!(config.index_path.join("index.json").exists());
    }
}
