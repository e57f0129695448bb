//! Guidance generator: one retrieval + generation per alert, appended to the
//! base alert line and fanned out to every recipient.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::embed::Embedder;
use super::index::KnowledgeIndex;
use crate::alert::Notification;
use crate::alert::model::DisasterAlert;
use crate::error::KnowledgeError;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::store::User;

const UNAVAILABLE_NOTICE: &str = "\n\n[대처방안] 현재 관련 정보를 조회할 수 없습니다.";
const FAILURE_NOTICE: &str = "\n\n[대처방안] 관련 정보를 조회하는 중 오류가 발생했습니다.";
const SUMMARY_HEADER: &str = "\n\n--- 재난 대응 요약 ---\n";
const EMPTY_ANSWER: &str = "대응 방안 생성 실패";

/// Retrieval index plus the models used to query it.
pub struct KnowledgeBase {
    index: KnowledgeIndex,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl KnowledgeBase {
    pub fn new(
        index: KnowledgeIndex,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            top_k,
        }
    }

    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    /// Answer `question` from the top-k manual chunks.
    pub async fn answer(&self, question: &str) -> Result<String, KnowledgeError> {
        let query = self.embedder.embed_query(question).await?;
        let hits = self.index.search(&query, self.top_k);
        info!(hits = hits.len(), "Retrieved manual chunks");

        let context = hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = CompletionRequest::new(vec![ChatMessage::user(summary_prompt(
            &context, question,
        ))])
        .with_temperature(0.0);

        let response = self.llm.complete(request).await?;
        Ok(response.content.trim().to_string())
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("chunks", &self.index.len())
            .field("embedding_model", &self.embedder.model_name())
            .field("chat_model", &self.llm.model_name())
            .field("top_k", &self.top_k)
            .finish()
    }
}

fn summary_prompt(context: &str, question: &str) -> String {
    format!(
        "다음 문서를 기반으로 아래 질문에 대한 '재난 대응 요약'을 작성해 주세요. \
         응답은 한국어로 작성하고, 핵심적인 내용만 간결하게 포함하세요.\n\n\
         문서:\n{context}\n\n\
         질문: {question}\n\n\
         응답 형식:\n[핵심 대응 지침]\n- \n- \n[주의사항]\n- "
    )
}

/// Builds the per-alert notification text.
///
/// Never fails: a missing knowledge base or any lookup error degrades to a
/// fixed notice.
#[derive(Debug, Clone, Default)]
pub struct GuidanceGenerator {
    knowledge: Option<Arc<KnowledgeBase>>,
}

impl GuidanceGenerator {
    pub fn new(knowledge: Option<Arc<KnowledgeBase>>) -> Self {
        Self { knowledge }
    }

    /// Base alert line plus guidance for `alert`.
    pub async fn guidance_text(&self, alert: &DisasterAlert) -> String {
        let mut text = alert.base_message();

        let Some(knowledge) = &self.knowledge else {
            warn!("Knowledge base unavailable, sending alert without guidance");
            text.push_str(UNAVAILABLE_NOTICE);
            return text;
        };

        let query = alert.guidance_query();
        info!(query = %query, "Requesting disaster guidance");
        match knowledge.answer(&query).await {
            Ok(answer) => {
                let answer = if answer.is_empty() {
                    EMPTY_ANSWER.to_string()
                } else {
                    answer
                };
                text.push_str(SUMMARY_HEADER);
                text.push_str(&answer);
            }
            Err(e) => {
                error!(error = %e, "Guidance generation failed");
                text.push_str(FAILURE_NOTICE);
            }
        }
        text
    }

    /// One notification per user, all sharing the same text.
    pub async fn compose(&self, alert: &DisasterAlert, users: Vec<User>) -> Vec<Notification> {
        let message = self.guidance_text(alert).await;
        users
            .into_iter()
            .map(|user| Notification {
                user,
                message: message.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::model::sample_alert;
    use crate::error::LlmError;
    use crate::knowledge::index::IndexedChunk;
    use crate::knowledge::index::tests::KeywordEmbedder;
    use crate::llm::provider::CompletionResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingLlm {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingLlm {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for RecordingLlm {
        fn model_name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.messages[0].content.clone());
            match &self.reply {
                Ok(text) => Ok(CompletionResponse { content: text.clone() }),
                Err(()) => Err(LlmError::RequestFailed {
                    provider: "stub".into(),
                    reason: "offline".into(),
                }),
            }
        }
    }

    fn index() -> KnowledgeIndex {
        let chunk = |source: &str, text: &str, embedding: Vec<f32>| IndexedChunk {
            source: source.into(),
            text: text.into(),
            embedding,
        };
        KnowledgeIndex::new(
            "keyword-test",
            vec![
                chunk("earthquake.txt", "지진 시 탁자 아래로", vec![1.0, 0.0, 0.0, 0.01]),
                chunk("flood.txt", "호우 시 높은 곳으로", vec![0.0, 1.0, 0.0, 0.01]),
            ],
        )
        .unwrap()
    }

    fn generator(llm: Arc<RecordingLlm>) -> GuidanceGenerator {
        let kb = KnowledgeBase::new(index(), Arc::new(KeywordEmbedder::new()), llm, 4);
        GuidanceGenerator::new(Some(Arc::new(kb)))
    }

    fn users(n: usize) -> Vec<User> {
        (0..n)
            .map(|i| User {
                id: i as i64 + 1,
                vulnerability_type: "고령자".into(),
                address: "서울 강남구".into(),
                phone_number: format!("+8210000000{i}"),
                has_guardian: false,
                guardian_phone_number: None,
                wants_info_call: true,
            })
            .collect()
    }

    #[tokio::test]
    async fn without_knowledge_appends_unavailable_notice() {
        let generator = GuidanceGenerator::default();
        let notes = generator.compose(&sample_alert("서울특별시 강남구"), users(2)).await;
        assert_eq!(notes.len(), 2);
        for note in &notes {
            assert!(note.message.starts_with("[긴급] 서울특별시 강남구 호우 발생"));
            assert!(note.message.ends_with(UNAVAILABLE_NOTICE));
        }
    }

    #[tokio::test]
    async fn answer_is_appended_under_summary_header() {
        let llm = Arc::new(RecordingLlm::replying("[핵심 대응 지침]\n- 고지대로 대피\n"));
        let text = generator(llm.clone())
            .guidance_text(&sample_alert("서울특별시 강남구"))
            .await;
        assert!(text.ends_with("\n\n--- 재난 대응 요약 ---\n[핵심 대응 지침]\n- 고지대로 대피"));

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("호우 시 높은 곳으로"));
        assert!(prompts[0].contains("질문: 호우 발생 시 (서울특별시 강남구 상황)"));
    }

    #[tokio::test]
    async fn empty_answer_uses_placeholder() {
        let llm = Arc::new(RecordingLlm::replying("   "));
        let text = generator(llm).guidance_text(&sample_alert("부산광역시")).await;
        assert!(text.ends_with("--- 재난 대응 요약 ---\n대응 방안 생성 실패"));
    }

    #[tokio::test]
    async fn generation_failure_degrades_to_notice() {
        let llm = Arc::new(RecordingLlm::failing());
        let notes = generator(llm)
            .compose(&sample_alert("서울특별시 강남구"), users(3))
            .await;
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|n| n.message.ends_with(FAILURE_NOTICE)));
    }

    #[tokio::test]
    async fn one_generation_call_per_alert() {
        let llm = Arc::new(RecordingLlm::replying("요약"));
        let notes = generator(llm.clone())
            .compose(&sample_alert("서울특별시 강남구"), users(5))
            .await;
        assert_eq!(notes.len(), 5);
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
        assert!(notes.windows(2).all(|w| w[0].message == w[1].message));
    }

    #[tokio::test]
    async fn zero_recipients_still_queries_once() {
        let llm = Arc::new(RecordingLlm::replying("요약"));
        let notes = generator(llm.clone())
            .compose(&sample_alert("서울특별시 강남구"), Vec::new())
            .await;
        assert!(notes.is_empty());
        assert_eq!(llm.prompts.lock().unwrap().len(), 1);
    }
}
