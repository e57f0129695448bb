//! LLM integration for guidance generation.
//!
//! Supports:
//! - **Upstage**: Solar chat models over the OpenAI-compatible API via rig-core
//!
//! Uses the rig-core crate for HTTP transport and the `RigAdapter` to bridge
//! rig's `CompletionModel` trait to our `LlmProvider` trait.

pub mod provider;
mod rig_adapter;

pub use provider::*;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::config::UpstageConfig;
use crate::error::LlmError;

/// Create the chat provider from configuration.
///
/// Upstage speaks the OpenAI chat-completions dialect, so the OpenAI client is
/// pointed at the configured base URL.
pub fn create_provider(config: &UpstageConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::builder()
            .api_key(config.api_key.expose_secret())
            .base_url(config.api_base.as_str())
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: "upstage".to_string(),
                reason: format!("Failed to create Upstage client: {}", e),
            })?;

    let model = client.completions_api().completion_model(&config.chat_model);
    tracing::info!("Using Upstage (model: {})", config.chat_model);
    Ok(Arc::new(RigAdapter::new(model, &config.chat_model)))
}
