use crate::llm::core::{LLM, LLMError, Prompt};
use async_trait::async_trait;
use rig::prelude::*;
use rig::providers::gemini;
use rig::{agent::Agent as RigAgent, completion::CompletionModel};
use tracing::debug;

/// Adapter implementations for third-party LLM libraries.
///
/// Implementation of the `LLM` trait for `rig::Agent`.
///
/// This lets any `rig` agent serve the gateway's text features. Rig agents are
/// driven with plain text here, so a prompt carrying an inline image is
/// rejected rather than silently dropping the picture.
///
/// # Example
///
/// ```rust,ignore
/// use nanogate::llm::{LLM, Prompt};
///
/// let agent = nanogate::llm::adapters::gemini_agent(&api_key, "gemini-2.5-flash");
/// let reply = agent.prompt(Prompt::text("Hello")).await?;
/// ```
#[async_trait]
impl<M> LLM for RigAgent<M>
where
    M: CompletionModel,
{
    async fn prompt(&self, prompt: Prompt) -> Result<String, LLMError> {
        if prompt.image.is_some() {
            return Err(LLMError::PromptError(
                "rig agents accept text-only prompts".to_string(),
            ));
        }
        rig::completion::Prompt::prompt(self, prompt.text)
            .await
            .map(|response| response.to_string())
            .map_err(|e| {
                debug!("Rig agent error: {}", e);
                LLMError::PromptError(e.to_string())
            })
    }
}

/// Builds a rig agent for a Gemini text model.
pub fn gemini_agent(api_key: &str, model: &str) -> RigAgent<gemini::completion::CompletionModel> {
    gemini::Client::new(api_key).agent(model).build()
}
