//! LLM-backed message composition.
//!
//! The one capability allowed to fail: a draft the model never produced
//! cannot be substituted deterministically, so errors propagate and the
//! orchestrator converts them to structured error outcomes.

use std::sync::Arc;

use async_trait::async_trait;

use reclaim_core::{EvidenceRecord, RefundPolicy};

use crate::agents::{AgentError, MessageComposer};
use crate::prompts;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};

/// Message composer backed by one drafting call per message.
pub struct LlmMessageComposer {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
}

impl LlmMessageComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self { provider, config }
    }

    async fn draft(&self, user_prompt: String) -> Result<String, AgentError> {
        let messages = vec![
            ChatMessage::system(prompts::COMPOSER_SYSTEM_PROMPT),
            ChatMessage::user(user_prompt),
        ];
        let completion = self
            .provider
            .complete(messages, &self.config)
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        let draft = completion.content.trim().to_string();
        if draft.is_empty() {
            return Err(AgentError::MalformedOutput(
                "composer returned an empty draft".to_string(),
            ));
        }
        Ok(draft)
    }
}

#[async_trait]
impl MessageComposer for LlmMessageComposer {
    async fn compose_request(
        &self,
        issue_description: &str,
        policy: &RefundPolicy,
        details: Option<&EvidenceRecord>,
    ) -> Result<String, AgentError> {
        self.draft(prompts::request_prompt(issue_description, policy, details))
            .await
    }

    async fn compose_escalation(
        &self,
        previous_response: &str,
        policy: &RefundPolicy,
        history: &[String],
    ) -> Result<String, AgentError> {
        self.draft(prompts::escalation_prompt(previous_response, policy, history))
            .await
    }
}
