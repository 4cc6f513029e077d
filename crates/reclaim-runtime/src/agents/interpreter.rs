//! LLM-backed response interpretation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use reclaim_core::{keyword_analysis, RefundPolicy, ResponseAnalysis, ANALYSIS_VERSION};

use crate::agents::{AgentError, ResponseInterpreter};
use crate::prompts;
use crate::providers::{extract_json, ChatMessage, CompletionConfig, LlmProvider};

/// Response interpreter backed by one classification call.
pub struct LlmResponseInterpreter {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
}

impl LlmResponseInterpreter {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self { provider, config }
    }

    async fn analyze_inner(
        &self,
        response: &str,
        policy: &RefundPolicy,
    ) -> Result<ResponseAnalysis, AgentError> {
        let messages = vec![
            ChatMessage::system(prompts::ANALYSIS_SYSTEM_PROMPT),
            ChatMessage::user(prompts::analysis_prompt(response, policy)),
        ];
        let completion = self
            .provider
            .complete(messages, &self.config)
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        let json = extract_json(&completion.content).ok_or_else(|| {
            AgentError::MalformedOutput("analysis returned no JSON".to_string())
        })?;
        let verdict: LlmVerdict = serde_json::from_str(json)
            .map_err(|e| AgentError::MalformedOutput(e.to_string()))?;

        Ok(ResponseAnalysis {
            approved: verdict.approved,
            needs_escalation: verdict.needs_escalation,
            key_points: verdict.key_points,
            policy_violations: verdict.policy_violations,
            suggested_action: verdict.suggested_action,
            confidence: verdict.confidence.clamp(0.0, 1.0),
            analyzed_at: Utc::now(),
            response_length: response.len(),
            analysis_version: ANALYSIS_VERSION.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LlmVerdict {
    approved: bool,
    needs_escalation: bool,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    policy_violations: Vec<String>,
    #[serde(default)]
    suggested_action: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
}

fn default_confidence() -> f64 {
    0.5
}

#[async_trait]
impl ResponseInterpreter for LlmResponseInterpreter {
    async fn analyze(&self, response: &str, policy: &RefundPolicy) -> ResponseAnalysis {
        match self.analyze_inner(response, policy).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "response analysis failed, using keyword fallback");
                keyword_analysis(response)
            }
        }
    }
}
