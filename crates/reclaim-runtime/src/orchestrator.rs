//! Refund orchestrator.
//!
//! Drives the four capabilities in a fixed two-phase protocol: initiate a
//! refund request, then interpret each platform reply until the request is
//! approved, rejected, or escalated for another round. Per order id the
//! states are: no history -> initiated -> {success, rejected, escalated},
//! where an escalation re-enters the response-pending state.
//!
//! Every public operation catches internal failures and returns a structured
//! error outcome; nothing here retries, and nothing is fatal to the process.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use reclaim_core::{ConversationHistory, ResponseAnalysis};

use crate::agents::{
    AgentError, EvidenceExtractor, MessageComposer, PolicySource, ResponseInterpreter,
};

/// Errors from orchestrator construction.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Capability not configured: {0}")]
    MissingCapability(&'static str),
}

/// Outcome of one orchestrator operation, serialized with a `status` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefundOutcome {
    /// The request was drafted and the conversation opened.
    Initiated { message: String, tracking_id: String },

    /// The platform approved the refund.
    Success {
        message: String,
        details: ResponseAnalysis,
    },

    /// The reply warranted escalation; the escalation draft was recorded.
    Escalated {
        message: String,
        details: ResponseAnalysis,
    },

    /// The platform rejected the request; no further automatic action.
    Rejected {
        message: String,
        details: ResponseAnalysis,
    },

    /// A precondition failed or an internal step errored.
    Error { message: String },
}

impl RefundOutcome {
    /// Whether this outcome is terminal for the conversation.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefundOutcome::Success { .. } | RefundOutcome::Rejected { .. }
        )
    }
}

/// The orchestrating agent.
///
/// Holds the injected conversation history store and one handle per
/// capability. All external calls for a given order run strictly in
/// sequence; different order ids are independent.
pub struct RefundOrchestrator {
    policy_source: Arc<dyn PolicySource>,
    evidence_extractor: Arc<dyn EvidenceExtractor>,
    message_composer: Arc<dyn MessageComposer>,
    response_interpreter: Arc<dyn ResponseInterpreter>,
    history: ConversationHistory,
}

impl RefundOrchestrator {
    pub fn builder() -> RefundOrchestratorBuilder {
        RefundOrchestratorBuilder::new()
    }

    /// Initiate the refund process for an order.
    ///
    /// Fetches the platform policy, processes the receipt when supplied,
    /// drafts the refund request, and opens the order's conversation. The
    /// conversation is only created once the draft exists; an evidence
    /// rejection or a failed draft leaves no trace in history.
    pub async fn initiate_refund(
        &self,
        platform: &str,
        order_id: &str,
        issue_description: &str,
        receipt: Option<&[u8]>,
    ) -> RefundOutcome {
        match self
            .try_initiate(platform, order_id, issue_description, receipt)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(order_id, error = %e, "error initiating refund");
                RefundOutcome::Error {
                    message: format!("Failed to initiate refund: {e}"),
                }
            }
        }
    }

    /// Interpret a platform reply and decide the next step.
    ///
    /// The raw reply is always appended to history before branching.
    /// Approval takes precedence over escalation when an interpreter sets
    /// both flags.
    pub async fn handle_response(
        &self,
        order_id: &str,
        response: &str,
        platform: &str,
    ) -> RefundOutcome {
        match self.try_handle(order_id, response, platform).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(order_id, error = %e, "error handling response");
                RefundOutcome::Error {
                    message: format!("Failed to process response: {e}"),
                }
            }
        }
    }

    /// The conversation history store, for inspection.
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    async fn try_initiate(
        &self,
        platform: &str,
        order_id: &str,
        issue_description: &str,
        receipt: Option<&[u8]>,
    ) -> Result<RefundOutcome, AgentError> {
        // Always fetched fresh; policies are never cached across calls.
        let policy = self.policy_source.fetch(platform).await;

        let mut details = None;
        if let Some(receipt_bytes) = receipt {
            let record = self.evidence_extractor.extract(receipt_bytes).await;
            if !self.evidence_extractor.validate(&record, &policy).await {
                return Ok(RefundOutcome::Error {
                    message: "Insufficient evidence for refund request".to_string(),
                });
            }
            details = Some(record);
        }

        let message = self
            .message_composer
            .compose_request(issue_description, &policy, details.as_ref())
            .await?;

        self.history.begin(order_id, message.clone());

        Ok(RefundOutcome::Initiated {
            message,
            tracking_id: order_id.to_string(),
        })
    }

    async fn try_handle(
        &self,
        order_id: &str,
        response: &str,
        platform: &str,
    ) -> Result<RefundOutcome, AgentError> {
        if !self.history.contains(order_id) {
            return Ok(RefundOutcome::Error {
                message: "No active refund request found".to_string(),
            });
        }

        let policy = self.policy_source.fetch(platform).await;
        let analysis = self.response_interpreter.analyze(response, &policy).await;

        self.history.append(order_id, response.to_string());

        // Approval is checked first and short-circuits escalation.
        if analysis.approved {
            return Ok(RefundOutcome::Success {
                message: "Refund approved".to_string(),
                details: analysis,
            });
        }

        if analysis.needs_escalation {
            let conversation = self.history.snapshot(order_id).unwrap_or_default();
            let escalation = self
                .message_composer
                .compose_escalation(response, &policy, &conversation)
                .await?;
            self.history.append(order_id, escalation.clone());

            return Ok(RefundOutcome::Escalated {
                message: escalation,
                details: analysis,
            });
        }

        Ok(RefundOutcome::Rejected {
            message: "Refund request rejected".to_string(),
            details: analysis,
        })
    }
}

/// Builder for [`RefundOrchestrator`].
pub struct RefundOrchestratorBuilder {
    policy_source: Option<Arc<dyn PolicySource>>,
    evidence_extractor: Option<Arc<dyn EvidenceExtractor>>,
    message_composer: Option<Arc<dyn MessageComposer>>,
    response_interpreter: Option<Arc<dyn ResponseInterpreter>>,
}

impl RefundOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            policy_source: None,
            evidence_extractor: None,
            message_composer: None,
            response_interpreter: None,
        }
    }

    pub fn policy_source(mut self, source: Arc<dyn PolicySource>) -> Self {
        self.policy_source = Some(source);
        self
    }

    pub fn evidence_extractor(mut self, extractor: Arc<dyn EvidenceExtractor>) -> Self {
        self.evidence_extractor = Some(extractor);
        self
    }

    pub fn message_composer(mut self, composer: Arc<dyn MessageComposer>) -> Self {
        self.message_composer = Some(composer);
        self
    }

    pub fn response_interpreter(mut self, interpreter: Arc<dyn ResponseInterpreter>) -> Self {
        self.response_interpreter = Some(interpreter);
        self
    }

    pub fn build(self) -> Result<RefundOrchestrator, BuildError> {
        Ok(RefundOrchestrator {
            policy_source: self
                .policy_source
                .ok_or(BuildError::MissingCapability("policy source"))?,
            evidence_extractor: self
                .evidence_extractor
                .ok_or(BuildError::MissingCapability("evidence extractor"))?,
            message_composer: self
                .message_composer
                .ok_or(BuildError::MissingCapability("message composer"))?,
            response_interpreter: self
                .response_interpreter
                .ok_or(BuildError::MissingCapability("response interpreter"))?,
            history: ConversationHistory::new(),
        })
    }
}

impl Default for RefundOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
