//! Capability traits the orchestrator drives.
//!
//! Four roles, one concrete LLM-backed implementation each. Fallback duties
//! differ by role: policy fetching, evidence processing, and response
//! interpretation must degrade internally and never surface an error;
//! message composition is allowed to fail and the orchestrator converts the
//! failure to a structured error outcome.

use async_trait::async_trait;
use thiserror::Error;

use reclaim_core::{EvidenceRecord, RefundPolicy, ResponseAnalysis};

/// Errors from capability implementations.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    LlmError(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Unreadable input: {0}")]
    UnreadableInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Source of structured refund policies.
#[async_trait]
pub trait PolicySource: Send + Sync {
    /// Fetch the refund policy for a platform.
    ///
    /// Never fails: implementations fall back to a fixed default policy when
    /// the live policy cannot be fetched or structured.
    async fn fetch(&self, platform: &str) -> RefundPolicy;
}

/// Turns receipt artifacts into evidence records and checks them against
/// policy requirements.
#[async_trait]
pub trait EvidenceExtractor: Send + Sync {
    /// Extract structured order details from raw receipt bytes.
    ///
    /// Never fails: on any processing error the returned record has its
    /// `extraction_failed` flag set and carries no data.
    async fn extract(&self, receipt: &[u8]) -> EvidenceRecord;

    /// Whether the record satisfies the policy's evidence requirements.
    ///
    /// Never fails: implementations degrade to the deterministic substring
    /// and time-window validator.
    async fn validate(&self, record: &EvidenceRecord, policy: &RefundPolicy) -> bool;
}

/// Drafts refund request and escalation messages.
#[async_trait]
pub trait MessageComposer: Send + Sync {
    /// Draft the initial refund request.
    ///
    /// `details` is the extracted evidence record, absent when the customer
    /// supplied no receipt.
    async fn compose_request(
        &self,
        issue_description: &str,
        policy: &RefundPolicy,
        details: Option<&EvidenceRecord>,
    ) -> Result<String, AgentError>;

    /// Draft a follow-up that escalates a rejection.
    ///
    /// `history` is the order's full conversation so far, oldest first.
    async fn compose_escalation(
        &self,
        previous_response: &str,
        policy: &RefundPolicy,
        history: &[String],
    ) -> Result<String, AgentError>;
}

/// Classifies platform replies.
#[async_trait]
pub trait ResponseInterpreter: Send + Sync {
    /// Interpret a platform reply against the policy.
    ///
    /// Never fails: implementations degrade to keyword matching.
    async fn analyze(&self, response: &str, policy: &RefundPolicy) -> ResponseAnalysis;
}
