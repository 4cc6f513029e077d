//! Structured verdicts on platform replies, plus the keyword fallback
//! analyzer used when the LLM round trip fails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version tag stamped on LLM-derived analyses.
pub const ANALYSIS_VERSION: &str = "1.0";

/// Version tag stamped on keyword-fallback analyses.
pub const FALLBACK_ANALYSIS_VERSION: &str = "1.0-fallback";

const APPROVAL_KEYWORDS: &[&str] = &["approved", "accepted", "processed", "refunded"];
const DENIAL_KEYWORDS: &[&str] = &["denied", "rejected", "cannot", "policy", "unfortunately"];

/// Structured interpretation of one platform reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseAnalysis {
    /// The platform approved the refund.
    pub approved: bool,

    /// The reply warrants an escalation message.
    pub needs_escalation: bool,

    /// Main points made in the reply.
    #[serde(default)]
    pub key_points: Vec<String>,

    /// Policy terms the reply appears to violate.
    #[serde(default)]
    pub policy_violations: Vec<String>,

    /// Recommended next action for a human reviewer.
    #[serde(default)]
    pub suggested_action: String,

    /// Confidence in the verdict, in [0, 1].
    pub confidence: f64,

    pub analyzed_at: DateTime<Utc>,
    pub response_length: usize,
    pub analysis_version: String,
}

/// Keyword heuristic applied when the LLM call or its JSON parsing fails.
///
/// Approval wins: denial keywords only mark the reply for escalation when no
/// approval keyword is present.
pub fn keyword_analysis(response: &str) -> ResponseAnalysis {
    let lowered = response.to_lowercase();

    let approved = APPROVAL_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    let denial = DENIAL_KEYWORDS.iter().any(|kw| lowered.contains(kw));

    ResponseAnalysis {
        approved,
        needs_escalation: denial && !approved,
        key_points: vec!["Fallback analysis - basic keyword matching used".to_string()],
        policy_violations: Vec::new(),
        suggested_action: if approved {
            "None needed".to_string()
        } else {
            "Manual review needed".to_string()
        },
        confidence: 0.5,
        analyzed_at: Utc::now(),
        response_length: response.len(),
        analysis_version: FALLBACK_ANALYSIS_VERSION.to_string(),
    }
}
