//! Refund policy model and the deterministic fallback policy.
//!
//! A `RefundPolicy` is fetched fresh for every orchestrator operation and is
//! never mutated after construction. When the live policy cannot be fetched
//! or structured, `fallback_policy` supplies a fixed conservative policy so
//! the rest of the pipeline always has something to work with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Time-limit category applied when no more specific category matches.
pub const STANDARD_LIMIT: &str = "standard";

/// A platform's refund policy in structured form.
///
/// Maps use `BTreeMap` so serialized policies and prompt renderings are
/// deterministic for identical inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundPolicy {
    /// Platform identifier, e.g. "amazon".
    pub platform: String,

    /// Raw policy text the structured fields were derived from.
    pub policy_text: String,

    /// Condition name -> human-readable description.
    pub eligibility_criteria: BTreeMap<String, String>,

    /// Category -> window in hours.
    pub time_limits: BTreeMap<String, u32>,

    /// Evidence the platform expects, in the order it should be presented.
    pub required_evidence: Vec<String>,
}

impl RefundPolicy {
    /// Hour window for the standard category, if the policy defines one.
    pub fn standard_limit_hours(&self) -> Option<u32> {
        self.time_limits.get(STANDARD_LIMIT).copied()
    }

    /// First few hundred characters of the policy text, for prompt budgets.
    pub fn text_excerpt(&self, max_chars: usize) -> &str {
        let end = self
            .policy_text
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(self.policy_text.len());
        &self.policy_text[..end]
    }
}

/// Deterministic policy used whenever the live policy cannot be obtained.
///
/// Pure function of the platform id: calling it twice for the same platform
/// yields equal values.
pub fn fallback_policy(platform: &str) -> RefundPolicy {
    let mut eligibility_criteria = BTreeMap::new();
    eligibility_criteria.insert("damaged".to_string(), "Item received damaged".to_string());
    eligibility_criteria.insert(
        "not_as_described".to_string(),
        "Item not as described".to_string(),
    );
    eligibility_criteria.insert("not_received".to_string(), "Item not received".to_string());

    let mut time_limits = BTreeMap::new();
    time_limits.insert(STANDARD_LIMIT.to_string(), 30 * 24);
    time_limits.insert("damaged".to_string(), 48);
    time_limits.insert("not_received".to_string(), 7 * 24);

    RefundPolicy {
        platform: platform.to_string(),
        policy_text: "Standard refund policy applies".to_string(),
        eligibility_criteria,
        time_limits,
        required_evidence: vec![
            "Order number".to_string(),
            "Photos of damaged items".to_string(),
            "Description of issue".to_string(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fallback_policy_has_expected_windows() {
        let policy = fallback_policy("some-marketplace");

        assert_eq!(policy.platform, "some-marketplace");
        assert_eq!(policy.standard_limit_hours(), Some(720));
        assert_eq!(policy.time_limits.get("damaged"), Some(&48));
        assert_eq!(policy.time_limits.get("not_received"), Some(&168));
        assert_eq!(policy.required_evidence.len(), 3);
    }

    #[test]
    fn fallback_policy_is_idempotent() {
        assert_eq!(fallback_policy("ubereats"), fallback_policy("ubereats"));
    }

    #[test]
    fn text_excerpt_respects_char_boundaries() {
        let mut policy = fallback_policy("amazon");
        policy.policy_text = "héllo wörld".to_string();

        assert_eq!(policy.text_excerpt(5), "héllo");
        assert_eq!(policy.text_excerpt(500), "héllo wörld");
    }

    #[test]
    fn policy_round_trips_through_json() {
        let policy = fallback_policy("airbnb");
        let json = serde_json::to_string(&policy).unwrap();
        let back: RefundPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(policy, back);
    }

    proptest! {
        #[test]
        fn fallback_policy_is_pure(platform in "[a-z0-9_-]{1,24}") {
            prop_assert_eq!(fallback_policy(&platform), fallback_policy(&platform));
        }
    }
}
