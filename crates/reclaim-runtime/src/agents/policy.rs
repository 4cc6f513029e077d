//! LLM-backed policy source.
//!
//! Fetches a platform's policy page, strips it to text, and asks the model
//! to structure it. The policy is re-derived on every call: results are not
//! cached, so orchestrator operations always see the freshest reading.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use reclaim_core::{fallback_policy, RefundPolicy};

use crate::agents::{AgentError, PolicySource};
use crate::prompts;
use crate::providers::{extract_json, ChatMessage, CompletionConfig, LlmProvider};

lazy_static! {
    static ref SCRIPT_RE: Regex =
        Regex::new(r"(?is)<(script|style)\b.*?</(script|style)>").expect("valid regex");
    static ref TAG_RE: Regex = Regex::new(r"(?s)<[^>]*>").expect("valid regex");
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").expect("valid regex");
}

/// Policy source backed by a web fetch and one structuring call.
pub struct LlmPolicySource {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
    http: reqwest::Client,
    policy_urls: BTreeMap<&'static str, &'static str>,
}

impl LlmPolicySource {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        let mut policy_urls = BTreeMap::new();
        policy_urls.insert(
            "amazon",
            "https://www.amazon.com/gp/help/customer/display.html?nodeId=GKM69DUUYKQWKWX7",
        );
        policy_urls.insert(
            "ubereats",
            "https://help.uber.com/ubereats/article/uber-eats-refund-policy",
        );
        policy_urls.insert(
            "airbnb",
            "https://www.airbnb.com/help/article/1320/airbnb-guest-refund-policy",
        );

        // Timeout lives on the transport; the orchestrator imposes none.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();

        Self {
            provider,
            config,
            http,
            policy_urls,
        }
    }

    /// Platforms with a configured policy page.
    pub fn known_platforms(&self) -> impl Iterator<Item = &str> {
        self.policy_urls.keys().copied()
    }

    async fn fetch_live(&self, platform: &str) -> Result<RefundPolicy, AgentError> {
        let url = self
            .policy_urls
            .get(platform)
            .ok_or_else(|| AgentError::Internal(format!("no policy URL for '{platform}'")))?;

        let html = self
            .http
            .get(*url)
            .send()
            .await
            .map_err(|e| AgentError::LlmError(format!("policy page fetch failed: {e}")))?
            .text()
            .await
            .map_err(|e| AgentError::LlmError(format!("policy page unreadable: {e}")))?;

        let policy_text = html_to_text(&html);

        let messages = vec![
            ChatMessage::system(prompts::POLICY_SYSTEM_PROMPT),
            ChatMessage::user(prompts::policy_prompt(platform, &policy_text)),
        ];
        let completion = self
            .provider
            .complete(messages, &self.config)
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        Ok(assemble_policy(platform, policy_text, &completion.content))
    }
}

#[derive(Debug, Deserialize)]
struct PolicyAnalysis {
    eligibility_criteria: BTreeMap<String, String>,
    time_limits: BTreeMap<String, u32>,
    required_evidence: Vec<String>,
}

/// Build a policy from the fetched page text and the model's analysis.
///
/// An unparsable analysis keeps the real page text and borrows the fallback
/// policy's structured fields, so a flaky model never discards a good fetch.
fn assemble_policy(platform: &str, policy_text: String, model_output: &str) -> RefundPolicy {
    let analysis = extract_json(model_output)
        .and_then(|json| serde_json::from_str::<PolicyAnalysis>(json).ok());

    match analysis {
        Some(analysis) => RefundPolicy {
            platform: platform.to_string(),
            policy_text,
            eligibility_criteria: analysis.eligibility_criteria,
            time_limits: analysis.time_limits,
            required_evidence: analysis.required_evidence,
        },
        None => {
            tracing::warn!(platform, "policy analysis was not valid JSON, using defaults");
            RefundPolicy {
                policy_text,
                ..fallback_policy(platform)
            }
        }
    }
}

/// Strip markup from a policy page, keeping readable text.
fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_scripts, " ");
    WHITESPACE_RE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

#[async_trait]
impl PolicySource for LlmPolicySource {
    async fn fetch(&self, platform: &str) -> RefundPolicy {
        match self.fetch_live(platform).await {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!(platform, error = %e, "policy fetch failed, using fallback policy");
                fallback_policy(platform)
            }
        }
    }
}
