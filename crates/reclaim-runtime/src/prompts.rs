//! Prompt templates for the four LLM round trips.
//!
//! Each capability makes exactly one prompt-and-parse call. The system
//! prompts pin the output contract (JSON keys, or plain prose for the
//! composer); the builder functions splice in the per-request data.

use reclaim_core::{EvidenceRecord, RefundPolicy};

/// Character budget for policy text spliced into prompts.
pub const POLICY_TEXT_BUDGET: usize = 2000;

/// Shorter excerpt used where the policy is context, not the subject.
pub const POLICY_SUMMARY_BUDGET: usize = 500;

/// System prompt for structuring a fetched policy page.
pub const POLICY_SYSTEM_PROMPT: &str = r#"
You extract structured refund policies from web page text.

Respond ONLY with a JSON object with these keys:
- eligibility_criteria: object mapping condition name to description
- time_limits: object mapping category name to a whole number of hours
- required_evidence: array of required documents or evidence

Do not invent terms the page does not state. If the page text is unusable,
still return the JSON object with your best conservative reading.
"#;

/// System prompt for structuring recognized receipt text.
pub const RECEIPT_SYSTEM_PROMPT: &str = r#"
You extract order details from receipt text.

Respond ONLY with a JSON object with these keys:
- order_id: string or null (any order/transaction ID)
- date: string or null (purchase date, ISO format preferred)
- total_amount: number or null
- merchant: string or null
- items: array of {"description": string, "price": number or null}
- payment_method: string or null
- delivery_status: string or null

Use null for anything the receipt does not show. Never guess values.
"#;

/// System prompt for evidence-vs-policy validation.
pub const VALIDATION_SYSTEM_PROMPT: &str = r#"
You check whether refund evidence satisfies a platform's policy.

Respond ONLY with a JSON object with these keys:
- meets_requirements: boolean
- missing_items: array of missing requirements
- time_valid: boolean
- validation_notes: array of short notes
"#;

/// System prompt for drafting customer-to-platform messages.
pub const COMPOSER_SYSTEM_PROMPT: &str = r#"
You write messages from a customer to a platform's support team.
Write only the message body: no subject line, no surrounding commentary.
"#;

/// System prompt for classifying platform replies.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"
You classify a platform's reply to a refund request.

Respond ONLY with a JSON object with these keys:
- approved: boolean (the refund was granted)
- needs_escalation: boolean (denied, but worth escalating)
- key_points: array of the reply's main points
- policy_violations: array of policy terms the reply conflicts with
- suggested_action: string (next recommended action)
- confidence: number between 0 and 1
"#;

/// User prompt asking for a policy page to be structured.
pub fn policy_prompt(platform: &str, page_text: &str) -> String {
    let excerpt = truncate_chars(page_text, POLICY_TEXT_BUDGET);
    format!(
        "Analyze this {platform} refund policy and extract eligibility \
         criteria, time limits in hours, and required evidence.\n\n\
         Policy Text:\n{excerpt}"
    )
}

/// User prompt asking for receipt text to be structured.
pub fn receipt_prompt(receipt_text: &str) -> String {
    format!("Extract key information from this receipt text:\n\n{receipt_text}")
}

/// User prompt asking whether evidence satisfies a policy.
pub fn validation_prompt(record: &EvidenceRecord, policy: &RefundPolicy) -> String {
    let evidence_json =
        serde_json::to_string(record).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Determine if this evidence meets the refund policy requirements.\n\n\
         Evidence:\n{evidence_json}\n\n\
         Policy Requirements:\n\
         Required Evidence: {:?}\n\
         Time Limits (hours): {:?}\n\
         Eligibility Criteria: {:?}",
        policy.required_evidence, policy.time_limits, policy.eligibility_criteria
    )
}

/// User prompt asking for an initial refund request.
pub fn request_prompt(
    issue_description: &str,
    policy: &RefundPolicy,
    details: Option<&EvidenceRecord>,
) -> String {
    let order_details = details
        .and_then(|d| serde_json::to_string(d).ok())
        .unwrap_or_else(|| "none provided".to_string());
    format!(
        "Generate a professional refund request based on:\n\n\
         Issue: {issue_description}\n\
         Order Details: {order_details}\n\
         Platform Policy: {}\n\n\
         Requirements:\n\
         1. Professional and courteous tone\n\
         2. Reference specific policy points that support the request\n\
         3. Include all relevant order details\n\
         4. Clear statement of desired resolution",
        policy.text_excerpt(POLICY_TEXT_BUDGET)
    )
}

/// User prompt asking for an escalation of a rejection.
pub fn escalation_prompt(
    previous_response: &str,
    policy: &RefundPolicy,
    history: &[String],
) -> String {
    let history_json =
        serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string());
    format!(
        "Generate an escalation message based on:\n\n\
         Previous Response: {previous_response}\n\
         Platform Policy: {}\n\
         Conversation History: {history_json}\n\n\
         Requirements:\n\
         1. Professional but firm tone\n\
         2. Address specific points from the rejection\n\
         3. Cite relevant policies or consumer rights\n\
         4. Clear escalation request (e.g., supervisor review)",
        policy.text_excerpt(POLICY_TEXT_BUDGET)
    )
}

/// User prompt asking for a platform reply to be classified.
pub fn analysis_prompt(response: &str, policy: &RefundPolicy) -> String {
    format!(
        "Analyze this response to a refund request.\n\n\
         Platform: {}\n\
         Response: {response}\n\
         Platform Policy Summary: {}",
        policy.platform,
        policy.text_excerpt(POLICY_SUMMARY_BUDGET)
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    let end = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}
