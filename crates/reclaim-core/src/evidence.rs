//! Evidence records extracted from receipts, plus the deterministic
//! validator used when LLM validation is unavailable.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::policy::RefundPolicy;

/// A single purchased item as read off a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    pub price: Option<f64>,
}

/// Structured order details extracted from a receipt artifact.
///
/// Produced once per receipt and never mutated afterwards; validation and
/// message composition only read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub order_id: Option<String>,
    /// Purchase date as written on the receipt (ideally RFC 3339).
    pub date: Option<String>,
    pub total_amount: Option<f64>,
    pub merchant: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub payment_method: Option<String>,
    pub delivery_status: Option<String>,

    /// When extraction ran.
    pub processed_at: DateTime<Utc>,
    /// Confidence in the recognized receipt text, in [0, 1].
    pub text_confidence: f64,
    /// Set when extraction failed and the record carries no real data.
    pub extraction_failed: bool,
}

impl EvidenceRecord {
    /// Record returned when receipt processing fails entirely.
    ///
    /// All data fields are empty, confidence is zero, and the error flag is
    /// set so downstream consumers can tell this apart from a sparse but
    /// genuine receipt.
    pub fn extraction_failure() -> Self {
        Self {
            order_id: None,
            date: None,
            total_amount: None,
            merchant: None,
            items: Vec::new(),
            payment_method: None,
            delivery_status: None,
            processed_at: Utc::now(),
            text_confidence: 0.0,
            extraction_failed: true,
        }
    }

    /// String renderings of every populated data field.
    ///
    /// Used by the deterministic validator for case-insensitive substring
    /// matching against a policy's required-evidence list.
    pub fn field_strings(&self) -> Vec<String> {
        let mut fields = Vec::new();
        let mut push = |value: &Option<String>| {
            if let Some(v) = value {
                fields.push(v.clone());
            }
        };

        push(&self.order_id);
        push(&self.date);
        push(&self.merchant);
        push(&self.payment_method);
        push(&self.delivery_status);

        if let Some(total) = self.total_amount {
            fields.push(total.to_string());
        }
        for item in &self.items {
            fields.push(item.description.clone());
            if let Some(price) = item.price {
                fields.push(price.to_string());
            }
        }

        fields
    }
}

/// Estimate confidence in recognized receipt text.
///
/// Cheap signal counting: currency markers, digits, and words longer than
/// two characters, capped at 1.0. Empty text scores zero.
pub fn text_confidence(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let currency_markers = text.matches('$').count();
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
    let words = text.split_whitespace().filter(|w| w.len() > 2).count();

    let score = (currency_markers + digits + words) as f64 / 100.0;
    score.min(1.0)
}

/// Deterministic evidence validation against a policy.
///
/// Passes when (a) every required-evidence keyword appears case-insensitively
/// as a substring of at least one field's string form, and (b) if the record's
/// date parses, the elapsed hours since it do not exceed the policy's
/// standard window. A missing standard window means unlimited; a date that
/// does not parse gets the benefit of the doubt and counts as time-valid.
pub fn validate_evidence(record: &EvidenceRecord, policy: &RefundPolicy) -> bool {
    let fields: Vec<String> = record
        .field_strings()
        .iter()
        .map(|f| f.to_lowercase())
        .collect();

    let missing: Vec<&str> = policy
        .required_evidence
        .iter()
        .filter(|required| {
            let needle = required.to_lowercase();
            !fields.iter().any(|field| field.contains(&needle))
        })
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        tracing::debug!(?missing, "evidence missing required items");
        return false;
    }

    within_standard_window(record, policy)
}

fn within_standard_window(record: &EvidenceRecord, policy: &RefundPolicy) -> bool {
    let Some(limit_hours) = policy.standard_limit_hours() else {
        return true;
    };
    let Some(raw_date) = record.date.as_deref() else {
        return true;
    };
    let Some(purchased_at) = parse_receipt_date(raw_date) else {
        // Unparseable dates are not held against the customer.
        return true;
    };

    let elapsed_hours = (Utc::now() - purchased_at).num_hours();
    elapsed_hours <= i64::from(limit_hours)
}

/// Parse a receipt date, accepting RFC 3339 or a bare `YYYY-MM-DD`.
fn parse_receipt_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = raw.parse::<DateTime<Utc>>() {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::fallback_policy;
    use chrono::Duration;

    fn record_with_fields() -> EvidenceRecord {
        EvidenceRecord {
            order_id: Some("order number: 123".to_string()),
            date: None,
            total_amount: Some(25.99),
            merchant: Some("Acme".to_string()),
            items: vec![LineItem {
                description: "Photos of damaged items attached".to_string(),
                price: None,
            }],
            payment_method: Some("visa".to_string()),
            delivery_status: Some("Description of issue: box crushed".to_string()),
            processed_at: Utc::now(),
            text_confidence: 0.8,
            extraction_failed: false,
        }
    }

    #[test]
    fn extraction_failure_is_flagged_and_empty() {
        let record = EvidenceRecord::extraction_failure();

        assert!(record.extraction_failed);
        assert_eq!(record.text_confidence, 0.0);
        assert!(record.order_id.is_none());
        assert!(record.items.is_empty());
        assert!(record.field_strings().is_empty());
    }

    #[test]
    fn validation_passes_when_required_substrings_present() {
        let policy = fallback_policy("amazon");
        assert!(validate_evidence(&record_with_fields(), &policy));
    }

    #[test]
    fn validation_fails_when_required_substrings_missing() {
        let policy = fallback_policy("amazon");
        let mut record = record_with_fields();
        record.order_id = Some("123".to_string());

        // "Order number" no longer appears in any field.
        assert!(!validate_evidence(&record, &policy));
    }

    #[test]
    fn validation_fails_when_all_required_substrings_missing() {
        let policy = fallback_policy("amazon");
        let record = EvidenceRecord::extraction_failure();

        assert!(!validate_evidence(&record, &policy));
    }

    #[test]
    fn validation_fails_outside_standard_window() {
        let policy = fallback_policy("amazon");
        let mut record = record_with_fields();
        record.date = Some((Utc::now() - Duration::days(45)).to_rfc3339());

        assert!(!validate_evidence(&record, &policy));
    }

    #[test]
    fn recent_purchase_is_time_valid() {
        let policy = fallback_policy("amazon");
        let mut record = record_with_fields();
        record.date = Some((Utc::now() - Duration::days(2)).to_rfc3339());

        assert!(validate_evidence(&record, &policy));
    }

    #[test]
    fn malformed_date_gets_benefit_of_the_doubt() {
        let policy = fallback_policy("amazon");
        let mut record = record_with_fields();
        record.date = Some("sometime last week".to_string());

        assert!(validate_evidence(&record, &policy));
    }

    #[test]
    fn missing_standard_limit_means_unlimited() {
        let mut policy = fallback_policy("amazon");
        policy.time_limits.remove("standard");

        let mut record = record_with_fields();
        record.date = Some("2019-01-01".to_string());

        assert!(validate_evidence(&record, &policy));
    }

    #[test]
    fn bare_date_format_is_accepted() {
        assert!(parse_receipt_date("2026-07-01").is_some());
        assert!(parse_receipt_date("2026-07-01T10:30:00Z").is_some());
        assert!(parse_receipt_date("last tuesday").is_none());
    }

    #[test]
    fn text_confidence_scores_reasonably() {
        assert_eq!(text_confidence(""), 0.0);

        let receipt = "Total: $25.99 paid with card ending 4242 on 2026-07-01";
        let score = text_confidence(receipt);
        assert!(score > 0.0 && score <= 1.0);

        // Dense receipts saturate at 1.0.
        let dense = "$1 $2 $3 ".repeat(50);
        assert_eq!(text_confidence(&dense), 1.0);
    }
}
