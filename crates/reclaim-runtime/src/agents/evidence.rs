//! LLM-backed evidence extraction and validation.
//!
//! Receipt bytes pass through a [`TextRecognizer`] seam first; image OCR is
//! an external collaborator behind that trait, and the default recognizer
//! simply reads the bytes as UTF-8 (plain-text and email receipts).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use reclaim_core::{
    text_confidence, validate_evidence, EvidenceRecord, LineItem, RefundPolicy,
};

use crate::agents::{AgentError, EvidenceExtractor};
use crate::prompts;
use crate::providers::{extract_json, ChatMessage, CompletionConfig, LlmProvider};

/// Turns raw receipt bytes into text.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, receipt: &[u8]) -> Result<String, AgentError>;
}

/// Recognizer for receipts that are already text.
#[derive(Debug, Default)]
pub struct Utf8Recognizer;

impl TextRecognizer for Utf8Recognizer {
    fn recognize(&self, receipt: &[u8]) -> Result<String, AgentError> {
        let text = std::str::from_utf8(receipt)
            .map_err(|e| AgentError::UnreadableInput(format!("receipt is not UTF-8: {e}")))?;
        Ok(text.trim().to_string())
    }
}

/// Evidence extractor backed by text recognition plus one structuring call.
pub struct LlmEvidenceExtractor {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
    recognizer: Box<dyn TextRecognizer>,
}

impl LlmEvidenceExtractor {
    /// Extractor with the default UTF-8 text recognizer.
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self::with_recognizer(provider, config, Box::new(Utf8Recognizer))
    }

    /// Extractor with a custom recognizer (e.g. an OCR integration).
    pub fn with_recognizer(
        provider: Arc<dyn LlmProvider>,
        config: CompletionConfig,
        recognizer: Box<dyn TextRecognizer>,
    ) -> Self {
        Self {
            provider,
            config,
            recognizer,
        }
    }

    async fn extract_inner(&self, receipt: &[u8]) -> Result<EvidenceRecord, AgentError> {
        let receipt_text = self.recognizer.recognize(receipt)?;

        let messages = vec![
            ChatMessage::system(prompts::RECEIPT_SYSTEM_PROMPT),
            ChatMessage::user(prompts::receipt_prompt(&receipt_text)),
        ];
        let completion = self
            .provider
            .complete(messages, &self.config)
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        let json = extract_json(&completion.content).ok_or_else(|| {
            AgentError::MalformedOutput("receipt extraction returned no JSON".to_string())
        })?;
        let extracted: ExtractedReceipt = serde_json::from_str(json)
            .map_err(|e| AgentError::MalformedOutput(e.to_string()))?;

        Ok(EvidenceRecord {
            order_id: extracted.order_id,
            date: extracted.date,
            total_amount: extracted.total_amount,
            merchant: extracted.merchant,
            items: extracted
                .items
                .into_iter()
                .map(|i| LineItem {
                    description: i.description,
                    price: i.price,
                })
                .collect(),
            payment_method: extracted.payment_method,
            delivery_status: extracted.delivery_status,
            processed_at: Utc::now(),
            text_confidence: text_confidence(&receipt_text),
            extraction_failed: false,
        })
    }

    async fn validate_inner(
        &self,
        record: &EvidenceRecord,
        policy: &RefundPolicy,
    ) -> Result<bool, AgentError> {
        let messages = vec![
            ChatMessage::system(prompts::VALIDATION_SYSTEM_PROMPT),
            ChatMessage::user(prompts::validation_prompt(record, policy)),
        ];
        let completion = self
            .provider
            .complete(messages, &self.config)
            .await
            .map_err(|e| AgentError::LlmError(e.to_string()))?;

        let json = extract_json(&completion.content).ok_or_else(|| {
            AgentError::MalformedOutput("validation returned no JSON".to_string())
        })?;
        let verdict: ValidationVerdict = serde_json::from_str(json)
            .map_err(|e| AgentError::MalformedOutput(e.to_string()))?;

        if !verdict.meets_requirements {
            tracing::warn!(missing = ?verdict.missing_items, "evidence validation failed");
        }

        Ok(verdict.meets_requirements)
    }
}

#[derive(Debug, Deserialize)]
struct ExtractedReceipt {
    order_id: Option<String>,
    date: Option<String>,
    total_amount: Option<f64>,
    merchant: Option<String>,
    #[serde(default)]
    items: Vec<ExtractedItem>,
    payment_method: Option<String>,
    delivery_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExtractedItem {
    description: String,
    #[serde(default)]
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ValidationVerdict {
    meets_requirements: bool,
    #[serde(default)]
    missing_items: Vec<String>,
    #[allow(dead_code)]
    #[serde(default)]
    time_valid: Option<bool>,
    #[allow(dead_code)]
    #[serde(default)]
    validation_notes: Vec<String>,
}

#[async_trait]
impl EvidenceExtractor for LlmEvidenceExtractor {
    async fn extract(&self, receipt: &[u8]) -> EvidenceRecord {
        match self.extract_inner(receipt).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "receipt processing failed, returning error record");
                EvidenceRecord::extraction_failure()
            }
        }
    }

    async fn validate(&self, record: &EvidenceRecord, policy: &RefundPolicy) -> bool {
        match self.validate_inner(record, policy).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(error = %e, "LLM validation failed, using deterministic validator");
                validate_evidence(record, policy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, ProviderError, TokenUsage};
    use reclaim_core::fallback_policy;

    struct CannedProvider {
        reply: Result<String, ()>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            match &self.reply {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    usage: TokenUsage::default(),
                    model: "canned".to_string(),
                }),
                Err(()) => Err(ProviderError::HttpError("down".to_string())),
            }
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn extractor(reply: Result<String, ()>) -> LlmEvidenceExtractor {
        LlmEvidenceExtractor::new(
            Arc::new(CannedProvider { reply }),
            CompletionConfig::default(),
        )
    }

    const RECEIPT_JSON: &str = r#"{
        "order_id": "ORD-42",
        "date": "2026-07-20",
        "total_amount": 25.99,
        "merchant": "Acme",
        "items": [{"description": "Mug", "price": 25.99}],
        "payment_method": "visa",
        "delivery_status": "delivered"
    }"#;

    #[tokio::test]
    async fn extraction_builds_record_from_model_json() {
        let extractor = extractor(Ok(RECEIPT_JSON.to_string()));
        let record = extractor.extract(b"Receipt: Mug $25.99 order ORD-42").await;

        assert!(!record.extraction_failed);
        assert_eq!(record.order_id.as_deref(), Some("ORD-42"));
        assert_eq!(record.total_amount, Some(25.99));
        assert_eq!(record.items.len(), 1);
        assert!(record.text_confidence > 0.0);
    }

    #[tokio::test]
    async fn provider_failure_yields_error_record() {
        let extractor = extractor(Err(()));
        let record = extractor.extract(b"Receipt: anything").await;

        assert!(record.extraction_failed);
        assert_eq!(record.text_confidence, 0.0);
    }

    #[tokio::test]
    async fn non_utf8_receipt_yields_error_record() {
        let extractor = extractor(Ok(RECEIPT_JSON.to_string()));
        let record = extractor.extract(&[0xff, 0xfe, 0x00]).await;

        assert!(record.extraction_failed);
    }

    #[tokio::test]
    async fn malformed_model_output_yields_error_record() {
        let extractor = extractor(Ok("I could not read that receipt.".to_string()));
        let record = extractor.extract(b"Receipt text").await;

        assert!(record.extraction_failed);
    }

    #[tokio::test]
    async fn validation_uses_model_verdict() {
        let extractor = extractor(Ok(
            r#"{"meets_requirements": false, "missing_items": ["Order number"]}"#.to_string(),
        ));
        let policy = fallback_policy("amazon");
        let record = EvidenceRecord::extraction_failure();

        assert!(!extractor.validate(&record, &policy).await);
    }

    #[tokio::test]
    async fn validation_falls_back_to_deterministic_check() {
        let extractor = extractor(Err(()));
        let policy = fallback_policy("amazon");

        let mut record = EvidenceRecord::extraction_failure();
        record.order_id = Some("order number: 123".to_string());
        record.merchant = Some("photos of damaged items enclosed".to_string());
        record.delivery_status = Some("description of issue: arrived broken".to_string());

        assert!(extractor.validate(&record, &policy).await);

        let empty = EvidenceRecord::extraction_failure();
        assert!(!extractor.validate(&empty, &policy).await);
    }

    #[test]
    fn utf8_recognizer_trims_text() {
        let recognizer = Utf8Recognizer;
        assert_eq!(recognizer.recognize(b"  hello \n").unwrap(), "hello");
        assert!(recognizer.recognize(&[0xff]).is_err());
    }
}
