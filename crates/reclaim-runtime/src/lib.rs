//! # reclaim-runtime
//!
//! LLM-assisted runtime for the Reclaim refund agent.
//!
//! This crate provides the four capability implementations the orchestrator
//! drives (policy fetching, evidence processing, message composition, and
//! response interpretation). Each is a single prompt-and-parse round trip
//! with a deterministic fallback from `reclaim-core` when the call or its
//! JSON parsing fails.
//!
//! ## Degradation contract
//!
//! - Policy fetching, evidence processing, and response interpretation never
//!   surface errors; they fall back internally.
//! - Message composition may fail; the orchestrator converts the failure to
//!   a structured `error` outcome.
//! - Nothing retries and nothing is fatal: every failure degrades to a
//!   best-effort structured response.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reclaim_runtime::{
//!     CompletionConfig, LlmEvidenceExtractor, LlmMessageComposer,
//!     LlmPolicySource, LlmResponseInterpreter, OpenAiProvider,
//!     RefundOrchestrator,
//! };
//!
//! let provider = Arc::new(OpenAiProvider::from_env()?);
//! let config = CompletionConfig::default();
//!
//! let agent = RefundOrchestrator::builder()
//!     .policy_source(Arc::new(LlmPolicySource::new(provider.clone(), config.clone())))
//!     .evidence_extractor(Arc::new(LlmEvidenceExtractor::new(provider.clone(), config.clone())))
//!     .message_composer(Arc::new(LlmMessageComposer::new(provider.clone(), config.clone())))
//!     .response_interpreter(Arc::new(LlmResponseInterpreter::new(provider, config)))
//!     .build()?;
//!
//! let outcome = agent.initiate_refund("amazon", "ORD-1", "item damaged", None).await;
//! ```

pub mod agents;
pub mod orchestrator;
pub mod prompts;
pub mod providers;

pub use agents::{
    AgentError, EvidenceExtractor, LlmEvidenceExtractor, LlmMessageComposer, LlmPolicySource,
    LlmResponseInterpreter, MessageComposer, PolicySource, ResponseInterpreter, TextRecognizer,
    Utf8Recognizer,
};
pub use orchestrator::{BuildError, RefundOrchestrator, RefundOrchestratorBuilder, RefundOutcome};
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, CredentialSource,
    LlmProvider, ProviderError, TokenUsage,
};

#[cfg(feature = "anthropic")]
pub use providers::AnthropicProvider;
#[cfg(feature = "openai")]
pub use providers::OpenAiProvider;
