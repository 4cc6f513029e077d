//! Capability traits and their LLM-backed implementations.
//!
//! Each implementation makes exactly one prompt-and-parse round trip and
//! owns its own fallback; the orchestrator never sees a provider error from
//! the infallible capabilities.

mod composer;
mod evidence;
mod interpreter;
mod policy;
mod traits;

pub use composer::LlmMessageComposer;
pub use evidence::{LlmEvidenceExtractor, TextRecognizer, Utf8Recognizer};
pub use interpreter::LlmResponseInterpreter;
pub use policy::LlmPolicySource;
pub use traits::{
    AgentError, EvidenceExtractor, MessageComposer, PolicySource, ResponseInterpreter,
};
