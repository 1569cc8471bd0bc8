// The `llm` module holds the upstream capabilities and the orchestration
// around them: the retrying caller and the cascading selector.

pub mod adapters;
pub mod cascade;
pub mod classify;
pub mod config;
pub mod core;
pub mod decorators;
pub mod factory;
pub mod gemini;

pub use cascade::{
    Artifact, CandidateAttempt, CandidateModel, CandidateStatus, CascadeOutcome,
    CascadingSelector, GenerationOutcome, first_inline_image, perform_cascade,
};
pub use classify::{FailureClass, TransientSignals, classify};
pub use config::RetryPolicy;
pub use self::core::{
    CandidateInvoker, GenerationResponse, InlineImage, LLM, LLMError, Prompt, ResponsePart,
};
pub use decorators::{
    CallAttempt, RetryReport, RetryingLLM, perform_with_retry, perform_with_retry_report,
};
pub use factory::LLMFactory;
pub use gemini::GeminiClient;
