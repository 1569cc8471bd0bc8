/// LLM decorators for adding functionality to base LLM implementations.
///
/// Decorators implement the `LLM` trait themselves and wrap another
/// implementation, adding their behaviour transparently.
///
/// # Available Decorators
///
/// - **Retry**: bounded exponential backoff on transient upstream failures
pub mod retry;

pub use retry::{
    AttemptOutcome, CallAttempt, RetryReport, RetryingLLM, perform_with_retry,
    perform_with_retry_report,
};
