use crate::llm::config::RetryPolicy;
use crate::llm::core::LLM;
use crate::llm::decorators::RetryingLLM;

/// Factory for creating LLM instances with optional decorators.
///
/// Request handlers only ever see a `Box<dyn LLM>`; whether the model
/// underneath retries transient failures is decided here, from configuration.
pub struct LLMFactory;

impl LLMFactory {
    /// Create an LLM instance with optional retry decoration.
    ///
    /// # Arguments
    ///
    /// * `base_llm` - The base LLM implementation to potentially wrap
    /// * `retry_policy` - Optional retry policy. `None`, or a policy allowing a
    ///   single attempt, returns the base LLM unchanged.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use nanogate::llm::{LLMFactory, RetryPolicy};
    ///
    /// // No retry
    /// let llm = LLMFactory::create(base_llm, None);
    ///
    /// // With retry
    /// let llm = LLMFactory::create(base_llm, Some(RetryPolicy::default()));
    /// ```
    pub fn create(base_llm: Box<dyn LLM>, retry_policy: Option<RetryPolicy>) -> Box<dyn LLM> {
        match retry_policy {
            Some(policy) if policy.retries_enabled() => {
                tracing::debug!(
                    max_attempts = policy.attempts(),
                    initial_delay_ms = policy.initial_delay.as_millis() as u64,
                    multiplier = policy.multiplier,
                    signals = ?policy.transient.patterns(),
                    "Wrapping LLM with retry decorator"
                );
                Box::new(RetryingLLM::new(base_llm, policy))
            }
            Some(_) => {
                tracing::debug!("Retry policy allows a single attempt, using base LLM without retry");
                base_llm
            }
            None => {
                tracing::debug!("No retry policy provided, using base LLM without retry");
                base_llm
            }
        }
    }
}
