//! # Retrying caller
//!
//! Bounded exponential backoff around a single upstream capability.
//!
//! - **Transient failures** (by default messages mentioning `503`,
//!   `overloaded` or `unavailable`) are retried after `initial_delay`,
//!   `initial_delay * multiplier`, ... until `max_attempts` invocations have
//!   been made. Running out of attempts yields [`LLMError::Overloaded`].
//! - **Any other failure** stops immediately with [`LLMError::Service`],
//!   which keeps the original message.
//! - **Success** returns the payload exactly as the capability produced it.
//!
//! Attempts are strictly sequential. The sleeps are driven by
//! `tokio_retry::RetryIf` using the policy's delay schedule.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nanogate::llm::{perform_with_retry, Prompt, RetryPolicy};
//!
//! let text = perform_with_retry(
//!     |prompt| client.prompt(prompt),
//!     Prompt::text("Tell me a joke"),
//!     &RetryPolicy::default(),
//! )
//! .await?;
//! ```

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::llm::classify::{FailureClass, classify};
use crate::llm::config::RetryPolicy;
use crate::llm::core::{LLM, LLMError, Prompt};

/// The outcome of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Succeeded,
    Failed { class: FailureClass, message: String },
}

/// One try at invoking the upstream capability.
#[derive(Debug, Clone, PartialEq)]
pub struct CallAttempt {
    /// 1-based attempt index.
    pub index: usize,
    /// Backoff slept before this attempt; zero for the first one.
    pub delay: Duration,
    pub outcome: AttemptOutcome,
}

/// Every attempt made by one retrying call, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryReport {
    pub attempts: Vec<CallAttempt>,
}

impl RetryReport {
    /// Sum of all backoff delays.
    pub fn total_delay(&self) -> Duration {
        self.attempts.iter().map(|attempt| attempt.delay).sum()
    }
}

struct ClassifiedFailure {
    class: FailureClass,
    error: LLMError,
}

/// Invokes `capability` under `policy` and returns the first success.
///
/// # Errors
///
/// * [`LLMError::Overloaded`] when every allowed attempt failed transiently.
/// * [`LLMError::Service`] (or the capability's own orchestration error) on
///   the first non-transient failure.
pub async fn perform_with_retry<F, Fut, T>(
    capability: F,
    prompt: Prompt,
    policy: &RetryPolicy,
) -> Result<T, LLMError>
where
    F: FnMut(Prompt) -> Fut,
    Fut: Future<Output = Result<T, LLMError>>,
{
    perform_with_retry_report(capability, prompt, policy)
        .await
        .0
}

/// Same as [`perform_with_retry`], also returning the list of attempts made.
pub async fn perform_with_retry_report<F, Fut, T>(
    mut capability: F,
    prompt: Prompt,
    policy: &RetryPolicy,
) -> (Result<T, LLMError>, RetryReport)
where
    F: FnMut(Prompt) -> Fut,
    Fut: Future<Output = Result<T, LLMError>>,
{
    let delays = policy.delays();
    let max_attempts = delays.len() + 1;
    let signals = &policy.transient;
    let made = AtomicUsize::new(0);
    let log = Mutex::new(Vec::with_capacity(max_attempts));

    let result = RetryIf::start(
        delays.clone(),
        || {
            let index = made.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = match index {
                1 => Duration::ZERO,
                n => delays.get(n - 2).copied().unwrap_or_default(),
            };
            let call = capability(prompt.clone());
            let log = &log;
            async move {
                let outcome = call.await;
                let attempt = match &outcome {
                    Ok(_) => {
                        debug!(attempt = index, max_attempts, "Upstream call succeeded");
                        CallAttempt {
                            index,
                            delay,
                            outcome: AttemptOutcome::Succeeded,
                        }
                    }
                    Err(error) => {
                        let class = classify(error, signals);
                        warn!(
                            attempt = index,
                            max_attempts,
                            ?class,
                            error = %error,
                            "Upstream call failed"
                        );
                        CallAttempt {
                            index,
                            delay,
                            outcome: AttemptOutcome::Failed {
                                class,
                                message: error.detail(),
                            },
                        }
                    }
                };
                if let Ok(mut log) = log.lock() {
                    log.push(attempt);
                }
                outcome.map_err(|error| ClassifiedFailure {
                    class: classify(&error, signals),
                    error,
                })
            }
        },
        |failure: &ClassifiedFailure| {
            let retry = failure.class == FailureClass::Transient;
            let attempt = made.load(Ordering::SeqCst);
            if retry && attempt < max_attempts {
                let delay = delays.get(attempt - 1).copied().unwrap_or_default();
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before next attempt"
                );
            }
            retry
        },
    )
    .await;

    let report = RetryReport {
        attempts: log
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner),
    };

    let result = result.map_err(|failure| match failure.class {
        FailureClass::Transient => {
            warn!(
                attempts = report.attempts.len(),
                "Upstream still overloaded after all attempts"
            );
            LLMError::Overloaded {
                attempts: report.attempts.len(),
            }
        }
        FailureClass::Fatal => match failure.error {
            LLMError::PromptError(message) => LLMError::Service(message),
            terminal => terminal,
        },
    });

    (result, report)
}

/// An `LLM` decorator that retries transient failures of the wrapped model.
///
/// # Example
///
/// ```rust,ignore
/// use nanogate::llm::{RetryingLLM, RetryPolicy, LLM, Prompt};
///
/// let model = RetryingLLM::new(gemini_client, RetryPolicy::default());
/// let reply = model.prompt(Prompt::text("Hello!")).await?;
/// ```
pub struct RetryingLLM<L: LLM> {
    inner: L,
    policy: RetryPolicy,
}

impl<L: LLM> RetryingLLM<L> {
    /// Wraps `inner` with the given retry policy.
    pub fn new(inner: L, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<L: LLM> LLM for RetryingLLM<L> {
    async fn prompt(&self, prompt: Prompt) -> Result<String, LLMError> {
        perform_with_retry(|prompt| self.inner.prompt(prompt), prompt, &self.policy).await
    }
}
