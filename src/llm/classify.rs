//! Failure classification for upstream calls.
//!
//! Providers report most conditions only through the error message, so the
//! classification is a case-insensitive substring match against a set of
//! signals. Only raw upstream failures (`LLMError::PromptError`) can be
//! transient; errors produced by the orchestration layer are final.

use crate::llm::core::LLMError;

/// Whether a failure warrants another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// A temporary condition such as an overloaded model.
    Transient,
    /// Anything else.
    Fatal,
}

const OVERLOAD_SIGNALS: &[&str] = &["503", "overloaded", "unavailable"];
const RATE_LIMIT_SIGNALS: &[&str] = &["429", "rate limit", "resource_exhausted"];
const NETWORK_SIGNALS: &[&str] = &[
    "timed out",
    "timeout",
    "connection reset",
    "connection refused",
];

/// The set of message fragments that mark a failure as transient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientSignals {
    patterns: Vec<String>,
}

impl Default for TransientSignals {
    /// Overload signals only: `503`, `overloaded`, `unavailable`.
    fn default() -> Self {
        Self::from_patterns(OVERLOAD_SIGNALS.iter().copied())
    }
}

impl TransientSignals {
    /// Builds a signal set from arbitrary fragments.
    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut signals = Self {
            patterns: Vec::new(),
        };
        signals.extend(patterns);
        signals
    }

    /// Also treat rate limiting (`429`, `RESOURCE_EXHAUSTED`) as transient.
    pub fn with_rate_limits(mut self) -> Self {
        self.extend(RATE_LIMIT_SIGNALS.iter().copied());
        self
    }

    /// Also treat network timeouts and refused/reset connections as transient.
    pub fn with_network_errors(mut self) -> Self {
        self.extend(NETWORK_SIGNALS.iter().copied());
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns `true` if the message contains any of the signals.
    pub fn matches(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| message.contains(pattern.as_str()))
    }

    fn extend<I, S>(&mut self, patterns: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for pattern in patterns {
            let pattern = pattern.as_ref().trim().to_lowercase();
            if !pattern.is_empty() && !self.patterns.contains(&pattern) {
                self.patterns.push(pattern);
            }
        }
    }
}

/// Classifies an error against the given signals.
pub fn classify(error: &LLMError, signals: &TransientSignals) -> FailureClass {
    match error {
        LLMError::PromptError(message) if signals.matches(message) => FailureClass::Transient,
        _ => FailureClass::Fatal,
    }
}
