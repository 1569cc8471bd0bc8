use std::time::Duration;

use crate::llm::classify::TransientSignals;

/// Configuration for the retrying caller.
///
/// The delay before attempt `n + 1` is `initial_delay * multiplier^(n - 1)`,
/// so with the defaults the upstream is called at 0 ms, 2000 ms and 5000 ms.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of invocations, including the first one. Values below 1
    /// are treated as 1.
    pub max_attempts: usize,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after every transient failure. Values
    /// below 1.0 are treated as 1.0 so delays never shrink.
    pub multiplier: f64,
    /// Failure messages that are worth retrying.
    pub transient: TransientSignals,
}

impl Default for RetryPolicy {
    /// 3 attempts, 2 second initial delay, x1.5 backoff, overload signals only.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(2000),
            multiplier: 1.5,
            transient: TransientSignals::default(),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom parameters and the default signals.
    pub fn new(max_attempts: usize, initial_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay,
            multiplier,
            transient: TransientSignals::default(),
        }
    }

    /// A single attempt and no retries.
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO, 1.0)
    }

    /// Also retry rate-limit failures.
    pub fn retry_rate_limits(mut self) -> Self {
        self.transient = self.transient.with_rate_limits();
        self
    }

    /// Also retry network timeouts and dropped connections.
    pub fn retry_network_errors(mut self) -> Self {
        self.transient = self.transient.with_network_errors();
        self
    }

    /// The number of invocations this policy allows, never less than one.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// Whether this policy allows more than one invocation.
    pub fn retries_enabled(&self) -> bool {
        self.attempts() > 1
    }

    /// The sleeps between consecutive attempts, `attempts() - 1` entries long.
    pub fn delays(&self) -> Vec<Duration> {
        let multiplier = if self.multiplier.is_finite() {
            self.multiplier.max(1.0)
        } else {
            1.0
        };
        std::iter::successors(Some(self.initial_delay), |delay| {
            let nanos = (delay.as_nanos() as f64 * multiplier).round();
            Some(Duration::from_nanos(nanos.min(u64::MAX as f64) as u64))
        })
        .take(self.attempts() - 1)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(2000));
        assert_eq!(policy.multiplier, 1.5);
        assert!(policy.transient.matches("503 overloaded"));
    }

    #[test]
    fn test_default_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delays(),
            vec![Duration::from_millis(2000), Duration::from_millis(3000)]
        );
    }

    #[test]
    fn test_delays_follow_multiplier() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), 2.0);
        assert_eq!(
            policy.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400),
                Duration::from_millis(800),
            ]
        );
    }

    #[test]
    fn test_shrinking_multiplier_is_clamped() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), 0.5);
        assert_eq!(
            policy.delays(),
            vec![Duration::from_millis(100), Duration::from_millis(100)]
        );
    }

    #[test]
    fn test_zero_attempts_still_invokes_once() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100), 1.5);
        assert_eq!(policy.attempts(), 1);
        assert!(policy.delays().is_empty());
        assert!(!policy.retries_enabled());
    }

    #[test]
    fn test_disabled_policy() {
        let policy = RetryPolicy::disabled();
        assert_eq!(policy.attempts(), 1);
        assert!(!policy.retries_enabled());
    }

    #[test]
    fn test_retry_rate_limits() {
        let policy = RetryPolicy::default().retry_rate_limits();
        assert!(policy.transient.matches("[429 Too Many Requests]"));
    }

    #[test]
    fn test_retry_network_errors() {
        let policy = RetryPolicy::default();
        assert!(!policy.transient.matches("connection reset by peer"));
        let policy = policy.retry_network_errors();
        assert!(policy.transient.matches("connection reset by peer"));
        assert!(policy.transient.matches("503 overloaded"));
    }
}
