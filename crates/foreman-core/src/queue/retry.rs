//! Retry policy: decides backoff delays.

use std::time::Duration;

/// Exponential backoff for failed tasks.
///
/// `delay = min(base_delay * multiplier^retry_count, max_delay)`, where
/// `retry_count` is the number of failures already recorded for the task
/// (0 on the first failure). Defaults give 1s, 2s, 4s, 8s, 16s, then the
/// 30s cap — bounding worst-case retry storms.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, given the failures so far.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        let raw = self.base_delay.as_secs_f64() * self.multiplier.powi(retry_count as i32);
        Duration::from_secs_f64(raw.min(self.max_delay.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::first_failure(0, 1)]
    #[case::second(1, 2)]
    #[case::third(2, 4)]
    #[case::fourth(3, 8)]
    #[case::fifth(4, 16)]
    #[case::capped(5, 30)]
    #[case::deep_into_the_cap(10, 30)]
    fn backoff_sequence(#[case] retry_count: u32, #[case] expected_secs: u64) {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.delay_for(retry_count),
            Duration::from_secs(expected_secs)
        );
    }

    #[test]
    fn delays_are_monotonic_until_the_cap() {
        let policy = RetryPolicy::default();
        let mut last = Duration::ZERO;
        for n in 0..8 {
            let delay = policy.delay_for(n);
            assert!(delay >= last);
            assert!(delay <= policy.max_delay);
            last = delay;
        }
    }
}
