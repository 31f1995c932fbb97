//! Bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Retry schedule for the payment executor.
///
/// The delay before retry `attempt + 1` is `base_delay * 2^(attempt-1)` plus
/// a random jitter strictly smaller than that step, so consecutive tiers
/// never overlap and the total worst case stays a known bound.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with at least one attempt.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Deterministic delay tier for a 1-based attempt number.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Delay tier plus jitter in `[0, tier)`.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let step = self.delay(attempt);
        let step_ms = step.as_millis() as u64;
        if step_ms == 0 {
            return step;
        }
        let jitter = rand::thread_rng().gen_range(0..step_ms);
        step + Duration::from_millis(jitter)
    }

    /// Upper bound on the time spent sleeping between attempts. Each of the
    /// `max_attempts - 1` waits is below twice its tier.
    pub fn worst_case_backoff(&self) -> Duration {
        (1..self.max_attempts).map(|a| self.delay(a) * 2).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(800));
        assert_eq!(policy.delay(4), Duration::from_millis(1600));
    }

    #[test]
    fn jitter_stays_within_the_tier() {
        let policy = RetryPolicy::default();
        for attempt in 1..=4 {
            let step = policy.delay(attempt);
            for _ in 0..100 {
                let jittered = policy.jittered_delay(attempt);
                assert!(jittered >= step);
                assert!(jittered < step * 2);
                // Tiers never overlap.
                assert!(jittered < policy.delay(attempt + 1) * 2);
            }
        }
    }

    #[test]
    fn zero_base_delay_never_panics() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert_eq!(policy.jittered_delay(1), Duration::ZERO);
    }

    #[test]
    fn at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(100));
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn worst_case_is_a_known_bound() {
        let policy = RetryPolicy::default();
        // 2 * (200 + 400 + 800 + 1600) ms
        assert_eq!(policy.worst_case_backoff(), Duration::from_millis(6000));

        let single = RetryPolicy::new(1, Duration::from_millis(200));
        assert_eq!(single.worst_case_backoff(), Duration::ZERO);
    }
}
