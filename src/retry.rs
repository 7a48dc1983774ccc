//! How long to wait between attempts, and how many attempts to make

use core::time::Duration;

use rand::Rng;

/// No delay ever exceeds this, whether computed or sent by the server
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Fraction of the exponential delay added on top as random jitter
const JITTER_FACTOR: f64 = 0.1;

pub const DEFAULT_RETRY: RetryPolicy = RetryPolicy {
    max_retries: DEFAULT_MAX_RETRIES,
    base_delay: DEFAULT_BASE_DELAY,
};

/// Exponential backoff with jitter, bounded by a maximum number of retries
///
/// Attempts are numbered from 1, so a policy with `max_retries = 3` makes at most 4 attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        DEFAULT_RETRY
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Policy that makes exactly one attempt
    pub const fn never() -> Self {
        Self::new(0, DEFAULT_BASE_DELAY)
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether a failed `attempt` may be followed by another one
    pub const fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }

    /// `base_delay * 2^(attempt - 1)`, without jitter or clamping
    pub fn exponential(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.base_delay.as_secs_f64() * 2f64.powi(exponent)
    }

    /// Delay before the attempt following `attempt`.
    ///
    /// A `Retry-After` from the server wins over the computed backoff. Either way the result is
    /// clamped to [`MAX_RETRY_DELAY`].
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let delay = match retry_after {
            Some(retry_after) => retry_after,
            None => {
                let max = MAX_RETRY_DELAY.as_secs_f64();
                // clamp before jitter, large attempt counts overflow to inf and rand won't sample up to that
                let exponential = self.exponential(attempt).min(max);
                let jitter = rand::thread_rng().gen_range(0.0..=exponential * JITTER_FACTOR);
                Duration::try_from_secs_f64((exponential + jitter).min(max))
                    .unwrap_or(MAX_RETRY_DELAY)
            }
        };
        delay.min(MAX_RETRY_DELAY)
    }
}

/// Parses a `Retry-After` header given as a (possibly fractional) number of seconds.
///
/// HTTP-date values are not supported and yield [None], same as anything negative or non-finite.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let seconds = value.trim().parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_budget() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.max_attempts(), 4);
        assert!(policy.has_attempts_after(1));
        assert!(policy.has_attempts_after(3));
        assert!(!policy.has_attempts_after(4));

        let never = RetryPolicy::never();
        assert_eq!(never.max_attempts(), 1);
        assert!(!never.has_attempts_after(1));
    }

    #[test]
    fn backoff_stays_within_jitter_bounds() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1));
        for attempt in 1..=8u32 {
            let exponential = 2f64.powi(attempt as i32 - 1);
            let low = exponential.min(30.0);
            let high = (exponential * 1.1).min(30.0);
            for _ in 0..50 {
                let delay = policy.delay(attempt, None).as_secs_f64();
                assert!(
                    (low - 1e-6..=high + 1e-6).contains(&delay),
                    "attempt {attempt}: {delay} not in [{low}, {high}]"
                );
            }
        }
    }

    #[test]
    fn backoff_is_clamped() {
        let policy = RetryPolicy::new(100, Duration::from_secs(1));
        assert_eq!(policy.delay(6, None), MAX_RETRY_DELAY);
        assert_eq!(policy.delay(64, None), MAX_RETRY_DELAY);
        assert_eq!(policy.delay(u32::MAX, None), MAX_RETRY_DELAY);
    }

    #[test]
    fn retry_after_wins() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(
            policy.delay(3, Some(Duration::from_secs(2))),
            Duration::from_secs(2)
        );
        assert_eq!(policy.delay(1, Some(Duration::ZERO)), Duration::ZERO);
        assert_eq!(
            policy.delay(1, Some(Duration::from_secs(120))),
            MAX_RETRY_DELAY
        );
    }

    #[test]
    fn zero_base_delay() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert_eq!(policy.delay(3, None), Duration::ZERO);
    }

    #[test]
    fn retry_after_parsing() {
        assert_eq!(parse_retry_after("120"), Some(Duration::from_secs(120)));
        assert_eq!(parse_retry_after(" 0 "), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("1.5"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_retry_after("-1"), None);
        assert_eq!(parse_retry_after("NaN"), None);
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }
}
