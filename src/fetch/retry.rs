//! Retry classification for point-data requests.
//!
//! The upstream service sheds load with 504s that clear within seconds,
//! while other 5xx responses tend to mean minutes of unavailability.
//! Timeouts are retried immediately. Waits are jittered so a fleet of
//! concurrent fetches does not retry in lockstep.

use crate::fetch::error::FetchError;
use rand::Rng;
use std::time::Duration;

/// Wait durations per error class. The jitter fraction scales each wait by
/// a uniform factor in `[1 - jitter, 1 + jitter]`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub overloaded_wait: Duration,
    pub server_error_wait: Duration,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            overloaded_wait: Duration::from_secs(10),
            server_error_wait: Duration::from_secs(300),
            jitter: 0.5,
        }
    }
}

impl RetryPolicy {
    /// How long to wait before retrying after `error`.
    ///
    /// `None` means the error is not retryable and must be surfaced.
    /// `Some(Duration::ZERO)` retries immediately.
    pub fn delay_for(&self, error: &FetchError) -> Option<Duration> {
        match error {
            FetchError::Timeout(_) => Some(Duration::ZERO),
            FetchError::Overloaded(_) => Some(self.jittered(self.overloaded_wait)),
            FetchError::Service(_) | FetchError::Network(_, _) => {
                Some(self.jittered(self.server_error_wait))
            }
            FetchError::Decode(_) | FetchError::MissingVariable(_) | FetchError::BadDate(_) => {
                None
            }
        }
    }

    fn jittered(&self, base: Duration) -> Duration {
        if self.jitter <= 0.0 {
            return base;
        }
        let factor = rand::thread_rng().gen_range(1.0 - self.jitter..1.0 + self.jitter);
        base.mul_f64(factor.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn exact() -> RetryPolicy {
        RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn timeouts_retry_immediately() {
        let delay = exact().delay_for(&FetchError::Timeout("url".into()));
        assert_eq!(delay, Some(Duration::ZERO));
    }

    #[test]
    fn overload_waits_are_short() {
        let delay = exact().delay_for(&FetchError::Overloaded(StatusCode::GATEWAY_TIMEOUT));
        assert_eq!(delay, Some(Duration::from_secs(10)));
    }

    #[test]
    fn other_service_errors_wait_minutes() {
        let delay = exact().delay_for(&FetchError::Service(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(delay, Some(Duration::from_secs(300)));
    }

    #[test]
    fn malformed_responses_are_fatal() {
        let delay = exact().delay_for(&FetchError::BadDate("20xx0101".into()));
        assert_eq!(delay, None);
        let delay = exact().delay_for(&FetchError::MissingVariable("T2M".into()));
        assert_eq!(delay, None);
    }

    #[test]
    fn jitter_stays_within_its_band() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy
                .delay_for(&FetchError::Overloaded(StatusCode::GATEWAY_TIMEOUT))
                .expect("retryable");
            assert!(delay >= Duration::from_secs(5));
            assert!(delay <= Duration::from_secs(15));
        }
    }
}
