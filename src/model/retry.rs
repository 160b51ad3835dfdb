//! Bounded retry with exponential backoff.

use super::transport::{HttpReply, HttpRequest, Transport};
use super::CallError;
use std::time::Duration;

/// Per-provider retry and timeout settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. `1` disables retrying.
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles on each later attempt.
    pub initial_backoff: Duration,
    /// Whole-request timeout applied to every attempt.
    pub timeout: Option<Duration>,
}

impl RetryPolicy {
    pub const fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            timeout: None,
        }
    }

    pub fn retries(&self) -> bool {
        self.max_attempts > 1
    }

    /// Backoff to wait after the given 0-based attempt fails.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(Duration::MAX)
    }
}

pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// HTTP statuses that mean "try again later".
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 503)
}

/// Send a request, retrying throttling statuses and transient transport
/// failures until the policy's attempt budget runs out.
///
/// With a single-attempt policy the reply is returned whatever its status.
/// Any non-transient transport failure ends the loop immediately.
pub fn send_with_retry<T, S>(
    transport: &T,
    sleeper: &S,
    policy: &RetryPolicy,
    request: &HttpRequest,
) -> Result<HttpReply, CallError>
where
    T: Transport + ?Sized,
    S: Sleeper + ?Sized,
{
    if !policy.retries() {
        return transport.post_json(request).map_err(CallError::Transport);
    }

    for attempt in 0..policy.max_attempts {
        let delay = policy.backoff_for(attempt);
        let is_last = attempt + 1 == policy.max_attempts;

        let cause = match transport.post_json(request) {
            Ok(reply) if is_retryable_status(reply.status) => format!("HTTP {}", reply.status),
            Ok(reply) => return Ok(reply),
            Err(err) if err.is_transient() => err.to_string(),
            Err(err) => return Err(CallError::Transport(err)),
        };

        if is_last {
            tracing::warn!(
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                cause = %cause,
                "model request failed, no attempts left"
            );
            break;
        }
        tracing::warn!(
            attempt = attempt + 1,
            max_attempts = policy.max_attempts,
            backoff_ms = delay.as_millis() as u64,
            cause = %cause,
            "model request failed, retrying"
        );
        sleeper.sleep(delay);
    }

    Err(CallError::ServiceUnavailable {
        attempts: policy.max_attempts,
    })
}
