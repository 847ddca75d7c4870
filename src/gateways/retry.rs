use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub min_interval: Duration,
    pub max_interval: Duration,
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(5),
            min_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }
}

/// How a single attempt ended, before the body is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Status(u16),
    TransportError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDirective {
    Done,
    Continue(Duration),
    FailNow,
}

impl RetryPolicy {
    /// Wait before the attempt following the zero-based `attempt`.
    pub fn backoff(&self, attempt: u32, status: Option<u16>) -> Duration {
        if status == Some(429) {
            return self.rate_limit_cooldown;
        }

        2u32.checked_pow(attempt)
            .and_then(|factor| self.min_interval.checked_mul(factor))
            .filter(|wait| *wait <= self.max_interval)
            .unwrap_or(self.max_interval)
    }

    /// Transport failures, rate limiting and server errors other than 501.
    pub fn is_retryable(outcome: AttemptOutcome) -> bool {
        match outcome {
            AttemptOutcome::TransportError => true,
            AttemptOutcome::Status(429) => true,
            AttemptOutcome::Status(501) => false,
            AttemptOutcome::Status(s) => s >= 500,
        }
    }

    pub fn classify(&self, attempt: u32, outcome: AttemptOutcome) -> RetryDirective {
        if matches!(outcome, AttemptOutcome::Status(s) if (200..300).contains(&s)) {
            return RetryDirective::Done;
        }
        if !Self::is_retryable(outcome) {
            return RetryDirective::FailNow;
        }
        if attempt + 1 >= self.max_attempts.max(1) {
            return RetryDirective::FailNow;
        }

        let status = match outcome {
            AttemptOutcome::Status(s) => Some(s),
            AttemptOutcome::TransportError => None,
        };
        RetryDirective::Continue(self.backoff(attempt, status))
    }
}
