//! Per-domain circuit breaker: trips after N consecutive failures on a
//! domain and skips further attempts until a cooldown elapses, so one
//! unreachable host doesn't consume the whole retry budget across many
//! queued URLs. Three-state machine (Closed/Open/HalfOpen) over a
//! `DashMap<String, DomainHealth>`.

use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

#[derive(Debug, Clone)]
pub struct DomainHealth {
    pub consecutive_failures: u32,
    pub total_attempts: u32,
    pub total_successes: u32,
    pub last_opened: Option<Instant>,
    pub consecutive_successes_in_halfopen: u32,
    pub state: CircuitState,
}

impl DomainHealth {
    fn new() -> Self {
        Self {
            consecutive_failures: 0,
            total_attempts: 0,
            total_successes: 0,
            last_opened: None,
            consecutive_successes_in_halfopen: 0,
            state: CircuitState::Closed,
        }
    }
}

/// Wired as an additional admission check: never a replacement for the
/// retry-strategy invariant, only an early skip for domains that have
/// already shown themselves consistently broken.
pub struct CircuitBreaker {
    domains: DashMap<String, DomainHealth>,
    failure_threshold: u32,
    success_threshold: u32,
    half_open_timeout: Duration,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, success_threshold: u32, half_open_timeout: Duration) -> Self {
        Self {
            domains: DashMap::new(),
            failure_threshold,
            success_threshold,
            half_open_timeout,
        }
    }

    pub fn should_attempt(&self, domain: &str) -> bool {
        let mut health = self.domains.entry(domain.to_string()).or_insert_with(DomainHealth::new);

        match health.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                if let Some(opened) = health.last_opened {
                    if opened.elapsed() >= self.half_open_timeout {
                        health.state = CircuitState::HalfOpen;
                        health.consecutive_successes_in_halfopen = 0;
                        info!(domain, "circuit breaker transitioning to half-open after timeout");
                        return true;
                    }
                }
                false
            }
            CircuitState::HalfOpen => true,
        }
    }

    pub fn record_success(&self, domain: &str) {
        if let Some(mut health) = self.domains.get_mut(domain) {
            health.consecutive_failures = 0;
            health.total_successes += 1;
            health.total_attempts += 1;

            if health.state == CircuitState::HalfOpen {
                health.consecutive_successes_in_halfopen += 1;
                if health.consecutive_successes_in_halfopen >= self.success_threshold {
                    health.state = CircuitState::Closed;
                    info!(domain, "circuit breaker closed");
                } else {
                    debug!(domain, successes = health.consecutive_successes_in_halfopen, "half-open success");
                }
            }
        }
    }

    pub fn record_failure(&self, domain: &str, error: &str) {
        let mut health = self.domains.entry(domain.to_string()).or_insert_with(DomainHealth::new);
        health.consecutive_failures += 1;
        health.total_attempts += 1;

        if health.consecutive_failures >= self.failure_threshold && health.state != CircuitState::Open {
            health.state = CircuitState::Open;
            health.last_opened = Some(Instant::now());
            health.consecutive_successes_in_halfopen = 0;
            warn!(domain, failures = health.consecutive_failures, error, "circuit breaker open");
        }
    }

    #[must_use]
    pub fn get_health(&self, domain: &str) -> Option<DomainHealth> {
        self.domains.get(domain).map(|r| r.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_by_default() {
        let cb = CircuitBreaker::new(3, 2, Duration::from_secs(60));
        assert!(cb.should_attempt("example.com"));
        cb.record_success("example.com");
        assert_eq!(cb.get_health("example.com").unwrap().state, CircuitState::Closed);
    }

    #[test]
    fn opens_after_consecutive_failures() {
        let cb = CircuitBreaker::new(2, 1, Duration::from_secs(60));
        cb.record_failure("example.com", "boom");
        assert!(cb.should_attempt("example.com"));
        cb.record_failure("example.com", "boom");
        assert_eq!(cb.get_health("example.com").unwrap().state, CircuitState::Open);
        assert!(!cb.should_attempt("example.com"));
    }

    #[test]
    fn half_opens_after_timeout() {
        let cb = CircuitBreaker::new(1, 1, Duration::from_millis(50));
        cb.record_failure("example.com", "boom");
        assert_eq!(cb.get_health("example.com").unwrap().state, CircuitState::Open);
        std::thread::sleep(Duration::from_millis(80));
        assert!(cb.should_attempt("example.com"));
        assert_eq!(cb.get_health("example.com").unwrap().state, CircuitState::HalfOpen);
    }
}
