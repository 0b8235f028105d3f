//! Per-destination circuit breaker: closed → open → half-open → closed.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum State {
    Closed,
    Open { opened_at: Instant },
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
struct Counters {
    state: State,
    consecutive_failures: u32,
    consecutive_successes: u32,
}

/// Tracks failure/success streaks for one destination and decides whether a
/// call is allowed through.
pub struct CircuitBreaker {
    counters: Mutex<Counters>,
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            counters: Mutex::new(Counters { state: State::Closed, consecutive_failures: 0, consecutive_successes: 0 }),
            failure_threshold,
            cooldown,
        }
    }

    /// Whether a call should be attempted right now. Transitions `Open` to
    /// `HalfOpen` once the cooldown has elapsed, admitting a single probe.
    pub fn allow(&self) -> bool {
        let mut counters = self.counters.lock().unwrap();
        match counters.state {
            State::Closed | State::HalfOpen => true,
            State::Open { opened_at } => {
                if opened_at.elapsed() >= self.cooldown {
                    counters.state = State::HalfOpen;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut counters = self.counters.lock().unwrap();
        counters.consecutive_failures = 0;
        match counters.state {
            State::Closed => {}
            State::HalfOpen => {
                counters.consecutive_successes += 1;
                if counters.consecutive_successes >= 2 {
                    counters.state = State::Closed;
                    counters.consecutive_successes = 0;
                }
            }
            State::Open { .. } => {
                counters.state = State::HalfOpen;
                counters.consecutive_successes = 1;
            }
        }
    }

    pub fn record_failure(&self) {
        let mut counters = self.counters.lock().unwrap();
        counters.consecutive_successes = 0;
        match counters.state {
            State::HalfOpen => {
                counters.state = State::Open { opened_at: Instant::now() };
            }
            State::Closed => {
                counters.consecutive_failures += 1;
                if counters.consecutive_failures >= self.failure_threshold {
                    counters.state = State::Open { opened_at: Instant::now() };
                }
            }
            State::Open { .. } => {}
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.counters.lock().unwrap().state, State::Open { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold_failures() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(30));
        assert!(cb.allow());
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
        cb.record_failure();
        assert!(cb.is_open());
        assert!(!cb.allow());
    }

    #[test]
    fn half_open_closes_after_two_successes() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.record_failure();
        assert!(cb.is_open());
        assert!(cb.allow()); // cooldown elapsed immediately -> half-open
        cb.record_success();
        assert!(cb.is_open() == false || cb.allow());
        cb.record_success();
        assert!(!cb.is_open());
    }

    #[test]
    fn single_half_open_failure_reopens() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(0));
        cb.record_failure();
        assert!(cb.allow());
        cb.record_failure();
        assert!(cb.is_open());
    }
}
