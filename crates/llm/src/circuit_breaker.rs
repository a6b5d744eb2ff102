//! Circuit Breaker (component F): guards Tier 3 LLM calls. CLOSED admits
//! calls, OPEN rejects them immediately, HALF_OPEN probes once after the
//! timeout elapses. State transitions are lock-free so concurrent callers
//! never block on each other.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

const FAILURE_THRESHOLD: u32 = 5;
const SUCCESS_THRESHOLD: u32 = 2;
const OPEN_TIMEOUT: Duration = Duration::from_secs(60);

const STATE_CLOSED: u8 = 0;
const STATE_OPEN: u8 = 1;
const STATE_HALF_OPEN: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl From<u8> for BreakerState {
    fn from(v: u8) -> Self {
        match v {
            STATE_OPEN => Self::Open,
            STATE_HALF_OPEN => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

/// Returned by [`CircuitBreaker::admit`] to tell the caller whether to
/// proceed with the guarded call.
pub enum Admission {
    /// Proceed with the call; report the outcome via `on_success`/`on_failure`.
    Go,
    /// Circuit is open; caller should fall back immediately without
    /// attempting the call.
    Reject,
}

pub struct CircuitBreaker {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
    opened_at: Mutex<Option<Instant>>,
    /// Ensures only one caller gets to probe while HALF_OPEN.
    probe_in_flight: AtomicU8,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_CLOSED),
            consecutive_failures: AtomicU32::new(0),
            consecutive_successes: AtomicU32::new(0),
            opened_at: Mutex::new(None),
            probe_in_flight: AtomicU8::new(0),
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Call before attempting the guarded operation.
    pub fn admit(&self) -> Admission {
        match self.state() {
            BreakerState::Closed => Admission::Go,
            BreakerState::Open => {
                let elapsed = self
                    .opened_at
                    .lock()
                    .as_ref()
                    .map(|t| t.elapsed() >= OPEN_TIMEOUT)
                    .unwrap_or(false);
                if !elapsed {
                    return Admission::Reject;
                }
                // Timeout elapsed: move to HALF_OPEN and let exactly one
                // caller probe.
                let _ = self.state.compare_exchange(
                    STATE_OPEN,
                    STATE_HALF_OPEN,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                self.try_claim_probe()
            }
            BreakerState::HalfOpen => self.try_claim_probe(),
        }
    }

    fn try_claim_probe(&self) -> Admission {
        match self
            .probe_in_flight
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Admission::Go,
            Err(_) => Admission::Reject,
        }
    }

    pub fn on_success(&self) {
        let state = self.state();
        match state {
            BreakerState::Closed => {
                self.consecutive_failures.store(0, Ordering::Release);
            }
            BreakerState::HalfOpen => {
                let successes = self.consecutive_successes.fetch_add(1, Ordering::AcqRel) + 1;
                self.probe_in_flight.store(0, Ordering::Release);
                if successes >= SUCCESS_THRESHOLD {
                    self.reset_to_closed();
                }
            }
            BreakerState::Open => {
                // A success arriving after the state already flipped back
                // to open (e.g. a stale admitted probe) is a no-op.
            }
        }
    }

    pub fn on_failure(&self) {
        let state = self.state();
        match state {
            BreakerState::Closed => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= FAILURE_THRESHOLD {
                    self.trip_open();
                }
            }
            BreakerState::HalfOpen => {
                self.probe_in_flight.store(0, Ordering::Release);
                self.trip_open();
            }
            BreakerState::Open => {}
        }
    }

    fn trip_open(&self) {
        self.state.store(STATE_OPEN, Ordering::Release);
        self.consecutive_successes.store(0, Ordering::Release);
        *self.opened_at.lock() = Some(Instant::now());
    }

    fn reset_to_closed(&self) {
        self.state.store(STATE_CLOSED, Ordering::Release);
        self.consecutive_failures.store(0, Ordering::Release);
        self.consecutive_successes.store(0, Ordering::Release);
        *self.opened_at.lock() = None;
    }
}

pub type SharedCircuitBreaker = Arc<CircuitBreaker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_after_threshold_failures() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD {
            assert!(matches!(cb.admit(), Admission::Go));
            cb.on_failure();
        }
        assert_eq!(cb.state(), BreakerState::Open);
        assert!(matches!(cb.admit(), Admission::Reject));
    }

    #[test]
    fn half_open_allows_single_probe() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD {
            cb.on_failure();
        }
        *cb.opened_at.lock() = Some(Instant::now() - Duration::from_secs(61));
        assert!(matches!(cb.admit(), Admission::Go));
        assert!(matches!(cb.admit(), Admission::Reject));
    }

    #[test]
    fn two_successes_close_from_half_open() {
        let cb = CircuitBreaker::new();
        for _ in 0..FAILURE_THRESHOLD {
            cb.on_failure();
        }
        *cb.opened_at.lock() = Some(Instant::now() - Duration::from_secs(61));
        assert!(matches!(cb.admit(), Admission::Go));
        cb.on_success();
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        assert!(matches!(cb.admit(), Admission::Go));
        cb.on_success();
        assert_eq!(cb.state(), BreakerState::Closed);
    }
}
