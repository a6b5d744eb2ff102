//! Small seams that keep the rest of the engine testable without wall-clock
//! or random-id dependencies baked into call sites.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Abstracts "now" so tests can pin a fixed instant instead of racing the
/// wall clock (date resolution, TTL expiry, circuit-breaker timeouts all
/// go through this).
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Abstracts id generation for tests that need deterministic ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
