//! Wall-clock abstraction.
//!
//! Capability expiry compares persisted UTC timestamps against "now".
//! Routing "now" through [`Clock`] lets tests move time forward without
//! sleeping; see [`ManualClock`](crate::testing::ManualClock).

use chrono::{DateTime, Utc};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
