//! Time source for revision metadata.
//!
//! Orchestration code never reads the system clock directly; it is handed a
//! [`Clock`] so imports are reproducible under test.

use chrono::{DateTime, Utc};

/// Wall-clock timestamp (UTC).
pub type Timestamp = DateTime<Utc>;

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(Timestamp);

impl FixedClock {
    #[must_use]
    pub const fn new(at: Timestamp) -> Self {
        Self(at)
    }

    /// A fixed clock at the given Unix timestamp (seconds). Out-of-range
    /// values fall back to the epoch.
    #[must_use]
    pub fn from_unix(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}
