//! Schema version timestamps and the clock used to pick "now".
//!
//! A [`SchemaVersion`] marks the moment a collection revision becomes
//! effective. Versions are plain milliseconds since the Unix epoch so they
//! order totally and serialize as a bare number.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Effective-from timestamp of a collection revision, in milliseconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SchemaVersion(pub u64);

impl SchemaVersion {
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Abstraction over the system clock for dependency injection.
///
/// History resolution defaults its cut-off to "now"; tests swap in a
/// [`FixedClock`] to make that deterministic.
pub trait ClockSource: Send + Sync {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now(&self) -> u64;

    /// Returns the current time as a [`SchemaVersion`].
    fn now_version(&self) -> SchemaVersion {
        SchemaVersion(self.now())
    }
}

/// Default clock source that reads the real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> u64 {
        let elapsed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u64);

impl ClockSource for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}
