//! Millisecond duration newtype with a stable wire representation.
//!
//! Wall-clock durations cross the pause/resume boundary as part of
//! [`crate::telemetry`] and tool-execution records, so they need a
//! representation that survives a serialize/deserialize round trip
//! without platform-specific `Duration` quirks.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(pub u64);

impl DurationMs {
    pub const ZERO: DurationMs = DurationMs(0);

    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    pub fn to_std(&self) -> Duration {
        Duration::from_millis(self.0)
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(d.as_millis() as u64)
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        d.to_std()
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_std_duration() {
        let d: DurationMs = Duration::from_secs(2).into();
        assert_eq!(d.as_millis(), 2000);
    }

    #[test]
    fn displays_with_unit_suffix() {
        assert_eq!(DurationMs::from_millis(42).to_string(), "42ms");
    }
}
