//! Time Abstractions
//!
//! Provides an injectable time source so that age-based logic (e.g. cache
//! expiry in the playback core) can be tested deterministically.

use crate::platform::PlatformSendSync;
use std::time::{SystemTime, UNIX_EPOCH};

/// Time source trait
///
/// Abstracts system time to enable deterministic testing.
///
/// # Example
///
/// ```ignore
/// use bridge_audio::time::Clock;
///
/// fn stamp(clock: &dyn Clock) -> u64 {
///     clock.now_millis()
/// }
/// ```
pub trait Clock: PlatformSendSync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;

    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> u64 {
        self.now_millis() / 1000
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances() {
        let clock = SystemClock;
        let millis = clock.now_millis();
        assert!(millis > 0);
        assert_eq!(clock.now_secs(), millis / 1000);
    }
}
