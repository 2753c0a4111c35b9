//! # Player Configuration
//!
//! Timing knobs for the playback facade.
//!
//! The delay values exist to compensate for hosts that apply control calls
//! asynchronously: a stop may not have fully quiesced when the next source is
//! assigned, and a state query right after play/pause may still report the
//! previous state. They are configurable rather than hard-coded, but the
//! defaults match what the supported hosts need in practice.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback facade configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// How long to wait after an internal stop before assigning a new source
    /// during a source switch. Lets hosts that apply stop asynchronously
    /// fully quiesce.
    ///
    /// Default: 150 ms.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: Duration,

    /// Delay before re-reading live session state after pause/stop on hosts
    /// whose state queries update asynchronously.
    ///
    /// Default: 50 ms.
    #[serde(default = "default_control_resync_delay")]
    pub control_resync_delay: Duration,

    /// Delay before re-reading live session state after play/seek.
    ///
    /// Default: 100 ms.
    #[serde(default = "default_playback_resync_delay")]
    pub playback_resync_delay: Duration,

    /// Maximum time `play` will wait for an in-flight load to complete.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_load_timeout")]
    pub load_timeout: Duration,

    /// Default maximum age for prepared-source cache entries.
    ///
    /// Default: 30 minutes.
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age: Duration,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            settle_delay: default_settle_delay(),
            control_resync_delay: default_control_resync_delay(),
            playback_resync_delay: default_playback_resync_delay(),
            load_timeout: default_load_timeout(),
            cache_max_age: default_cache_max_age(),
        }
    }
}

impl PlayerConfig {
    /// Configuration for hosts that confirm control calls promptly.
    ///
    /// Shorter settle/resync windows make source switches snappier at the
    /// cost of racing hosts that are slow to quiesce.
    pub fn responsive() -> Self {
        Self {
            settle_delay: Duration::from_millis(50),
            control_resync_delay: Duration::from_millis(20),
            playback_resync_delay: Duration::from_millis(40),
            ..Default::default()
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.load_timeout.is_zero() {
            return Err("load_timeout must be > 0".to_string());
        }

        if self.load_timeout <= self.settle_delay {
            return Err("load_timeout must exceed settle_delay".to_string());
        }

        if self.cache_max_age.is_zero() {
            return Err("cache_max_age must be > 0".to_string());
        }

        Ok(())
    }
}

fn default_settle_delay() -> Duration {
    Duration::from_millis(150)
}

fn default_control_resync_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_playback_resync_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_load_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_cache_max_age() -> Duration {
    Duration::from_secs(30 * 60)
}
