//! # Playback State
//!
//! The facade's view of the current playback session, plus the
//! resynchronization policy that re-derives it from live host session reads.
//!
//! Push events from host sessions arrive late or not at all, so the facade
//! never trusts them alone: every externally observable read and every
//! mutating call re-derives the activity flags and timing fields from the
//! live session via [`apply_probe`]. The policy is a pure function so it can
//! be tested without a host.

use serde::{Deserialize, Serialize};

/// Snapshot of the playback session as exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Current audio source URI; empty string means no source is loaded.
    pub source: String,
    /// Current playback position in seconds.
    pub current_time: f64,
    /// Total duration in seconds; 0 until the host has parsed metadata.
    pub duration: f64,
    /// Volume fraction in `[0, 1]`.
    pub volume: f64,
    /// Whether audio is actively playing. Never `true` together with
    /// `paused`.
    pub playing: bool,
    /// Whether playback is paused mid-stream. Both `playing` and `paused`
    /// false means idle/stopped/ended.
    pub paused: bool,
    /// Whether a source is currently being fetched/prepared.
    pub loading: bool,
    /// Seconds of buffered media known to the host, best-effort.
    pub buffered: f64,
    /// Last host error description, cleared when a new load starts.
    pub error: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            source: String::new(),
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            playing: false,
            paused: false,
            loading: false,
            buffered: 0.0,
            error: None,
        }
    }
}

impl PlaybackState {
    /// Derived position in the abstract playback machine.
    pub fn phase(&self) -> PlaybackPhase {
        if self.playing {
            PlaybackPhase::Playing
        } else if self.paused {
            PlaybackPhase::Paused
        } else if self.loading {
            PlaybackPhase::Loading
        } else if !self.source.is_empty() && self.duration > 0.0 {
            PlaybackPhase::Ready
        } else {
            PlaybackPhase::Idle
        }
    }

    /// Reset the fields that a fresh load invalidates, keeping `volume` and
    /// `buffered` (the host overwrites buffered as it reports progress).
    pub(crate) fn begin_load(&mut self, source: &str) {
        self.source = source.to_string();
        self.error = None;
        self.current_time = 0.0;
        self.duration = 0.0;
        self.playing = false;
        self.paused = false;
        self.loading = true;
    }
}

/// Abstract machine states derived from the snapshot flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No usable source.
    Idle,
    /// A source is being fetched/prepared.
    Loading,
    /// A source is loaded and playback can start.
    Ready,
    Playing,
    Paused,
}

/// Live reads taken from a host session in one pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BackendProbe {
    pub current_time: f64,
    pub duration: f64,
    pub paused: bool,
    /// Only the full media variant can report this; `false` otherwise.
    pub ended: bool,
    /// `None` on hosts that never report buffered ranges.
    pub buffered: Option<f64>,
}

/// Re-derive the activity flags and timing fields from a live probe.
///
/// `stopped_explicitly` is the external disambiguation flag for hosts whose
/// state query cannot tell idle-after-stop apart from idle-after-pause; it is
/// only ever set for the restricted session variant.
///
/// Policy:
/// - explicit-stop flag set: neither playing nor paused
/// - host reports ended: neither playing nor paused
/// - host reports paused: paused only if something has actually played
///   (`current_time > 0`), otherwise idle - a session paused at time zero
///   right after construction is not "paused"
/// - otherwise: playing
///
/// `NaN` time reads coerce to 0; `NaN` duration reads keep the previous
/// known duration.
pub(crate) fn apply_probe(state: &mut PlaybackState, probe: BackendProbe, stopped_explicitly: bool) {
    let current_time = if probe.current_time.is_nan() {
        0.0
    } else {
        probe.current_time
    };
    let duration = if probe.duration.is_nan() {
        state.duration
    } else {
        probe.duration
    };

    state.current_time = current_time;
    state.duration = duration;

    if stopped_explicitly {
        state.playing = false;
        state.paused = false;
    } else if probe.ended {
        state.playing = false;
        state.paused = false;
    } else if probe.paused {
        state.playing = false;
        state.paused = current_time > 0.0;
    } else {
        state.playing = true;
        state.paused = false;
    }

    if let Some(buffered) = probe.buffered {
        state.buffered = buffered;
    }
}
