//! # Player Events and Listener Registry
//!
//! Public playback events and the subscription mechanism behind
//! `AudioPlayer::on`/`off`.
//!
//! Callbacks run synchronously at the emission site, in registration order.
//! A callback may be registered multiple times and fires that many times.
//! A panicking callback is contained and logged; it neither suppresses the
//! remaining callbacks for that event nor propagates to the operation that
//! triggered the emission.

use crate::state::PlaybackState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

/// Events emitted by the playback facade.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Playback started or resumed.
    Play,
    /// Playback paused.
    Pause,
    /// Playback stopped (explicitly or force-applied after a failed native
    /// stop).
    Stop,
    /// The stream played to its end; position collapses back to 0.
    Ended,
    /// A host error occurred.
    Error { message: String },
    /// Playback position advanced.
    TimeUpdate { current_time: f64, duration: f64 },
    /// A source load began.
    LoadStart,
    /// A source load completed.
    LoadEnd,
    /// The host reports the source can start playing.
    CanPlay,
    /// The host stalled buffering.
    Waiting,
    /// Any observable state transition; carries the full snapshot.
    StateChange(PlaybackState),
}

impl PlayerEvent {
    /// The subscription key this event is delivered under.
    pub fn kind(&self) -> PlayerEventKind {
        match self {
            PlayerEvent::Play => PlayerEventKind::Play,
            PlayerEvent::Pause => PlayerEventKind::Pause,
            PlayerEvent::Stop => PlayerEventKind::Stop,
            PlayerEvent::Ended => PlayerEventKind::Ended,
            PlayerEvent::Error { .. } => PlayerEventKind::Error,
            PlayerEvent::TimeUpdate { .. } => PlayerEventKind::TimeUpdate,
            PlayerEvent::LoadStart => PlayerEventKind::LoadStart,
            PlayerEvent::LoadEnd => PlayerEventKind::LoadEnd,
            PlayerEvent::CanPlay => PlayerEventKind::CanPlay,
            PlayerEvent::Waiting => PlayerEventKind::Waiting,
            PlayerEvent::StateChange(_) => PlayerEventKind::StateChange,
        }
    }
}

/// Subscription keys for [`PlayerEvent`]s.
///
/// The set is closed: unknown event names are unrepresentable, which is the
/// typed rendering of "subscribing to an unknown event is silently ignored".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerEventKind {
    Play,
    Pause,
    Stop,
    Ended,
    Error,
    TimeUpdate,
    LoadStart,
    LoadEnd,
    CanPlay,
    Waiting,
    StateChange,
}

/// Handle identifying one registration. Returned by `on`, consumed by `off`.
///
/// Each registration gets its own id, so registering the same callback twice
/// yields two independently removable registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

/// Ordered listener registry with per-callback panic isolation.
pub(crate) struct ListenerRegistry {
    entries: Mutex<HashMap<PlayerEventKind, Vec<(ListenerId, Callback)>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a callback for `kind`; insertion order is invocation order.
    pub(crate) fn add(
        &self,
        kind: PlayerEventKind,
        callback: impl Fn(&PlayerEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove exactly the registration identified by `id`. Returns whether a
    /// registration was removed.
    pub(crate) fn remove(&self, kind: PlayerEventKind, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        let Some(callbacks) = entries.get_mut(&kind) else {
            return false;
        };
        match callbacks.iter().position(|(registered, _)| *registered == id) {
            Some(index) => {
                callbacks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop all registrations for `kind`, or every registration when `kind`
    /// is `None`.
    pub(crate) fn remove_all(&self, kind: Option<PlayerEventKind>) {
        let mut entries = self.entries.lock();
        match kind {
            Some(kind) => {
                entries.remove(&kind);
            }
            None => entries.clear(),
        }
    }

    /// Invoke every callback registered for the event's kind, in order.
    ///
    /// The lock is released before invocation so callbacks may re-enter the
    /// registry (e.g. a one-shot listener removing itself).
    pub(crate) fn emit(&self, event: &PlayerEvent) {
        let callbacks: Vec<Callback> = {
            let entries = self.entries.lock();
            match entries.get(&event.kind()) {
                Some(callbacks) => callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => return,
            }
        };

        for callback in callbacks {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| callback(event))) {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(kind = ?event.kind(), %message, "player event listener panicked");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self, kind: PlayerEventKind) -> usize {
        self.entries.lock().get(&kind).map_or(0, Vec::len)
    }
}
