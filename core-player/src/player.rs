//! # Unified Audio Player Facade
//!
//! One backend-agnostic control surface over whichever host session variant
//! is available, plus the event relay, the prepared-source cache and the
//! defensive state resynchronization that papers over unreliable host event
//! delivery.
//!
//! ## Ownership
//!
//! The player is an explicit session object owned by the caller; "one active
//! playback session" is an invariant the owner enforces by constructing one
//! player, not something enforced through hidden global state. The handle is
//! cheap to clone and share across tasks.
//!
//! ## Concurrency
//!
//! Playback requests are serialized through an internal operation lock:
//! overlapping `play` calls run one after the other in arrival order, so the
//! later request observes the state the earlier one left behind and wins.
//! `set_source` itself is not serialized; a newer load supersedes an older
//! in-flight one, which then fails with `PrepareFailed`.

use crate::backend::{Backend, BackendKind};
use crate::cache::{PreparedSource, SourceCache};
use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::events::{ListenerId, ListenerRegistry, PlayerEvent, PlayerEventKind};
use crate::state::{apply_probe, PlaybackState};
use bridge_audio::{
    AudioSessionFactory, Clock, RawSessionEvent, SessionEventReceiver, SystemClock,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Diagnostic snapshot: the public state plus the internal flags.
///
/// Intended for logging and debugging, not for behavioral branching by
/// callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedPlayerState {
    /// The public snapshot, freshly resynchronized.
    pub state: PlaybackState,
    /// Disambiguation flag for the restricted session's pause/stop ambiguity.
    pub stopped_explicitly: bool,
    /// Which session variant is driving playback.
    pub backend: BackendKind,
    /// Whether the host session is still held (false after `destroy`).
    pub session_alive: bool,
}

struct PendingLoad {
    source: String,
    tx: oneshot::Sender<std::result::Result<f64, String>>,
}

struct PlayerInner {
    config: PlayerConfig,
    clock: Arc<dyn Clock>,
    backend_kind: BackendKind,
    /// `None` once the player has been destroyed.
    backend: Mutex<Option<Backend>>,
    state: Mutex<PlaybackState>,
    /// Set by `stop`, cleared by loads and play. Only consulted for the
    /// restricted session variant, whose native state query reads paused
    /// after both pause and stop.
    stopped_explicitly: AtomicBool,
    listeners: ListenerRegistry,
    cache: Mutex<SourceCache>,
    pending_load: Mutex<Option<PendingLoad>>,
    /// Mirrors `state.loading` so waiters can await the transition instead
    /// of polling.
    loading_tx: watch::Sender<bool>,
    op_lock: tokio::sync::Mutex<()>,
    relay: Mutex<Option<JoinHandle<()>>>,
}

/// Backend-agnostic audio player.
///
/// Constructed from an [`AudioSessionFactory`]; the factory's capability
/// probe decides once, at construction, which session variant drives
/// playback. See the module docs for the ownership and concurrency model.
#[derive(Clone)]
pub struct AudioPlayer {
    inner: Arc<PlayerInner>,
}

impl AudioPlayer {
    /// Construct a player with default configuration and the system clock.
    pub async fn new(factory: Arc<dyn AudioSessionFactory>) -> Result<Self> {
        Self::with_config(factory, PlayerConfig::default(), Arc::new(SystemClock)).await
    }

    /// Construct a player with explicit configuration and clock.
    #[instrument(skip_all)]
    pub async fn with_config(
        factory: Arc<dyn AudioSessionFactory>,
        config: PlayerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate().map_err(PlayerError::InvalidConfig)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let backend = Backend::from_factory(factory.as_ref(), event_tx).await?;
        let backend_kind = backend.kind();
        let (loading_tx, _) = watch::channel(false);

        let inner = Arc::new(PlayerInner {
            config,
            clock,
            backend_kind,
            backend: Mutex::new(Some(backend)),
            state: Mutex::new(PlaybackState::default()),
            stopped_explicitly: AtomicBool::new(false),
            listeners: ListenerRegistry::new(),
            cache: Mutex::new(SourceCache::new()),
            pending_load: Mutex::new(None),
            loading_tx,
            op_lock: tokio::sync::Mutex::new(()),
            relay: Mutex::new(None),
        });

        let relay = tokio::spawn(relay_loop(Arc::downgrade(&inner), event_rx));
        *inner.relay.lock() = Some(relay);

        info!(backend = ?backend_kind, "audio player ready");
        Ok(Self { inner })
    }

    /// Which session variant drives playback.
    pub fn backend_kind(&self) -> BackendKind {
        self.inner.backend_kind
    }

    /// The configuration the player was constructed with.
    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    /// Set the audio source, preparing it through the host session.
    ///
    /// Resets playback position, clears any previous error and the
    /// explicit-stop flag. A source that is already a fully prepared cache
    /// entry resolves immediately without touching the host (a `StateChange`
    /// is still emitted). Otherwise the host is instructed to prepare the
    /// source and the returned future resolves when the host reports ready
    /// (`CanPlay`) or fails (`Error`).
    ///
    /// A newer `set_source` supersedes an older in-flight one; the older call
    /// fails with [`PlayerError::PrepareFailed`].
    #[instrument(skip(self))]
    pub async fn set_source(&self, uri: &str) -> Result<PreparedSource> {
        if uri.is_empty() {
            return Err(PlayerError::EmptySource);
        }
        self.inner.ensure_open()?;

        self.inner.stopped_explicitly.store(false, Ordering::SeqCst);
        self.inner.state.lock().begin_load(uri);
        self.inner.loading_tx.send_replace(true);

        let cached = self.inner.cache.lock().get_loaded(uri).cloned();
        if let Some(entry) = cached {
            {
                let mut state = self.inner.state.lock();
                state.duration = entry.duration;
            }
            self.inner.set_loading(false);
            debug!(source = uri, "prepared-source cache hit");
            self.inner.emit_state_change();
            return Ok(entry);
        }

        self.inner.emit(PlayerEvent::LoadStart);
        self.inner.emit_state_change();

        let load = self.inner.register_pending_load(uri);
        {
            let backend = self.inner.backend.lock();
            match backend.as_ref() {
                Some(backend) => backend.begin_load(uri),
                None => return Err(PlayerError::SessionClosed),
            }
        }

        match load.await {
            Ok(Ok(duration)) => {
                let entry = PreparedSource {
                    source: uri.to_string(),
                    duration,
                    loaded: true,
                    loaded_at_ms: self.inner.clock.now_millis(),
                };
                self.inner.cache.lock().insert(entry.clone());
                info!(source = uri, duration, "audio source prepared");
                self.inner.emit_state_change();
                Ok(entry)
            }
            Ok(Err(message)) => {
                warn!(source = uri, %message, "audio source failed to prepare");
                Err(PlayerError::PrepareFailed(message))
            }
            // The oneshot sender was dropped: either a newer load took the
            // slot or the player was destroyed.
            Err(_) => {
                if self.inner.is_open() {
                    Err(PlayerError::PrepareFailed(
                        "load superseded by a newer request".to_string(),
                    ))
                } else {
                    Err(PlayerError::SessionClosed)
                }
            }
        }
    }

    /// Start playback, optionally of a new source.
    ///
    /// - New source while anything is active: stop, wait out the settle
    ///   delay, reload, then play.
    /// - Same source already playing: idempotent no-op.
    /// - Same source paused: direct native resume, no reload.
    /// - No usable source (an empty string counts as absent): `EmptySource`.
    /// - Source still loading: waits for the load to finish, bounded by the
    ///   configured load timeout.
    ///
    /// Resolves when the native play invocation succeeds, which is not
    /// necessarily the moment audio becomes audible.
    #[instrument(skip(self))]
    pub async fn play(&self, source: Option<&str>) -> Result<()> {
        let _op = self.inner.op_lock.lock().await;
        self.inner.ensure_open()?;

        let requested = source.filter(|uri| !uri.is_empty());
        if let Some(uri) = requested {
            let current = self.inner.state.lock().source.clone();
            if uri != current {
                let active = {
                    let state = self.inner.state.lock();
                    state.playing || state.loading || state.paused
                };
                if active {
                    debug!(from = %current, to = uri, "stopping current playback before switch");
                    self.stop();
                    // Hosts apply stop asynchronously; give the session time
                    // to quiesce before assigning the next source.
                    tokio::time::sleep(self.inner.config.settle_delay).await;
                }
                self.set_source(uri).await?;
            } else {
                let snapshot = self.inner.state.lock().clone();
                if snapshot.playing {
                    return Ok(());
                }
                if snapshot.paused {
                    let result = {
                        let backend = self.inner.backend.lock();
                        match backend.as_ref() {
                            Some(backend) => backend.resume(),
                            None => return Err(PlayerError::SessionClosed),
                        }
                    };
                    return result.map_err(|error| PlayerError::PlayFailed(error.to_string()));
                }
            }
        }

        let (current, loading) = {
            let state = self.inner.state.lock();
            (state.source.clone(), state.loading)
        };
        if current.is_empty() {
            return Err(PlayerError::EmptySource);
        }
        if loading {
            self.inner.await_load_completion().await?;
        }

        let kind = self.inner.backend_kind;
        if kind == BackendKind::Restricted {
            self.inner.stopped_explicitly.store(false, Ordering::SeqCst);
        }
        let source_now = self.inner.state.lock().source.clone();
        let result = {
            let backend = self.inner.backend.lock();
            match backend.as_ref() {
                Some(backend) => backend.invoke_play(&source_now),
                None => return Err(PlayerError::SessionClosed),
            }
        };

        match result {
            Ok(()) => {
                // Host event delivery for "playing" may lag the call; confirm
                // against the live session shortly after.
                match kind {
                    BackendKind::Restricted => self
                        .inner
                        .schedule_resync(self.inner.config.playback_resync_delay),
                    BackendKind::Full => self.inner.resync(),
                }
                debug!(source = %source_now, "native play invoked");
                Ok(())
            }
            Err(error) => {
                warn!(%error, "native play invocation failed");
                Err(PlayerError::PlayFailed(error.to_string()))
            }
        }
    }

    /// Pause playback. No-op once the session is closed.
    pub fn pause(&self) {
        let result = {
            let backend = self.inner.backend.lock();
            match backend.as_ref() {
                Some(backend) => backend.pause(),
                None => return,
            }
        };
        if let Err(error) = result {
            warn!(%error, "native pause failed");
        }
        match self.inner.backend_kind {
            BackendKind::Restricted => self
                .inner
                .schedule_resync(self.inner.config.control_resync_delay),
            BackendKind::Full => self.inner.resync(),
        }
    }

    /// Stop playback and reset the position to 0. No-op once the session is
    /// closed.
    ///
    /// On the restricted session the explicit-stop flag is raised before the
    /// native call so the next state read does not mistake the resulting
    /// paused-like reading for a pause. A failed native stop never escapes:
    /// the stopped state is force-applied locally and `Stop` is still
    /// emitted. On the full session, stop is synthesized (pause + position
    /// reset) and the `Stop`/`StateChange` pair is emitted synchronously
    /// because no distinct native stop event exists there.
    pub fn stop(&self) {
        let kind = self.inner.backend_kind;
        if kind == BackendKind::Restricted {
            self.inner.stopped_explicitly.store(true, Ordering::SeqCst);
        }
        let result = {
            let backend = self.inner.backend.lock();
            match backend.as_ref() {
                Some(backend) => backend.stop(),
                None => return,
            }
        };
        self.inner.state.lock().current_time = 0.0;

        match result {
            Ok(()) => match kind {
                BackendKind::Restricted => self
                    .inner
                    .schedule_resync(self.inner.config.control_resync_delay),
                BackendKind::Full => {
                    self.inner.resync();
                    self.inner.emit(PlayerEvent::Stop);
                    self.inner.emit_state_change();
                }
            },
            Err(error) => {
                warn!(%error, "native stop failed, forcing stopped state");
                {
                    let mut state = self.inner.state.lock();
                    state.playing = false;
                    state.paused = false;
                    state.current_time = 0.0;
                }
                self.inner.emit(PlayerEvent::Stop);
                self.inner.emit_state_change();
            }
        }
    }

    /// Seek to an absolute position in seconds.
    ///
    /// Positions outside `[0, duration]` are rejected with a diagnostic log
    /// and leave all state unchanged; no error reaches the caller.
    pub fn seek(&self, position: f64) {
        let duration = self.inner.state.lock().duration;
        if !position.is_finite() || position < 0.0 || position > duration {
            warn!(position, duration, "seek position out of range, ignoring");
            return;
        }

        let result = {
            let backend = self.inner.backend.lock();
            match backend.as_ref() {
                Some(backend) => backend.seek(position),
                None => return,
            }
        };
        if let Err(error) = result {
            warn!(%error, position, "native seek failed");
        }
        match self.inner.backend_kind {
            BackendKind::Restricted => self
                .inner
                .schedule_resync(self.inner.config.playback_resync_delay),
            BackendKind::Full => self.inner.resync(),
        }
    }

    /// Set the volume fraction.
    ///
    /// Values outside `[0, 1]` are rejected with a diagnostic log and leave
    /// state unchanged. Valid values are always recorded in state; they only
    /// reach the host on the full session variant (the restricted session
    /// has no playback volume, which the adapter logs).
    pub fn set_volume(&self, volume: f64) {
        if !(0.0..=1.0).contains(&volume) {
            warn!(volume, "volume out of range, ignoring");
            return;
        }
        self.inner.state.lock().volume = volume;

        let backend = self.inner.backend.lock();
        if let Some(backend) = backend.as_ref() {
            backend.set_volume(volume);
        }
    }

    /// Resynchronize against the live session and return a snapshot.
    pub fn state(&self) -> PlaybackState {
        self.inner.resync();
        self.inner.state.lock().clone()
    }

    /// Like [`state`](AudioPlayer::state) plus the internal flags, for
    /// diagnostics.
    pub fn detailed_state(&self) -> DetailedPlayerState {
        self.inner.resync();
        DetailedPlayerState {
            state: self.inner.state.lock().clone(),
            stopped_explicitly: self.inner.stopped_explicitly.load(Ordering::SeqCst),
            backend: self.inner.backend_kind,
            session_alive: self.inner.is_open(),
        }
    }

    /// Register a callback for an event kind. Returns the handle that
    /// removes exactly this registration.
    pub fn on(
        &self,
        kind: PlayerEventKind,
        callback: impl Fn(&PlayerEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.inner.listeners.add(kind, callback)
    }

    /// Remove one registration. Returns whether anything was removed.
    pub fn off(&self, kind: PlayerEventKind, id: ListenerId) -> bool {
        self.inner.listeners.remove(kind, id)
    }

    /// Remove every registration for `kind`, or all registrations when
    /// `kind` is `None`.
    pub fn remove_all_listeners(&self, kind: Option<PlayerEventKind>) {
        self.inner.listeners.remove_all(kind)
    }

    /// Evict prepared-source entries older than `max_age` (defaults to the
    /// configured `cache_max_age`). Returns how many entries were removed.
    pub fn clear_stale_cache(&self, max_age: Option<Duration>) -> usize {
        let max_age = max_age.unwrap_or(self.inner.config.cache_max_age);
        let now_ms = self.inner.clock.now_millis();
        let removed = self.inner.cache.lock().clear_stale(now_ms, max_age);
        if removed > 0 {
            debug!(removed, "evicted stale prepared sources");
        }
        removed
    }

    /// Look up the prepared-source entry for `source`, if fully loaded.
    pub fn cached_source(&self, source: &str) -> Option<PreparedSource> {
        self.inner.cache.lock().get_loaded(source).cloned()
    }

    /// Number of prepared-source entries currently held.
    pub fn cache_len(&self) -> usize {
        self.inner.cache.lock().len()
    }

    /// Tear the session down: stop playback, drop all listeners, release the
    /// host session, clear the cache and detach the event relay.
    ///
    /// Control operations on a destroyed player either no-op (`pause`,
    /// `stop`, `seek`) or fail with [`PlayerError::SessionClosed`].
    pub fn destroy(&self) {
        self.stop();
        self.inner.listeners.remove_all(None);

        let backend = self.inner.backend.lock().take();
        if let Some(backend) = backend {
            backend.release();
        }
        self.inner.cache.lock().clear();
        *self.inner.pending_load.lock() = None;
        if let Some(relay) = self.inner.relay.lock().take() {
            relay.abort();
        }
        info!("audio player destroyed");
    }
}

impl PlayerInner {
    fn is_open(&self) -> bool {
        self.backend.lock().is_some()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(PlayerError::SessionClosed)
        }
    }

    fn set_loading(&self, loading: bool) {
        self.state.lock().loading = loading;
        self.loading_tx.send_replace(loading);
    }

    fn emit(&self, event: PlayerEvent) {
        self.listeners.emit(&event);
    }

    fn emit_state_change(&self) {
        let snapshot = self.state.lock().clone();
        self.listeners.emit(&PlayerEvent::StateChange(snapshot));
    }

    /// Re-derive the observable state from a live session read.
    fn resync(&self) {
        let probe = {
            let backend = self.backend.lock();
            match backend.as_ref() {
                Some(backend) => backend.probe(),
                None => return,
            }
        };
        let stopped = self.backend_kind == BackendKind::Restricted
            && self.stopped_explicitly.load(Ordering::SeqCst);
        let mut state = self.state.lock();
        apply_probe(&mut state, probe, stopped);
    }

    /// Resync after `delay` without blocking the caller, mirroring hosts
    /// whose state queries only settle shortly after a control call.
    fn schedule_resync(self: &Arc<Self>, delay: Duration) {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.resync();
            }
        });
    }

    async fn await_load_completion(&self) -> Result<()> {
        let mut loading = self.loading_tx.subscribe();
        let outcome =
            tokio::time::timeout(self.config.load_timeout, loading.wait_for(|value| !*value)).await;
        match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(PlayerError::SessionClosed),
            Err(_) => {
                warn!("timed out waiting for in-flight load");
                Err(PlayerError::LoadTimeout)
            }
        }
    }

    fn register_pending_load(
        &self,
        source: &str,
    ) -> oneshot::Receiver<std::result::Result<f64, String>> {
        let (tx, rx) = oneshot::channel();
        let mut pending = self.pending_load.lock();
        if let Some(previous) = pending.take() {
            debug!(superseded = %previous.source, "superseding in-flight load");
        }
        *pending = Some(PendingLoad {
            source: source.to_string(),
            tx,
        });
        rx
    }

    fn resolve_pending_load(&self) {
        let pending = self.pending_load.lock().take();
        if let Some(PendingLoad { source, tx }) = pending {
            let duration = self.state.lock().duration;
            debug!(%source, duration, "load completed");
            let _ = tx.send(Ok(duration));
        }
    }

    fn fail_pending_load(&self, message: &str) {
        let pending = self.pending_load.lock().take();
        if let Some(PendingLoad { source, tx }) = pending {
            debug!(%source, %message, "load failed");
            let _ = tx.send(Err(message.to_string()));
        }
    }

    /// Apply one raw host event: mutate state, resolve waiters, emit the
    /// public events. Runs on the relay task.
    fn apply_session_event(&self, event: RawSessionEvent) {
        match event {
            RawSessionEvent::Started => {
                debug!("host session reported playback start");
                {
                    let mut state = self.state.lock();
                    state.playing = true;
                    state.paused = false;
                    state.loading = false;
                }
                self.loading_tx.send_replace(false);
                self.stopped_explicitly.store(false, Ordering::SeqCst);
                self.emit(PlayerEvent::Play);
                self.emit_state_change();
            }
            RawSessionEvent::Paused => {
                {
                    let mut state = self.state.lock();
                    state.playing = false;
                    state.paused = true;
                    state.loading = false;
                }
                self.loading_tx.send_replace(false);
                self.emit(PlayerEvent::Pause);
                self.emit_state_change();
            }
            RawSessionEvent::Stopped => {
                {
                    let mut state = self.state.lock();
                    state.playing = false;
                    state.paused = false;
                    state.current_time = 0.0;
                    state.loading = false;
                }
                self.loading_tx.send_replace(false);
                if self.backend_kind == BackendKind::Restricted {
                    self.stopped_explicitly.store(true, Ordering::SeqCst);
                }
                self.emit(PlayerEvent::Stop);
                self.emit_state_change();
            }
            RawSessionEvent::Ended => {
                {
                    let mut state = self.state.lock();
                    state.playing = false;
                    state.paused = false;
                    state.current_time = 0.0;
                    state.loading = false;
                }
                self.loading_tx.send_replace(false);
                if self.backend_kind == BackendKind::Restricted {
                    self.stopped_explicitly.store(true, Ordering::SeqCst);
                }
                self.emit(PlayerEvent::Ended);
                self.emit_state_change();
            }
            RawSessionEvent::Error(message) => {
                {
                    let mut state = self.state.lock();
                    state.error = Some(message.clone());
                    state.playing = false;
                    state.loading = false;
                }
                self.loading_tx.send_replace(false);
                self.fail_pending_load(&message);
                self.emit(PlayerEvent::Error {
                    message: message.clone(),
                });
                self.emit_state_change();
            }
            RawSessionEvent::TimeUpdate { position, duration } => {
                let (current_time, total) = {
                    let mut state = self.state.lock();
                    state.current_time = if position.is_nan() { 0.0 } else { position };
                    if !duration.is_nan() {
                        state.duration = duration;
                    }
                    state.loading = false;
                    (state.current_time, state.duration)
                };
                self.loading_tx.send_replace(false);
                self.emit(PlayerEvent::TimeUpdate {
                    current_time,
                    duration: total,
                });
            }
            RawSessionEvent::LoadStart => {
                {
                    let mut state = self.state.lock();
                    state.loading = true;
                    state.error = None;
                }
                self.loading_tx.send_replace(true);
                self.emit(PlayerEvent::LoadStart);
                self.emit_state_change();
            }
            RawSessionEvent::CanPlay => {
                let duration = {
                    let backend = self.backend.lock();
                    backend
                        .as_ref()
                        .map(|backend| backend.probe().duration)
                        .unwrap_or(f64::NAN)
                };
                {
                    let mut state = self.state.lock();
                    state.loading = false;
                    if !duration.is_nan() {
                        state.duration = duration;
                    }
                }
                self.loading_tx.send_replace(false);
                self.resolve_pending_load();
                self.emit(PlayerEvent::CanPlay);
                self.emit(PlayerEvent::LoadEnd);
                self.emit_state_change();
            }
            RawSessionEvent::Waiting => {
                {
                    let mut state = self.state.lock();
                    state.loading = true;
                    state.error = None;
                }
                self.loading_tx.send_replace(true);
                self.emit(PlayerEvent::Waiting);
                self.emit_state_change();
            }
        }
    }
}

impl Drop for PlayerInner {
    fn drop(&mut self) {
        // The relay only holds a weak reference, but its task would otherwise
        // idle on the host channel until the host drops its sender.
        if let Some(relay) = self.relay.lock().take() {
            relay.abort();
        }
    }
}

/// Drains raw host events into state mutations and public emissions.
///
/// Holds only a weak reference so the relay never keeps a destroyed player
/// alive; the loop exits when the player is dropped or the host closes the
/// channel.
async fn relay_loop(inner: Weak<PlayerInner>, mut events: SessionEventReceiver) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        inner.apply_session_event(event);
    }
    debug!("session event relay shut down");
}
