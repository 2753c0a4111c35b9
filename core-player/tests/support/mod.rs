//! Shared fakes for driving the player without a real host runtime.
//!
//! The fake sessions push raw events through the same channel a real host
//! would, so tests exercise the full relay path rather than poking state
//! directly.

#![allow(dead_code)]

use bridge_audio::error::BridgeError;
use bridge_audio::{
    AudioSessionFactory, Clock, FullMediaSession, RawSessionEvent, RestrictedAudioSession,
    Result as BridgeResult, SessionEventSender,
};
use core_player::{AudioPlayer, PlaybackState, PlayerEvent, PlayerEventKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

pub const TRACK_A: &str = "https://cdn.example.com/audio/track-a.mp3";
pub const TRACK_B: &str = "https://cdn.example.com/audio/track-b.mp3";

/// Let the spawned event relay drain everything the fakes have pushed.
pub async fn drain() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Deterministic clock for cache-age assertions.
pub struct TestClock {
    millis: AtomicU64,
}

impl TestClock {
    pub fn new(start_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            millis: AtomicU64::new(start_ms),
        })
    }

    pub fn advance(&self, delta_ms: u64) {
        self.millis.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now_millis(&self) -> u64 {
        self.millis.load(Ordering::SeqCst)
    }
}

/// Knobs controlling how a fake session responds. Mutable at runtime via the
/// session's setters.
#[derive(Debug, Clone)]
pub struct FakeSessionConfig {
    /// Duration reported once a source is prepared.
    pub duration: f64,
    /// Push `CanPlay` as soon as a source is assigned.
    pub auto_ready: bool,
    /// Push `Error` instead of preparing.
    pub fail_load: bool,
    /// Native stop call fails without changing session state.
    pub fail_stop: bool,
}

impl Default for FakeSessionConfig {
    fn default() -> Self {
        Self {
            duration: 30.0,
            auto_ready: true,
            fail_load: false,
            fail_stop: false,
        }
    }
}

#[derive(Debug, Default)]
struct SessionFields {
    source: String,
    current_time: f64,
    duration: f64,
    paused: bool,
    ended: bool,
    volume: f64,
    buffered: f64,
    released: bool,
}

/// Fake of the restricted in-app session: no volume, and `is_paused` reads
/// `true` after both pause and stop, exactly the ambiguity the player's
/// explicit-stop flag exists for.
pub struct FakeRestrictedSession {
    config: Mutex<FakeSessionConfig>,
    fields: Mutex<SessionFields>,
    events: SessionEventSender,
    set_sources: AtomicUsize,
    plays: AtomicUsize,
    pauses: AtomicUsize,
    stops: AtomicUsize,
}

impl FakeRestrictedSession {
    fn new(config: FakeSessionConfig, events: SessionEventSender) -> Self {
        Self {
            config: Mutex::new(config),
            fields: Mutex::new(SessionFields {
                paused: true,
                ..Default::default()
            }),
            events,
            set_sources: AtomicUsize::new(0),
            plays: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn emit(&self, event: RawSessionEvent) {
        let _ = self.events.send(event);
    }

    /// Simulate playback progress to `seconds`.
    pub fn advance_to(&self, seconds: f64) {
        self.fields.lock().current_time = seconds;
    }

    /// Simulate the stream playing to its end.
    pub fn finish(&self) {
        {
            let mut fields = self.fields.lock();
            fields.paused = true;
            fields.current_time = 0.0;
        }
        self.emit(RawSessionEvent::Ended);
    }

    pub fn set_fail_stop(&self, fail: bool) {
        self.config.lock().fail_stop = fail;
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.config.lock().fail_load = fail;
    }

    pub fn position(&self) -> f64 {
        self.fields.lock().current_time
    }

    pub fn released(&self) -> bool {
        self.fields.lock().released
    }

    pub fn set_source_count(&self) -> usize {
        self.set_sources.load(Ordering::SeqCst)
    }

    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl RestrictedAudioSession for FakeRestrictedSession {
    fn set_source(&self, uri: &str) {
        self.set_sources.fetch_add(1, Ordering::SeqCst);
        {
            let mut fields = self.fields.lock();
            fields.source = uri.to_string();
            fields.current_time = 0.0;
        }
        let config = self.config.lock().clone();
        if config.fail_load {
            self.emit(RawSessionEvent::Error("simulated prepare failure".into()));
        } else if config.auto_ready {
            self.fields.lock().duration = config.duration;
            self.emit(RawSessionEvent::CanPlay);
        }
    }

    fn source(&self) -> String {
        self.fields.lock().source.clone()
    }

    fn play(&self) -> BridgeResult<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        self.fields.lock().paused = false;
        self.emit(RawSessionEvent::Started);
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.fields.lock().paused = true;
        self.emit(RawSessionEvent::Paused);
        Ok(())
    }

    fn stop(&self) -> BridgeResult<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.config.lock().fail_stop {
            return Err(BridgeError::OperationFailed("stop rejected by host".into()));
        }
        {
            let mut fields = self.fields.lock();
            fields.paused = true;
            fields.current_time = 0.0;
        }
        self.emit(RawSessionEvent::Stopped);
        Ok(())
    }

    fn seek(&self, position: f64) -> BridgeResult<()> {
        self.fields.lock().current_time = position;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.fields.lock().current_time
    }

    fn duration(&self) -> f64 {
        self.fields.lock().duration
    }

    fn is_paused(&self) -> bool {
        self.fields.lock().paused
    }

    fn release(&self) {
        self.fields.lock().released = true;
    }
}

/// Fake of the full media element: volume, buffered and ended are all
/// natively queryable, and assigning a source fires the loadstart/canplay
/// pair a real element would.
pub struct FakeFullSession {
    config: Mutex<FakeSessionConfig>,
    fields: Mutex<SessionFields>,
    events: SessionEventSender,
    set_sources: AtomicUsize,
    plays: AtomicUsize,
    pauses: AtomicUsize,
}

impl FakeFullSession {
    fn new(config: FakeSessionConfig, events: SessionEventSender) -> Self {
        Self {
            config: Mutex::new(config),
            fields: Mutex::new(SessionFields {
                paused: true,
                ..Default::default()
            }),
            events,
            set_sources: AtomicUsize::new(0),
            plays: AtomicUsize::new(0),
            pauses: AtomicUsize::new(0),
        }
    }

    pub fn emit(&self, event: RawSessionEvent) {
        let _ = self.events.send(event);
    }

    pub fn advance_to(&self, seconds: f64) {
        self.fields.lock().current_time = seconds;
    }

    pub fn set_buffered(&self, seconds: f64) {
        self.fields.lock().buffered = seconds;
    }

    /// Simulate the stream playing to its end.
    pub fn finish(&self) {
        {
            let mut fields = self.fields.lock();
            fields.paused = true;
            fields.ended = true;
            fields.current_time = fields.duration;
        }
        self.emit(RawSessionEvent::Ended);
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.config.lock().fail_load = fail;
    }

    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.config.lock().auto_ready = auto_ready;
    }

    pub fn position(&self) -> f64 {
        self.fields.lock().current_time
    }

    pub fn volume(&self) -> f64 {
        self.fields.lock().volume
    }

    pub fn released(&self) -> bool {
        self.fields.lock().released
    }

    pub fn set_source_count(&self) -> usize {
        self.set_sources.load(Ordering::SeqCst)
    }

    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

impl FullMediaSession for FakeFullSession {
    fn set_source(&self, uri: &str) {
        self.set_sources.fetch_add(1, Ordering::SeqCst);
        {
            let mut fields = self.fields.lock();
            fields.source = uri.to_string();
            fields.current_time = 0.0;
            fields.ended = false;
        }
        self.emit(RawSessionEvent::LoadStart);
        let config = self.config.lock().clone();
        if config.fail_load {
            self.emit(RawSessionEvent::Error("simulated prepare failure".into()));
        } else if config.auto_ready {
            self.fields.lock().duration = config.duration;
            self.emit(RawSessionEvent::CanPlay);
        }
    }

    fn source(&self) -> String {
        self.fields.lock().source.clone()
    }

    fn play(&self) -> BridgeResult<()> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        {
            let mut fields = self.fields.lock();
            fields.paused = false;
            fields.ended = false;
        }
        self.emit(RawSessionEvent::Started);
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.fields.lock().paused = true;
        self.emit(RawSessionEvent::Paused);
        Ok(())
    }

    fn seek(&self, position: f64) -> BridgeResult<()> {
        self.fields.lock().current_time = position;
        Ok(())
    }

    fn set_volume(&self, volume: f64) -> BridgeResult<()> {
        self.fields.lock().volume = volume;
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.fields.lock().current_time
    }

    fn duration(&self) -> f64 {
        self.fields.lock().duration
    }

    fn is_paused(&self) -> bool {
        self.fields.lock().paused
    }

    fn has_ended(&self) -> bool {
        self.fields.lock().ended
    }

    fn buffered(&self) -> f64 {
        self.fields.lock().buffered
    }

    fn release(&self) {
        self.fields.lock().released = true;
    }
}

enum FactoryMode {
    Restricted,
    Full,
}

/// Factory that provisions one fake session and keeps a handle for the test.
pub struct FakeSessionFactory {
    mode: FactoryMode,
    config: FakeSessionConfig,
    restricted: Mutex<Option<Arc<FakeRestrictedSession>>>,
    full: Mutex<Option<Arc<FakeFullSession>>>,
}

impl FakeSessionFactory {
    pub fn restricted(config: FakeSessionConfig) -> Arc<Self> {
        Arc::new(Self {
            mode: FactoryMode::Restricted,
            config,
            restricted: Mutex::new(None),
            full: Mutex::new(None),
        })
    }

    pub fn full(config: FakeSessionConfig) -> Arc<Self> {
        Arc::new(Self {
            mode: FactoryMode::Full,
            config,
            restricted: Mutex::new(None),
            full: Mutex::new(None),
        })
    }

    /// The restricted session the player was built around.
    pub fn restricted_session(&self) -> Arc<FakeRestrictedSession> {
        self.restricted
            .lock()
            .clone()
            .expect("restricted session not created")
    }

    /// The full session the player was built around.
    pub fn full_session(&self) -> Arc<FakeFullSession> {
        self.full.lock().clone().expect("full session not created")
    }
}

#[async_trait::async_trait]
impl AudioSessionFactory for FakeSessionFactory {
    fn restricted_available(&self) -> bool {
        matches!(self.mode, FactoryMode::Restricted)
    }

    async fn create_restricted(
        &self,
        events: SessionEventSender,
    ) -> BridgeResult<Arc<dyn RestrictedAudioSession>> {
        let session = Arc::new(FakeRestrictedSession::new(self.config.clone(), events));
        *self.restricted.lock() = Some(Arc::clone(&session));
        Ok(session)
    }

    async fn create_full(
        &self,
        events: SessionEventSender,
    ) -> BridgeResult<Arc<dyn FullMediaSession>> {
        let session = Arc::new(FakeFullSession::new(self.config.clone(), events));
        *self.full.lock() = Some(Arc::clone(&session));
        Ok(session)
    }
}

/// Records every event delivered to the kinds it is attached to.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<PlayerEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, player: &AudioPlayer, kinds: &[PlayerEventKind]) {
        for kind in kinds {
            let events = Arc::clone(&self.events);
            player.on(*kind, move |event| events.lock().push(event.clone()));
        }
    }

    pub fn count(&self, kind: PlayerEventKind) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    pub fn kinds(&self) -> Vec<PlayerEventKind> {
        self.events.lock().iter().map(PlayerEvent::kind).collect()
    }

    pub fn last_state_change(&self) -> Option<PlaybackState> {
        self.events.lock().iter().rev().find_map(|event| match event {
            PlayerEvent::StateChange(state) => Some(state.clone()),
            _ => None,
        })
    }
}
