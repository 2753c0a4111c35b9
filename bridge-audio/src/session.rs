//! Host audio session contracts and the raw event set they emit.
//!
//! Two session variants exist because host runtimes diverge in what their
//! native audio capability exposes. The playback core wraps whichever variant
//! the factory provisions behind a uniform adapter; callers never see these
//! traits directly once a player is constructed.

use crate::{error::Result, platform::PlatformSendSync};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Raw events a host audio session pushes through its event channel.
///
/// Delivery is asynchronous and best-effort: hosts may deliver events late,
/// coalesce them, or (for some capabilities) never deliver a given kind at
/// all. Consumers must treat these as hints and re-read the live session
/// fields for authoritative state.
#[derive(Debug, Clone, PartialEq)]
pub enum RawSessionEvent {
    /// Playback started or resumed.
    Started,
    /// Playback paused without releasing the session.
    Paused,
    /// Playback stopped; position reset to the start of the stream.
    ///
    /// Only restricted sessions emit this - a full media session has no
    /// distinct native stop primitive.
    Stopped,
    /// The stream played to its end.
    Ended,
    /// Playback position advanced. `duration` may be `NaN` until the host
    /// has parsed the stream metadata.
    TimeUpdate { position: f64, duration: f64 },
    /// The session began fetching/preparing a source.
    LoadStart,
    /// Enough of the source is prepared for playback to begin.
    CanPlay,
    /// The session stalled waiting for more data.
    Waiting,
    /// The session failed; `message` is the host-specific error description.
    Error(String),
}

/// Sending half of a session's event channel, handed to the host at creation.
pub type SessionEventSender = mpsc::UnboundedSender<RawSessionEvent>;

/// Receiving half drained by the playback core's event relay.
pub type SessionEventReceiver = mpsc::UnboundedReceiver<RawSessionEvent>;

/// Restricted in-app audio session.
///
/// This variant models hosts whose audio capability is a single opaque voice
/// session: the source is set by assigning a field, volume control does not
/// exist, and the native state query collapses "paused" and "stopped" into
/// the same paused-like reading. The playback core keeps an external
/// explicit-stop flag to disambiguate; implementations only need to report
/// the fields faithfully.
pub trait RestrictedAudioSession: PlatformSendSync {
    /// Assign the source URI. Assignment alone must not start playback.
    fn set_source(&self, uri: &str);

    /// The currently assigned source URI, empty if none.
    fn source(&self) -> String;

    /// Begin or resume playback of the assigned source.
    fn play(&self) -> Result<()>;

    /// Pause playback, preserving position.
    fn pause(&self) -> Result<()>;

    /// Stop playback and reset position to the start.
    ///
    /// Some hosts reject stop on an idle session; callers must be prepared
    /// for an error here and must not let it escape to their own callers.
    fn stop(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    fn seek(&self, position: f64) -> Result<()>;

    /// Current playback position in seconds. May be `NaN` before metadata.
    fn current_time(&self) -> f64;

    /// Total duration in seconds. May be `NaN` before metadata.
    fn duration(&self) -> f64;

    /// Whether the session reports a paused-like state. Note this reads
    /// `true` after both `pause()` and `stop()`.
    fn is_paused(&self) -> bool;

    /// Release the underlying native resource. The session is unusable
    /// afterwards.
    fn release(&self);
}

/// Full media-element session.
///
/// This variant models hosts that expose a standard media element: the whole
/// control surface of [`RestrictedAudioSession`] minus the native stop, plus
/// volume, buffered-range and ended-state queries. Stopping is synthesized by
/// the playback core as pause-at-zero because no distinct native stop
/// primitive exists.
pub trait FullMediaSession: PlatformSendSync {
    /// Assign the source URI. Assignment alone must not start playback.
    fn set_source(&self, uri: &str);

    /// The currently assigned source URI, empty if none.
    fn source(&self) -> String;

    /// Begin or resume playback of the assigned source.
    fn play(&self) -> Result<()>;

    /// Pause playback, preserving position.
    fn pause(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    fn seek(&self, position: f64) -> Result<()>;

    /// Apply a volume in `[0.0, 1.0]`.
    fn set_volume(&self, volume: f64) -> Result<()>;

    /// Current playback position in seconds. May be `NaN` before metadata.
    fn current_time(&self) -> f64;

    /// Total duration in seconds. May be `NaN` before metadata.
    fn duration(&self) -> f64;

    /// Whether the element reports a paused state.
    fn is_paused(&self) -> bool;

    /// Whether the element has played to its end.
    fn has_ended(&self) -> bool;

    /// Seconds of buffered media, best-effort.
    fn buffered(&self) -> f64;

    /// Release the underlying native resource. The session is unusable
    /// afterwards.
    fn release(&self);
}

/// Factory through which the host provisions audio sessions.
///
/// The playback core probes [`restricted_available`] exactly once at
/// construction and creates the matching session variant; hosts should
/// return `true` only when the restricted capability actually exists in the
/// current environment, since the restricted variant is preferred whenever
/// present.
///
/// [`restricted_available`]: AudioSessionFactory::restricted_available
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioSessionFactory: PlatformSendSync {
    /// Capability probe: does this host expose the restricted in-app session?
    fn restricted_available(&self) -> bool;

    /// Provision a restricted session. `events` is the channel the session
    /// must push its [`RawSessionEvent`]s into for its whole lifetime.
    async fn create_restricted(
        &self,
        events: SessionEventSender,
    ) -> Result<Arc<dyn RestrictedAudioSession>>;

    /// Provision a full media session. Same event-channel contract as
    /// [`create_restricted`](AudioSessionFactory::create_restricted).
    async fn create_full(&self, events: SessionEventSender) -> Result<Arc<dyn FullMediaSession>>;
}
