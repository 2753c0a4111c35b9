//! # Backend Adapter
//!
//! Wraps whichever host session variant the factory provisioned behind one
//! uniform control surface. Constructed exactly once per player; nothing
//! outside this module branches on the session variant.

use crate::state::BackendProbe;
use bridge_audio::{
    AudioSessionFactory, BridgeError, FullMediaSession, RestrictedAudioSession,
    SessionEventSender,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Which host session variant is driving playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Restricted in-app session: no volume control, ambiguous pause/stop.
    Restricted,
    /// Full media element: volume, buffered ranges and ended state.
    Full,
}

/// Tagged adapter over the two host session variants.
pub(crate) enum Backend {
    Restricted(Arc<dyn RestrictedAudioSession>),
    Full(Arc<dyn FullMediaSession>),
}

impl Backend {
    /// Select and provision a session: the restricted capability is preferred
    /// whenever the host probe reports it, otherwise the full media variant.
    pub(crate) async fn from_factory(
        factory: &dyn AudioSessionFactory,
        events: SessionEventSender,
    ) -> Result<Self, BridgeError> {
        if factory.restricted_available() {
            debug!("restricted audio capability detected");
            Ok(Self::Restricted(factory.create_restricted(events).await?))
        } else {
            debug!("falling back to full media session");
            Ok(Self::Full(factory.create_full(events).await?))
        }
    }

    pub(crate) fn kind(&self) -> BackendKind {
        match self {
            Backend::Restricted(_) => BackendKind::Restricted,
            Backend::Full(_) => BackendKind::Full,
        }
    }

    /// Assign a new source for preparation.
    ///
    /// The restricted session is stopped first so the new assignment does not
    /// race a still-active stream; hosts reject stop on an idle session, so
    /// that failure is expected and ignored.
    pub(crate) fn begin_load(&self, uri: &str) {
        match self {
            Backend::Restricted(session) => {
                if let Err(error) = session.stop() {
                    debug!(%error, "pre-load stop rejected by host, continuing");
                }
                session.set_source(uri);
            }
            Backend::Full(session) => session.set_source(uri),
        }
    }

    /// Invoke native play for `uri`.
    ///
    /// The restricted session re-asserts the source first: its host applies
    /// control calls against whatever source field currently holds, which may
    /// have been clobbered by an interleaved load.
    pub(crate) fn invoke_play(&self, uri: &str) -> Result<(), BridgeError> {
        match self {
            Backend::Restricted(session) => {
                session.set_source(uri);
                session.play()
            }
            Backend::Full(session) => session.play(),
        }
    }

    /// Resume playback of the already-assigned source.
    pub(crate) fn resume(&self) -> Result<(), BridgeError> {
        match self {
            Backend::Restricted(session) => session.play(),
            Backend::Full(session) => session.play(),
        }
    }

    pub(crate) fn pause(&self) -> Result<(), BridgeError> {
        match self {
            Backend::Restricted(session) => session.pause(),
            Backend::Full(session) => session.pause(),
        }
    }

    /// Stop playback.
    ///
    /// Restricted: delegates to the native stop and reports its failure so
    /// the facade can force-apply the stopped state locally (the error must
    /// never reach the facade's caller).
    ///
    /// Full: no distinct native stop exists; the closest primitive is pause
    /// plus a position reset, which this method applies directly. The facade
    /// synthesizes the stop event afterwards.
    pub(crate) fn stop(&self) -> Result<(), BridgeError> {
        match self {
            Backend::Restricted(session) => session.stop(),
            Backend::Full(session) => {
                if let Err(error) = session.pause() {
                    warn!(%error, "pause during synthesized stop failed");
                }
                if let Err(error) = session.seek(0.0) {
                    warn!(%error, "position reset during synthesized stop failed");
                }
                Ok(())
            }
        }
    }

    pub(crate) fn seek(&self, position: f64) -> Result<(), BridgeError> {
        match self {
            Backend::Restricted(session) => session.seek(position),
            Backend::Full(session) => session.seek(position),
        }
    }

    /// Apply a volume natively where the host supports it. The restricted
    /// session has no playback volume; the facade still records the value in
    /// state, so this is a logged no-op there.
    pub(crate) fn set_volume(&self, volume: f64) {
        match self {
            Backend::Restricted(_) => {
                warn!(volume, "host session does not support volume control");
            }
            Backend::Full(session) => {
                if let Err(error) = session.set_volume(volume) {
                    warn!(%error, volume, "host rejected volume change");
                }
            }
        }
    }

    /// One-pass live read of the session fields the resync policy needs.
    pub(crate) fn probe(&self) -> BackendProbe {
        match self {
            Backend::Restricted(session) => BackendProbe {
                current_time: session.current_time(),
                duration: session.duration(),
                paused: session.is_paused(),
                ended: false,
                buffered: None,
            },
            Backend::Full(session) => BackendProbe {
                current_time: session.current_time(),
                duration: session.duration(),
                paused: session.is_paused(),
                ended: session.has_ended(),
                buffered: Some(session.buffered()),
            },
        }
    }

    pub(crate) fn release(&self) {
        match self {
            Backend::Restricted(session) => session.release(),
            Backend::Full(session) => session.release(),
        }
    }
}
