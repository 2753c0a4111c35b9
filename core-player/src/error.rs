//! # Player Error Types
//!
//! Error types for the unified playback facade.

use bridge_audio::BridgeError;
use thiserror::Error;

/// Errors that can surface from playback operations.
///
/// Range violations on `seek`/`set_volume` are deliberately absent: those are
/// recovered locally with a diagnostic log and never reach the caller.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// A source-dependent operation was invoked with no usable source URI.
    #[error("No audio source set")]
    EmptySource,

    /// The host session failed to load/prepare the requested source.
    #[error("Failed to prepare audio source: {0}")]
    PrepareFailed(String),

    /// The native play invocation itself failed.
    #[error("Native play invocation failed: {0}")]
    PlayFailed(String),

    /// Loading did not complete within the configured load timeout.
    #[error("Audio load timed out")]
    LoadTimeout,

    /// The player session has been destroyed; construct a new one.
    #[error("Player session is closed")]
    SessionClosed,

    /// Configuration rejected by validation.
    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),

    /// Error from the host bridge layer.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),
}

impl PlayerError {
    /// Returns `true` if retrying the same operation may succeed without any
    /// caller-side change (e.g. a flaky host load).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlayerError::PrepareFailed(_) | PlayerError::LoadTimeout | PlayerError::PlayFailed(_)
        )
    }

    /// Returns `true` if the error indicates a caller mistake rather than a
    /// host failure.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PlayerError::EmptySource | PlayerError::SessionClosed | PlayerError::InvalidConfig(_)
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlayerError>;
