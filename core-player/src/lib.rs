//! # Unified Playback Core
//!
//! Backend-agnostic audio playback facade over divergent host audio
//! capabilities.
//!
//! ## Overview
//!
//! This crate handles:
//! - Constructor-time selection between the two host session variants
//!   (restricted in-app session vs. full media element) behind one adapter
//! - The playback state machine with defensive resynchronization against
//!   live host session reads
//! - Ordered, panic-isolated event subscription
//! - A prepared-source cache keyed by URI
//!
//! Host runtimes supply their capabilities through the traits in
//! [`bridge_audio`]; see [`AudioPlayer`] for the caller-facing surface.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod player;
pub mod state;

pub use backend::BackendKind;
pub use cache::PreparedSource;
pub use config::PlayerConfig;
pub use error::{PlayerError, Result};
pub use events::{ListenerId, PlayerEvent, PlayerEventKind};
pub use player::{AudioPlayer, DetailedPlayerState};
pub use state::{PlaybackPhase, PlaybackState};
