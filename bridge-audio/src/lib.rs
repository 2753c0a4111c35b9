//! # Host Audio Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host runtime
//! that wants to drive the unified playback facade in `core-player`.
//!
//! ## Overview
//!
//! This crate defines the contract between the playback core and the host's
//! native audio capabilities. Hosts differ in what they expose: some provide
//! only a restricted in-app audio session (no volume control, and a state
//! query that cannot tell an explicit stop apart from a pause), others expose
//! a full media element with volume and buffered-range support. The core
//! selects one of the two at construction time via [`AudioSessionFactory`]
//! and never branches on the host type anywhere else.
//!
//! ## Traits
//!
//! - [`RestrictedAudioSession`](session::RestrictedAudioSession) - the
//!   limited native session variant
//! - [`FullMediaSession`](session::FullMediaSession) - the full media-element
//!   variant
//! - [`AudioSessionFactory`](session::AudioSessionFactory) - capability probe
//!   and session provisioning
//! - [`Clock`](time::Clock) - time source for deterministic testing
//!
//! ## Event Delivery
//!
//! Sessions push [`RawSessionEvent`](session::RawSessionEvent) values into the
//! channel sender handed to them at creation. Delivery is best-effort and
//! asynchronous; the core never trusts push events alone and re-reads the live
//! session fields before exposing state (see `core-player`).
//!
//! ## Thread Safety
//!
//! Session implementations are shared across async tasks and must satisfy the
//! [`PlatformSendSync`](platform::PlatformSendSync) bound, which resolves to
//! `Send + Sync` on native targets and relaxes on single-threaded wasm hosts.

pub mod error;
pub mod platform;
pub mod session;
pub mod time;

pub use error::{BridgeError, Result};
pub use session::{
    AudioSessionFactory, FullMediaSession, RawSessionEvent, RestrictedAudioSession,
    SessionEventReceiver, SessionEventSender,
};
pub use time::{Clock, SystemClock};
