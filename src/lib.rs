//! Workspace placeholder crate.
//!
//! This crate exists to expose the individual workspace crates behind a single
//! dependency. Host applications can depend on `unified-audio-workspace` and
//! reach both the bridge contracts (`bridge-audio`) and the playback facade
//! (`core-player`) without wiring each crate individually.

pub use bridge_audio;
pub use core_player;
