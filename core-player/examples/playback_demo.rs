//! # Playback Facade Usage Example
//!
//! Demonstrates the full control surface against a simulated host session:
//! preload, play, progress events, pause/resume, seek, volume and teardown.
//!
//! Run with: `cargo run --example playback_demo --package core-player`

use bridge_audio::{
    AudioSessionFactory, FullMediaSession, RawSessionEvent, RestrictedAudioSession,
    Result as BridgeResult, SessionEventSender,
};
use bridge_audio::error::BridgeError;
use core_player::{AudioPlayer, PlayerEvent, PlayerEventKind};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const TRACK: &str = "https://cdn.example.com/audio/demo-track.mp3";

// ============================================================================
// Simulated host session (for demonstration)
// ============================================================================

#[derive(Default)]
struct SimulatedFields {
    source: String,
    current_time: f64,
    duration: f64,
    paused: bool,
    ended: bool,
    volume: f64,
}

/// A full media session backed by nothing but a clock: assigning a source
/// "prepares" a three-minute stream, and `tick` advances playback.
struct SimulatedMediaSession {
    fields: Mutex<SimulatedFields>,
    events: SessionEventSender,
}

impl SimulatedMediaSession {
    fn new(events: SessionEventSender) -> Self {
        Self {
            fields: Mutex::new(SimulatedFields {
                paused: true,
                volume: 1.0,
                ..Default::default()
            }),
            events,
        }
    }

    /// Advance simulated playback by one second.
    fn tick(&self) {
        let update = {
            let mut fields = self.fields.lock();
            if fields.paused {
                None
            } else {
                fields.current_time += 1.0;
                if fields.current_time >= fields.duration {
                    fields.current_time = fields.duration;
                    fields.paused = true;
                    fields.ended = true;
                }
                Some((fields.current_time, fields.duration, fields.ended))
            }
        };
        if let Some((position, duration, ended)) = update {
            let _ = self.events.send(RawSessionEvent::TimeUpdate { position, duration });
            if ended {
                let _ = self.events.send(RawSessionEvent::Ended);
            }
        }
    }
}

impl FullMediaSession for SimulatedMediaSession {
    fn set_source(&self, uri: &str) {
        {
            let mut fields = self.fields.lock();
            fields.source = uri.to_string();
            fields.current_time = 0.0;
            fields.duration = 180.0;
            fields.ended = false;
        }
        let _ = self.events.send(RawSessionEvent::LoadStart);
        let _ = self.events.send(RawSessionEvent::CanPlay);
    }

    fn source(&self) -> String {
        self.fields.lock().source.clone()
    }

    fn play(&self) -> BridgeResult<()> {
        {
            let mut fields = self.fields.lock();
            fields.paused = false;
            fields.ended = false;
        }
        let _ = self.events.send(RawSessionEvent::Started);
        Ok(())
    }

    fn pause(&self) -> BridgeResult<()> {
        self.fields.lock().paused = true;
        let _ = self.events.send(RawSessionEvent::Paused);
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
        self.fields.lock().duration
    }

    fn release(&self) {}
}

/// Factory for a host that only offers the full media capability.
struct SimulatedHost {
    session: Mutex<Option<Arc<SimulatedMediaSession>>>,
}

impl SimulatedHost {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(None),
        })
    }

    fn session(&self) -> Arc<SimulatedMediaSession> {
        self.session.lock().clone().expect("session not created yet")
    }
}

#[async_trait::async_trait]
impl AudioSessionFactory for SimulatedHost {
    fn restricted_available(&self) -> bool {
        false
    }

    async fn create_restricted(
        &self,
        _events: SessionEventSender,
    ) -> BridgeResult<Arc<dyn RestrictedAudioSession>> {
        Err(BridgeError::NotAvailable("no restricted capability".into()))
    }

    async fn create_full(
        &self,
        events: SessionEventSender,
    ) -> BridgeResult<Arc<dyn FullMediaSession>> {
        let session = Arc::new(SimulatedMediaSession::new(events));
        *self.session.lock() = Some(Arc::clone(&session));
        Ok(session)
    }
}

// ============================================================================
// Demo
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let host = SimulatedHost::new();
    let player = AudioPlayer::new(host.clone()).await?;

    player.on(PlayerEventKind::Play, |_| println!(">> playback started"));
    player.on(PlayerEventKind::Pause, |_| println!(">> paused"));
    player.on(PlayerEventKind::Stop, |_| println!(">> stopped"));
    player.on(PlayerEventKind::Ended, |_| println!(">> ended"));
    player.on(PlayerEventKind::TimeUpdate, |event| {
        if let PlayerEvent::TimeUpdate {
            current_time,
            duration,
        } = event
        {
            println!(">> progress {current_time:.0}s / {duration:.0}s");
        }
    });

    // Preload, then play from the cache entry.
    let prepared = player.set_source(TRACK).await?;
    println!(
        "prepared {} ({}s, cached at {}ms)",
        prepared.source, prepared.duration, prepared.loaded_at_ms
    );
    player.play(None).await?;

    let session = host.session();
    for _ in 0..3 {
        session.tick();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    player.pause();
    println!("state after pause: {:?}", player.state().phase());

    player.play(Some(TRACK)).await?;
    player.seek(30.0);
    player.set_volume(0.8);
    for _ in 0..3 {
        session.tick();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let state = player.state();
    println!(
        "now at {:.0}s of {:.0}s, volume {:.1}",
        state.current_time, state.duration, state.volume
    );

    player.stop();
    println!("detailed: {:?}", player.detailed_state());
    player.destroy();

    Ok(())
}
