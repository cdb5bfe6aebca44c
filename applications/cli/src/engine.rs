//! Simulated audio engine
//!
//! Plays nothing audible: a tokio task walks the playback position forward
//! every tick and reports completion when the track length is reached.
//! Useful for driving the player end to end without an output device.

use crate::config::EngineSettings;
use cadence_playback::{
    AudioEngine, EngineError, EngineEvent, EngineEventSender, Generation, ResolvedSource,
};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};

struct LoadedTrack {
    generation: Generation,
    title: String,
    duration: Duration,
    /// Position when the clock last stopped
    position: Duration,
    /// Set while playing
    resumed_at: Option<Instant>,
}

/// [`AudioEngine`] backed by a timer instead of an output device
pub struct SimulatedEngine {
    settings: EngineSettings,
    events: EngineEventSender,
    track: Option<LoadedTrack>,
    clock: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    /// Events are reported on `events`; must be called inside a tokio runtime
    /// before `play` is used.
    pub fn new(settings: EngineSettings, events: EngineEventSender) -> Self {
        Self {
            settings,
            events,
            track: None,
            clock: None,
        }
    }

    /// Current position of the loaded track
    pub fn position(&self) -> Option<Duration> {
        self.track
            .as_ref()
            .map(|track| self.position_of(track).min(track.duration))
    }

    pub fn is_playing(&self) -> bool {
        self.track
            .as_ref()
            .is_some_and(|track| track.resumed_at.is_some())
    }

    fn position_of(&self, track: &LoadedTrack) -> Duration {
        match track.resumed_at {
            Some(since) => track.position + since.elapsed().mul_f64(self.settings.speed),
            None => track.position,
        }
    }

    fn halt_clock(&mut self) {
        if let Some(clock) = self.clock.take() {
            clock.abort();
        }
    }

    fn start_clock(&mut self) {
        let Some(track) = self.track.as_mut() else {
            return;
        };
        track.resumed_at = Some(Instant::now());

        let clock = run_clock(
            self.events.clone(),
            track.generation,
            track.position,
            track.duration,
            self.settings.tick(),
            self.settings.speed,
        );
        self.clock = Some(tokio::spawn(clock));
    }

    /// Freeze the loaded track's position and stop its clock
    fn freeze(&mut self) {
        self.halt_clock();
        let position = self.position();
        if let (Some(track), Some(position)) = (self.track.as_mut(), position) {
            track.position = position;
            track.resumed_at = None;
        }
    }
}

impl AudioEngine for SimulatedEngine {
    fn load(&mut self, source: &ResolvedSource, generation: Generation) -> Result<(), EngineError> {
        self.halt_clock();

        if source.handle.as_str().is_empty() {
            self.track = None;
            return Err(EngineError::Load("empty source handle".to_string()));
        }

        let duration = source
            .duration
            .unwrap_or_else(|| self.settings.fallback_duration());

        debug!(
            handle = %source.handle.as_str(),
            generation = %generation,
            duration_ms = duration.as_millis() as u64,
            "Loading source"
        );

        self.track = Some(LoadedTrack {
            generation,
            title: source.title.clone(),
            duration,
            position: Duration::ZERO,
            resumed_at: None,
        });
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        let Some(track) = self.track.as_ref() else {
            return Err(EngineError::Transport("no source loaded".to_string()));
        };
        if track.resumed_at.is_some() {
            return Ok(());
        }

        info!(title = %track.title, "Playing");
        self.start_clock();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        if self.track.is_none() {
            return Err(EngineError::Transport("no source loaded".to_string()));
        }
        self.freeze();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.halt_clock();
        self.track = None;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        let playing = self.is_playing();
        self.freeze();

        let Some(track) = self.track.as_mut() else {
            return Err(EngineError::Transport("no source loaded".to_string()));
        };
        track.position = position.min(track.duration);

        if playing {
            self.start_clock();
        }
        Ok(())
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.halt_clock();
    }
}

async fn run_clock(
    events: EngineEventSender,
    generation: Generation,
    mut position: Duration,
    duration: Duration,
    tick: Duration,
    speed: f64,
) {
    let step = tick.mul_f64(speed);
    let mut ticker = time::interval_at(Instant::now() + tick, tick);

    while position < duration {
        ticker.tick().await;
        position = (position + step).min(duration);
        if events.send(EngineEvent::position(generation, position)).is_err() {
            return;
        }
    }

    let _ = events.send(EngineEvent::completed(generation));
}
