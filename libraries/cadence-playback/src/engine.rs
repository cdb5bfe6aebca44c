//! Audio engine capability
//!
//! The engine is exclusively owned by the playback controller. Transport
//! commands are synchronous; progress and completion come back as
//! [`EngineEvent`]s over a channel so they re-enter the player loop in order.

use crate::error::EngineError;
use crate::source::ResolvedSource;
use crate::types::Generation;
use std::time::Duration;
use tokio::sync::mpsc;

/// What the engine reports about the loaded source
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    /// Source played to its natural end
    Completed,

    /// Playback failed
    Error(String),

    /// Playback position update
    PositionChanged(Duration),
}

/// Engine event tagged with the generation the source was loaded under
///
/// Events from a source that has since been replaced carry an old
/// generation and are ignored by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub generation: Generation,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn completed(generation: Generation) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Completed,
        }
    }

    pub fn error(generation: Generation, reason: impl Into<String>) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Error(reason.into()),
        }
    }

    pub fn position(generation: Generation, position: Duration) -> Self {
        Self {
            generation,
            kind: EngineEventKind::PositionChanged(position),
        }
    }
}

/// Sending half given to engine implementations
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving half handed to the player
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Create the channel an engine uses to report events to the player
pub fn engine_channel() -> (EngineEventSender, EngineEventReceiver) {
    mpsc::unbounded_channel()
}

/// Platform audio output driven by the controller
pub trait AudioEngine: Send {
    /// Load a source, replacing whatever was loaded before
    ///
    /// Events for this source must carry `generation`.
    fn load(&mut self, source: &ResolvedSource, generation: Generation) -> Result<(), EngineError>;

    /// Start or resume playback of the loaded source
    fn play(&mut self) -> Result<(), EngineError>;

    /// Pause playback
    fn pause(&mut self) -> Result<(), EngineError>;

    /// Stop playback and unload the source
    fn stop(&mut self) -> Result<(), EngineError>;

    /// Seek within the loaded source
    fn seek(&mut self, position: Duration) -> Result<(), EngineError>;
}

impl<E: AudioEngine + ?Sized> AudioEngine for Box<E> {
    fn load(&mut self, source: &ResolvedSource, generation: Generation) -> Result<(), EngineError> {
        (**self).load(source, generation)
    }

    fn play(&mut self) -> Result<(), EngineError> {
        (**self).play()
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        (**self).pause()
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        (**self).stop()
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        (**self).seek(position)
    }
}
