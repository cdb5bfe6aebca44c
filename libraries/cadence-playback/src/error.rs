//! Error types for queue and playback management

use std::time::Duration;
use thiserror::Error;

/// Errors reported synchronously to the caller of a queue or transport command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Index does not address an entry of the queue
    #[error("Index {index} out of range for queue of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Move with an invalid source or target index
    #[error("Cannot move entry from {from} to {to} in queue of length {len}")]
    InvalidMove { from: usize, to: usize, len: usize },

    /// Command not valid in the current state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// The player task has shut down
    #[error("Player is no longer running")]
    PlayerClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Failure to turn a track reference into a playable source
///
/// Never returned to command callers; surfaced as a `Failed` notification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Track not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Resolution timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure reported by the audio engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Source could not be loaded
    #[error("Failed to load source: {0}")]
    Load(String),

    /// Transport command or playback failed
    #[error("Playback engine error: {0}")]
    Transport(String),
}
