//! Player notifications
//!
//! Events are emitted in the exact order the controller applied the
//! transitions that caused them:
//! - Queue changes (every successful mutation)
//! - State changes (every transition, failures included)
//! - Position updates (forwarded from the engine)

use crate::types::{EntryId, Generation, PlaybackState, QueueUpdate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Queue was mutated
    QueueChanged(QueueUpdate),

    /// Playback state changed
    StateChanged {
        /// The new state
        state: PlaybackState,
        /// Entry the state refers to (the failed entry for `Failed`)
        entry: Option<EntryId>,
        /// Session generation at the time of the transition
        generation: Generation,
        /// Failure reason, set for `Failed`
        error: Option<String>,
    },

    /// Playback position of the current entry moved
    PositionChanged {
        entry: EntryId,
        position: Duration,
    },
}

impl PlayerEvent {
    /// State carried by a `StateChanged` event
    pub fn state(&self) -> Option<PlaybackState> {
        match self {
            PlayerEvent::StateChanged { state, .. } => Some(*state),
            _ => None,
        }
    }

    pub fn is_queue_change(&self) -> bool {
        matches!(self, PlayerEvent::QueueChanged(_))
    }
}
