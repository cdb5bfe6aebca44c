//! Play a queue through to the end
//!
//! Subscribes to the player, queues the items, starts playback and logs
//! every notification until the player runs out of tracks.

use crate::error::{CliError, Result};
use cadence_playback::{
    EnqueuePosition, PlaybackState, PlayerEvent, PlayerHandle, QueueItem, QueueSnapshot,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

/// Outcome of a finished session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSummary {
    /// Tracks that played to their end
    pub played: usize,
    /// Tracks that failed to resolve or play
    pub failed: usize,
}

/// Queue `items` and play until the queue is exhausted
pub async fn play_queue(
    player: &PlayerHandle,
    items: Vec<QueueItem>,
    shuffle: bool,
) -> Result<PlaybackSummary> {
    if items.is_empty() {
        return Err(CliError::NothingToPlay("the queue is empty".to_string()));
    }

    // Subscribe first so no notification is missed
    let mut events = player.subscribe();

    let count = items.len();
    let update = player
        .enqueue_many(items, shuffle, EnqueuePosition::End)
        .await?;
    info!(tracks = count, shuffle, "Queued tracks");
    log_queue(&update.snapshot);

    player.play().await?;
    Ok(watch_until_idle(&mut events).await)
}

/// Log notifications until the player goes idle or closes
pub async fn watch_until_idle(events: &mut broadcast::Receiver<PlayerEvent>) -> PlaybackSummary {
    let mut summary = PlaybackSummary::default();

    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed player notifications");
                continue;
            }
            Err(RecvError::Closed) => {
                debug!("Player closed");
                return summary;
            }
        };

        log_event(&event);

        match event.state() {
            Some(PlaybackState::Ended) => summary.played += 1,
            Some(PlaybackState::Failed) => summary.failed += 1,
            Some(PlaybackState::Idle) => return summary,
            _ => {}
        }
    }
}

pub fn log_event(event: &PlayerEvent) {
    match event {
        PlayerEvent::QueueChanged(update) => {
            debug!(
                kind = ?update.change.kind,
                affected = ?update.change.affected,
                len = update.snapshot.len(),
                cursor = ?update.snapshot.cursor,
                "Queue changed"
            );
        }
        PlayerEvent::StateChanged {
            state,
            entry,
            generation,
            error,
        } => match error {
            Some(error) => warn!(
                state = ?state,
                entry = ?entry,
                generation = %generation,
                error = %error,
                "Playback failed"
            ),
            None => info!(
                state = ?state,
                entry = ?entry,
                generation = %generation,
                "Playback state"
            ),
        },
        PlayerEvent::PositionChanged { entry, position } => {
            debug!(entry = ?entry, position_secs = position.as_secs(), "Position");
        }
    }
}

pub fn log_queue(snapshot: &QueueSnapshot) {
    for (index, entry) in snapshot.entries.iter().enumerate() {
        let marker = if snapshot.cursor == Some(index) { ">" } else { " " };
        info!(
            "{} {:>3}. {} - {}",
            marker,
            index + 1,
            entry.item.artist,
            entry.item.title
        );
    }
}
