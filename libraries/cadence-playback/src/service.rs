//! Player service
//!
//! Runs a [`PlaybackController`] on one tokio task. Commands from the
//! facade, engine events and resolution outcomes all funnel into that task
//! and are applied one at a time, so the queue and controller never see
//! concurrent mutation and notifications leave in the order transitions
//! happened.

use crate::controller::{PlaybackController, ResolveRequest};
use crate::engine::{AudioEngine, EngineEventReceiver};
use crate::error::{PlaybackError, ResolveError, Result};
use crate::events::PlayerEvent;
use crate::source::{ResolvedSource, SourceResolver};
use crate::types::{
    EnqueuePosition, Generation, PlaybackState, PlaybackStatus, PlayerConfig, QueueEntry,
    QueueItem, QueueSnapshot, QueueUpdate,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{debug, info, warn};

enum Command {
    Enqueue {
        item: QueueItem,
        position: EnqueuePosition,
        reply: oneshot::Sender<QueueUpdate>,
    },
    EnqueueMany {
        items: Vec<QueueItem>,
        shuffle: bool,
        position: EnqueuePosition,
        reply: oneshot::Sender<QueueUpdate>,
    },
    RemoveAt {
        index: usize,
        reply: oneshot::Sender<Result<QueueUpdate>>,
    },
    MoveItem {
        from: usize,
        to: usize,
        reply: oneshot::Sender<Result<QueueUpdate>>,
    },
    SetCursor {
        index: usize,
        reply: oneshot::Sender<Result<QueueUpdate>>,
    },
    Clear {
        reply: oneshot::Sender<QueueUpdate>,
    },
    Play {
        reply: oneshot::Sender<Result<()>>,
    },
    Pause {
        reply: oneshot::Sender<Result<()>>,
    },
    Resume {
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Seek {
        position: Duration,
        reply: oneshot::Sender<Result<()>>,
    },
    SkipNext {
        reply: oneshot::Sender<QueueUpdate>,
    },
    SkipPrevious {
        reply: oneshot::Sender<QueueUpdate>,
    },
    Snapshot {
        reply: oneshot::Sender<QueueSnapshot>,
    },
    Status {
        reply: oneshot::Sender<PlaybackStatus>,
    },
    CurrentItem {
        reply: oneshot::Sender<Option<QueueEntry>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Outcome of one resolution task
struct Resolution {
    generation: Generation,
    outcome: std::result::Result<ResolvedSource, ResolveError>,
}

/// Entry point for starting the player task
pub struct Player;

impl Player {
    /// Spawn the player on the current tokio runtime
    ///
    /// `engine_events` must be the receiving half of the channel whose
    /// sender was given to `engine`.
    pub fn spawn(
        config: PlayerConfig,
        resolver: Arc<dyn SourceResolver>,
        engine: impl AudioEngine + 'static,
        engine_events: EngineEventReceiver,
    ) -> PlayerHandle {
        let controller = PlaybackController::new(&config, Box::new(engine));
        Self::spawn_with_controller(config, controller, resolver, engine_events)
    }

    /// Spawn the player around an already configured controller
    pub fn spawn_with_controller(
        config: PlayerConfig,
        controller: PlaybackController,
        resolver: Arc<dyn SourceResolver>,
        engine_events: EngineEventReceiver,
    ) -> PlayerHandle {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity.max(1));
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();

        let task = PlayerTask {
            controller,
            resolver,
            resolve_timeout: config.resolve_timeout(),
            events: event_tx.clone(),
            resolved_tx,
            in_flight: None,
        };

        info!(
            resolve_timeout_ms = config.resolve_timeout_ms,
            autoplay_on_advance = config.autoplay_on_advance,
            "Starting player"
        );
        tokio::spawn(task.run(command_rx, engine_events, resolved_rx));

        PlayerHandle {
            commands: command_tx,
            events: event_tx,
        }
    }
}

struct PlayerTask {
    controller: PlaybackController,
    resolver: Arc<dyn SourceResolver>,
    resolve_timeout: Duration,
    events: broadcast::Sender<PlayerEvent>,
    resolved_tx: mpsc::UnboundedSender<Resolution>,
    in_flight: Option<(Generation, JoinHandle<()>)>,
}

impl PlayerTask {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut engine_events: EngineEventReceiver,
        mut resolved: mpsc::UnboundedReceiver<Resolution>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        if let Some(reply) = self.handle_command(command) {
                            self.shutdown();
                            let _ = reply.send(());
                            return;
                        }
                    }
                    None => break,
                },
                Some(event) = engine_events.recv() => {
                    self.controller.on_engine_event(event);
                }
                Some(resolution) = resolved.recv() => {
                    self.finish_resolution(resolution);
                }
            }
            self.flush();
        }

        // Every handle dropped
        self.shutdown();
    }

    /// Apply one command; returns the reply channel when it asks for shutdown
    fn handle_command(&mut self, command: Command) -> Option<oneshot::Sender<()>> {
        match command {
            Command::Enqueue {
                item,
                position,
                reply,
            } => {
                let update = self.controller.enqueue(item, position);
                self.respond(reply, update);
            }
            Command::EnqueueMany {
                items,
                shuffle,
                position,
                reply,
            } => {
                let update = self.controller.enqueue_many(items, shuffle, position);
                self.respond(reply, update);
            }
            Command::RemoveAt { index, reply } => {
                let result = self.controller.remove_at(index);
                self.respond(reply, result);
            }
            Command::MoveItem { from, to, reply } => {
                let result = self.controller.move_item(from, to);
                self.respond(reply, result);
            }
            Command::SetCursor { index, reply } => {
                let result = self.controller.set_cursor(index);
                self.respond(reply, result);
            }
            Command::Clear { reply } => {
                let update = self.controller.clear();
                self.respond(reply, update);
            }
            Command::Play { reply } => {
                let result = self.controller.play();
                self.respond(reply, result);
            }
            Command::Pause { reply } => {
                let result = self.controller.pause();
                self.respond(reply, result);
            }
            Command::Resume { reply } => {
                let result = self.controller.resume();
                self.respond(reply, result);
            }
            Command::Stop { reply } => {
                self.controller.stop();
                self.respond(reply, ());
            }
            Command::Seek { position, reply } => {
                let result = self.controller.seek(position);
                self.respond(reply, result);
            }
            Command::SkipNext { reply } => {
                let update = self.controller.skip_next();
                self.respond(reply, update);
            }
            Command::SkipPrevious { reply } => {
                let update = self.controller.skip_previous();
                self.respond(reply, update);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
            Command::Status { reply } => {
                let _ = reply.send(self.controller.status());
            }
            Command::CurrentItem { reply } => {
                let _ = reply.send(self.controller.current_item());
            }
            Command::Shutdown { reply } => return Some(reply),
        }
        None
    }

    /// Publish the command's effects, then answer the caller
    ///
    /// Subscribers therefore hold every event a command caused by the time
    /// its caller resumes. A dropped receiver means the caller stopped
    /// waiting; the command has still been applied.
    fn respond<T>(&mut self, reply: oneshot::Sender<T>, value: T) {
        self.flush();
        let _ = reply.send(value);
    }

    fn finish_resolution(&mut self, resolution: Resolution) {
        if self
            .in_flight
            .as_ref()
            .is_some_and(|(generation, _)| *generation == resolution.generation)
        {
            self.in_flight = None;
        }
        self.controller
            .on_resolved(resolution.generation, resolution.outcome);
    }

    /// Start pending work, cancel superseded work, publish events
    fn flush(&mut self) {
        if let Some(request) = self.controller.take_resolve_request() {
            self.spawn_resolution(request);
        }

        let current = self.controller.generation();
        if let Some((generation, handle)) = self.in_flight.take() {
            if generation == current {
                self.in_flight = Some((generation, handle));
            } else {
                debug!(cancelled = %generation, current = %current, "Cancelling superseded resolution");
                handle.abort();
            }
        }

        for event in self.controller.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }

    fn spawn_resolution(&mut self, request: ResolveRequest) {
        if let Some((generation, handle)) = self.in_flight.take() {
            debug!(cancelled = %generation, "Cancelling superseded resolution");
            handle.abort();
        }

        let resolver = Arc::clone(&self.resolver);
        let results = self.resolved_tx.clone();
        let timeout = self.resolve_timeout;
        let generation = request.generation;

        let handle = tokio::spawn(async move {
            let item = request.entry.item;
            let title = item.title.clone();

            // The lookup runs in its own task so a panicking resolver surfaces
            // as a failed join instead of taking the timeout down with it
            let lookup = tokio::spawn(async move { resolver.resolve(&item).await });
            let guard = AbortOnDrop(lookup.abort_handle());

            let outcome = match tokio::time::timeout(timeout, lookup).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) if e.is_panic() => {
                    let reason = panic_reason(e);
                    warn!(
                        generation = %generation,
                        title = %title,
                        reason = %reason,
                        "Resolver panicked"
                    );
                    Err(ResolveError::Network(format!("resolver panicked: {reason}")))
                }
                // Cancelled along with this task
                Ok(Err(_)) => return,
                Err(_) => {
                    warn!(generation = %generation, title = %title, "Resolution timed out");
                    Err(ResolveError::Timeout(timeout))
                }
            };
            drop(guard);

            let _ = results.send(Resolution {
                generation,
                outcome,
            });
        });

        self.in_flight = Some((generation, handle));
    }

    fn shutdown(&mut self) {
        if let Some((_, handle)) = self.in_flight.take() {
            handle.abort();
        }
        if self.controller.state() != PlaybackState::Idle {
            self.controller.stop();
        }
        for event in self.controller.drain_events() {
            let _ = self.events.send(event);
        }
        info!("Player stopped");
    }
}

/// Aborts the resolver task when its resolution is cancelled or times out
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_reason(error: JoinError) -> String {
    let payload = error.into_panic();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Cloneable facade over the running player
///
/// Commands are applied in the order they are sent. Structural errors
/// (bad index, bad move) come back from the command itself; resolution and
/// engine failures only ever appear on the event stream.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<PlayerEvent>,
}

impl PlayerHandle {
    /// Subscribe to notifications emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    // ===== Queries =====

    pub async fn current_item(&self) -> Result<Option<QueueEntry>> {
        self.request(|reply| Command::CurrentItem { reply }).await
    }

    pub async fn queue_snapshot(&self) -> Result<QueueSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    pub async fn playback_state(&self) -> Result<PlaybackState> {
        Ok(self.status().await?.state)
    }

    pub async fn status(&self) -> Result<PlaybackStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    // ===== Queue Commands =====

    pub async fn enqueue(&self, item: QueueItem, position: EnqueuePosition) -> Result<QueueUpdate> {
        self.request(|reply| Command::Enqueue {
            item,
            position,
            reply,
        })
        .await
    }

    pub async fn enqueue_many(
        &self,
        items: Vec<QueueItem>,
        shuffle: bool,
        position: EnqueuePosition,
    ) -> Result<QueueUpdate> {
        self.request(|reply| Command::EnqueueMany {
            items,
            shuffle,
            position,
            reply,
        })
        .await
    }

    pub async fn remove_at(&self, index: usize) -> Result<QueueUpdate> {
        self.request(|reply| Command::RemoveAt { index, reply })
            .await?
    }

    pub async fn move_item(&self, from: usize, to: usize) -> Result<QueueUpdate> {
        self.request(|reply| Command::MoveItem { from, to, reply })
            .await?
    }

    pub async fn set_cursor(&self, index: usize) -> Result<QueueUpdate> {
        self.request(|reply| Command::SetCursor { index, reply })
            .await?
    }

    pub async fn clear(&self) -> Result<QueueUpdate> {
        self.request(|reply| Command::Clear { reply }).await
    }

    // ===== Transport Commands =====

    pub async fn play(&self) -> Result<()> {
        self.request(|reply| Command::Play { reply }).await?
    }

    pub async fn pause(&self) -> Result<()> {
        self.request(|reply| Command::Pause { reply }).await?
    }

    pub async fn resume(&self) -> Result<()> {
        self.request(|reply| Command::Resume { reply }).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn seek(&self, position: Duration) -> Result<()> {
        self.request(|reply| Command::Seek { position, reply })
            .await?
    }

    pub async fn skip_next(&self) -> Result<QueueUpdate> {
        self.request(|reply| Command::SkipNext { reply }).await
    }

    pub async fn skip_previous(&self) -> Result<QueueUpdate> {
        self.request(|reply| Command::SkipPrevious { reply }).await
    }

    /// Stop playback and end the player task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| PlaybackError::PlayerClosed)?;
        response.await.map_err(|_| PlaybackError::PlayerClosed)
    }
}
