//! Playback controller - core orchestration
//!
//! Synchronous state machine that follows the queue's current entry,
//! requests source resolution for it, drives the audio engine, and
//! advances the queue on completion or failure.
//!
//! ```text
//!            new current            resolved (same generation)
//!   Idle ───────────────► Resolving ─────────────────────────► Ready
//!    ▲                      │   ▲                                │ play / autoplay
//!    │ stop / queue ends    │   │ next entry                     ▼
//!    │                      ▼   │                  pause      Playing ◄──► Paused
//!    └──────────────────── Failed / Ended ◄───────────────────────┘
//!                                         completed / engine error
//! ```
//!
//! Resolution itself is asynchronous and performed by the caller: every
//! step that starts a new episode leaves a [`ResolveRequest`] behind, and
//! the outcome is fed back through [`PlaybackController::on_resolved`].
//! Each episode carries a [`Generation`]; outcomes and engine events
//! tagged with any other generation are dropped.

use crate::engine::{AudioEngine, EngineEvent, EngineEventKind};
use crate::error::{PlaybackError, ResolveError, Result};
use crate::events::PlayerEvent;
use crate::queue::QueueStore;
use crate::shuffle::Shuffler;
use crate::source::ResolvedSource;
use crate::types::{
    EnqueuePosition, EntryId, Generation, PlaybackState, PlaybackStatus, PlayerConfig, QueueEntry,
    QueueItem, QueueSnapshot, QueueUpdate,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolution the caller must perform for the current episode
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveRequest {
    pub generation: Generation,
    pub entry: QueueEntry,
}

/// Ephemeral state of one episode
#[derive(Debug, Clone)]
struct PlaybackSession {
    entry: EntryId,
    source: Option<ResolvedSource>,
    position: Duration,
    autoplay: bool,
}

pub struct PlaybackController {
    state: PlaybackState,
    generation: Generation,
    session: Option<PlaybackSession>,

    // Entry the controller last acknowledged as current. Survives `stop()`
    // so edits that leave the current entry alone do not restart playback.
    tracked: Option<EntryId>,
    last_error: Option<String>,

    queue: QueueStore,
    engine: Box<dyn AudioEngine>,
    autoplay_on_advance: bool,

    pending_events: Vec<PlayerEvent>,
    pending_resolve: Option<ResolveRequest>,
}

impl PlaybackController {
    pub fn new(config: &PlayerConfig, engine: Box<dyn AudioEngine>) -> Self {
        Self::with_queue(
            config,
            QueueStore::with_shuffler(Shuffler::new(config.shuffle_seed)),
            engine,
        )
    }

    /// Controller over an existing queue store
    ///
    /// Whatever is current in `queue` is considered already acknowledged;
    /// nothing resolves until the current entry changes or `play()` is called.
    pub fn with_queue(config: &PlayerConfig, queue: QueueStore, engine: Box<dyn AudioEngine>) -> Self {
        Self {
            state: PlaybackState::Idle,
            generation: Generation::default(),
            session: None,
            tracked: queue.current().map(|entry| entry.id),
            last_error: None,
            queue,
            engine,
            autoplay_on_advance: config.autoplay_on_advance,
            pending_events: Vec::new(),
            pending_resolve: None,
        }
    }

    // ===== Queue Commands =====

    pub fn enqueue(&mut self, item: QueueItem, position: EnqueuePosition) -> QueueUpdate {
        let autoplay = position == EnqueuePosition::Now || self.is_engaged();
        let update = self.queue.enqueue(item, position);
        self.after_queue_change(update, autoplay)
    }

    pub fn enqueue_many(
        &mut self,
        items: Vec<QueueItem>,
        shuffle: bool,
        position: EnqueuePosition,
    ) -> QueueUpdate {
        let autoplay = position == EnqueuePosition::Now || self.is_engaged();
        let update = self.queue.enqueue_many(items, shuffle, position);
        self.after_queue_change(update, autoplay)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<QueueUpdate> {
        let autoplay = self.is_engaged();
        let update = self.queue.remove_at(index)?;
        Ok(self.after_queue_change(update, autoplay))
    }

    pub fn move_item(&mut self, from: usize, to: usize) -> Result<QueueUpdate> {
        let autoplay = self.is_engaged();
        let update = self.queue.move_item(from, to)?;
        Ok(self.after_queue_change(update, autoplay))
    }

    pub fn set_cursor(&mut self, index: usize) -> Result<QueueUpdate> {
        let autoplay = self.is_engaged();
        let update = self.queue.set_cursor(index)?;
        Ok(self.after_queue_change(update, autoplay))
    }

    pub fn clear(&mut self) -> QueueUpdate {
        let update = self.queue.clear();
        self.after_queue_change(update, false)
    }

    // ===== Transport Commands =====

    /// Start playback of the current entry
    ///
    /// From `Idle` this re-resolves the current entry, or starts the queue
    /// from the top when nothing is current.
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Ready => {
                self.start_playing();
                Ok(())
            }
            PlaybackState::Paused => {
                self.resume_playing();
                Ok(())
            }
            PlaybackState::Resolving => {
                if let Some(session) = self.session.as_mut() {
                    session.autoplay = true;
                }
                Ok(())
            }
            PlaybackState::Idle => {
                if self.queue.is_empty() {
                    return Err(PlaybackError::QueueEmpty);
                }
                if self.queue.current().is_none() {
                    let update = self.queue.set_cursor(0)?;
                    self.emit(PlayerEvent::QueueChanged(update));
                }
                self.begin_episode(true);
                Ok(())
            }
            PlaybackState::Playing | PlaybackState::Ended | PlaybackState::Failed => Ok(()),
        }
    }

    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing => {
                if let Err(e) = self.engine.pause() {
                    self.fail(e.to_string());
                    return Ok(());
                }
                self.transition(PlaybackState::Paused);
                Ok(())
            }
            PlaybackState::Paused => Ok(()),
            PlaybackState::Resolving | PlaybackState::Ready => {
                // Nothing audible yet; just cancel the pending autoplay
                if let Some(session) = self.session.as_mut() {
                    session.autoplay = false;
                }
                Ok(())
            }
            _ => Err(PlaybackError::InvalidOperation(
                "nothing is playing".to_string(),
            )),
        }
    }

    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Idle => Err(PlaybackError::InvalidOperation(
                "nothing to resume".to_string(),
            )),
            _ => self.play(),
        }
    }

    /// Stop playback and drop the session
    ///
    /// The cursor is kept, so a later `play()` starts the same entry again.
    pub fn stop(&mut self) {
        self.generation = self.generation.next();
        self.halt_engine();
        self.session = None;
        info!(generation = %self.generation, "Playback stopped");
        self.transition(PlaybackState::Idle);
    }

    pub fn seek(&mut self, position: Duration) -> Result<()> {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return Err(PlaybackError::InvalidOperation(format!(
                "cannot seek while {:?}",
                self.state
            )));
        }

        if let Err(e) = self.engine.seek(position) {
            self.fail(e.to_string());
            return Ok(());
        }
        self.record_position(position);
        Ok(())
    }

    /// Advance to the next entry, cancelling any in-flight resolution
    pub fn skip_next(&mut self) -> QueueUpdate {
        let autoplay = self.is_engaged();
        let update = self.queue.advance();
        self.after_queue_change(update, autoplay)
    }

    /// Step back to the previous entry
    ///
    /// At the first entry the cursor cannot move; the current track is
    /// restarted instead if it is loaded.
    pub fn skip_previous(&mut self) -> QueueUpdate {
        let autoplay = self.is_engaged();
        let before = self.queue.current().map(|entry| entry.id);
        let update = self.queue.rewind();

        if before.is_some() && before == self.queue.current().map(|entry| entry.id) {
            self.emit(PlayerEvent::QueueChanged(update.clone()));
            if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                debug!(generation = %self.generation, "Restarting current track");
                if let Err(e) = self.engine.seek(Duration::ZERO) {
                    self.fail(e.to_string());
                } else {
                    self.record_position(Duration::ZERO);
                }
            }
            return update;
        }

        self.after_queue_change(update, autoplay)
    }

    // ===== Asynchronous Inputs =====

    /// Apply the outcome of a resolution request
    ///
    /// Outcomes for any generation other than the current one are dropped
    /// without effect: a newer episode has already superseded them.
    pub fn on_resolved(
        &mut self,
        generation: Generation,
        outcome: std::result::Result<ResolvedSource, ResolveError>,
    ) {
        if generation != self.generation || self.state != PlaybackState::Resolving {
            debug!(
                stale = %generation,
                current = %self.generation,
                "Dropping stale resolution"
            );
            return;
        }

        let source = match outcome {
            Ok(source) => source,
            Err(e) => {
                warn!(generation = %generation, error = %e, "Resolution failed");
                self.fail(e.to_string());
                return;
            }
        };

        if let Err(e) = self.engine.load(&source, generation) {
            warn!(generation = %generation, error = %e, "Engine rejected source");
            self.fail(e.to_string());
            return;
        }

        debug!(generation = %generation, handle = %source.handle, "Source ready");
        let autoplay = match self.session.as_mut() {
            Some(session) => {
                session.source = Some(source);
                session.autoplay
            }
            None => false,
        };
        self.transition(PlaybackState::Ready);

        if autoplay {
            self.start_playing();
        }
    }

    /// Apply an event reported by the audio engine
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        if event.generation != self.generation {
            debug!(
                stale = %event.generation,
                current = %self.generation,
                "Ignoring engine event for replaced source"
            );
            return;
        }

        match event.kind {
            EngineEventKind::Completed => {
                if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                    return;
                }
                if let Some(session) = self.session.as_mut() {
                    // Finished sources need no stop
                    session.source = None;
                }
                self.transition(PlaybackState::Ended);
                self.auto_advance();
            }
            EngineEventKind::Error(reason) => {
                if self.state.has_loaded_source() {
                    warn!(generation = %self.generation, reason = %reason, "Engine reported error");
                    self.fail(format!("Playback engine error: {reason}"));
                }
            }
            EngineEventKind::PositionChanged(position) => {
                if matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
                    self.record_position(position);
                }
            }
        }
    }

    // ===== Queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn queue(&self) -> &QueueStore {
        &self.queue
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        self.queue.snapshot()
    }

    pub fn current_item(&self) -> Option<QueueEntry> {
        self.queue.current().cloned()
    }

    /// Source resolved for the current episode, once `Ready`
    pub fn current_source(&self) -> Option<&ResolvedSource> {
        self.session.as_ref().and_then(|session| session.source.as_ref())
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            entry: self.session.as_ref().map(|session| session.entry),
            generation: self.generation,
            position: self
                .session
                .as_ref()
                .map_or(Duration::ZERO, |session| session.position),
            last_error: self.last_error.clone(),
        }
    }

    /// Take events produced since the last call, in emission order
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    /// Take the resolution the caller must now perform, if any
    ///
    /// Only the most recent request is kept; earlier ones were superseded.
    pub fn take_resolve_request(&mut self) -> Option<ResolveRequest> {
        self.pending_resolve.take()
    }

    // ===== Internals =====

    /// Whether the user currently expects sound, so a new episode should autoplay
    fn is_engaged(&self) -> bool {
        match self.state {
            PlaybackState::Playing | PlaybackState::Ended | PlaybackState::Failed => true,
            PlaybackState::Resolving | PlaybackState::Ready => {
                self.session.as_ref().is_some_and(|session| session.autoplay)
            }
            PlaybackState::Idle | PlaybackState::Paused => false,
        }
    }

    fn after_queue_change(&mut self, update: QueueUpdate, autoplay: bool) -> QueueUpdate {
        self.emit(PlayerEvent::QueueChanged(update.clone()));

        let current = self.queue.current().map(|entry| entry.id);
        if current != self.tracked {
            self.begin_episode(autoplay);
        }
        update
    }

    /// Start a new episode for whatever is current, or go idle
    fn begin_episode(&mut self, autoplay: bool) {
        self.generation = self.generation.next();
        self.halt_engine();
        self.session = None;
        self.pending_resolve = None;

        let Some(entry) = self.queue.current().cloned() else {
            self.tracked = None;
            debug!(generation = %self.generation, "Nothing current, going idle");
            self.transition(PlaybackState::Idle);
            return;
        };

        info!(
            generation = %self.generation,
            entry = %entry.id,
            title = %entry.item.title,
            "Resolving"
        );
        self.tracked = Some(entry.id);
        self.session = Some(PlaybackSession {
            entry: entry.id,
            source: None,
            position: Duration::ZERO,
            autoplay,
        });
        self.transition(PlaybackState::Resolving);
        self.pending_resolve = Some(ResolveRequest {
            generation: self.generation,
            entry,
        });
    }

    fn auto_advance(&mut self) {
        let update = self.queue.advance();
        self.emit(PlayerEvent::QueueChanged(update));
        self.begin_episode(self.autoplay_on_advance);
    }

    /// Surface a failure for the current entry, then move past it
    fn fail(&mut self, reason: String) {
        self.halt_engine();
        if let Some(session) = self.session.as_mut() {
            session.source = None;
        }
        self.last_error = Some(reason.clone());
        self.set_state(PlaybackState::Failed, Some(reason));
        self.auto_advance();
    }

    fn start_playing(&mut self) {
        if let Err(e) = self.engine.play() {
            self.fail(e.to_string());
            return;
        }
        info!(generation = %self.generation, "Playing");
        self.transition(PlaybackState::Playing);
    }

    fn resume_playing(&mut self) {
        if let Err(e) = self.engine.play() {
            self.fail(e.to_string());
            return;
        }
        self.transition(PlaybackState::Playing);
    }

    /// Stop the engine if it holds a source for the current session
    fn halt_engine(&mut self) {
        let loaded = self
            .session
            .as_ref()
            .is_some_and(|session| session.source.is_some());
        if loaded {
            if let Err(e) = self.engine.stop() {
                warn!(error = %e, "Engine failed to stop");
            }
        }
    }

    fn record_position(&mut self, position: Duration) {
        if let Some(session) = self.session.as_mut() {
            session.position = position;
            let entry = session.entry;
            self.emit(PlayerEvent::PositionChanged { entry, position });
        }
    }

    fn transition(&mut self, state: PlaybackState) {
        self.set_state(state, None);
    }

    fn set_state(&mut self, state: PlaybackState, error: Option<String>) {
        let previous = self.state;
        if previous == PlaybackState::Idle && state == PlaybackState::Idle {
            return;
        }
        self.state = state;

        // The failed entry is reported even though the session is about to go
        let entry = self.session.as_ref().map(|session| session.entry);
        debug!(from = ?previous, to = ?state, generation = %self.generation, "State transition");
        self.emit(PlayerEvent::StateChanged {
            state,
            entry,
            generation: self.generation,
            error,
        });
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.pending_events.push(event);
    }
}
