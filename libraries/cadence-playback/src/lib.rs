//! Cadence - Queue and Playback Orchestration
//!
//! Decides what plays next and from where, and keeps the play queue
//! consistent with user edits while one playback session runs.
//!
//! This crate provides:
//! - Queue store with a cursor that survives inserts, removals and moves
//! - Bulk enqueue with seeded Fisher-Yates shuffle
//! - Playback controller state machine (resolve, play, pause, auto-advance)
//! - Generation-based discard of stale resolutions and engine events
//! - Async player service with a cloneable command facade and ordered
//!   notifications
//!
//! # Architecture
//!
//! `cadence-playback` knows nothing about HTTP, files, or audio output:
//! - Source resolution is provided through [`SourceResolver`]
//! - Audio output is provided through [`AudioEngine`]
//!
//! Everything runs on one logical task. The only suspension points are
//! the resolver call and waiting for engine events.
//!
//! # Example: Queue Store
//!
//! ```rust
//! use cadence_playback::{EnqueuePosition, QueueItem, QueueStore};
//!
//! let mut queue = QueueStore::new();
//! queue.enqueue(QueueItem::local("one.m4a", "One", "Artist"), EnqueuePosition::End);
//! queue.enqueue(QueueItem::remote("https://youtu.be/x", "Two", "Artist"), EnqueuePosition::End);
//!
//! assert_eq!(queue.current().unwrap().item.title, "One");
//! queue.advance();
//! assert_eq!(queue.current().unwrap().item.title, "Two");
//! queue.advance();
//! assert!(queue.current().is_none()); // no wraparound
//! ```
//!
//! # Example: Running a Player
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use cadence_playback::{
//!     engine_channel, AudioEngine, EngineError, EnqueuePosition, Generation, Player,
//!     PlayerConfig, QueueItem, ResolveError, ResolvedSource, SourceHandle, SourceResolver,
//! };
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct FileResolver;
//!
//! #[async_trait]
//! impl SourceResolver for FileResolver {
//!     async fn resolve(&self, item: &QueueItem) -> Result<ResolvedSource, ResolveError> {
//!         let handle = SourceHandle::new(format!("file:///music/{}", item.source.reference()));
//!         Ok(ResolvedSource::from_item(handle, item))
//!     }
//! }
//!
//! struct SilentEngine;
//!
//! impl AudioEngine for SilentEngine {
//!     fn load(&mut self, _: &ResolvedSource, _: Generation) -> Result<(), EngineError> { Ok(()) }
//!     fn play(&mut self) -> Result<(), EngineError> { Ok(()) }
//!     fn pause(&mut self) -> Result<(), EngineError> { Ok(()) }
//!     fn stop(&mut self) -> Result<(), EngineError> { Ok(()) }
//!     fn seek(&mut self, _: Duration) -> Result<(), EngineError> { Ok(()) }
//! }
//!
//! # #[tokio::main] async fn main() -> cadence_playback::Result<()> {
//! let (_engine_tx, engine_rx) = engine_channel();
//! let player = Player::spawn(PlayerConfig::default(), Arc::new(FileResolver), SilentEngine, engine_rx);
//! let mut events = player.subscribe();
//!
//! player.enqueue(QueueItem::local("song.m4a", "Song", "Artist"), EnqueuePosition::Now).await?;
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! # Ok(()) }
//! ```

mod controller;
mod engine;
mod error;
mod events;
mod queue;
mod service;
mod shuffle;
mod source;
pub mod types;

// Public exports
pub use controller::{PlaybackController, ResolveRequest};
pub use engine::{
    engine_channel, AudioEngine, EngineEvent, EngineEventKind, EngineEventReceiver,
    EngineEventSender,
};
pub use error::{EngineError, PlaybackError, ResolveError, Result};
pub use events::PlayerEvent;
pub use queue::QueueStore;
pub use service::{Player, PlayerHandle};
pub use shuffle::Shuffler;
pub use source::{ResolvedSource, SourceHandle, SourceResolver};
pub use types::{
    EnqueuePosition, EntryId, Generation, PlaybackState, PlaybackStatus, PlayerConfig,
    QueueChange, QueueChangeKind, QueueEntry, QueueItem, QueueSnapshot, QueueUpdate, TrackSource,
};
