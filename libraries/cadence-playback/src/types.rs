//! Core types for queue and playback management

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Positional identity of a queue entry
///
/// Assigned by the queue store when an item is enqueued. Enqueuing the same
/// track twice yields two entries with different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a queued track is played from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TrackSource {
    /// Already downloaded file, identified by its file name
    Local { file: String },

    /// Track identifier or URL that has to be resolved before playback
    Remote { track: String },
}

impl TrackSource {
    /// Whether the track is available without a remote round trip
    pub fn is_local(&self) -> bool {
        matches!(self, TrackSource::Local { .. })
    }

    /// The file name or remote reference carried by this source
    pub fn reference(&self) -> &str {
        match self {
            TrackSource::Local { file } => file,
            TrackSource::Remote { track } => track,
        }
    }
}

/// Track reference plus display metadata
///
/// Metadata is denormalized so the queue can be rendered without asking
/// the resolver. The resolver's canonical metadata replaces it for display
/// once the track has been resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Source discriminator
    pub source: TrackSource,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,

    /// Thumbnail URL or file reference (optional)
    pub thumbnail: Option<String>,

    /// Duration if known before resolution
    pub duration: Option<Duration>,
}

impl QueueItem {
    /// Item backed by a downloaded file
    pub fn local(file: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self::new(TrackSource::Local { file: file.into() }, title, artist)
    }

    /// Item that must be resolved remotely
    pub fn remote(track: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self::new(TrackSource::Remote { track: track.into() }, title, artist)
    }

    fn new(source: TrackSource, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            source,
            title: title.into(),
            artist: artist.into(),
            album: None,
            thumbnail: None,
            duration: None,
        }
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A queued item together with its positional identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: EntryId,
    pub item: QueueItem,
}

/// Where `enqueue` places new items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnqueuePosition {
    /// Append to the end of the queue
    #[default]
    End,

    /// Insert right after the current item
    Next,

    /// Insert at the cursor and make it current
    Now,
}

/// Immutable copy of the queue at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueEntry>,
    pub cursor: Option<usize>,
}

impl QueueSnapshot {
    /// Entry at the cursor
    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|index| self.entries.get(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids in queue order, mostly useful for assertions and logging
    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|entry| entry.id).collect()
    }
}

/// Kind of structural change applied to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueChangeKind {
    Inserted,
    Removed,
    Moved,
    CursorMoved,
    Cleared,
}

/// Change descriptor returned by every queue mutation
///
/// `affected` holds indices in the post-mutation queue for insertions and
/// cursor moves, and pre-mutation indices for removals. A move reports
/// `[from, to]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueChange {
    pub kind: QueueChangeKind,
    pub affected: Vec<usize>,
}

impl QueueChange {
    pub(crate) fn new(kind: QueueChangeKind, affected: Vec<usize>) -> Self {
        Self { kind, affected }
    }
}

/// Result of a queue mutation: the new snapshot and what changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueUpdate {
    pub snapshot: QueueSnapshot,
    pub change: QueueChange,
}

/// Monotonic counter invalidating stale asynchronous resolutions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

/// Transport state of the playback controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// No current item
    Idle,

    /// Source lookup in flight for the current item
    Resolving,

    /// Source resolved and loaded, not started
    Ready,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Current item finished naturally, about to advance
    Ended,

    /// Resolution or playback failed for the current item
    Failed,
}

impl PlaybackState {
    /// States in which the engine holds a loaded source
    pub fn has_loaded_source(self) -> bool {
        matches!(
            self,
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused
        )
    }
}

/// Observer-facing summary of the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub entry: Option<EntryId>,
    pub generation: Generation,
    pub position: Duration,
    pub last_error: Option<String>,
}

/// Configuration for the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Start playback automatically when auto-advance resolves the next item (default: true)
    pub autoplay_on_advance: bool,

    /// Resolution timeout in milliseconds (default: 180000)
    ///
    /// Covers downloads that transcode on the server before they can stream.
    pub resolve_timeout_ms: u64,

    /// Notification buffer per subscriber (default: 256)
    pub event_capacity: usize,

    /// Pending command buffer (default: 64)
    pub command_capacity: usize,

    /// Fixed seed for queue shuffling; entropy when unset
    pub shuffle_seed: Option<u64>,
}

impl PlayerConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay_on_advance: true,
            resolve_timeout_ms: 180_000,
            event_capacity: 256,
            command_capacity: 64,
            shuffle_seed: None,
        }
    }
}
