//! Source resolution capability
//!
//! Abstracts "track reference to playable source" so the controller works
//! with downloaded files, HTTP download services, or test doubles alike.

use crate::error::ResolveError;
use crate::types::QueueItem;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque handle to a playable source
///
/// The controller never inspects it; it is passed unchanged to the audio engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceHandle(pub String);

impl SourceHandle {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved track: playable handle plus canonical metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSource {
    pub handle: SourceHandle,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration: Option<Duration>,
}

impl ResolvedSource {
    /// Resolution that keeps the item's own metadata
    pub fn from_item(handle: SourceHandle, item: &QueueItem) -> Self {
        Self {
            handle,
            title: item.title.clone(),
            artist: item.artist.clone(),
            album: item.album.clone(),
            duration: item.duration,
        }
    }
}

/// Resolves queue items into playable sources
///
/// Implementations may be slow (network). The player runs every call in its
/// own task under a timeout and drops the future when the result is no
/// longer wanted, so transports that cancel on drop stop early.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    async fn resolve(&self, item: &QueueItem) -> Result<ResolvedSource, ResolveError>;
}
