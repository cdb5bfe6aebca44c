//! Types for music download API requests and responses.

use cadence_playback::QueueItem;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Configuration for connecting to the download API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the API (e.g., "http://127.0.0.1:8000")
    pub base_url: String,
    /// Container requested for new downloads
    pub output_format: OutputFormat,
    /// Whole-request timeout in seconds; downloads block until the server
    /// has fetched and converted the track
    pub request_timeout_secs: u64,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Ask the server to embed cover art into downloaded files
    pub embed_thumbnail: bool,
}

impl RemoteConfig {
    /// Config for the given URL with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            output_format: OutputFormat::M4a,
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
            embed_thumbnail: false,
        }
    }
}

/// Audio container produced by the download service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    M4a,
    Mp3,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::M4a => "m4a",
            OutputFormat::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// =============================================================================
// Service Types
// =============================================================================

/// Response from the API root.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceStatus {
    pub message: String,
    pub status: String,
}

// =============================================================================
// Search Types
// =============================================================================

/// Request body for the search endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    /// Query several search variants and filter by title keywords
    pub deep_search: bool,
    /// Shortest accepted duration in seconds
    pub duration_min: u32,
    /// Longest accepted duration in seconds
    pub duration_max: f64,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            deep_search: true,
            duration_min: 0,
            duration_max: 600.0,
        }
    }

    #[must_use]
    pub fn quick(mut self) -> Self {
        self.deep_search = false;
        self
    }

    #[must_use]
    pub fn with_duration_range(mut self, min_secs: u32, max_secs: f64) -> Self {
        self.duration_min = min_secs;
        self.duration_max = max_secs;
        self
    }
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub uploader: String,
    /// Duration in seconds
    pub duration: f64,
    pub url: String,
    pub thumbnail: String,
}

impl VideoInfo {
    /// Queue item that resolves this result through a download.
    pub fn to_queue_item(&self) -> QueueItem {
        let mut item = QueueItem::remote(&self.url, &self.title, &self.uploader);
        if !self.thumbnail.is_empty() {
            item = item.with_thumbnail(&self.thumbnail);
        }
        if self.duration.is_finite() && self.duration > 0.0 {
            item = item.with_duration(Duration::from_secs_f64(self.duration));
        }
        item
    }
}

// =============================================================================
// Download Types
// =============================================================================

/// Request body for the download endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub output_format: OutputFormat,
    pub embed_thumbnail: bool,
}

/// Response from a completed download.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadResponse {
    pub success: bool,
    /// Path on the server
    pub file_path: String,
    /// Name to stream the file under
    pub filename: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
}

/// A file in the server's download folder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadedFile {
    pub filename: String,
    pub file_path: String,
    /// Size in bytes
    pub size: u64,
}

impl DownloadedFile {
    /// Queue item for this file, titled after the file name.
    pub fn to_queue_item(&self) -> QueueItem {
        local_queue_item(&self.filename)
    }
}

/// Queue item for a file in the downloads folder.
///
/// `"Artist - Title.m4a"` is split into artist and title; anything else
/// becomes the title with an unknown artist.
pub fn local_queue_item(filename: &str) -> QueueItem {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(filename);

    match stem.split_once(" - ") {
        Some((artist, title)) if !artist.trim().is_empty() && !title.trim().is_empty() => {
            QueueItem::local(filename, title.trim(), artist.trim())
        }
        _ => QueueItem::local(filename, stem, "Unknown Artist"),
    }
}

/// Response from the downloads listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadsListing {
    pub files: Vec<DownloadedFile>,
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: String,
}
