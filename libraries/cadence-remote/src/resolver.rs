//! Source resolution against the download API.

use crate::client::DownloadApiClient;
use crate::error::{RemoteError, Result};
use async_trait::async_trait;
use cadence_playback::{
    QueueItem, ResolveError, ResolvedSource, SourceHandle, SourceResolver, TrackSource,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves queue items to streaming URLs served by the download API.
///
/// - `Local` items must already be listed in the downloads folder
/// - `Remote` items are downloaded first, then streamed from the new file
pub struct HttpSourceResolver {
    client: Arc<DownloadApiClient>,
}

impl HttpSourceResolver {
    pub fn new(client: Arc<DownloadApiClient>) -> Self {
        Self { client }
    }

    async fn resolve_local(&self, file: &str, item: &QueueItem) -> Result<ResolvedSource> {
        let listed = self
            .client
            .list_downloads()
            .await?
            .iter()
            .any(|download| download.filename == file);
        if !listed {
            return Err(RemoteError::NotFound(file.to_string()));
        }

        let url = self.client.stream_url(file)?;
        Ok(ResolvedSource::from_item(SourceHandle::new(url), item))
    }

    async fn resolve_remote(&self, track: &str, item: &QueueItem) -> Result<ResolvedSource> {
        let request =
            self.client
                .download_request(track, &item.title, &item.artist, item.album.as_deref());
        let download = self.client.download(&request).await?;
        let url = self.client.stream_url(&download.filename)?;

        // The server's tags win; fall back to what the queue knew
        Ok(ResolvedSource {
            handle: SourceHandle::new(url),
            title: non_empty(download.title).unwrap_or_else(|| item.title.clone()),
            artist: non_empty(download.artist).unwrap_or_else(|| item.artist.clone()),
            album: non_empty(download.album).or_else(|| item.album.clone()),
            duration: item.duration,
        })
    }
}

#[async_trait]
impl SourceResolver for HttpSourceResolver {
    async fn resolve(&self, item: &QueueItem) -> std::result::Result<ResolvedSource, ResolveError> {
        debug!(source = ?item.source, title = %item.title, "Resolving via download API");

        let outcome = match &item.source {
            TrackSource::Local { file } => self.resolve_local(file, item).await,
            TrackSource::Remote { track } => self.resolve_remote(track, item).await,
        };

        outcome.map_err(|e| {
            warn!(title = %item.title, error = %e, "Resolution failed");
            e.into_resolve_error(self.client.config().request_timeout())
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
