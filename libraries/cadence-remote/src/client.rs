//! Music download API client.

use crate::error::{RemoteError, Result};
use crate::types::{
    DownloadRequest, DownloadResponse, DownloadedFile, DownloadsListing, ErrorBody,
    RemoteConfig, SearchRequest, ServiceStatus, VideoInfo,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

/// Client for the music download API.
///
/// Wraps the search, download and downloads-listing endpoints and builds
/// streaming URLs for downloaded files.
///
/// # Example
///
/// ```ignore
/// use cadence_remote::{DownloadApiClient, RemoteConfig, SearchRequest};
///
/// let client = DownloadApiClient::new(RemoteConfig::new("http://127.0.0.1:8000"))?;
/// let results = client.search(&SearchRequest::new("daft punk")).await?;
/// let items: Vec<_> = results.iter().map(|r| r.to_queue_item()).collect();
/// ```
#[derive(Debug, Clone)]
pub struct DownloadApiClient {
    http: Client,
    base_url: Url,
    config: RemoteConfig,
}

impl DownloadApiClient {
    /// Create a new client with the given configuration.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(RemoteError::InvalidUrl("URL cannot be empty".into()));
        }
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(RemoteError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| RemoteError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Check that the API is up.
    pub async fn test_connection(&self) -> Result<ServiceStatus> {
        let url = self.endpoint(&[])?;
        debug!(url = %url, "Testing API connection");

        let response = self.http.get(url).send().await.map_err(send_error)?;
        let status: ServiceStatus = read_json(response, "service status").await?;

        info!(message = %status.message, status = %status.status, "Connected to download API");
        Ok(status)
    }

    /// Search for tracks.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<VideoInfo>> {
        let url = self.endpoint(&["search"])?;
        debug!(query = %request.query, deep = request.deep_search, "Searching");

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(send_error)?;
        let results: Vec<VideoInfo> = read_json(response, "search results").await?;

        debug!(query = %request.query, results = results.len(), "Search finished");
        Ok(results)
    }

    /// Download request for `url` using the configured format settings.
    pub fn download_request(
        &self,
        url: &str,
        title: &str,
        artist: &str,
        album: Option<&str>,
    ) -> DownloadRequest {
        DownloadRequest {
            url: url.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.unwrap_or_default().to_string(),
            output_format: self.config.output_format,
            embed_thumbnail: self.config.embed_thumbnail,
        }
    }

    /// Ask the server to download a track and wait for the file.
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadResponse> {
        let url = self.endpoint(&["download"])?;
        debug!(url = %request.url, title = %request.title, format = %request.output_format, "Requesting download");

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(send_error)?;
        let download: DownloadResponse = read_json(response, "download response").await?;

        if !download.success {
            return Err(RemoteError::DownloadFailed(request.url.clone()));
        }

        info!(
            filename = %download.filename,
            title = %download.title,
            artist = %download.artist,
            "Track downloaded"
        );
        Ok(download)
    }

    /// List the files in the server's download folder.
    pub async fn list_downloads(&self) -> Result<Vec<DownloadedFile>> {
        let url = self.endpoint(&["downloads"])?;
        debug!(url = %url, "Listing downloads");

        let response = self.http.get(url).send().await.map_err(send_error)?;
        let listing: DownloadsListing = read_json(response, "downloads listing").await?;

        debug!(files = listing.files.len(), "Fetched downloads");
        Ok(listing.files)
    }

    /// URL the audio engine streams a downloaded file from.
    pub fn stream_url(&self, filename: &str) -> Result<Url> {
        if filename.is_empty() {
            return Err(RemoteError::NotFound("empty file name".into()));
        }
        self.endpoint(&["downloads", filename])
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn send_error(e: reqwest::Error) -> RemoteError {
    if e.is_connect() {
        RemoteError::ServerUnreachable(e.to_string())
    } else {
        RemoteError::Request(e)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        response
            .json()
            .await
            .map_err(|e| RemoteError::ParseError(format!("Failed to parse {}: {}", what, e)))
    } else {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.detail)
            .unwrap_or(text);
        Err(RemoteError::ServerError {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_validation() {
        assert!(DownloadApiClient::new(RemoteConfig::new("http://127.0.0.1:8000")).is_ok());
        assert!(DownloadApiClient::new(RemoteConfig::new("https://music.example.com")).is_ok());

        assert!(DownloadApiClient::new(RemoteConfig::new("")).is_err());
        assert!(DownloadApiClient::new(RemoteConfig::new("localhost:8000")).is_err());
        assert!(DownloadApiClient::new(RemoteConfig::new("ftp://example.com")).is_err());
    }

    #[test]
    fn test_stream_url_encodes_file_name() {
        let client = DownloadApiClient::new(RemoteConfig::new("http://127.0.0.1:8000/")).unwrap();
        let url = client.stream_url("Daft Punk - One More Time.m4a").unwrap();

        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/downloads/Daft%20Punk%20-%20One%20More%20Time.m4a"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = DownloadApiClient::new(RemoteConfig::new("https://example.com/api/")).unwrap();
        assert_eq!(
            client.stream_url("a.mp3").unwrap().as_str(),
            "https://example.com/api/downloads/a.mp3"
        );
    }

    #[test]
    fn test_download_request_uses_config() {
        let config = RemoteConfig {
            output_format: crate::types::OutputFormat::Mp3,
            embed_thumbnail: true,
            ..RemoteConfig::default()
        };
        let client = DownloadApiClient::new(config).unwrap();

        let request = client.download_request("https://youtu.be/x", "Song", "Artist", None);
        assert_eq!(request.album, "");
        assert_eq!(request.output_format.extension(), "mp3");
        assert!(request.embed_thumbnail);
    }
}
