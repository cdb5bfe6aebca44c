//! Cadence Download API Client
//!
//! HTTP client for the music download service, plus a [`SourceResolver`]
//! that lets the player stream what the service has downloaded.
//!
//! # Features
//!
//! - **Search**: query the service for tracks and turn results into queue items
//! - **Download**: have the service fetch a track in the configured format
//! - **Downloads**: list downloaded files and build their streaming URLs
//! - **Resolution**: [`HttpSourceResolver`] for local and remote queue items
//!
//! # Example
//!
//! ```ignore
//! use cadence_remote::{DownloadApiClient, HttpSourceResolver, RemoteConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(DownloadApiClient::new(RemoteConfig::default())?);
//!     client.test_connection().await?;
//!
//!     let items: Vec<_> = client
//!         .list_downloads()
//!         .await?
//!         .iter()
//!         .map(|file| file.to_queue_item())
//!         .collect();
//!
//!     let resolver = HttpSourceResolver::new(client);
//!     Ok(())
//! }
//! ```
//!
//! [`SourceResolver`]: cadence_playback::SourceResolver

mod client;
mod error;
mod resolver;
mod types;

pub use client::DownloadApiClient;
pub use error::{RemoteError, Result};
pub use resolver::HttpSourceResolver;
pub use types::{
    local_queue_item, DownloadRequest, DownloadResponse, DownloadedFile, OutputFormat,
    RemoteConfig, SearchRequest, ServiceStatus, VideoInfo,
};
