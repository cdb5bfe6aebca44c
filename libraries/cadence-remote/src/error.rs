//! Error types for the download API client.

use cadence_playback::ResolveError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to the music download API.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Requested file is not among the downloads
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server accepted the download but reported it unsuccessful
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    /// Invalid server URL
    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// Failed to parse server response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Server is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),
}

impl RemoteError {
    /// Map onto the resolver taxonomy
    ///
    /// `timeout` is the request timeout the failing call ran under.
    pub fn into_resolve_error(self, timeout: Duration) -> ResolveError {
        match self {
            RemoteError::NotFound(what) => ResolveError::NotFound(what),
            RemoteError::ServerError {
                status: 404,
                message,
            } => ResolveError::NotFound(message),
            RemoteError::Request(e) if e.is_timeout() => ResolveError::Timeout(timeout),
            other => ResolveError::Network(other.to_string()),
        }
    }
}

/// Result type for download API operations.
pub type Result<T> = std::result::Result<T, RemoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_not_found() {
        let error = RemoteError::NotFound("song.m4a".into());
        assert_eq!(
            error.into_resolve_error(Duration::from_secs(30)),
            ResolveError::NotFound("song.m4a".into())
        );
    }

    #[test]
    fn test_http_404_maps_to_not_found() {
        let error = RemoteError::ServerError {
            status: 404,
            message: "File not found".into(),
        };
        assert_eq!(
            error.into_resolve_error(Duration::from_secs(30)),
            ResolveError::NotFound("File not found".into())
        );
    }

    #[test]
    fn test_other_errors_map_to_network() {
        let error = RemoteError::ServerError {
            status: 500,
            message: "yt-dlp exited with status 1".into(),
        };
        assert_eq!(
            error.into_resolve_error(Duration::from_secs(30)),
            ResolveError::Network("Server error (500): yt-dlp exited with status 1".into())
        );

        let error = RemoteError::ServerUnreachable("connection refused".into());
        assert!(matches!(
            error.into_resolve_error(Duration::from_secs(30)),
            ResolveError::Network(_)
        ));
    }
}
