/// CLI error types
use cadence_playback::PlaybackError;
use cadence_remote::RemoteError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Download API error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Nothing to play: {0}")]
    NothingToPlay(String),
}
