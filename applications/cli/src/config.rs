/// CLI configuration
use crate::error::{CliError, Result};
use cadence_playback::PlayerConfig;
use cadence_remote::RemoteConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

/// Prefix of environment overrides, e.g. `CADENCE_REMOTE__BASE_URL`
pub const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default = "default_engine")]
    pub engine: EngineSettings,
}

/// Simulated audio engine settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Playback speed multiplier (2.0 plays a track in half the time)
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Interval between position updates in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Track length assumed when the source has no duration
    #[serde(default = "default_fallback_duration_secs")]
    pub fallback_duration_secs: u64,
}

impl EngineSettings {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn fallback_duration(&self) -> Duration {
        Duration::from_secs(self.fallback_duration_secs)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        default_engine()
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` is used
    /// when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(
            path,
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings =
                    settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Environment wins over the file
        settings = settings.add_source(env);

        let config: CliConfig = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.engine.speed.is_finite() || self.engine.speed <= 0.0 {
            return Err(CliError::Config(format!(
                "engine.speed must be positive, got {}",
                self.engine.speed
            )));
        }

        if self.engine.tick_ms == 0 {
            return Err(CliError::Config("engine.tick_ms must be positive".to_string()));
        }

        if self.player.resolve_timeout_ms == 0 {
            return Err(CliError::Config(
                "player.resolve_timeout_ms must be positive".to_string(),
            ));
        }

        // A shorter resolve timeout would cut off every download mid-request
        if self.player.resolve_timeout() < self.remote.request_timeout() {
            return Err(CliError::Config(format!(
                "player.resolve_timeout_ms ({}) must not be shorter than remote.request_timeout_secs ({}s)",
                self.player.resolve_timeout_ms, self.remote.request_timeout_secs
            )));
        }

        Ok(())
    }
}

// Default values
fn default_engine() -> EngineSettings {
    EngineSettings {
        speed: default_speed(),
        tick_ms: default_tick_ms(),
        fallback_duration_secs: default_fallback_duration_secs(),
    }
}

fn default_speed() -> f64 {
    1.0
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_fallback_duration_secs() -> u64 {
    180
}
