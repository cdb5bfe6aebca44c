//! Cadence CLI Library
//!
//! Configuration, a simulated audio engine and the playback session driver
//! behind the `cadence` binary. Exposed as a library for testing.

pub mod config;
pub mod engine;
pub mod error;
pub mod session;

pub use config::{CliConfig, EngineSettings};
pub use engine::SimulatedEngine;
pub use error::{CliError, Result};
pub use session::{play_queue, watch_until_idle, PlaybackSummary};
