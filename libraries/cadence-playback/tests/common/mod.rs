//! Shared fixtures for controller and player tests
#![allow(dead_code)]

use async_trait::async_trait;
use cadence_playback::{
    AudioEngine, EngineError, Generation, PlaybackState, PlayerEvent, QueueItem, ResolveError,
    ResolveRequest, ResolvedSource, SourceHandle, SourceResolver,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Items =====

pub fn track(name: &str) -> QueueItem {
    QueueItem::local(format!("{name}.m4a"), format!("Track {name}"), "Test Artist")
        .with_duration(Duration::from_secs(180))
}

pub fn tracks(names: &[&str]) -> Vec<QueueItem> {
    names.iter().map(|name| track(name)).collect()
}

pub fn handle_for(item: &QueueItem) -> SourceHandle {
    SourceHandle::new(format!("file:///downloads/{}", item.source.reference()))
}

/// Successful outcome for a request, as a resolver would produce it
pub fn resolved(request: &ResolveRequest) -> ResolvedSource {
    ResolvedSource::from_item(handle_for(&request.entry.item), &request.entry.item)
}

pub fn states(events: &[PlayerEvent]) -> Vec<PlaybackState> {
    events.iter().filter_map(PlayerEvent::state).collect()
}

// ===== Engine =====

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String, Generation),
    Play,
    Pause,
    Stop,
    Seek(Duration),
}

/// Engine that records every command and can be told to reject them
#[derive(Clone, Default)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<Call>>>,
    reject_loads: Arc<Mutex<HashSet<String>>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_load(&self, handle: &str) {
        self.reject_loads.lock().unwrap().insert(handle.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Load(handle, _) => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().unwrap().last().cloned()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AudioEngine for RecordingEngine {
    fn load(&mut self, source: &ResolvedSource, generation: Generation) -> Result<(), EngineError> {
        let handle = source.handle.to_string();
        if self.reject_loads.lock().unwrap().contains(&handle) {
            return Err(EngineError::Load(format!("unsupported format: {handle}")));
        }
        self.record(Call::Load(handle, generation));
        Ok(())
    }

    fn play(&mut self) -> Result<(), EngineError> {
        self.record(Call::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        self.record(Call::Pause);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.record(Call::Stop);
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), EngineError> {
        self.record(Call::Seek(position));
        Ok(())
    }
}

// ===== Resolver =====

#[derive(Default)]
struct Script {
    delays: HashMap<String, Duration>,
    failures: HashMap<String, ResolveError>,
    hanging: HashSet<String>,
    panicking: HashSet<String>,
    calls: Vec<String>,
}

/// Resolver whose latency and failures are scripted per file name
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    script: Arc<Mutex<Script>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delay(self, file: &str, delay: Duration) -> Self {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(file.to_string(), delay);
        self
    }

    pub fn fail(self, file: &str, error: ResolveError) -> Self {
        self.script
            .lock()
            .unwrap()
            .failures
            .insert(file.to_string(), error);
        self
    }

    /// Never answer for this file
    pub fn hang(self, file: &str) -> Self {
        self.script.lock().unwrap().hanging.insert(file.to_string());
        self
    }

    /// Panic instead of answering for this file
    pub fn panic_on(self, file: &str) -> Self {
        self.script.lock().unwrap().panicking.insert(file.to_string());
        self
    }

    /// File names requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.script.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl SourceResolver for ScriptedResolver {
    async fn resolve(&self, item: &QueueItem) -> Result<ResolvedSource, ResolveError> {
        let file = item.source.reference().to_string();
        let (delay, failure, hanging, panicking) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(file.clone());
            (
                script.delays.get(&file).copied(),
                script.failures.get(&file).cloned(),
                script.hanging.contains(&file),
                script.panicking.contains(&file),
            )
        };

        if panicking {
            panic!("resolver crashed on {file}");
        }
        if hanging {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(ResolvedSource::from_item(handle_for(item), item))
    }
}
