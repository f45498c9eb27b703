//! Shared test rig: a scripted in-memory engine and a recording catalog
//!
//! The engine never produces events on its own. Tests decide when a load
//! becomes ready, fails, ticks or ends, which makes races reproducible.

use crossbeam_channel::{unbounded, Sender};
use encore_core::{Track, TrackCatalog, TrackId};
use encore_playback::{
    AudioEngine, EffectSettings, EngineEvent, LoadRequest, LoadToken, MediaLoadError,
    PlaybackConfig, PlaybackController, PlaybackState, PlaybackStatus,
};
use std::sync::{Arc, Mutex};

// ===== Engine =====

/// Call received by the scripted engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(LoadToken),
    Play,
    Pause,
    Seek(f64, u64),
    SetVolume(f32),
    SetEffects(EffectSettings),
    Release,
}

/// What the engine has been told so far
#[derive(Debug, Default)]
pub struct EngineLog {
    pub calls: Vec<EngineCall>,
    pub current: Option<LoadRequest>,
    pub playing: bool,
    pub volume: Option<f32>,
    pub effects: Option<EffectSettings>,
}

impl EngineLog {
    pub fn loads(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Load(token) => Some(token.track_id.as_str()),
                _ => None,
            })
            .collect()
    }
}

pub struct ScriptedEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl AudioEngine for ScriptedEngine {
    fn load(&mut self, request: LoadRequest) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Load(request.token.clone()));
        log.volume = Some(request.output_gain());
        log.effects = Some(request.effects);
        // Replacing the handle is atomic: never two at once
        log.current = Some(request);
        log.playing = false;
    }

    fn play(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Play);
        log.playing = true;
    }

    fn pause(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Pause);
        log.playing = false;
    }

    fn seek(&mut self, seconds: f64, epoch: u64) {
        self.log.lock().unwrap().calls.push(EngineCall::Seek(seconds, epoch));
    }

    fn set_volume(&mut self, gain: f32) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::SetVolume(gain));
        log.volume = Some(gain);
    }

    fn set_effects(&mut self, settings: &EffectSettings) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::SetEffects(*settings));
        log.effects = Some(*settings);
    }

    fn release(&mut self) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Release);
        log.current = None;
        log.playing = false;
    }

    fn live_handles(&self) -> usize {
        usize::from(self.log.lock().unwrap().current.is_some())
    }
}

// ===== Catalog =====

#[derive(Clone, Default)]
pub struct RecordingCatalog {
    pub plays: Arc<Mutex<Vec<TrackId>>>,
}

impl TrackCatalog for RecordingCatalog {
    fn increment_play_count(&self, track_id: &TrackId) {
        self.plays.lock().unwrap().push(track_id.clone());
    }
}

// ===== Rig =====

pub struct Rig {
    pub controller: PlaybackController,
    pub engine: Arc<Mutex<EngineLog>>,
    pub events: Sender<EngineEvent>,
    pub plays: Arc<Mutex<Vec<TrackId>>>,
}

impl Default for Rig {
    fn default() -> Self {
        Self::with_config(PlaybackConfig::default())
    }
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: PlaybackConfig) -> Self {
        let (tx, rx) = unbounded();
        let engine = Arc::new(Mutex::new(EngineLog::default()));
        let catalog = RecordingCatalog::default();
        let plays = Arc::clone(&catalog.plays);

        let controller = PlaybackController::new(
            Box::new(ScriptedEngine {
                log: Arc::clone(&engine),
            }),
            rx,
            Box::new(catalog),
            config,
        )
        .with_seed(1234);

        Self {
            controller,
            engine,
            events: tx,
            plays,
        }
    }

    pub fn state(&self) -> Arc<PlaybackState> {
        self.controller.snapshot()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state().status
    }

    pub fn current_id(&self) -> Option<String> {
        self.state().current_id().map(|id| id.as_str().to_string())
    }

    /// Token of the load the engine is working on
    pub fn engine_token(&self) -> LoadToken {
        self.engine
            .lock()
            .unwrap()
            .current
            .as_ref()
            .map(|request| request.token.clone())
            .expect("engine has no load")
    }

    /// Deliver an engine event and let the controller process it
    pub fn send(&mut self, event: EngineEvent) {
        self.events.send(event).unwrap();
        self.controller.pump().unwrap();
    }

    pub fn ready(&mut self, duration_seconds: f64) {
        let token = self.engine_token();
        self.send(EngineEvent::Ready {
            token,
            duration_seconds,
        });
    }

    pub fn end(&mut self) {
        let token = self.engine_token();
        self.send(EngineEvent::Ended { token });
    }

    pub fn fail(&mut self, error: MediaLoadError) {
        let token = self.engine_token();
        self.send(EngineEvent::Error { token, error });
    }

    pub fn tick(&mut self, epoch: u64, seconds: f64) {
        let token = self.engine_token();
        self.send(EngineEvent::PositionTick {
            token,
            epoch,
            seconds,
        });
    }

    pub fn play_count(&self) -> usize {
        self.plays.lock().unwrap().len()
    }

    pub fn history_ids(&self) -> Vec<String> {
        self.state()
            .history
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect()
    }

    pub fn queue_ids(&self) -> Vec<String> {
        self.state()
            .queue
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect()
    }
}

// ===== Fixtures =====

pub fn track(id: &str) -> Track {
    Track::new(
        id,
        format!("Track {}", id),
        "Test Artist",
        format!("https://cdn.test/{}.mp3", id),
    )
    .with_duration(180.0)
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().copied().map(track).collect()
}
