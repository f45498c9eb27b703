//! Playback controller
//!
//! Single owner of [`PlaybackState`]. Every input (UI call, OS media action,
//! engine event) is reduced one at a time; the resulting effects are run
//! against the engine and catalog, then the new snapshot is published.

use crate::engine::{AudioEngine, EngineEvent};
use crate::error::{PlaybackError, Result};
use crate::machine::{reduce, Command, Effect, Event};
use crate::media_session::{MediaAction, MediaSessionBridge, MediaSurface};
use crate::types::{PlaybackConfig, PlaybackState};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use encore_core::{Track, TrackCatalog};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Store + effect runner around [`reduce`]
///
/// Lives on the UI/event-loop thread. Engine events are not processed until
/// the host calls [`pump`](Self::pump) or [`wait_for_event`](Self::wait_for_event).
pub struct PlaybackController {
    state: Arc<PlaybackState>,
    config: PlaybackConfig,
    engine: Box<dyn AudioEngine>,
    events: Receiver<EngineEvent>,
    catalog: Box<dyn TrackCatalog>,
    subscribers: Vec<Sender<Arc<PlaybackState>>>,
    media: Option<MediaSessionBridge>,
    rng: StdRng,
}

impl PlaybackController {
    /// Create a controller around `engine`
    ///
    /// `events` must be the receiving end of the engine's event channel; the
    /// controller is its only consumer.
    pub fn new(
        engine: Box<dyn AudioEngine>,
        events: Receiver<EngineEvent>,
        catalog: Box<dyn TrackCatalog>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            state: Arc::new(PlaybackState::new(&config)),
            config,
            engine,
            events,
            catalog,
            subscribers: Vec::new(),
            media: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Use a fixed shuffle seed (reproducible queues)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Mirror state onto an OS media surface from now on
    pub fn attach_media_session(&mut self, surface: Box<dyn MediaSurface>) {
        let mut bridge = MediaSessionBridge::new(surface);
        bridge.prime(&self.state);
        self.media = Some(bridge);
    }

    /// Current state
    pub fn snapshot(&self) -> Arc<PlaybackState> {
        Arc::clone(&self.state)
    }

    /// Receive a snapshot after every state change
    ///
    /// The current snapshot is delivered immediately. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&mut self) -> Receiver<Arc<PlaybackState>> {
        let (tx, rx) = unbounded();
        // Receiver is alive, send cannot fail
        let _ = tx.send(self.snapshot());
        self.subscribers.push(tx);
        rx
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Handles held by the engine (0 or 1)
    pub fn live_handles(&self) -> usize {
        self.engine.live_handles()
    }

    // ===== Engine events =====

    /// Apply all engine events that are already queued
    ///
    /// Returns how many were applied.
    pub fn pump(&mut self) -> Result<usize> {
        let mut applied = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply(Event::Engine(event));
                    applied += 1;
                }
                Err(TryRecvError::Empty) => return Ok(applied),
                Err(TryRecvError::Disconnected) => return Err(PlaybackError::EngineDisconnected),
            }
        }
    }

    /// Block up to `timeout` for an engine event, then drain the rest
    ///
    /// Returns `false` when nothing arrived in time.
    pub fn wait_for_event(&mut self, timeout: Duration) -> Result<bool> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => {
                self.apply(Event::Engine(event));
                self.pump()?;
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => Err(PlaybackError::EngineDisconnected),
        }
    }

    // ===== Commands =====

    /// Apply a command
    pub fn dispatch(&mut self, command: Command) {
        self.apply(Event::Command(command));
    }

    /// Apply an OS media-control action
    pub fn handle_media_action(&mut self, action: MediaAction) {
        debug!("Media action: {:?}", action);
        self.dispatch(action.command());
    }

    pub fn select_track(&mut self, track: Track) {
        self.dispatch(Command::SelectTrack(track));
    }

    /// Replace the queue with `tracks` and start at `index`
    pub fn play_from(&mut self, tracks: Vec<Track>, index: usize) -> Result<()> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptySelection);
        }
        if index >= tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: tracks.len(),
            });
        }
        self.dispatch(Command::PlayFrom { tracks, index });
        Ok(())
    }

    pub fn toggle_play(&mut self) {
        self.dispatch(Command::TogglePlay);
    }

    pub fn play(&mut self) {
        self.dispatch(Command::Play);
    }

    pub fn pause(&mut self) {
        self.dispatch(Command::Pause);
    }

    pub fn stop(&mut self) {
        self.dispatch(Command::Stop);
    }

    pub fn seek(&mut self, seconds: f64) {
        self.dispatch(Command::Seek(seconds));
    }

    pub fn skip_next(&mut self) {
        self.dispatch(Command::SkipNext);
    }

    pub fn skip_previous(&mut self) {
        self.dispatch(Command::SkipPrevious);
    }

    pub fn toggle_shuffle(&mut self) {
        self.dispatch(Command::ToggleShuffle);
    }

    pub fn cycle_repeat(&mut self) {
        self.dispatch(Command::CycleRepeat);
    }

    /// Volume slider in [0, 1]
    pub fn set_volume(&mut self, level: f32) {
        self.dispatch(Command::SetVolume(level));
    }

    pub fn toggle_mute(&mut self) {
        self.dispatch(Command::ToggleMute);
    }

    /// Band gains in dB (clamped to ±15)
    pub fn set_eq(&mut self, bass_db: f32, mid_db: f32, treble_db: f32) {
        self.dispatch(Command::SetEq {
            bass_db,
            mid_db,
            treble_db,
        });
    }

    pub fn set_reverb(&mut self, wet: f32) {
        self.dispatch(Command::SetReverb(wet));
    }

    pub fn set_master_gain(&mut self, db: f32) {
        self.dispatch(Command::SetMasterGain(db));
    }

    pub fn retry(&mut self) {
        self.dispatch(Command::Retry);
    }

    // ===== Internals =====

    fn apply(&mut self, event: Event) {
        trace!("Applying {:?}", event);
        let transition = reduce(&self.state, event, &self.config, &mut self.rng);

        for effect in transition.effects {
            self.run(effect);
        }

        let previous = std::mem::replace(&mut self.state, Arc::new(transition.state));
        if *previous == *self.state {
            return;
        }

        if let Some(media) = &mut self.media {
            media.sync(&previous, &self.state);
        }
        self.publish();
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Load(request) => self.engine.load(request),
            Effect::Play => self.engine.play(),
            Effect::Pause => self.engine.pause(),
            Effect::Seek { seconds, epoch } => self.engine.seek(seconds, epoch),
            Effect::SetVolume(gain) => self.engine.set_volume(gain),
            Effect::SetEffects(settings) => self.engine.set_effects(&settings),
            Effect::Release => self.engine.release(),
            Effect::IncrementPlayCount(track_id) => self.catalog.increment_play_count(&track_id),
        }
    }

    fn publish(&mut self) {
        let state = &self.state;
        self.subscribers
            .retain(|subscriber| subscriber.send(Arc::clone(state)).is_ok());
    }
}
