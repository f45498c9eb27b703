//! Desktop implementation of [`AudioEngine`]
//!
//! Commands from the controller touch the shared deck directly; loads are
//! handed to the background loader. Every outcome comes back on the event
//! channel returned by [`DesktopEngine::new`].

use crate::deck::lock;
use crate::error::Result;
use crate::loader::{spawn_load, LoadJob};
use crate::output::Output;
use crossbeam_channel::{unbounded, Receiver, Sender};
use encore_audio::effects::EffectSettings;
use encore_playback::{AudioEngine, EngineEvent, LoadRequest, MediaLoadError, PlaybackConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// CPAL + Symphonia audio engine
///
/// Holds one output stream for its whole life. Sources are swapped in and out
/// of that stream, so the effects chain and its settings survive every load.
pub struct DesktopEngine {
    output: Output,
    events: Sender<EngineEvent>,
    load_timeout: Duration,
}

impl DesktopEngine {
    /// Open the default output device
    ///
    /// Returns the engine and the receiving end of its event channel, to be
    /// handed to the playback controller.
    ///
    /// # Errors
    /// Fails when no output device is available or the stream cannot start.
    pub fn new(config: &PlaybackConfig) -> Result<(Self, Receiver<EngineEvent>)> {
        let (events, receiver) = unbounded();
        let output = Output::open(config, events.clone())?;

        let engine = Self {
            output,
            events,
            load_timeout: config.load_timeout(),
        };
        Ok((engine, receiver))
    }

    /// Device sample rate; all sources are resampled to it
    pub fn sample_rate(&self) -> u32 {
        self.output.sample_rate
    }

    /// Whether the effects chain is bypassed for this device
    pub fn effects_passthrough(&self) -> bool {
        lock(&self.output.deck).is_passthrough()
    }
}

impl AudioEngine for DesktopEngine {
    fn load(&mut self, request: LoadRequest) {
        let gain = request.output_gain();
        let token = request.token;
        lock(&self.output.deck).begin_load(token.clone(), gain, &request.effects);

        let job = LoadJob {
            token: token.clone(),
            url: request.track.stream_url,
            output_rate: self.output.sample_rate,
            timeout: self.load_timeout,
        };
        if let Err(e) = spawn_load(job, Arc::clone(&self.output.deck), self.events.clone()) {
            error!("Could not start load {}: {}", token, e);
            let _ = self.events.send(EngineEvent::Error {
                token,
                error: MediaLoadError::from(e),
            });
        }
    }

    fn play(&mut self) {
        lock(&self.output.deck).set_playing(true);
    }

    fn pause(&mut self) {
        lock(&self.output.deck).set_playing(false);
    }

    fn seek(&mut self, seconds: f64, epoch: u64) {
        lock(&self.output.deck).seek(seconds, epoch);
    }

    fn set_volume(&mut self, gain: f32) {
        lock(&self.output.deck).set_output_gain(gain);
    }

    fn set_effects(&mut self, settings: &EffectSettings) {
        lock(&self.output.deck).set_effects(settings);
    }

    fn release(&mut self) {
        debug!("Releasing output handle");
        lock(&self.output.deck).release();
    }

    fn live_handles(&self) -> usize {
        lock(&self.output.deck).live_handles()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_desktop_engine() {
        // May fail if no audio device available
        match DesktopEngine::new(&PlaybackConfig::default()) {
            Ok((engine, _events)) => {
                assert!(engine.sample_rate() > 0);
                assert_eq!(engine.live_handles(), 0);
            }
            Err(e) => {
                eprintln!("Note: Audio device not available in test environment: {}", e);
            }
        }
    }
}
