//! Shared playback deck
//!
//! The single slot holding the current source, shared between the engine
//! (commands), the loader (installing decoded audio) and the CPAL callback
//! (rendering). One mutex guards all of it, so replacing the pending load
//! and installing a finished one can never interleave.

use crate::sources::DecodedAudio;
use crossbeam_channel::Sender;
use encore_audio::effects::{EffectSettings, EffectsChain};
use encore_playback::{EngineEvent, LoadToken, PlaybackConfig};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Lock the deck; a panic elsewhere must not silence the output
pub(crate) fn lock(deck: &Mutex<Deck>) -> MutexGuard<'_, Deck> {
    deck.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Loaded {
    token: LoadToken,
    samples: Vec<f32>,
    /// Playhead in frames
    cursor: usize,
    ended: bool,
}

impl Loaded {
    fn frames(&self) -> usize {
        self.samples.len() / 2
    }
}

/// Linear fade-in after a seek
struct Ramp {
    total: usize,
    remaining: usize,
}

impl Ramp {
    fn start(&mut self) {
        self.remaining = self.total;
    }

    fn apply(&mut self, stereo: &mut [f32]) {
        for frame in stereo.chunks_exact_mut(2) {
            if self.remaining == 0 {
                break;
            }
            let gain = 1.0 - self.remaining as f32 / self.total as f32;
            frame[0] *= gain;
            frame[1] *= gain;
            self.remaining -= 1;
        }
    }
}

pub(crate) struct Deck {
    sample_rate: u32,
    pending: Option<LoadToken>,
    loaded: Option<Loaded>,
    playing: bool,
    epoch: u64,
    chain: EffectsChain,
    tick_frames: usize,
    frames_since_tick: usize,
    seek_ramp: Ramp,
}

impl Deck {
    /// Deck for an output running at `sample_rate`
    ///
    /// Falls back to a pass-through chain when the effects cannot run at this
    /// rate; the reason is returned alongside.
    pub(crate) fn new(sample_rate: u32, config: &PlaybackConfig) -> (Self, Option<String>) {
        let (chain, unavailable) = match EffectsChain::new(sample_rate) {
            Ok(chain) => (chain, None),
            Err(e) => {
                warn!("Effects chain unavailable, using pass-through: {}", e);
                (EffectsChain::passthrough(sample_rate), Some(e.to_string()))
            }
        };

        let frames_per_ms = sample_rate as f64 / 1000.0;
        let tick_frames = (config.tick_interval_ms as f64 * frames_per_ms).max(1.0) as usize;
        let ramp_frames = (config.seek_ramp_ms as f64 * frames_per_ms) as usize;

        let deck = Self {
            sample_rate,
            pending: None,
            loaded: None,
            playing: false,
            epoch: 0,
            chain,
            tick_frames,
            frames_since_tick: 0,
            seek_ramp: Ramp {
                total: ramp_frames,
                remaining: 0,
            },
        };
        (deck, unavailable)
    }

    pub(crate) fn is_passthrough(&self) -> bool {
        self.chain.is_passthrough()
    }

    /// Drop the current source and wait for `token`
    pub(crate) fn begin_load(&mut self, token: LoadToken, gain: f32, effects: &EffectSettings) {
        self.loaded = None;
        self.pending = Some(token);
        self.playing = false;
        self.frames_since_tick = 0;
        self.chain.apply_settings(effects);
        self.chain.set_output_gain(gain);
        self.chain.reset();
    }

    /// Attach decoded audio if `token` is still the load being waited for
    ///
    /// Returns `false` for a superseded load; the audio is dropped.
    pub(crate) fn install(&mut self, token: &LoadToken, audio: DecodedAudio) -> bool {
        if self.pending.as_ref() != Some(token) {
            return false;
        }
        self.pending = None;
        self.loaded = Some(Loaded {
            token: token.clone(),
            samples: audio.samples,
            cursor: 0,
            ended: false,
        });
        true
    }

    /// Whether `token` is the pending or attached load
    pub(crate) fn is_current(&self, token: &LoadToken) -> bool {
        self.pending.as_ref() == Some(token)
            || self.loaded.as_ref().is_some_and(|loaded| &loaded.token == token)
    }

    /// Token of whatever the deck holds
    pub(crate) fn current_token(&self) -> Option<&LoadToken> {
        self.loaded
            .as_ref()
            .map(|loaded| &loaded.token)
            .or(self.pending.as_ref())
    }

    pub(crate) fn release(&mut self) {
        self.pending = None;
        self.loaded = None;
        self.playing = false;
    }

    pub(crate) fn live_handles(&self) -> usize {
        usize::from(self.pending.is_some() || self.loaded.is_some())
    }

    pub(crate) fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub(crate) fn set_output_gain(&mut self, gain: f32) {
        self.chain.set_output_gain(gain);
    }

    pub(crate) fn set_effects(&mut self, settings: &EffectSettings) {
        self.chain.apply_settings(settings);
    }

    /// Move the playhead; the epoch is recorded even with nothing loaded
    pub(crate) fn seek(&mut self, seconds: f64, epoch: u64) {
        self.epoch = epoch;
        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };

        let frame = (seconds.max(0.0) * self.sample_rate as f64) as usize;
        loaded.cursor = frame.min(loaded.frames());
        loaded.ended = false;
        self.frames_since_tick = 0;
        self.seek_ramp.start();
        debug!("Seek to frame {} (epoch {})", loaded.cursor, epoch);
    }

    /// Fill `out` (interleaved stereo) and report ticks and the end of the source
    ///
    /// Runs on the audio callback thread: events go out with `try_send`.
    pub(crate) fn render(&mut self, out: &mut [f32], events: &Sender<EngineEvent>) {
        out.fill(0.0);

        let Some(loaded) = self.loaded.as_mut() else {
            return;
        };
        if !self.playing || loaded.ended {
            return;
        }

        let wanted = out.len() / 2;
        let frames = wanted.min(loaded.frames() - loaded.cursor);
        let start = loaded.cursor * 2;
        out[..frames * 2].copy_from_slice(&loaded.samples[start..start + frames * 2]);
        loaded.cursor += frames;

        self.seek_ramp.apply(&mut out[..frames * 2]);
        self.chain.process(out);

        self.frames_since_tick += frames;
        if self.frames_since_tick >= self.tick_frames {
            self.frames_since_tick = 0;
            let _ = events.try_send(EngineEvent::PositionTick {
                token: loaded.token.clone(),
                epoch: self.epoch,
                seconds: loaded.cursor as f64 / self.sample_rate as f64,
            });
        }

        if loaded.cursor >= loaded.frames() {
            loaded.ended = true;
            self.playing = false;
            let _ = events.try_send(EngineEvent::Ended {
                token: loaded.token.clone(),
            });
        }
    }
}
