//! Audio engine contract
//!
//! The engine owns the decoding/output device and is driven by commands from
//! the controller. It reports back exclusively through [`EngineEvent`]s on a
//! single crossbeam channel; nothing is returned synchronously.

use crate::error::MediaLoadError;
use encore_audio::effects::EffectSettings;
use encore_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one `load` request
///
/// Every event about a load carries its token. Any token other than the
/// latest one belongs to a superseded load and is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadToken {
    pub generation: u64,
    pub track_id: TrackId,
}

impl LoadToken {
    pub fn new(generation: u64, track_id: TrackId) -> Self {
        Self {
            generation,
            track_id,
        }
    }
}

impl fmt::Display for LoadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:{}", self.generation, self.track_id)
    }
}

/// Everything the engine needs to attach a new source
///
/// Volume and effects ride along so a freshly attached handle starts with
/// the current settings rather than defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub token: LoadToken,
    pub track: Track,
    /// Slider value in [0, 1]
    pub volume: f32,
    pub muted: bool,
    pub effects: EffectSettings,
}

impl LoadRequest {
    /// Linear gain for the requested volume and mute state
    pub fn output_gain(&self) -> f32 {
        crate::volume::output_gain(self.volume, self.muted)
    }
}

/// Lifecycle notifications from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Source decoded and attached; duration now authoritative
    Ready { token: LoadToken, duration_seconds: f64 },

    /// Playhead report (about 10 Hz while playing)
    PositionTick { token: LoadToken, epoch: u64, seconds: f64 },

    /// Source played to completion
    Ended { token: LoadToken },

    /// Load or playback failed
    Error { token: LoadToken, error: MediaLoadError },

    /// Effects chain could not be built; output runs in pass-through
    EffectsUnavailable { reason: String },
}

impl EngineEvent {
    /// Token the event refers to, if any
    pub fn token(&self) -> Option<&LoadToken> {
        match self {
            Self::Ready { token, .. }
            | Self::PositionTick { token, .. }
            | Self::Ended { token }
            | Self::Error { token, .. } => Some(token),
            Self::EffectsUnavailable { .. } => None,
        }
    }
}

/// Platform audio engine
///
/// Implementations must release the previous handle before (or atomically
/// with) attaching a new one, so at most one source is ever audible.
/// Position ticks carry the epoch passed to the most recent [`seek`](Self::seek)
/// call (0 before any seek), across loads.
pub trait AudioEngine: Send {
    /// Release any current handle and start loading `request.track`
    fn load(&mut self, request: LoadRequest);

    /// Start or resume output; no-op when already playing
    fn play(&mut self);

    /// Pause output; no-op when already paused
    fn pause(&mut self);

    /// Move the playhead, clamped to the source duration
    fn seek(&mut self, seconds: f64, epoch: u64);

    /// Linear output gain (0 = silent)
    fn set_volume(&mut self, gain: f32);

    /// Apply new effect parameters to the live chain
    fn set_effects(&mut self, settings: &EffectSettings);

    /// Stop output and free the handle
    fn release(&mut self);

    /// Attached or loading handles (0 or 1)
    fn live_handles(&self) -> usize;
}
