//! Core types for playback management

use crate::engine::LoadToken;
use crate::history::History;
use encore_audio::effects::EffectSettings;
use encore_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlaybackStatus {
    /// Nothing selected
    #[default]
    Idle,

    /// Waiting for the engine to report ready
    Loading,

    /// Output running
    Playing,

    /// Paused mid-track
    Paused,

    /// Queue exhausted; last track kept for display
    Ended,

    /// Load or playback failed
    Errored,
}

impl PlaybackStatus {
    /// A handle is attached and can be sought
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    None,

    /// Loop current track only
    One,

    /// Loop entire queue
    All,
}

impl RepeatMode {
    /// None → One → All → None
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::One,
            Self::One => Self::All,
            Self::All => Self::None,
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum history size (default: 50)
    pub history_size: usize,

    /// Initial volume (0.0-1.0, default: 0.8)
    pub initial_volume: f32,

    /// Engine load timeout in milliseconds (default: 20 000)
    pub load_timeout_ms: u64,

    /// Position tick interval in milliseconds (default: 100)
    pub tick_interval_ms: u64,

    /// Failed auto-advance loads in a row before giving up (default: 3)
    pub max_consecutive_failures: usize,

    /// Output fade around seeks in milliseconds (default: 5)
    pub seek_ramp_ms: u64,
}

impl PlaybackConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            history_size: 50,
            initial_volume: 0.8,
            load_timeout_ms: 20_000,
            tick_interval_ms: 100,
            max_consecutive_failures: 3,
            seek_ramp_ms: 5,
        }
    }
}

/// Authoritative playback state
///
/// Owned by the controller and replaced wholesale on every transition;
/// subscribers receive immutable snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    pub current_track: Option<Track>,
    pub status: PlaybackStatus,
    pub position_seconds: f64,
    pub duration_seconds: f64,

    /// Slider value in [0, 1]; see [`crate::volume`] for the gain curve
    pub volume: f32,
    pub muted: bool,

    pub repeat_mode: RepeatMode,
    pub shuffle_enabled: bool,

    /// Active play order (a permutation of `source_order` when shuffled)
    pub queue: Vec<Track>,
    /// Order the tracks were supplied in
    pub source_order: Vec<Track>,
    /// Previously active tracks, most recent last
    pub history: History,

    pub effects: EffectSettings,
    /// False once the engine fell back to pass-through
    pub effects_available: bool,

    /// Reason while `Errored`
    pub error: Option<String>,
    /// Failure breaker tripped; auto-advance stopped
    pub playback_unavailable: bool,

    /// Load the machine is waiting on
    pub in_flight: Option<LoadToken>,
    /// Load currently attached to the output
    pub loaded: Option<LoadToken>,
    /// In-flight load was started by auto-advance rather than the user
    pub advancing: bool,
    /// Last issued load generation
    pub load_generation: u64,
    /// Bumped on every seek; older ticks are ignored
    pub seek_epoch: u64,
    /// Distinct tracks that failed in a row
    pub consecutive_failures: Vec<TrackId>,
}

impl PlaybackState {
    /// Idle state seeded from `config`
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            current_track: None,
            status: PlaybackStatus::Idle,
            position_seconds: 0.0,
            duration_seconds: 0.0,
            volume: crate::volume::clamp_level(config.initial_volume),
            muted: false,
            repeat_mode: RepeatMode::None,
            shuffle_enabled: false,
            queue: Vec::new(),
            source_order: Vec::new(),
            history: History::new(config.history_size),
            effects: EffectSettings::default(),
            effects_available: true,
            error: None,
            playback_unavailable: false,
            in_flight: None,
            loaded: None,
            advancing: false,
            load_generation: 0,
            seek_epoch: 0,
            consecutive_failures: Vec::new(),
        }
    }

    /// Id of the current track
    pub fn current_id(&self) -> Option<&TrackId> {
        self.current_track.as_ref().map(|t| &t.id)
    }

    /// Whether an engine handle exists (loading or attached)
    pub fn has_handle(&self) -> bool {
        self.in_flight.is_some() || self.loaded.is_some()
    }

    /// Linear output gain for the current volume and mute state
    pub fn output_gain(&self) -> f32 {
        crate::volume::output_gain(self.volume, self.muted)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(&PlaybackConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.history_size, 50);
        assert_eq!(config.initial_volume, 0.8);
        assert_eq!(config.load_timeout(), Duration::from_secs(20));
        assert_eq!(config.max_consecutive_failures, 3);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: PlaybackConfig =
            serde_json::from_str(r#"{ "history_size": 10, "load_timeout_ms": 5000 }"#).unwrap();
        assert_eq!(config.history_size, 10);
        assert_eq!(config.load_timeout(), Duration::from_secs(5));
        assert_eq!(config.tick_interval_ms, 100);
    }

    #[test]
    fn repeat_cycles_through_all_modes() {
        assert_eq!(RepeatMode::None.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::None);
    }

    #[test]
    fn initial_state_is_idle() {
        let state = PlaybackState::default();
        assert_eq!(state.status, PlaybackStatus::Idle);
        assert!(state.current_track.is_none());
        assert!(!state.has_handle());
        assert!(state.effects_available);
        assert_eq!(state.history.max_size(), 50);
    }
}
