//! Encore - Playback Management
//!
//! Platform-agnostic playback control for the Encore engine.
//!
//! This crate provides:
//! - A pure state machine ([`machine::reduce`]) owning all transport rules
//! - A controller that runs the machine's effects against an [`AudioEngine`]
//! - Queue navigation with shuffle, repeat (None/One/All) and bounded history
//! - Logarithmic volume with mute
//! - A stateless bridge to the OS media-control surface
//!
//! # Architecture
//!
//! `encore-playback` has no platform dependencies:
//! - No dependency on CPAL, Symphonia or any network stack
//! - The engine is a trait; `encore-audio-desktop` provides the desktop one
//! - Engine lifecycle is reported through a crossbeam channel of [`EngineEvent`]s
//!
//! # Example
//!
//! ```rust
//! use encore_core::{NullCatalog, Track};
//! use encore_playback::{
//!     AudioEngine, EffectSettings, EngineEvent, LoadRequest, PlaybackConfig, PlaybackController,
//!     PlaybackStatus,
//! };
//! use crossbeam_channel::{unbounded, Sender};
//!
//! // Engine that reports every load as ready immediately
//! struct InstantEngine {
//!     events: Sender<EngineEvent>,
//!     loaded: bool,
//! }
//!
//! impl AudioEngine for InstantEngine {
//!     fn load(&mut self, request: LoadRequest) {
//!         self.loaded = true;
//!         let _ = self.events.send(EngineEvent::Ready { token: request.token, duration_seconds: 120.0 });
//!     }
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _seconds: f64, _epoch: u64) {}
//!     fn set_volume(&mut self, _gain: f32) {}
//!     fn set_effects(&mut self, _settings: &EffectSettings) {}
//!     fn release(&mut self) { self.loaded = false; }
//!     fn live_handles(&self) -> usize { usize::from(self.loaded) }
//! }
//!
//! let (tx, rx) = unbounded();
//! let engine = InstantEngine { events: tx, loaded: false };
//! let mut player = PlaybackController::new(
//!     Box::new(engine),
//!     rx,
//!     Box::new(NullCatalog),
//!     PlaybackConfig::default(),
//! );
//!
//! player.select_track(Track::new("t1", "Song", "Artist", "https://cdn.example.com/t1.mp3"));
//! player.pump().unwrap();
//! assert_eq!(player.snapshot().status, PlaybackStatus::Playing);
//! ```

mod controller;
mod engine;
mod error;
mod history;
pub mod machine;
pub mod media_session;
pub mod queue;
pub mod shuffle;
pub mod types;
pub mod volume;

// Public exports
pub use controller::PlaybackController;
pub use encore_audio::effects::EffectSettings;
pub use engine::{AudioEngine, EngineEvent, LoadRequest, LoadToken};
pub use error::{MediaLoadError, PlaybackError, Result};
pub use history::History;
pub use machine::{Command, Effect, Event, Transition};
pub use media_session::{MediaAction, MediaMetadata, MediaPlayback, MediaSessionBridge, MediaSurface};
pub use types::{PlaybackConfig, PlaybackState, PlaybackStatus, RepeatMode};
