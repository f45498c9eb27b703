//! Encore Audio
//!
//! Real-time signal processing for the Encore playback engine.
//!
//! This crate provides:
//! - A fixed effects topology: 3-band EQ → reverb → compressor → master gain
//! - Per-sample parameter smoothing so slider moves never click
//! - Graceful degradation to pass-through when the chain cannot be built
//!
//! # Example
//!
//! ```rust
//! use encore_audio::effects::{EffectSettings, EffectsChain};
//!
//! let mut chain = EffectsChain::new(48_000).unwrap_or_else(|_| EffectsChain::passthrough(48_000));
//!
//! let mut settings = EffectSettings::default();
//! settings.bass_gain_db = 4.0;
//! settings.reverb_wet = 0.2;
//! chain.apply_settings(&settings);
//!
//! // Interleaved stereo samples (L, R, L, R, ...)
//! let mut buffer = vec![0.0f32; 1024];
//! chain.process(&mut buffer);
//! ```

pub mod effects;
mod error;

pub use error::{EffectsInitError, Result};
