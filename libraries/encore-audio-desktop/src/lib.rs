//! Desktop audio engine for Encore using CPAL
//!
//! This crate provides [`DesktopEngine`], the desktop implementation of
//! `encore_playback::AudioEngine`.
//!
//! # Features
//!
//! - Cross-platform audio output using CPAL
//! - Decoding of every Symphonia-supported format (MP3, FLAC, OGG, WAV, AAC, ...)
//! - Streams from `http(s)` URLs, `file://` URLs and plain paths
//! - Automatic sample rate conversion to the device rate
//! - Effects chain (EQ, reverb, compressor, master gain) on the output,
//!   falling back to pass-through when the device rate is unsupported
//! - Load timeout, superseded-load suppression, click-free seeks
//!
//! # Example
//!
//! ```no_run
//! use encore_audio_desktop::DesktopEngine;
//! use encore_core::NullCatalog;
//! use encore_playback::{PlaybackConfig, PlaybackController};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PlaybackConfig::default();
//! let (engine, events) = DesktopEngine::new(&config)?;
//! let mut player = PlaybackController::new(Box::new(engine), events, Box::new(NullCatalog), config);
//!
//! player.select_track(encore_core::Track::new("t1", "Song", "Artist", "/music/song.flac"));
//! while player.wait_for_event(std::time::Duration::from_millis(100))? {}
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod deck;
mod engine;
mod error;
mod loader;
mod output;
pub mod sources;

pub use engine::DesktopEngine;
pub use error::{AudioError, Result};
pub use sources::{decode, prepare, prepare_while, resample, DecodedAudio, StreamLocation};
