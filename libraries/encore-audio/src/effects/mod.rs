//! Audio effects processing
//!
//! Every stage operates on interleaved stereo f32 samples in [-1.0, 1.0] and
//! implements [`AudioEffect`]. The stages are wired in a fixed order by
//! [`EffectsChain`]:
//!
//! ```text
//! Source → ThreeBandEq → Reverb → Compressor → MasterGain → Output
//! ```

mod chain;
mod compressor;
mod eq;
mod gain;
mod reverb;
mod settings;

pub use chain::{AudioEffect, EffectsChain};
pub use compressor::{Compressor, CompressorSettings};
pub use eq::{EqBand, FilterType, ThreeBandEq};
pub use gain::{db_to_linear, MasterGain};
pub use reverb::{Reverb, ReverbSettings};
pub use settings::{EffectSettings, MAX_GAIN_DB, MIN_GAIN_DB};
