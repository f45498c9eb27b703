/// Effects chain errors
use thiserror::Error;

/// Result type alias using `EffectsInitError`
pub type Result<T> = std::result::Result<T, EffectsInitError>;

/// The signal-processing graph could not be built on this platform
///
/// Never blocks playback: callers fall back to
/// [`EffectsChain::passthrough`](crate::effects::EffectsChain::passthrough)
/// and disable the effect controls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectsInitError {
    /// Device sample rate is outside what the filters are designed for
    #[error("Unsupported sample rate for effects: {0} Hz")]
    UnsupportedSampleRate(u32),

    /// Channel layout the chain cannot process
    #[error("Unsupported channel count for effects: {0}")]
    UnsupportedChannels(u16),
}
