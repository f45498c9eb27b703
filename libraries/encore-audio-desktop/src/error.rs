/// Desktop audio errors
use encore_playback::MediaLoadError;
use thiserror::Error;

/// Result type for desktop audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// Device not found
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Device error
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Failed to build output stream
    #[error("Failed to build output stream: {0}")]
    StreamBuildError(String),

    /// Failed to play stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Stream could not be fetched
    #[error("Source unreachable: {0}")]
    Unreachable(String),

    /// Unsupported container, codec or URL scheme
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Stream was readable but could not be decoded
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Sample rate conversion error
    #[error("Sample rate conversion error: {0}")]
    ResampleError(String),

    /// Worker or output thread could not be started
    #[error("Audio thread error: {0}")]
    ThreadError(String),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        AudioError::StreamBuildError(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for AudioError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        AudioError::DeviceError(err.to_string())
    }
}

impl From<std::io::Error> for AudioError {
    fn from(err: std::io::Error) -> Self {
        AudioError::Unreachable(err.to_string())
    }
}

impl From<AudioError> for MediaLoadError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Unreachable(msg) => MediaLoadError::Unreachable(msg),
            AudioError::UnsupportedFormat(msg) => MediaLoadError::UnsupportedFormat(msg),
            AudioError::DecodeError(msg) | AudioError::ResampleError(msg) => {
                MediaLoadError::Decode(msg)
            }
            other => MediaLoadError::Decode(other.to_string()),
        }
    }
}
