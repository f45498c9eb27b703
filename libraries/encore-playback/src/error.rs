//! Error types for playback management

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Playback errors
///
/// Controller-level misuse or a broken engine connection. Media failures are
/// not reported this way: they become [`PlaybackStatus::Errored`](crate::PlaybackStatus)
/// through the state machine.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The engine dropped its event sender
    #[error("Audio engine disconnected")]
    EngineDisconnected,

    /// `play_from` was given no tracks
    #[error("Cannot play from an empty track list")]
    EmptySelection,

    /// Index out of bounds
    #[error("Index out of bounds: {index} (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Catalog or track record problem
    #[error(transparent)]
    Catalog(#[from] encore_core::EncoreError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Why a stream could not be loaded or kept playing
///
/// Carried by [`EngineEvent::Error`](crate::EngineEvent). Recovered by moving
/// to `Errored`; the user (or auto-advance) decides what happens next.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum MediaLoadError {
    /// Network or filesystem failure fetching the stream
    #[error("Stream unreachable: {0}")]
    Unreachable(String),

    /// No decoder for the container or codec
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Stream was readable but corrupt
    #[error("Decode error: {0}")]
    Decode(String),

    /// Neither ready nor failed within the load timeout
    #[error("Load timed out after {seconds}s")]
    Timeout { seconds: u64 },
}
