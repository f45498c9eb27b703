/// Core error types for Encore
use thiserror::Error;

use crate::types::TrackId;

/// Result type alias using `EncoreError`
pub type Result<T> = std::result::Result<T, EncoreError>;

/// Core error type for Encore
#[derive(Error, Debug)]
pub enum EncoreError {
    /// Track not found in the catalog
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Catalog rejected or failed a write
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Track record failed validation
    #[error("Invalid track: {0}")]
    InvalidTrack(String),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl EncoreError {
    /// Create a catalog error
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Create an invalid track error
    pub fn invalid_track(msg: impl Into<String>) -> Self {
        Self::InvalidTrack(msg.into())
    }
}
