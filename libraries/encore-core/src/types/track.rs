/// Track domain type
use crate::error::{EncoreError, Result};
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Track record supplied by the catalog
///
/// Immutable from the engine's point of view: the engine references tracks
/// by `id` and never edits them. Field names follow the catalog read schema
/// (`streamUrl`, `artworkUrl`, `durationSeconds`) on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,

    /// Location of the encoded audio (http(s), file URL, or local path)
    pub stream_url: String,

    /// Cover art location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,

    /// Duration advertised by the catalog (the decoder's value wins once known)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl Track {
    /// Create a track with the required catalog fields
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        stream_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            stream_url: stream_url.into(),
            artwork_url: None,
            duration_seconds: None,
        }
    }

    /// Set the album name
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set the artwork location
    pub fn with_artwork(mut self, artwork_url: impl Into<String>) -> Self {
        self.artwork_url = Some(artwork_url.into());
        self
    }

    /// Set the advertised duration in seconds
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Advertised duration as a `Duration`
    pub fn duration(&self) -> Option<Duration> {
        self.duration_seconds
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(Duration::from_secs_f64)
    }

    /// Whether `other` refers to the same catalog entry
    pub fn same_track(&self, other: &Track) -> bool {
        self.id == other.id
    }

    /// Check the record is playable before handing it to an engine
    pub fn validate(&self) -> Result<()> {
        if self.id.as_str().is_empty() {
            return Err(EncoreError::invalid_track("empty id"));
        }
        if self.stream_url.trim().is_empty() {
            return Err(EncoreError::invalid_track(format!(
                "track {} has no stream URL",
                self.id
            )));
        }
        if let Some(secs) = self.duration_seconds {
            if !secs.is_finite() || secs < 0.0 {
                return Err(EncoreError::invalid_track(format!(
                    "track {} has invalid duration {}",
                    self.id, secs
                )));
            }
        }
        Ok(())
    }

    /// Parse a track from the catalog's JSON representation
    pub fn from_json(json: &str) -> Result<Self> {
        let track: Track = serde_json::from_str(json)?;
        track.validate()?;
        Ok(track)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_catalog_schema() {
        let json = r#"{
            "id": "abc",
            "title": "Night Drive",
            "artist": "Nova",
            "streamUrl": "https://cdn.example.com/abc.mp3",
            "artworkUrl": "https://cdn.example.com/abc.jpg",
            "durationSeconds": 201.5
        }"#;

        let track = Track::from_json(json).unwrap();
        assert_eq!(track.id.as_str(), "abc");
        assert_eq!(track.album, None);
        assert_eq!(track.duration(), Some(Duration::from_secs_f64(201.5)));
    }

    #[test]
    fn rejects_missing_stream_url() {
        let track = Track::new("abc", "Title", "Artist", "  ");
        assert!(matches!(
            track.validate(),
            Err(EncoreError::InvalidTrack(_))
        ));
    }

    #[test]
    fn rejects_negative_duration() {
        let track = Track::new("abc", "Title", "Artist", "file:///a.flac").with_duration(-1.0);
        assert!(track.validate().is_err());
        assert_eq!(track.duration(), None);
    }

    #[test]
    fn identity_ignores_metadata() {
        let a = Track::new("abc", "Title", "Artist", "file:///a.flac");
        let b = a.clone().with_album("Remaster");
        assert!(a.same_track(&b));
        assert_ne!(a, b);
    }
}
