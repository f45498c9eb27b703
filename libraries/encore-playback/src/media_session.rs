//! OS media-control integration
//!
//! Mirrors transport state onto the platform's now-playing surface (lock
//! screen, media keys, MPRIS) and maps its actions back to [`Command`]s.
//! The bridge keeps no playback state of its own: every update is derived
//! from the previous and the new controller snapshot.

use crate::machine::Command;
use crate::types::{PlaybackState, PlaybackStatus};
use encore_core::Track;
use serde::{Deserialize, Serialize};

/// Now-playing metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub artwork_url: Option<String>,
    pub duration_seconds: Option<f64>,
}

impl From<&Track> for MediaMetadata {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            artwork_url: track.artwork_url.clone(),
            duration_seconds: track.duration_seconds,
        }
    }
}

/// Coarse transport state as shown by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaPlayback {
    Playing,
    Paused,
    Stopped,
}

impl From<PlaybackStatus> for MediaPlayback {
    fn from(status: PlaybackStatus) -> Self {
        match status {
            // Loading counts as playing: autoplay follows
            PlaybackStatus::Playing | PlaybackStatus::Loading => Self::Playing,
            PlaybackStatus::Paused => Self::Paused,
            PlaybackStatus::Idle | PlaybackStatus::Ended | PlaybackStatus::Errored => Self::Stopped,
        }
    }
}

/// Action requested by the OS media controls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MediaAction {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    SeekTo(f64),
    Stop,
}

impl MediaAction {
    /// Command this action stands for
    pub fn command(self) -> Command {
        match self {
            Self::Play => Command::Play,
            Self::Pause => Command::Pause,
            Self::Toggle => Command::TogglePlay,
            Self::Next => Command::SkipNext,
            Self::Previous => Command::SkipPrevious,
            Self::SeekTo(seconds) => Command::Seek(seconds),
            Self::Stop => Command::Stop,
        }
    }
}

/// Platform now-playing surface
pub trait MediaSurface: Send {
    /// `None` clears the now-playing entry
    fn set_metadata(&mut self, metadata: Option<&MediaMetadata>);

    fn set_playback(&mut self, playback: MediaPlayback);
}

/// Pushes snapshot differences to a [`MediaSurface`]
pub struct MediaSessionBridge {
    surface: Box<dyn MediaSurface>,
}

impl MediaSessionBridge {
    pub fn new(surface: Box<dyn MediaSurface>) -> Self {
        Self { surface }
    }

    /// Push everything for `state` regardless of what the surface showed before
    pub fn prime(&mut self, state: &PlaybackState) {
        let metadata = state.current_track.as_ref().map(MediaMetadata::from);
        self.surface.set_metadata(metadata.as_ref());
        self.surface.set_playback(state.status.into());
    }

    /// Push what changed between two snapshots
    ///
    /// Metadata is compared by track id, playback by its coarse OS value.
    pub fn sync(&mut self, previous: &PlaybackState, current: &PlaybackState) {
        if previous.current_id() != current.current_id() {
            let metadata = current.current_track.as_ref().map(MediaMetadata::from);
            self.surface.set_metadata(metadata.as_ref());
        }

        let before = MediaPlayback::from(previous.status);
        let after = MediaPlayback::from(current.status);
        if before != after {
            self.surface.set_playback(after);
        }
    }
}
