//! Playback history tracking
//!
//! Maintains a bounded history of played tracks for "previous" functionality

use encore_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Playback history with bounded size
///
/// Linear stack, not a ring: "previous" walks back until it runs out and
/// never wraps. When full, the oldest entry is discarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// History buffer (most recent = back)
    tracks: VecDeque<Track>,

    /// Maximum history size
    max_size: usize,
}

impl History {
    /// Create new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size.min(64)),
            max_size,
        }
    }

    /// Add track to history
    ///
    /// If history is full, oldest track is discarded
    pub fn push(&mut self, track: Track) {
        if self.max_size == 0 {
            return;
        }
        while self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track);
    }

    /// Most recent track (without removing)
    pub fn peek(&self) -> Option<&Track> {
        self.tracks.back()
    }

    /// Pop most recent track from history
    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_back()
    }

    /// Drop tail entries equal to `id`
    pub(crate) fn drop_tail_matching(&mut self, id: &TrackId) {
        while self.peek().is_some_and(|t| &t.id == id) {
            self.tracks.pop_back();
        }
    }

    /// Iterate oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(50) // Default: 50 tracks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {}", id), "Test Artist", format!("file:///music/{}.mp3", id))
    }

    fn ids(history: &History) -> Vec<&str> {
        history.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn pop_returns_most_recent_first() {
        let mut history = History::new(10);
        history.push(create_test_track("1"));
        history.push(create_test_track("2"));
        history.push(create_test_track("3"));

        assert_eq!(history.pop().unwrap().id.as_str(), "3");
        assert_eq!(history.pop().unwrap().id.as_str(), "2");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn history_bounded() {
        let mut history = History::new(3);
        for id in ["1", "2", "3", "4"] {
            history.push(create_test_track(id));
        }

        // Oldest (Track 1) discarded
        assert_eq!(ids(&history), vec!["2", "3", "4"]);
    }

    #[test]
    fn empty_history_never_wraps() {
        let mut history = History::new(3);
        history.push(create_test_track("1"));
        assert!(history.pop().is_some());
        assert!(history.pop().is_none());
        assert!(history.pop().is_none());
    }

    #[test]
    fn zero_size_history_stays_empty() {
        let mut history = History::new(0);
        history.push(create_test_track("1"));
        assert!(history.is_empty());
    }

    #[test]
    fn drop_tail_matching_only_touches_tail() {
        let mut history = History::new(10);
        for id in ["a", "b", "a", "a"] {
            history.push(create_test_track(id));
        }
        history.drop_tail_matching(&TrackId::from("a"));
        assert_eq!(ids(&history), vec!["a", "b"]);
    }
}
