//! Queue navigation
//!
//! Pure functions over borrowed queue data. The only mutation is the history
//! push that accompanies an advance; the caller owns both.

use crate::history::History;
use crate::types::RepeatMode;
use encore_core::Track;

/// Track after `current` in `queue`, ignoring repeat-one
///
/// Does not touch history. `current` missing from the queue resolves to the
/// first entry.
pub fn following(current: &Track, queue: &[Track], wrap: bool) -> Option<Track> {
    let Some(pos) = queue.iter().position(|t| t.id == current.id) else {
        return queue.first().cloned();
    };

    match queue.get(pos + 1) {
        Some(track) => Some(track.clone()),
        None if wrap => queue.first().cloned(),
        None => None,
    }
}

/// Track to play when `current` finishes on its own
///
/// - `One` → `current` again, history untouched
/// - last entry with `All` → first entry
/// - last entry with `None` → `None` (queue exhausted)
///
/// On an advance to a different track the outgoing `current` is pushed to
/// `history`.
pub fn next(current: &Track, queue: &[Track], repeat: RepeatMode, history: &mut History) -> Option<Track> {
    if repeat == RepeatMode::One {
        return Some(current.clone());
    }
    advance(current, queue, repeat == RepeatMode::All, history)
}

/// Track to play on an explicit skip
///
/// Same as [`next`] except repeat-one is bypassed: a skip always moves on,
/// wrapping as if repeat-all were set.
pub fn skip_next(current: &Track, queue: &[Track], repeat: RepeatMode, history: &mut History) -> Option<Track> {
    let wrap = matches!(repeat, RepeatMode::One | RepeatMode::All);
    advance(current, queue, wrap, history)
}

/// Most recently played track, removed from history; never wraps
pub fn previous(history: &mut History) -> Option<Track> {
    history.pop()
}

fn advance(current: &Track, queue: &[Track], wrap: bool, history: &mut History) -> Option<Track> {
    let upcoming = following(current, queue, wrap)?;
    if upcoming.id != current.id {
        history.push(current.clone());
    }
    Some(upcoming)
}
