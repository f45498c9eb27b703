//! Shuffle for queue randomization
//!
//! Fisher-Yates via `SliceRandom`. The permutation is computed once per
//! shuffle toggle and cached as the queue; "next" never re-rolls it.

use encore_core::Track;
use rand::seq::SliceRandom;
use rand::Rng;

/// Build the play order for `tracks`
///
/// Identity when `shuffle` is false. When shuffled and there is more than
/// one distinct track, the result is uniformly random among permutations
/// that differ from the input order.
pub fn build_queue<R: Rng + ?Sized>(tracks: &[Track], shuffle: bool, rng: &mut R) -> Vec<Track> {
    let mut queue = tracks.to_vec();
    if !shuffle || !has_distinct_ids(tracks) {
        return queue;
    }

    // Rejection sampling keeps the distribution uniform; identity has
    // probability at most 1/2 so this terminates quickly.
    loop {
        queue.shuffle(rng);
        if !same_order(&queue, tracks) {
            return queue;
        }
    }
}

/// Shuffle around the playing track
///
/// `current` goes first so playback continues uninterrupted; the remaining
/// tracks are shuffled behind it with [`build_queue`], so they never keep
/// their source order when at least two distinct tracks remain. With fewer
/// (two tracks, the first one playing) the result can only be the input
/// order. Falls back to [`build_queue`] when `current` is not part of
/// `tracks`.
pub fn reshuffle_around<R: Rng + ?Sized>(current: &Track, tracks: &[Track], rng: &mut R) -> Vec<Track> {
    let Some(pos) = tracks.iter().position(|t| t.id == current.id) else {
        return build_queue(tracks, true, rng);
    };

    let mut rest: Vec<Track> = tracks.to_vec();
    let head = rest.remove(pos);

    let mut queue = Vec::with_capacity(tracks.len());
    queue.push(head);
    queue.extend(build_queue(&rest, true, rng));
    queue
}

fn same_order(a: &[Track], b: &[Track]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.id == y.id)
}

fn has_distinct_ids(tracks: &[Track]) -> bool {
    tracks
        .split_first()
        .is_some_and(|(first, rest)| rest.iter().any(|t| t.id != first.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn create_test_tracks(count: usize) -> Vec<Track> {
        (0..count)
            .map(|i| Track::new(format!("t{}", i), format!("Track {}", i), "Artist", "file:///x.mp3"))
            .collect()
    }

    #[test]
    fn unshuffled_is_identity() {
        let tracks = create_test_tracks(5);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(build_queue(&tracks, false, &mut rng), tracks);
    }

    #[test]
    fn shuffled_never_identity() {
        let tracks = create_test_tracks(2);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let queue = build_queue(&tracks, true, &mut rng);
            assert!(!same_order(&queue, &tracks));
        }
    }

    #[test]
    fn shuffle_preserves_tracks() {
        let tracks = create_test_tracks(20);
        let mut rng = StdRng::seed_from_u64(42);
        let queue = build_queue(&tracks, true, &mut rng);

        let original: HashSet<_> = tracks.iter().map(|t| t.id.clone()).collect();
        let shuffled: HashSet<_> = queue.iter().map(|t| t.id.clone()).collect();
        assert_eq!(queue.len(), tracks.len());
        assert_eq!(original, shuffled);
    }

    #[test]
    fn single_and_empty_inputs_pass_through() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(build_queue(&[], true, &mut rng).is_empty());
        let one = create_test_tracks(1);
        assert_eq!(build_queue(&one, true, &mut rng), one);
    }

    #[test]
    fn reshuffle_keeps_current_first() {
        let tracks = create_test_tracks(10);
        let mut rng = StdRng::seed_from_u64(9);
        let queue = reshuffle_around(&tracks[4], &tracks, &mut rng);

        assert_eq!(queue[0].id, tracks[4].id);
        assert_eq!(queue.len(), tracks.len());
    }

    #[test]
    fn reshuffle_from_first_track_changes_order() {
        let tracks = create_test_tracks(3);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let queue = reshuffle_around(&tracks[0], &tracks, &mut rng);
            assert_eq!(queue[0].id, tracks[0].id);
            assert!(!same_order(&queue, &tracks), "seed {} kept source order", seed);
        }
    }

    #[test]
    fn reshuffle_of_two_from_first_is_source_order() {
        let tracks = create_test_tracks(2);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(same_order(&reshuffle_around(&tracks[0], &tracks, &mut rng), &tracks));
    }

    #[test]
    fn reshuffle_without_current_shuffles_everything() {
        let tracks = create_test_tracks(4);
        let stranger = Track::new("zz", "Stranger", "Artist", "file:///z.mp3");
        let mut rng = StdRng::seed_from_u64(5);
        let queue = reshuffle_around(&stranger, &tracks, &mut rng);
        assert_eq!(queue.len(), 4);
        assert!(!same_order(&queue, &tracks));
    }
}
