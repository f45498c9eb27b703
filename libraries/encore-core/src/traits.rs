/// Core traits for Encore
use crate::types::TrackId;

/// Write side of the track catalog consumed by the playback engine
///
/// The catalog service owns track records; the engine only reports that a
/// track started playing. Calls are fire-and-forget: implementers must not
/// block the caller (spawn or enqueue the request instead) and swallow their
/// own failures.
pub trait TrackCatalog: Send {
    /// Record one play of `track_id`
    ///
    /// Invoked once per completed load that transitioned into `Playing`,
    /// never on resume from pause.
    fn increment_play_count(&self, track_id: &TrackId);
}

/// Catalog that discards every write
///
/// Used when the host application has no catalog service attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCatalog;

impl TrackCatalog for NullCatalog {
    fn increment_play_count(&self, _track_id: &TrackId) {}
}
