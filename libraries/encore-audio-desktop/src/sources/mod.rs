//! Stream sources for desktop: where bytes come from and how they become PCM

pub mod decode;
pub mod location;

pub use decode::{decode, resample, DecodedAudio};
pub use location::StreamLocation;

use crate::error::{AudioError, Result};
use tracing::debug;

/// Fetch, decode and resample `url` to interleaved stereo at `output_rate`
///
/// Blocking; runs on a loader worker thread.
pub fn prepare(url: &str, output_rate: u32) -> Result<DecodedAudio> {
    let audio = prepare_while(url, output_rate, || true)?;
    // `keep_going` never declines, so every stage ran
    audio.ok_or_else(|| AudioError::ThreadError("Preparation abandoned".into()))
}

/// [`prepare`], asking `keep_going` between stages
///
/// Returns `Ok(None)` as soon as `keep_going` answers `false`; the remaining
/// stages are skipped.
pub fn prepare_while<F>(url: &str, output_rate: u32, keep_going: F) -> Result<Option<DecodedAudio>>
where
    F: Fn() -> bool,
{
    let location = StreamLocation::parse(url)?;
    let bytes = location.fetch()?;
    debug!("Fetched {} bytes from {}", bytes.len(), location);
    if !keep_going() {
        return Ok(None);
    }

    let extension = location.extension();
    let audio = decode(bytes, extension.as_deref())?;
    if !keep_going() {
        return Ok(None);
    }

    resample(audio, output_rate).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;
    use std::cell::Cell;
    use tempfile::TempDir;

    #[test]
    fn declined_after_fetch_skips_decoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("garbage.mp3");
        std::fs::write(&path, vec![0x42; 4096]).unwrap();
        let url = path.to_str().unwrap();

        let asked = Cell::new(0);
        let result = prepare_while(url, 48000, || {
            asked.set(asked.get() + 1);
            false
        });
        assert!(matches!(result, Ok(None)));
        assert_eq!(asked.get(), 1);

        // The same bytes fail once decoding is allowed to run
        assert!(matches!(
            prepare_while(url, 48000, || true),
            Err(AudioError::UnsupportedFormat(_) | AudioError::DecodeError(_))
        ));
    }

    #[test]
    fn fetch_errors_win_over_declining() {
        let result = prepare_while("/nonexistent/encore/track.wav", 48000, || false);
        assert!(matches!(result, Err(AudioError::Unreachable(_))));
    }
}
