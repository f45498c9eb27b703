//! Background track loader
//!
//! Fetching and decoding take from milliseconds (local file) to seconds
//! (remote stream), so every load runs off the caller's thread.
//!
//! ## Architecture
//!
//! ```text
//! Engine (UI thread)      Supervisor thread           Worker thread
//!        │                       │                          │
//!        │  spawn_load(job)      │                          │
//!        │──────────────────────>│  spawn                   │
//!        │                       │─────────────────────────>│ fetch + decode
//!        │                       │  recv_timeout(timeout)   │ + resample
//!        │                       │<─────────────────────────│
//!        │                       │                          │
//!        │        Ready / Error / Timeout (if still current)
//!        │<──────────────────────│
//! ```
//!
//! The worker checks the deck after fetching and after decoding and stops
//! as soon as its load is superseded or released. A worker that outlives its
//! timeout is abandoned; its result is dropped because nobody is listening on
//! its channel any more.

use crate::deck::{lock, Deck};
use crate::error::{AudioError, Result};
use crate::sources::{prepare_while, DecodedAudio};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use encore_playback::{EngineEvent, LoadToken, MediaLoadError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One load to run in the background
#[derive(Debug, Clone)]
pub(crate) struct LoadJob {
    pub token: LoadToken,
    pub url: String,
    pub output_rate: u32,
    pub timeout: Duration,
}

/// Start loading `job` and report the outcome on `events`
///
/// Outcomes for a load the deck is no longer waiting for are dropped.
pub(crate) fn spawn_load(
    job: LoadJob,
    deck: Arc<Mutex<Deck>>,
    events: Sender<EngineEvent>,
) -> Result<()> {
    thread::Builder::new()
        .name(format!("encore-load-{}", job.token.generation))
        .spawn(move || supervise(job, deck, &events))
        .map(|_| ())
        .map_err(|e| AudioError::ThreadError(format!("Failed to spawn loader: {}", e)))
}

fn supervise(job: LoadJob, deck: Arc<Mutex<Deck>>, events: &Sender<EngineEvent>) {
    let started = Instant::now();
    let outcome = run_with_timeout(&job, &deck);

    match outcome {
        Ok(None) => debug!("Load {} superseded, stopped early", job.token),
        Ok(Some(audio)) => {
            let duration_seconds = audio.duration_seconds();
            if !lock(&deck).install(&job.token, audio) {
                debug!("Load {} superseded, dropping decoded audio", job.token);
                return;
            }
            info!(
                "Loaded {} ({:.1}s of audio) in {}ms",
                job.token,
                duration_seconds,
                started.elapsed().as_millis()
            );
            let _ = events.send(EngineEvent::Ready {
                token: job.token,
                duration_seconds,
            });
        }
        Err(error) => {
            if !lock(&deck).is_current(&job.token) {
                debug!("Load {} superseded, dropping error: {}", job.token, error);
                return;
            }
            warn!("Load {} failed: {}", job.token, error);
            let _ = events.send(EngineEvent::Error {
                token: job.token,
                error,
            });
        }
    }
}

/// `Ok(None)` when the load stopped being current before it finished
fn run_with_timeout(
    job: &LoadJob,
    deck: &Arc<Mutex<Deck>>,
) -> std::result::Result<Option<DecodedAudio>, MediaLoadError> {
    let (done_tx, done_rx) = bounded(1);
    let url = job.url.clone();
    let output_rate = job.output_rate;
    let token = job.token.clone();
    let deck = Arc::clone(deck);

    thread::Builder::new()
        .name("encore-decode".to_string())
        .spawn(move || {
            let prepared = prepare_while(&url, output_rate, || lock(&deck).is_current(&token));
            // Receiver gone means the supervisor timed out
            let _ = done_tx.send(prepared);
        })
        .map_err(|e| MediaLoadError::Decode(format!("Failed to spawn decoder: {}", e)))?;

    match done_rx.recv_timeout(job.timeout) {
        Ok(result) => result.map_err(MediaLoadError::from),
        Err(RecvTimeoutError::Timeout) => Err(MediaLoadError::Timeout {
            seconds: job.timeout.as_secs(),
        }),
        Err(RecvTimeoutError::Disconnected) => {
            Err(MediaLoadError::Decode("Decoder thread exited unexpectedly".into()))
        }
    }
}
