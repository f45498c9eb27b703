//! CPAL output thread
//!
//! CPAL's `Stream` is not `Send` on every platform, so a dedicated thread
//! opens the device, builds the stream and keeps it alive. Everything else
//! talks to the callback through the shared [`Deck`].

use crate::deck::{lock, Deck};
use crate::error::{AudioError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{bounded, Receiver, Sender};
use encore_playback::{EngineEvent, MediaLoadError, PlaybackConfig};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// Running output: the deck it renders and the thread that owns the stream
pub(crate) struct Output {
    pub deck: Arc<Mutex<Deck>>,
    pub sample_rate: u32,
    /// Dropping this sender stops the stream
    shutdown: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Output {
    /// Open the default output device
    ///
    /// Blocks until the stream is playing or has failed to start.
    pub(crate) fn open(config: &PlaybackConfig, events: Sender<EngineEvent>) -> Result<Self> {
        let (init_tx, init_rx) = bounded::<Result<(Arc<Mutex<Deck>>, u32)>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let config = config.clone();

        let thread = thread::Builder::new()
            .name("encore-output".to_string())
            .spawn(move || run(&config, events, &init_tx, &shutdown_rx))
            .map_err(|e| AudioError::ThreadError(format!("Failed to spawn output thread: {}", e)))?;

        let (deck, sample_rate) = init_rx
            .recv()
            .map_err(|_| AudioError::ThreadError("Output thread exited during setup".into()))??;

        Ok(Self {
            deck,
            sample_rate,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }
}

impl Drop for Output {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Output thread panicked");
            }
        }
    }
}

/// Output thread body: build the stream, report, then park until shutdown
fn run(
    config: &PlaybackConfig,
    events: Sender<EngineEvent>,
    init: &Sender<Result<(Arc<Mutex<Deck>>, u32)>>,
    shutdown: &Receiver<()>,
) {
    let stream = match build_stream(config, events) {
        Ok((stream, deck, sample_rate)) => {
            let _ = init.send(Ok((deck, sample_rate)));
            stream
        }
        Err(e) => {
            let _ = init.send(Err(e));
            return;
        }
    };

    // Returns once the engine drops its sender
    let _ = shutdown.recv();
    drop(stream);
    info!("Audio output closed");
}

fn build_stream(
    config: &PlaybackConfig,
    events: Sender<EngineEvent>,
) -> Result<(cpal::Stream, Arc<Mutex<Deck>>, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::DeviceNotFound)?;

    let supported = device.default_output_config()?;
    let sample_rate = supported.sample_rate();
    let stream_config = supported.config();
    let channels = usize::from(stream_config.channels.max(1));

    let (deck, effects_unavailable) = Deck::new(sample_rate, config);
    let deck = Arc::new(Mutex::new(deck));
    if let Some(reason) = effects_unavailable {
        let _ = events.send(EngineEvent::EffectsUnavailable { reason });
    }

    let callback_deck = Arc::clone(&deck);
    let callback_events = events.clone();
    let mut scratch: Vec<f32> = Vec::new();

    let error_deck = Arc::clone(&deck);
    let stream = device.build_output_stream(
        &stream_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let frames = data.len() / channels;
            scratch.resize(frames * 2, 0.0);
            lock(&callback_deck).render(&mut scratch, &callback_events);
            write_frames(&scratch, data, channels);
        },
        move |err| {
            error!("Audio stream error: {}", err);
            let current = lock(&error_deck).current_token().cloned();
            if let Some(token) = current {
                let _ = events.try_send(EngineEvent::Error {
                    token,
                    error: MediaLoadError::Decode(format!("Output stream error: {}", err)),
                });
            }
        },
        None,
    )?;
    stream.play()?;

    info!(
        "Audio output open: {} Hz, {} channels",
        sample_rate, channels
    );
    if channels > 2 {
        warn!("Output has {} channels, writing stereo to the first two", channels);
    }
    Ok((stream, deck, sample_rate))
}

/// Map interleaved stereo onto the device's channel layout
pub(crate) fn write_frames(stereo: &[f32], data: &mut [f32], channels: usize) {
    for (frame, out) in stereo.chunks_exact(2).zip(data.chunks_exact_mut(channels)) {
        match out {
            [mono] => *mono = (frame[0] + frame[1]) * 0.5,
            [left, right, rest @ ..] => {
                *left = frame[0];
                *right = frame[1];
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_passes_through() {
        let stereo = [0.1, 0.2, 0.3, 0.4];
        let mut data = [0.0; 4];
        write_frames(&stereo, &mut data, 2);
        assert_eq!(data, stereo);
    }

    #[test]
    fn mono_device_gets_average() {
        let stereo = [0.2, 0.4, -0.2, 0.0];
        let mut data = [0.0; 2];
        write_frames(&stereo, &mut data, 1);
        assert!((data[0] - 0.3).abs() < 1e-6);
        assert!((data[1] + 0.1).abs() < 1e-6);
    }

    #[test]
    fn surround_device_silences_extra_channels() {
        let stereo = [0.5, -0.5];
        let mut data = [1.0; 6];
        write_frames(&stereo, &mut data, 6);
        assert_eq!(data, [0.5, -0.5, 0.0, 0.0, 0.0, 0.0]);
    }
}
