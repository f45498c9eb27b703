//! Whole-stream decoding with Symphonia and resampling with Rubato
//!
//! A fetched stream is decoded in one pass into interleaved stereo f32.
//! Every Symphonia sample format goes through the same interleaving helper;
//! only the normalization closure differs per format.
//!
//! - Mono is duplicated to both sides
//! - Channels beyond the front pair are folded in at -6 dB

use crate::error::{AudioError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Frames fed to the resampler per call
const RESAMPLE_CHUNK_FRAMES: usize = 1024;

/// Decoded PCM, interleaved stereo
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved left/right samples in [-1, 1]
    pub samples: Vec<f32>,
    /// Frames per second
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of stereo frames
    pub fn frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Playing time at `sample_rate`
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Decode a complete stream held in memory
///
/// `extension` is only a hint; the prober also sniffs the content.
pub fn decode(bytes: Vec<u8>, extension: Option<&str>) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::UnsupportedFormat(format!("Failed to probe stream: {}", e)))?;
    let mut format_reader = probed.format;

    let track = format_reader
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::UnsupportedFormat("No audio tracks found".into()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioError::UnsupportedFormat("Unknown sample rate".into()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::UnsupportedFormat(format!("Failed to create decoder: {}", e)))?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match format_reader.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::DecodeError(format!("Error reading packet: {}", e)));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => append_stereo(decoded, &mut samples),
            // Corrupt packet: drop it and keep going
            Err(SymphoniaError::DecodeError(msg)) => {
                skipped += 1;
                warn!("Skipping undecodable packet: {}", msg);
            }
            Err(e) => return Err(AudioError::DecodeError(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::DecodeError("Stream contains no audio frames".into()));
    }

    debug!(
        "Decoded {} frames at {} Hz ({} packets skipped)",
        samples.len() / 2,
        sample_rate,
        skipped
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Convert to `target_rate`; identity when the rates already match
pub fn resample(audio: DecodedAudio, target_rate: u32) -> Result<DecodedAudio> {
    if audio.sample_rate == target_rate || audio.samples.is_empty() {
        return Ok(audio);
    }
    if audio.sample_rate == 0 || target_rate == 0 {
        return Err(AudioError::ResampleError(format!(
            "Cannot resample {} Hz to {} Hz",
            audio.sample_rate, target_rate
        )));
    }

    let ratio = target_rate as f64 / audio.sample_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, RESAMPLE_CHUNK_FRAMES, 2)
        .map_err(|e| AudioError::ResampleError(format!("Failed to create resampler: {}", e)))?;

    let (left, right): (Vec<f32>, Vec<f32>) = audio
        .samples
        .chunks_exact(2)
        .map(|frame| (frame[0], frame[1]))
        .unzip();

    let expected = (left.len() as f64 * ratio).ceil() as usize;
    let delay = resampler.output_delay();
    let mut out_left = Vec::with_capacity(expected + delay);
    let mut out_right = Vec::with_capacity(expected + delay);

    let mut offset = 0;
    while offset + RESAMPLE_CHUNK_FRAMES <= left.len() {
        let end = offset + RESAMPLE_CHUNK_FRAMES;
        let block = resampler
            .process(&[&left[offset..end], &right[offset..end]], None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        out_left.extend_from_slice(&block[0]);
        out_right.extend_from_slice(&block[1]);
        offset = end;
    }

    if offset < left.len() {
        let tail: [&[f32]; 2] = [&left[offset..], &right[offset..]];
        let block = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        out_left.extend_from_slice(&block[0]);
        out_right.extend_from_slice(&block[1]);
    }

    // Flush the filter delay
    while out_left.len() < expected + delay {
        let block = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AudioError::ResampleError(e.to_string()))?;
        if block[0].is_empty() {
            break;
        }
        out_left.extend_from_slice(&block[0]);
        out_right.extend_from_slice(&block[1]);
    }

    let samples = out_left
        .iter()
        .zip(&out_right)
        .skip(delay)
        .take(expected)
        .flat_map(|(&l, &r)| [l, r])
        .collect();

    Ok(DecodedAudio {
        samples,
        sample_rate: target_rate,
    })
}

/// Append a decoded packet to `output` as interleaved stereo f32
fn append_stereo(decoded: AudioBufferRef<'_>, output: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => interleave_to_stereo(&buf, |s| s, output),
        AudioBufferRef::F64(buf) => interleave_to_stereo(&buf, |s| s as f32, output),
        AudioBufferRef::S8(buf) => interleave_to_stereo(&buf, |s| s as f32 / i8::MAX as f32, output),
        AudioBufferRef::S16(buf) => {
            interleave_to_stereo(&buf, |s| s as f32 / i16::MAX as f32, output);
        }
        AudioBufferRef::S24(buf) => {
            interleave_to_stereo(&buf, |s| s.inner() as f32 / 8388607.0, output);
        }
        AudioBufferRef::S32(buf) => {
            interleave_to_stereo(&buf, |s| s as f32 / i32::MAX as f32, output);
        }
        AudioBufferRef::U8(buf) => {
            interleave_to_stereo(&buf, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0, output);
        }
        AudioBufferRef::U16(buf) => {
            interleave_to_stereo(&buf, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0, output);
        }
        AudioBufferRef::U24(buf) => {
            interleave_to_stereo(&buf, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0, output);
        }
        AudioBufferRef::U32(buf) => {
            interleave_to_stereo(&buf, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0, output);
        }
    }
}

fn interleave_to_stereo<T, F>(buf: &AudioBuffer<T>, normalize: F, output: &mut Vec<f32>)
where
    T: Sample,
    F: Fn(T) -> f32,
{
    let channels = buf.spec().channels.count();
    let frames = buf.frames();
    if channels == 0 {
        return;
    }
    output.reserve(frames * 2);

    for frame in 0..frames {
        let left = normalize(buf.chan(0)[frame]);
        let right = if channels > 1 {
            normalize(buf.chan(1)[frame])
        } else {
            left
        };

        if channels > 2 {
            let rest: f32 = (2..channels).map(|ch| normalize(buf.chan(ch)[frame])).sum();
            let fold = 0.5 * rest / (channels - 2) as f32;
            output.push(left + fold);
            output.push(right + fold);
        } else {
            output.push(left);
            output.push(right);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, sample_rate: u32) -> DecodedAudio {
        let samples = (0..frames)
            .flat_map(|i| {
                let v = (i as f32 / frames as f32) * 0.5;
                [v, -v]
            })
            .collect();
        DecodedAudio {
            samples,
            sample_rate,
        }
    }

    #[test]
    fn same_rate_is_untouched() {
        let audio = ramp(1000, 48000);
        assert_eq!(resample(audio.clone(), 48000).unwrap(), audio);
    }

    #[test]
    fn upsampling_scales_length() {
        let audio = ramp(44100, 44100);
        let out = resample(audio, 48000).unwrap();
        assert_eq!(out.sample_rate, 48000);
        assert_eq!(out.frames(), 48000);
        assert!(out.samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn short_input_is_flushed() {
        let audio = ramp(300, 48000);
        let out = resample(audio, 44100).unwrap();
        assert_eq!(out.frames(), (300.0f64 * 44100.0 / 48000.0).ceil() as usize);
    }

    #[test]
    fn garbage_is_unsupported() {
        let result = decode(vec![0x42; 4096], Some("mp3"));
        assert!(result.is_err());
    }

    #[test]
    fn duration_follows_rate() {
        let audio = ramp(24000, 48000);
        assert!((audio.duration_seconds() - 0.5).abs() < 1e-9);
    }
}
