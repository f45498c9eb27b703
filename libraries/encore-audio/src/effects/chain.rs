/// Fixed effects chain
///
/// Every track is routed through the same topology. Stages are created once
/// per output device and outlive any individual source, so settings carry
/// across track changes without re-initialization.
use super::compressor::{Compressor, CompressorSettings};
use super::eq::ThreeBandEq;
use super::gain::MasterGain;
use super::reverb::Reverb;
use super::settings::EffectSettings;
use crate::error::{EffectsInitError, Result};
use tracing::debug;

/// Sample rates the filter designs are valid for
const SUPPORTED_RATES: std::ops::RangeInclusive<u32> = 8_000..=384_000;

/// Trait for audio effects that can be chained together
///
/// # Safety
/// - Must NOT allocate memory in `process()` (real-time constraint)
/// - Must be Send so the chain can move onto the audio thread
pub trait AudioEffect: Send {
    /// Process audio buffer in-place
    ///
    /// # Arguments
    /// * `buffer` - Interleaved stereo samples (L, R, L, R, ...)
    /// * `sample_rate` - Sample rate in Hz
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32);

    /// Reset effect state (e.g., when seeking or changing tracks)
    fn reset(&mut self);

    /// Enable/disable the effect
    fn set_enabled(&mut self, enabled: bool);

    /// Check if effect is enabled
    fn is_enabled(&self) -> bool;

    /// Get effect name (for debugging)
    fn name(&self) -> &str;
}

/// Source → EQ → Reverb → Compressor → MasterGain → Output
pub struct EffectsChain {
    eq: ThreeBandEq,
    reverb: Reverb,
    compressor: Compressor,
    gain: MasterGain,
    settings: EffectSettings,
    sample_rate: u32,
    passthrough: bool,
}

impl EffectsChain {
    /// Build the full chain for a device running at `sample_rate`
    pub fn new(sample_rate: u32) -> Result<Self> {
        if !SUPPORTED_RATES.contains(&sample_rate) {
            return Err(EffectsInitError::UnsupportedSampleRate(sample_rate));
        }

        debug!("Effects chain ready at {} Hz", sample_rate);
        Ok(Self::build(sample_rate, false))
    }

    /// Chain that only applies master gain and output volume
    ///
    /// Used when [`EffectsChain::new`] fails. Settings are still recorded so
    /// they can be reported back, but EQ, reverb and compression are bypassed.
    pub fn passthrough(sample_rate: u32) -> Self {
        debug!("Effects chain in pass-through at {} Hz", sample_rate);
        Self::build(sample_rate, true)
    }

    fn build(sample_rate: u32, passthrough: bool) -> Self {
        let mut chain = Self {
            eq: ThreeBandEq::new(),
            reverb: Reverb::new(if passthrough { 44_100 } else { sample_rate }),
            compressor: Compressor::with_settings(CompressorSettings::streaming()),
            gain: MasterGain::new(),
            settings: EffectSettings::NEUTRAL,
            sample_rate,
            passthrough,
        };

        if passthrough {
            chain.eq.set_enabled(false);
            chain.reverb.set_enabled(false);
            chain.compressor.set_enabled(false);
        }
        chain
    }

    /// Push new parameters into every stage; changes ramp in, never step
    pub fn apply_settings(&mut self, settings: &EffectSettings) {
        let settings = settings.clamped();
        self.eq
            .set_gains(settings.bass_gain_db, settings.mid_gain_db, settings.treble_gain_db);
        self.reverb.set_wet(settings.reverb_wet);
        self.gain.set_trim_db(settings.master_gain_db);
        self.settings = settings;
    }

    /// Current (clamped) parameters
    pub fn settings(&self) -> EffectSettings {
        self.settings
    }

    /// Output volume as a linear factor in [0, 1]; 0 is mute
    pub fn set_output_gain(&mut self, gain: f32) {
        self.gain.set_output_gain(gain);
    }

    pub fn output_gain(&self) -> f32 {
        self.gain.output_gain()
    }

    /// Process interleaved stereo samples in place
    pub fn process(&mut self, buffer: &mut [f32]) {
        let sample_rate = self.sample_rate;
        for stage in self.stages_mut() {
            if stage.is_enabled() {
                stage.process(buffer, sample_rate);
            }
        }
    }

    /// Clear filter history and tails (seek, source swap); settings are kept
    pub fn reset(&mut self) {
        for stage in self.stages_mut() {
            stage.reset();
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Names of the active stages in processing order
    pub fn stage_names(&self) -> Vec<&str> {
        let stages: [&dyn AudioEffect; 4] = [&self.eq, &self.reverb, &self.compressor, &self.gain];
        stages
            .into_iter()
            .filter(|stage| stage.is_enabled())
            .map(|stage| stage.name())
            .collect()
    }

    fn stages_mut(&mut self) -> [&mut dyn AudioEffect; 4] {
        [
            &mut self.eq,
            &mut self.reverb,
            &mut self.compressor,
            &mut self.gain,
        ]
    }
}
