/// Master gain stage
///
/// Last stage of the chain. Combines the user's trim (dB) with the output
/// volume (linear, already mapped from the volume slider) and ramps between
/// values so volume drags and mute toggles never click.
use super::chain::AudioEffect;
use super::settings::{MAX_GAIN_DB, MIN_GAIN_DB};

/// Ramp length for gain changes (ms)
const RAMP_MS: f32 = 20.0;

/// Convert decibels to a linear amplitude factor
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub struct MasterGain {
    trim_db: f32,
    output_gain: f32,
    current: f32,
    ramp_target: f32,
    step: f32,
    enabled: bool,
}

impl MasterGain {
    pub fn new() -> Self {
        Self {
            trim_db: 0.0,
            output_gain: 1.0,
            current: 1.0,
            ramp_target: 1.0,
            step: 0.0,
            enabled: true,
        }
    }

    /// Set the trim in dB (clamped to ±15)
    pub fn set_trim_db(&mut self, db: f32) {
        self.trim_db = if db.is_nan() {
            0.0
        } else {
            db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
        };
    }

    /// Set the output volume as a linear factor in [0, 1]
    pub fn set_output_gain(&mut self, gain: f32) {
        self.output_gain = if gain.is_nan() { 0.0 } else { gain.clamp(0.0, 1.0) };
    }

    pub fn trim_db(&self) -> f32 {
        self.trim_db
    }

    pub fn output_gain(&self) -> f32 {
        self.output_gain
    }

    /// Gain the stage is ramping toward
    pub fn target(&self) -> f32 {
        db_to_linear(self.trim_db) * self.output_gain
    }
}

impl Default for MasterGain {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for MasterGain {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }

        let target = self.target();
        let frames = buffer.len() / 2;
        if frames == 0 {
            return;
        }

        if self.current == target {
            for sample in buffer.iter_mut() {
                *sample *= target;
            }
            return;
        }

        // Fixed-slope ramp, restarted whenever the target moves
        if target != self.ramp_target {
            let ramp_frames = (RAMP_MS * sample_rate as f32 / 1000.0).max(1.0);
            self.ramp_target = target;
            self.step = (target - self.current) / ramp_frames;
        }
        let step = self.step;

        for frame in buffer.chunks_exact_mut(2) {
            if (target - self.current).abs() <= step.abs() {
                self.current = target;
            } else {
                self.current += step;
            }
            frame[0] *= self.current;
            frame[1] *= self.current;
        }
    }

    fn reset(&mut self) {
        self.current = self.target();
        self.ramp_target = self.current;
        self.step = 0.0;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Master Gain"
    }
}
