/// Dynamic range compressor
///
/// Fixed at a gentle "streaming" preset in the chain: the goal is evening out
/// loudness between tracks, not audible pumping.
use super::chain::AudioEffect;

/// Level floor the peak detector decays toward (dB)
const NOISE_FLOOR_DB: f32 = -120.0;

/// Peak hold release; long enough to span a full cycle of the lowest bass note
const PEAK_RELEASE_MS: f32 = 50.0;

/// Compressor settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    /// Threshold in dB (-60 to 0)
    pub threshold_db: f32,
    /// Ratio (1.0 to 20.0), e.g. 3.0 means 3:1
    pub ratio: f32,
    /// Attack time in milliseconds (0.1 to 100)
    pub attack_ms: f32,
    /// Release time in milliseconds (10 to 1000)
    pub release_ms: f32,
    /// Soft knee width in dB (0 = hard knee)
    pub knee_db: f32,
    /// Gain applied after compression in dB (0 to 24)
    pub makeup_gain_db: f32,
}

impl CompressorSettings {
    /// Preset used by the playback chain
    /// - Threshold: -18 dB
    /// - Ratio: 3:1
    /// - Knee: 6 dB
    /// - Attack: 10 ms
    /// - Release: 120 ms
    pub fn streaming() -> Self {
        Self {
            threshold_db: -18.0,
            ratio: 3.0,
            attack_ms: 10.0,
            release_ms: 120.0,
            knee_db: 6.0,
            makeup_gain_db: 0.0,
        }
    }

    /// Clamp every field to its safe range
    pub fn validated(self) -> Self {
        Self {
            threshold_db: self.threshold_db.clamp(-60.0, 0.0),
            ratio: self.ratio.clamp(1.0, 20.0),
            attack_ms: self.attack_ms.clamp(0.1, 100.0),
            release_ms: self.release_ms.clamp(10.0, 1000.0),
            knee_db: self.knee_db.clamp(0.0, 10.0),
            makeup_gain_db: self.makeup_gain_db.clamp(0.0, 24.0),
        }
    }

    /// Static curve: output level for an input level, both in dB
    #[inline]
    fn output_level(&self, input_db: f32) -> f32 {
        let over = input_db - self.threshold_db;
        let slope = 1.0 - 1.0 / self.ratio;

        if self.knee_db > 0.0 && over.abs() < self.knee_db / 2.0 {
            let x = over + self.knee_db / 2.0;
            input_db - slope * x * x / (2.0 * self.knee_db)
        } else if over > 0.0 {
            self.threshold_db + over / self.ratio
        } else {
            input_db
        }
    }
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self::streaming()
    }
}

/// Linked-stereo feed-forward compressor
///
/// Level is tracked by a peak detector (instant attack, slow release) so the
/// estimate is stable within a waveform cycle; the resulting gain reduction
/// is then smoothed with the configured attack/release times.
pub struct Compressor {
    settings: CompressorSettings,
    enabled: bool,

    peak_db: f32,
    reduction_db: f32,

    peak_release_coeff: f32,
    attack_coeff: f32,
    release_coeff: f32,
    makeup_linear: f32,

    sample_rate: u32,
    needs_update: bool,
}

impl Compressor {
    /// Compressor with the streaming preset
    pub fn new() -> Self {
        Self::with_settings(CompressorSettings::streaming())
    }

    pub fn with_settings(settings: CompressorSettings) -> Self {
        Self {
            settings: settings.validated(),
            enabled: true,
            peak_db: NOISE_FLOOR_DB,
            reduction_db: 0.0,
            peak_release_coeff: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            makeup_linear: 1.0,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    pub fn settings(&self) -> CompressorSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: CompressorSettings) {
        self.settings = settings.validated();
        self.needs_update = true;
    }

    /// Current smoothed gain reduction in dB (<= 0)
    pub fn gain_reduction_db(&self) -> f32 {
        self.reduction_db
    }

    fn update_coefficients(&mut self) {
        if !self.needs_update {
            return;
        }

        let samples_per_ms = self.sample_rate as f32 / 1000.0;
        // coeff = exp(-1 / samples) reaches 63% of the target in `samples`
        let coeff = |ms: f32| (-1.0 / (ms * samples_per_ms)).exp();

        self.peak_release_coeff = coeff(PEAK_RELEASE_MS);
        self.attack_coeff = coeff(self.settings.attack_ms);
        self.release_coeff = coeff(self.settings.release_ms);
        self.makeup_linear = 10.0_f32.powf(self.settings.makeup_gain_db / 20.0);
        self.needs_update = false;
    }

    #[inline]
    fn track_peak(&mut self, input_db: f32) {
        if input_db > self.peak_db {
            self.peak_db = input_db;
        } else {
            self.peak_db =
                self.peak_release_coeff * (self.peak_db - NOISE_FLOOR_DB) + NOISE_FLOOR_DB;
        }
    }

    #[inline]
    fn smooth_reduction(&mut self, target_db: f32) {
        // More negative target = more compression = attack
        let coeff = if target_db < self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = coeff * self.reduction_db + (1.0 - coeff) * target_db;
    }
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for Compressor {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }

        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_coefficients();

        for frame in buffer.chunks_exact_mut(2) {
            let level = frame[0].abs().max(frame[1].abs());
            let input_db = if level > 1e-10 {
                20.0 * level.log10()
            } else {
                -200.0
            };

            self.track_peak(input_db);
            let target = self.settings.output_level(self.peak_db) - self.peak_db;
            self.smooth_reduction(target);

            let gain = 10.0_f32.powf(self.reduction_db / 20.0) * self.makeup_linear;
            frame[0] *= gain;
            frame[1] *= gain;
        }
    }

    fn reset(&mut self) {
        self.peak_db = NOISE_FLOOR_DB;
        self.reduction_db = 0.0;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Compressor"
    }
}
