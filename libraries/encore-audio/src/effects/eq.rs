/// Three-band equalizer
///
/// Low shelf, mid peak, and high shelf biquads in series. Gains are the only
/// user-facing parameters; band frequencies are fixed so the controls map
/// directly onto "bass", "mid" and "treble" sliders.
use super::chain::AudioEffect;
use super::settings::{MAX_GAIN_DB, MIN_GAIN_DB};

/// Low shelf corner frequency (Hz)
const BASS_FREQUENCY: f32 = 100.0;

/// Mid peak center frequency (Hz)
const MID_FREQUENCY: f32 = 1000.0;

/// Mid peak bandwidth
const MID_Q: f32 = 0.9;

/// High shelf corner frequency (Hz)
const TREBLE_FREQUENCY: f32 = 8000.0;

/// Per-sample exponential smoothing factor for coefficient changes.
/// ~10 ms time constant at 48 kHz.
const SMOOTH_COEFF: f32 = 0.002;

/// Filter type for EQ bands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    /// Boosts/cuts below the corner frequency
    LowShelf,
    /// Boosts/cuts around the center frequency
    Peaking,
    /// Boosts/cuts above the corner frequency
    HighShelf,
}

/// EQ band configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EqBand {
    /// Center or corner frequency in Hz
    pub frequency: f32,
    gain_db: f32,
    q: f32,
    filter_type: FilterType,
}

impl EqBand {
    fn new(filter_type: FilterType, frequency: f32, q: f32) -> Self {
        Self {
            frequency,
            gain_db: 0.0,
            q,
            filter_type,
        }
    }

    /// Gain in dB
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Filter type
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = if gain_db.is_nan() {
            0.0
        } else {
            gain_db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
        };
    }
}

/// Normalized biquad coefficients (a0 == 1)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coefficients {
    const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// RBJ audio-EQ-cookbook coefficients for `band` at `sample_rate`
    fn design(band: &EqBand, sample_rate: f32) -> Self {
        if sample_rate < 1.0 || band.gain_db == 0.0 {
            return Self::IDENTITY;
        }

        let a = 10.0_f32.powf(band.gain_db / 40.0);
        // Keep the corner well below Nyquist so low device rates stay stable
        let frequency = band.frequency.min(sample_rate * 0.45);
        let omega = 2.0 * std::f32::consts::PI * frequency / sample_rate;
        let (sin_w, cos_w) = omega.sin_cos();

        let (b0, b1, b2, a0, a1, a2) = match band.filter_type {
            FilterType::Peaking => {
                let alpha = sin_w / (2.0 * band.q);
                (
                    1.0 + alpha * a,
                    -2.0 * cos_w,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_w,
                    1.0 - alpha / a,
                )
            }
            FilterType::LowShelf => {
                // Shelf slope S = 1
                let beta = 2.0 * a.sqrt() * (sin_w / 2.0 * 2.0_f32.sqrt());
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w + beta),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                    a * ((a + 1.0) - (a - 1.0) * cos_w - beta),
                    (a + 1.0) + (a - 1.0) * cos_w + beta,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                    (a + 1.0) + (a - 1.0) * cos_w - beta,
                )
            }
            FilterType::HighShelf => {
                let beta = 2.0 * a.sqrt() * (sin_w / 2.0 * 2.0_f32.sqrt());
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w + beta),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                    a * ((a + 1.0) + (a - 1.0) * cos_w - beta),
                    (a + 1.0) - (a - 1.0) * cos_w + beta,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                    (a + 1.0) - (a - 1.0) * cos_w - beta,
                )
            }
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    #[inline]
    fn approach(&mut self, target: &Self) {
        self.b0 += SMOOTH_COEFF * (target.b0 - self.b0);
        self.b1 += SMOOTH_COEFF * (target.b1 - self.b1);
        self.b2 += SMOOTH_COEFF * (target.b2 - self.b2);
        self.a1 += SMOOTH_COEFF * (target.a1 - self.a1);
        self.a2 += SMOOTH_COEFF * (target.a2 - self.a2);
    }
}

/// Direct form I history for one channel
#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl ChannelState {
    #[inline]
    fn tick(&mut self, c: &Coefficients, input: f32) -> f32 {
        let mut out = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        // Flush denormals
        if out.abs() < 1e-15 {
            out = 0.0;
        }
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = out;
        out
    }
}

/// Stereo biquad with smoothed coefficient transitions
#[derive(Debug, Clone)]
struct BiquadFilter {
    active: Coefficients,
    target: Coefficients,
    left: ChannelState,
    right: ChannelState,
}

impl BiquadFilter {
    fn new() -> Self {
        Self {
            active: Coefficients::IDENTITY,
            target: Coefficients::IDENTITY,
            left: ChannelState::default(),
            right: ChannelState::default(),
        }
    }

    fn retarget(&mut self, band: &EqBand, sample_rate: f32) {
        self.target = Coefficients::design(band, sample_rate);
    }

    #[inline]
    fn process_frame(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.active.approach(&self.target);
        (
            self.left.tick(&self.active, left),
            self.right.tick(&self.active, right),
        )
    }

    /// Clear history and snap to the target coefficients
    fn reset(&mut self) {
        self.left = ChannelState::default();
        self.right = ChannelState::default();
        self.active = self.target;
    }
}

/// Bass / mid / treble equalizer
pub struct ThreeBandEq {
    bands: [EqBand; 3],
    filters: [BiquadFilter; 3],
    enabled: bool,
    sample_rate: u32,
    needs_update: bool,
}

impl ThreeBandEq {
    /// Create a flat EQ
    pub fn new() -> Self {
        Self {
            bands: [
                EqBand::new(FilterType::LowShelf, BASS_FREQUENCY, std::f32::consts::FRAC_1_SQRT_2),
                EqBand::new(FilterType::Peaking, MID_FREQUENCY, MID_Q),
                EqBand::new(FilterType::HighShelf, TREBLE_FREQUENCY, std::f32::consts::FRAC_1_SQRT_2),
            ],
            filters: [BiquadFilter::new(), BiquadFilter::new(), BiquadFilter::new()],
            enabled: true,
            sample_rate: 44100,
            needs_update: true,
        }
    }

    /// Set all three gains (dB, clamped to ±15)
    pub fn set_gains(&mut self, bass_db: f32, mid_db: f32, treble_db: f32) {
        self.bands[0].set_gain_db(bass_db);
        self.bands[1].set_gain_db(mid_db);
        self.bands[2].set_gain_db(treble_db);
        self.needs_update = true;
    }

    /// Current band configuration (bass, mid, treble)
    pub fn bands(&self) -> &[EqBand; 3] {
        &self.bands
    }

    fn update_filters(&mut self) {
        if !self.needs_update {
            return;
        }
        let sr = self.sample_rate as f32;
        for (filter, band) in self.filters.iter_mut().zip(self.bands.iter()) {
            filter.retarget(band, sr);
        }
        self.needs_update = false;
    }
}

impl Default for ThreeBandEq {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEffect for ThreeBandEq {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }

        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.needs_update = true;
        }
        self.update_filters();

        for frame in buffer.chunks_exact_mut(2) {
            let (mut l, mut r) = (frame[0], frame[1]);
            for filter in &mut self.filters {
                (l, r) = filter.process_frame(l, r);
            }
            frame[0] = l;
            frame[1] = r;
        }
    }

    fn reset(&mut self) {
        self.update_filters();
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Three-Band EQ"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::tests::{generate_sine, settled_rms};

    const SR: u32 = 48_000;

    fn gain_ratio(eq: &mut ThreeBandEq, freq: f32) -> f32 {
        let input = generate_sine(freq, SR, 1.0);
        let mut output = input.clone();
        eq.process(&mut output, SR);
        settled_rms(&output) / settled_rms(&input)
    }

    #[test]
    fn flat_eq_is_transparent() {
        let mut eq = ThreeBandEq::new();
        let input = generate_sine(440.0, SR, 0.1);
        let mut output = input.clone();
        eq.process(&mut output, SR);
        assert_eq!(input, output);
    }

    #[test]
    fn bass_boost_raises_low_frequencies() {
        let mut eq = ThreeBandEq::new();
        eq.set_gains(12.0, 0.0, 0.0);
        let ratio = gain_ratio(&mut eq, 50.0);
        assert!(ratio > 2.0, "expected >6 dB boost at 50 Hz, got ratio {}", ratio);
    }

    #[test]
    fn bass_boost_leaves_highs_alone() {
        let mut eq = ThreeBandEq::new();
        eq.set_gains(12.0, 0.0, 0.0);
        let ratio = gain_ratio(&mut eq, 6000.0);
        assert!((ratio - 1.0).abs() < 0.1, "6 kHz moved by ratio {}", ratio);
    }

    #[test]
    fn treble_cut_lowers_high_frequencies() {
        let mut eq = ThreeBandEq::new();
        eq.set_gains(0.0, 0.0, -12.0);
        let ratio = gain_ratio(&mut eq, 15_000.0);
        assert!(ratio < 0.5, "expected >6 dB cut at 15 kHz, got ratio {}", ratio);
    }

    #[test]
    fn mid_boost_peaks_at_center() {
        let mut eq = ThreeBandEq::new();
        eq.set_gains(0.0, 12.0, 0.0);
        let ratio = gain_ratio(&mut eq, MID_FREQUENCY);
        assert!(ratio > 3.0, "expected ~12 dB at 1 kHz, got ratio {}", ratio);
    }

    #[test]
    fn gains_are_clamped() {
        let mut eq = ThreeBandEq::new();
        eq.set_gains(100.0, -100.0, f32::NAN);
        let bands = eq.bands();
        assert_eq!(bands[0].gain_db(), MAX_GAIN_DB);
        assert_eq!(bands[1].gain_db(), MIN_GAIN_DB);
        assert_eq!(bands[2].gain_db(), 0.0);
    }

    #[test]
    fn parameter_change_has_no_step() {
        let mut eq = ThreeBandEq::new();
        let mut buffer = generate_sine(80.0, SR, 0.05);
        eq.process(&mut buffer, SR);

        eq.set_gains(15.0, 0.0, 0.0);
        let mut next = generate_sine(80.0, SR, 0.05);
        let before = next.clone();
        eq.process(&mut next, SR);

        // First frame after the change is still essentially the dry signal
        assert!((next[0] - before[0]).abs() < 0.05);
        assert!(next.iter().all(|s| s.is_finite()));
    }
}
