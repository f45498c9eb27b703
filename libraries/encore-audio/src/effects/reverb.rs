/// Schroeder reverb
///
/// Four damped feedback combs in parallel followed by two allpass diffusers,
/// one network per channel. The right channel's delays are offset slightly so
/// the tail decorrelates into a stereo image.
use super::chain::AudioEffect;

/// Comb delays in samples at 44.1 kHz
const COMB_TUNING: [usize; 4] = [1116, 1188, 1277, 1356];

/// Allpass delays in samples at 44.1 kHz
const ALLPASS_TUNING: [usize; 2] = [556, 441];

/// Right channel delay offset at 44.1 kHz
const STEREO_SPREAD: usize = 23;

const ALLPASS_FEEDBACK: f32 = 0.5;

/// Input attenuation before the comb bank
const INPUT_GAIN: f32 = 0.05;

/// Per-sample smoothing of the wet mix
const WET_SMOOTH: f32 = 0.001;

/// Reverb settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReverbSettings {
    /// Comb feedback (0.0 to 0.98); larger is a longer tail
    pub room_size: f32,
    /// High-frequency loss inside the combs (0.0 to 1.0)
    pub damping: f32,
    /// Wet/dry mix (0.0 = dry, 1.0 = fully wet)
    pub wet: f32,
}

impl ReverbSettings {
    pub fn validated(self) -> Self {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            room_size: unit(self.room_size).min(0.98),
            damping: unit(self.damping),
            wet: unit(self.wet),
        }
    }
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self {
            room_size: 0.84,
            damping: 0.2,
            wet: 0.0,
        }
    }
}

/// Circular delay buffer
#[derive(Debug, Clone)]
struct DelayLine {
    buffer: Vec<f32>,
    index: usize,
}

impl DelayLine {
    fn new(length: usize) -> Self {
        Self {
            buffer: vec![0.0; length.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn read(&self) -> f32 {
        self.buffer[self.index]
    }

    #[inline]
    fn write_and_advance(&mut self, value: f32) {
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % self.buffer.len();
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// Feedback comb with a one-pole lowpass in the loop
#[derive(Debug, Clone)]
struct CombFilter {
    delay: DelayLine,
    store: f32,
}

impl CombFilter {
    #[inline]
    fn tick(&mut self, input: f32, feedback: f32, damping: f32) -> f32 {
        let output = self.delay.read();
        self.store = output * (1.0 - damping) + self.store * damping;
        if self.store.abs() < 1e-15 {
            self.store = 0.0;
        }
        self.delay.write_and_advance(input + self.store * feedback);
        output
    }
}

#[derive(Debug, Clone)]
struct AllpassFilter {
    delay: DelayLine,
}

impl AllpassFilter {
    #[inline]
    fn tick(&mut self, input: f32) -> f32 {
        let delayed = self.delay.read();
        self.delay.write_and_advance(input + delayed * ALLPASS_FEEDBACK);
        delayed - input
    }
}

/// One channel's comb bank and diffusers
#[derive(Debug, Clone)]
struct Network {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl Network {
    fn new(sample_rate: u32, offset: usize) -> Self {
        let scale = |samples: usize| {
            ((samples + offset) as f64 * f64::from(sample_rate) / 44_100.0).round() as usize
        };
        Self {
            combs: COMB_TUNING
                .iter()
                .map(|&n| CombFilter {
                    delay: DelayLine::new(scale(n)),
                    store: 0.0,
                })
                .collect(),
            allpasses: ALLPASS_TUNING
                .iter()
                .map(|&n| AllpassFilter {
                    delay: DelayLine::new(scale(n)),
                })
                .collect(),
        }
    }

    #[inline]
    fn tick(&mut self, input: f32, feedback: f32, damping: f32) -> f32 {
        let scaled = input * INPUT_GAIN;
        let mut out: f32 = self
            .combs
            .iter_mut()
            .map(|comb| comb.tick(scaled, feedback, damping))
            .sum();
        for allpass in &mut self.allpasses {
            out = allpass.tick(out);
        }
        out
    }

    fn clear(&mut self) {
        for comb in &mut self.combs {
            comb.delay.clear();
            comb.store = 0.0;
        }
        for allpass in &mut self.allpasses {
            allpass.delay.clear();
        }
    }
}

/// Stereo Schroeder reverb with a smoothed wet mix
pub struct Reverb {
    settings: ReverbSettings,
    wet: f32,
    left: Network,
    right: Network,
    sample_rate: u32,
    enabled: bool,
}

impl Reverb {
    /// Allocate delay lines for `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self::with_settings(sample_rate, ReverbSettings::default())
    }

    pub fn with_settings(sample_rate: u32, settings: ReverbSettings) -> Self {
        let settings = settings.validated();
        Self {
            settings,
            wet: settings.wet,
            left: Network::new(sample_rate, 0),
            right: Network::new(sample_rate, STEREO_SPREAD),
            sample_rate,
            enabled: true,
        }
    }

    pub fn settings(&self) -> ReverbSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: ReverbSettings) {
        self.settings = settings.validated();
    }

    /// Set the wet/dry mix; ramps in over a few milliseconds
    pub fn set_wet(&mut self, wet: f32) {
        self.set_settings(ReverbSettings { wet, ..self.settings });
    }
}

impl AudioEffect for Reverb {
    fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        if !self.enabled {
            return;
        }

        // Delay lengths are tied to the rate; rebuild (allocates) only on a rate change
        if sample_rate != self.sample_rate {
            self.left = Network::new(sample_rate, 0);
            self.right = Network::new(sample_rate, STEREO_SPREAD);
            self.sample_rate = sample_rate;
        }

        let target = self.settings.wet;
        if target == 0.0 && self.wet == 0.0 {
            return;
        }

        let feedback = self.settings.room_size;
        let damping = self.settings.damping;

        for frame in buffer.chunks_exact_mut(2) {
            self.wet += WET_SMOOTH * (target - self.wet);
            if (self.wet - target).abs() < 1e-6 {
                self.wet = target;
            }

            let (dry_l, dry_r) = (frame[0], frame[1]);
            let mono = (dry_l + dry_r) * 0.5;
            let wet_l = self.left.tick(mono, feedback, damping);
            let wet_r = self.right.tick(mono, feedback, damping);

            frame[0] = dry_l * (1.0 - self.wet) + wet_l * self.wet;
            frame[1] = dry_r * (1.0 - self.wet) + wet_r * self.wet;
        }
    }

    fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.wet = self.settings.wet;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn name(&self) -> &str {
        "Reverb"
    }
}
