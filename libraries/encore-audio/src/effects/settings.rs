//! User-facing effect parameters

use serde::{Deserialize, Serialize};

/// Lowest gain accepted by the EQ bands and master gain (dB)
pub const MIN_GAIN_DB: f32 = -15.0;

/// Highest gain accepted by the EQ bands and master gain (dB)
pub const MAX_GAIN_DB: f32 = 15.0;

/// Parameters of the effects chain
///
/// Owned by the chain, not by the track: they survive every source swap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Low shelf gain in dB
    pub bass_gain_db: f32,
    /// Mid peak gain in dB
    pub mid_gain_db: f32,
    /// High shelf gain in dB
    pub treble_gain_db: f32,
    /// Reverb wet/dry mix (0 = dry, 1 = fully wet)
    pub reverb_wet: f32,
    /// Post-compressor trim in dB
    pub master_gain_db: f32,
}

impl EffectSettings {
    /// Flat EQ, dry reverb, unity master gain
    pub const NEUTRAL: Self = Self {
        bass_gain_db: 0.0,
        mid_gain_db: 0.0,
        treble_gain_db: 0.0,
        reverb_wet: 0.0,
        master_gain_db: 0.0,
    };

    /// Return a copy with every field clamped to its documented range
    ///
    /// NaN inputs collapse to the neutral value of the field.
    pub fn clamped(self) -> Self {
        Self {
            bass_gain_db: clamp_gain(self.bass_gain_db),
            mid_gain_db: clamp_gain(self.mid_gain_db),
            treble_gain_db: clamp_gain(self.treble_gain_db),
            reverb_wet: clamp_unit(self.reverb_wet),
            master_gain_db: clamp_gain(self.master_gain_db),
        }
    }

    /// Replace the three EQ gains
    pub fn with_eq(self, bass_db: f32, mid_db: f32, treble_db: f32) -> Self {
        Self {
            bass_gain_db: bass_db,
            mid_gain_db: mid_db,
            treble_gain_db: treble_db,
            ..self
        }
        .clamped()
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

fn clamp_gain(db: f32) -> f32 {
    if db.is_nan() {
        0.0
    } else {
        db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        let settings = EffectSettings {
            bass_gain_db: 40.0,
            mid_gain_db: -40.0,
            treble_gain_db: f32::NAN,
            reverb_wet: 1.5,
            master_gain_db: 3.0,
        }
        .clamped();

        assert_eq!(settings.bass_gain_db, MAX_GAIN_DB);
        assert_eq!(settings.mid_gain_db, MIN_GAIN_DB);
        assert_eq!(settings.treble_gain_db, 0.0);
        assert_eq!(settings.reverb_wet, 1.0);
        assert_eq!(settings.master_gain_db, 3.0);
    }

    #[test]
    fn with_eq_keeps_other_fields() {
        let base = EffectSettings {
            reverb_wet: 0.3,
            ..EffectSettings::default()
        };
        let updated = base.with_eq(2.0, -3.0, 20.0);
        assert_eq!(updated.reverb_wet, 0.3);
        assert_eq!(updated.treble_gain_db, MAX_GAIN_DB);
    }
}
