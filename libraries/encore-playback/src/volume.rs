//! Volume curve
//!
//! The slider value is stored in [0, 1] and mapped onto -60 dB..0 dB so equal
//! slider steps sound like equal loudness steps. 0 is true silence.

/// Range covered by the slider (dB)
const RANGE_DB: f32 = 60.0;

/// Clamp a slider value into [0, 1]; NaN becomes silence
pub fn clamp_level(level: f32) -> f32 {
    if level.is_nan() {
        0.0
    } else {
        level.clamp(0.0, 1.0)
    }
}

/// Convert a slider value to linear gain
///
/// Formula: gain = 10^((level - 1) * 60 / 20)
/// - 0.0 → silence
/// - 0.5 → -30 dB → 0.0316
/// - 0.8 → -12 dB → 0.251
/// - 1.0 →   0 dB → 1.0
pub fn linear_gain(level: f32) -> f32 {
    let level = clamp_level(level);
    if level == 0.0 {
        return 0.0;
    }
    let db = (level - 1.0) * RANGE_DB;
    10.0_f32.powf(db / 20.0)
}

/// Gain actually sent to the output: 0 when muted, slider level preserved
pub fn output_gain(level: f32, muted: bool) -> f32 {
    if muted {
        0.0
    } else {
        linear_gain(level)
    }
}

/// Slider value in dB, floored at -60
pub fn to_db(level: f32) -> f32 {
    (clamp_level(level) - 1.0) * RANGE_DB
}
