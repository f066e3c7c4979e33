//! Synthetic confidence score for display.
//!
//! The score is derived only from the user's temperature setting:
//! `max(FLOOR, 1 - temperature * DECAY)`. It is illustrative and says nothing
//! about the quality of a particular translation; engines expose no confidence.

/// Lowest score ever reported.
pub const FLOOR: f32 = 0.55;

/// How fast the score drops as temperature rises.
pub const DECAY: f32 = 0.4;

/// Score for a temperature, clamped to `[FLOOR, 1.0]` and rounded to three decimals.
///
/// Temperatures outside `[0.0, 1.0]` (and NaN) are clamped first.
pub fn estimate(temperature: f32) -> f32 {
    let temperature = if temperature.is_nan() {
        0.0
    } else {
        temperature.clamp(0.0, 1.0)
    };
    let score = (1.0 - temperature * DECAY).max(FLOOR).min(1.0);
    (score * 1000.0).round() / 1000.0
}
