//! Relaxation of the quasi-ELA toward the climate's ELA.

use super::thickness::ELAX_TERMINUS;

pub const MIN_TIMESCALE: f64 = 50.0;
pub const MAX_TIMESCALE: f64 = 300.0;

/// Relaxation timescale (years); receding and advancing glaciers respond
/// at different rates.
pub fn relaxation_timescale(ela: f64, quasi_ela: f64) -> f64 {
    let timescale = if ela > quasi_ela {
        -0.22 * ela + 1026.0
    } else {
        0.35 * ela - 1139.0
    };
    timescale.clamp(MIN_TIMESCALE, MAX_TIMESCALE)
}

/// Fastest rate (m/yr of quasi-ELA) at which an advancing glacier may move.
///
/// Only meaningful while `quasi_ela` is at or below the headwall; above it
/// the sign flips and the state would run away upward.
pub fn advance_limit(quasi_ela: f64, elax_m0: f64) -> f64 {
    (-0.06 * quasi_ela + 300.0) * ELAX_TERMINUS / elax_m0
}

/// Change of quasi-ELA over `dt` years.
pub fn relaxation_delta(ela: f64, quasi_ela: f64, dt: f64, elax_m0: f64) -> f64 {
    let timescale = relaxation_timescale(ela, quasi_ela);
    let delta = (ela - quasi_ela) * (1.0 - (-dt / timescale).exp());
    if ela < quasi_ela {
        delta.max(dt * advance_limit(quasi_ela, elax_m0))
    } else {
        delta
    }
}
