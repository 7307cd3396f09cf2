//! Ice thickness profile.
//!
//! The profile is a closed-form function of the quasi-ELA: an ellipse with a
//! power-law taper on the headwall side and a plain half-ellipse on the
//! terminus side. The constants are empirical fits to published glacier
//! data and are kept as-is.

/// Spacing of the profile samples used for averages and the ELA search (m).
pub const DX: f64 = 80.0;
/// qelax / glacier length.
pub const ELAX_TERMINUS: f64 = 0.6;
/// qelax intercept (m).
pub const ELAX_B0: f64 = 138_248.0;
/// max thickness = MAX_THICKNESS_SCALE · √qelax.
pub const MAX_THICKNESS_SCALE: f64 = 2.3;

const ELAX_M0_NUMERATOR: f64 = -55_630.0;
const ELAX_M0_BASE_ELEVATION: f64 = 2700.0;
/// Shape exponent p = max(P_INTERCEPT − P_SLOPE · quasi_ela, P_MIN).
const P_INTERCEPT: f64 = 42.0;
const P_SLOPE: f64 = 0.01;
const P_MIN: f64 = 1.5;
/// Upstream ellipse radius as a multiple of the peak position.
const UPSTREAM_RADIUS_SCALE: f64 = 1.5;

/// Slope of qelax against quasi-ELA for a valley whose headwall tops out
/// at `max_elevation`. Negative for any valley higher than 2700 m.
pub fn elax_m0(max_elevation: f64) -> f64 {
    ELAX_M0_NUMERATOR / (max_elevation - ELAX_M0_BASE_ELEVATION)
}

/// Distance from the headwall at which the quasi-ELA meets the bare valley,
/// clamped at zero.
pub fn qelax(elax_m0: f64, quasi_ela: f64) -> f64 {
    (ELAX_B0 + elax_m0 * quasi_ela).max(0.0)
}

/// Everything the thickness formula depends on, frozen after a
/// recomputation so it can be evaluated without touching the glacier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IceShape {
    pub headwall_x: f64,
    pub terminus_x: f64,
    pub glacier_length: f64,
    pub max_thickness: f64,
    pub quasi_ela: f64,
}

impl IceShape {
    /// Midpoint of the ice mass.
    pub fn peak_x(&self) -> f64 {
        self.headwall_x + 0.5 * self.glacier_length
    }

    /// Ice thickness at `x` (m); zero outside (headwall, terminus).
    pub fn thickness(&self, x: f64) -> f64 {
        if x <= self.headwall_x || x >= self.terminus_x {
            return 0.0;
        }

        let x_peak = self.peak_x();
        let d = x - x_peak;
        let thickness = if x < x_peak {
            let p = (P_INTERCEPT - P_SLOPE * self.quasi_ela).max(P_MIN);
            let r = UPSTREAM_RADIUS_SCALE * x_peak;
            let x_peak_pow = x_peak.powf(p);
            (r * r - d * d).sqrt() * (self.max_thickness / r) * (x_peak_pow - d.abs().powf(p))
                / x_peak_pow
        } else {
            (x_peak * x_peak - d * d).sqrt() * (self.max_thickness / x_peak)
        };

        // f64::max drops the NaN a rounding-negative sqrt would produce.
        thickness.max(0.0)
    }
}
