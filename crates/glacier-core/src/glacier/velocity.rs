//! Ice speed inside the glacier.
//!
//! Basal sliding plus a vertically varying deformation term: zero at the
//! bed, largest at the surface, scaled by the local thickness squared over
//! the glacier-wide mean of squared thickness.

/// Down-valley sliding speed (m/yr).
pub const U_SLIDE: f64 = 20.0;
/// Vertically averaged deformation speed for an average-thickness column (m/yr).
pub const U_DEFORM: f64 = 20.0;

/// Vertically averaged deformation speed for a column of `thickness`.
pub fn deformation_speed(thickness: f64, average_ice_thickness_squares: f64) -> f64 {
    if average_ice_thickness_squares <= 0.0 {
        return 0.0;
    }
    thickness * thickness * U_DEFORM / average_ice_thickness_squares
}

/// Ice speed (m/yr) at `elevation` in a column of `thickness` resting on a
/// floor at `floor_elevation`. Zero outside the ice.
pub fn ice_speed(
    thickness: f64,
    floor_elevation: f64,
    elevation: f64,
    average_ice_thickness_squares: f64,
) -> f64 {
    if thickness <= 0.0 {
        return 0.0;
    }
    let surface_elevation = floor_elevation + thickness;
    if elevation < floor_elevation || elevation > surface_elevation {
        return 0.0;
    }

    // 0 at the rock-ice interface, 1 at the ice surface.
    let zz = (elevation - floor_elevation) / thickness;
    let u_deform_avg = deformation_speed(thickness, average_ice_thickness_squares);
    let profile = zz - 1.5 * zz.powi(2) + zz.powi(3) - 0.25 * zz.powi(4);
    U_SLIDE + u_deform_avg * 5.0 * profile
}
