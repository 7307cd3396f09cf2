//! Where the climate's ELA meets the ice surface.

use crate::geometry::Point;

/// Step of the fine scan (m).
pub const SURFACE_ELA_SEARCH_DX: f64 = 1.0;
/// Surface and ELA are considered equal within this distance (m).
pub const SURFACE_ELA_EQUALITY_THRESHOLD: f64 = 1.0;

/// Scan `[start_x, end_x]` for the first point where `surface(x)` is within
/// [`SURFACE_ELA_EQUALITY_THRESHOLD`] of `ela`.
///
/// If the scan steps past the ELA without landing inside the tolerance, the
/// closer of the current and previous samples wins. The caller must know
/// the bracket contains a crossing; `None` is only returned for a bracket
/// that does not.
pub fn find_surface_at_ela(
    ela: f64,
    start_x: f64,
    end_x: f64,
    surface: impl Fn(f64) -> f64,
) -> Option<Point> {
    debug_assert!(start_x <= end_x, "inverted search bracket [{start_x}, {end_x}]");
    if !(start_x <= end_x) {
        return None;
    }

    let steps = ((end_x - start_x) / SURFACE_ELA_SEARCH_DX).floor() as usize;
    let mut xs: Vec<f64> = (0..=steps)
        .map(|i| start_x + i as f64 * SURFACE_ELA_SEARCH_DX)
        .collect();
    // Always finish on the bracket end, where the caller saw the crossing.
    if xs.last().is_some_and(|&x| x < end_x) {
        xs.push(end_x);
    }

    let mut previous: Option<(Point, f64)> = None;
    for x in xs {
        let z = surface(x);
        let diff = z - ela;
        let current = Point::new(x, z);

        if diff.abs() <= SURFACE_ELA_EQUALITY_THRESHOLD {
            return Some(current);
        }
        if diff < -SURFACE_ELA_EQUALITY_THRESHOLD {
            // Overshot: keep whichever sample is closer.
            return Some(match previous {
                Some((p, prev_diff)) if prev_diff.abs() <= diff.abs() => p,
                _ => current,
            });
        }
        previous = Some((current, diff));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn finds_crossing_on_gentle_slope() {
        // surface = 3000 − 0.5·x; ELA 2980 crosses at x = 40.
        let p = find_surface_at_ela(2980.0, 0.0, 80.0, |x| 3000.0 - 0.5 * x).unwrap();
        assert!((p.y - 2980.0).abs() <= SURFACE_ELA_EQUALITY_THRESHOLD);
        // First sample inside the tolerance is x = 38 (surface 2981).
        assert_relative_eq!(p.x, 38.0);
    }

    #[test]
    fn first_sample_within_tolerance_is_returned() {
        let p = find_surface_at_ela(2999.5, 10.0, 90.0, |x| 3010.0 - x).unwrap();
        assert_relative_eq!(p.x, 10.0);
    }

    #[test]
    fn overshoot_picks_closer_sample() {
        // 5 m per step: samples at 2010 (x=0), 2005 (x=1), 2000 (x=2)...
        // ELA 2002.2: x=1 is +2.8 (outside), x=2 is −2.2 (overshoot, closer).
        let p = find_surface_at_ela(2002.2, 0.0, 10.0, |x| 2010.0 - 5.0 * x).unwrap();
        assert_relative_eq!(p.x, 2.0);
        assert_relative_eq!(p.y, 2000.0);

        // ELA 2002.8: x=1 is +2.2, x=2 is −2.8 → previous sample wins.
        let p = find_surface_at_ela(2002.8, 0.0, 10.0, |x| 2010.0 - 5.0 * x).unwrap();
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 2005.0);
    }

    #[test]
    fn overshoot_on_first_sample_uses_it() {
        let p = find_surface_at_ela(2100.0, 0.0, 10.0, |x| 2000.0 - x).unwrap();
        assert_relative_eq!(p.x, 0.0);
    }

    #[test]
    fn degenerate_bracket() {
        let p = find_surface_at_ela(1000.5, 5.0, 5.0, |_| 1000.0).unwrap();
        assert_eq!(p, Point::new(5.0, 1000.0));
    }

    #[test]
    fn fractional_bracket_end_is_sampled() {
        // Crossing only at the very end of a non-integer bracket.
        let p = find_surface_at_ela(0.0, 0.0, 2.5, |x| if x < 2.5 { 50.0 } else { 0.0 }).unwrap();
        assert_relative_eq!(p.x, 2.5);
    }
}
