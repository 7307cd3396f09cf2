//! Valley floor profile: the terrain a glacier forms in.

use serde::{Deserialize, Serialize};

use crate::error::GlacierError;
use crate::geometry::Point;

/// Read-only terrain queries used by the glacier engine.
pub trait Terrain {
    /// Elevation of the valley floor at down-valley distance `x` (metres).
    fn elevation(&self, x: f64) -> f64;

    /// Bearing (radians) of the floor segment from `x0` to `x1`.
    /// Negative when the floor drops between the two positions.
    fn direction(&self, x0: f64, x1: f64) -> f64 {
        (self.elevation(x1) - self.elevation(x0)).atan2(x1 - x0)
    }

    /// Highest elevation along the valley, i.e. the top of the headwall.
    fn max_elevation(&self) -> f64;

    /// Upstream origin of the valley.
    fn headwall_position(&self) -> Point;
}

/// Piecewise-linear valley floor through `(x, elevation)` control points.
///
/// Control points are sorted by strictly increasing `x`; the first one is
/// the headwall, sits at `x = 0` and must also be the highest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Valley {
    points: Vec<Point>,
    max_elevation: f64,
}

/// Below this headwall elevation the engine's qelax slope degenerates.
pub const MIN_HEADWALL_ELEVATION: f64 = 2700.0;

impl Valley {
    pub fn new(points: Vec<Point>) -> Result<Self, GlacierError> {
        if points.len() < 2 {
            return Err(GlacierError::InvalidValley(format!(
                "need at least 2 control points, got {}",
                points.len()
            )));
        }
        if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GlacierError::InvalidValley(format!(
                "non-finite control point ({}, {})",
                p.x, p.y
            )));
        }
        if points[0].x != 0.0 {
            return Err(GlacierError::InvalidValley(format!(
                "headwall must sit at x = 0, got x = {}",
                points[0].x
            )));
        }
        if let Some(w) = points.windows(2).find(|w| w[1].x <= w[0].x) {
            return Err(GlacierError::InvalidValley(format!(
                "x must be strictly increasing ({} then {})",
                w[0].x, w[1].x
            )));
        }

        let max_elevation = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        if points[0].y < max_elevation {
            return Err(GlacierError::InvalidValley(format!(
                "headwall ({}) is lower than the valley maximum ({max_elevation})",
                points[0].y
            )));
        }
        if max_elevation <= MIN_HEADWALL_ELEVATION {
            return Err(GlacierError::InvalidValley(format!(
                "headwall elevation {max_elevation} must exceed {MIN_HEADWALL_ELEVATION}"
            )));
        }

        Ok(Self { points, max_elevation })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Down-valley extent of the control points.
    pub fn length(&self) -> f64 {
        self.points[self.points.len() - 1].x - self.points[0].x
    }
}

impl Default for Valley {
    /// Alpine valley with its headwall at (0, 4000).
    fn default() -> Self {
        let points = [
            (0.0, 4000.0),
            (1500.0, 3550.0),
            (4000.0, 3150.0),
            (8000.0, 2850.0),
            (14000.0, 2600.0),
            (22000.0, 2350.0),
            (32000.0, 2100.0),
            (45000.0, 1850.0),
            (60000.0, 1600.0),
            (80000.0, 1400.0),
        ];
        Self {
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            max_elevation: 4000.0,
        }
    }
}

impl Terrain for Valley {
    fn elevation(&self, x: f64) -> f64 {
        let pts = &self.points;
        let first = pts[0];
        if x <= first.x {
            return first.y;
        }

        // Index of the first control point strictly past x.
        let i = pts.partition_point(|p| p.x <= x);
        let (a, b) = if i < pts.len() {
            (pts[i - 1], pts[i])
        } else {
            (pts[pts.len() - 2], pts[pts.len() - 1])
        };
        let t = (x - a.x) / (b.x - a.x);
        (a.y + t * (b.y - a.y)).max(0.0)
    }

    fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    fn headwall_position(&self) -> Point {
        self.points[0]
    }
}

impl TryFrom<Vec<Point>> for Valley {
    type Error = GlacierError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Valley> for Vec<Point> {
    fn from(v: Valley) -> Self {
        v.points
    }
}
