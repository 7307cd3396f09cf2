/// Planar value types for the valley cross-section.
/// `x` is horizontal distance down-valley, `y` is elevation, both in metres.
use serde::{Deserialize, Serialize};

/// A position in the valley cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 2D vector, e.g. an ice velocity in metres/year.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a vector from a magnitude and a bearing in radians
    /// (0 points down-valley along +x, positive angles point upward).
    pub fn from_polar(magnitude: f64, angle: f64) -> Self {
        Self {
            x: magnitude * angle.cos(),
            y: magnitude * angle.sin(),
        }
    }

    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }
}
