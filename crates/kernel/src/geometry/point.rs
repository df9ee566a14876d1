use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

use super::vector::Vec2;

/// A coordinate with optional Z and M ordinates.
///
/// Presence of Z/M is carried by the `Option`, never inferred from a zero
/// value: `POINT Z (1 2 0)` and `POINT (1 2)` are different points.
///
/// A point whose X and Y are both NaN is the empty point, the same
/// encoding WKB uses for `POINT EMPTY`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub m: Option<f64>,
}

impl Point {
    pub const ORIGIN: Self = Self {
        x: 0.0,
        y: 0.0,
        z: None,
        m: None,
    };

    pub const EMPTY: Self = Self {
        x: f64::NAN,
        y: f64::NAN,
        z: None,
        m: None,
    };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None, m: None }
    }

    pub fn new_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z), m: None }
    }

    pub fn new_m(x: f64, y: f64, m: f64) -> Self {
        Self { x, y, z: None, m: Some(m) }
    }

    pub fn new_zm(x: f64, y: f64, z: f64, m: f64) -> Self {
        Self {
            x,
            y,
            z: Some(z),
            m: Some(m),
        }
    }

    /// True for [`Point::EMPTY`] and any point with NaN X and Y.
    pub fn is_empty_point(&self) -> bool {
        self.x.is_nan() && self.y.is_nan()
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    pub fn has_m(&self) -> bool {
        self.m.is_some()
    }

    /// Drop Z and M.
    pub fn to_2d(&self) -> Self {
        Self::new(self.x, self.y)
    }

    /// Planar equality within `epsilon`. Z and M are ignored.
    pub fn equals_2d(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon && (self.y - other.y).abs() < epsilon
    }

    /// Spatial equality within `epsilon`.
    ///
    /// Both points must agree on Z presence; M is ignored.
    pub fn equals_3d(&self, other: &Self, epsilon: f64) -> bool {
        if !self.equals_2d(other, epsilon) {
            return false;
        }
        match (self.z, other.z) {
            (Some(a), Some(b)) => (a - b).abs() < epsilon,
            (None, None) => true,
            _ => false,
        }
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn distance_squared_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Distance including Z, with a missing Z read as zero.
    pub fn distance_3d_to(&self, other: &Self) -> f64 {
        let dz = self.z.unwrap_or(0.0) - other.z.unwrap_or(0.0);
        (self.distance_squared_to(other) + dz * dz).sqrt()
    }

    pub fn midpoint(&self, other: &Self) -> Self {
        self.lerp(other, 0.5)
    }

    /// Linear interpolation. Z and M are interpolated only when both
    /// endpoints carry them.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        let mix = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => Some(a + t * (b - a)),
            _ => None,
        };
        Self {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
            z: mix(self.z, other.z),
            m: mix(self.m, other.m),
        }
    }

    pub fn to_vec2(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_none_or(f64::is_finite)
            && self.m.is_none_or(f64::is_finite)
    }
}

/// Exact ordinate comparison, except that NaN matches NaN so the empty
/// point equals itself.
impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        let same_opt = |a: Option<f64>, b: Option<f64>| match (a, b) {
            (Some(a), Some(b)) => same(a, b),
            (None, None) => true,
            _ => false,
        };
        same(self.x, other.x)
            && same(self.y, other.y)
            && same_opt(self.z, other.z)
            && same_opt(self.m, other.m)
    }
}

impl Default for Point {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl Add<Vec2> for Point {
    type Output = Point;
    fn add(self, rhs: Vec2) -> Self::Output {
        Point {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            ..self
        }
    }
}

impl Sub for Point {
    type Output = Vec2;
    fn sub(self, rhs: Self) -> Self::Output {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Sub<Vec2> for Point {
    type Output = Point;
    fn sub(self, rhs: Vec2) -> Self::Output {
        Point {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            ..self
        }
    }
}
