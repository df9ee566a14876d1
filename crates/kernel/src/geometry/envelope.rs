use serde::{Deserialize, Serialize};

use super::line_string::LineString;
use super::point::Point;

/// Axis-aligned bounding box. Z and M ranges are tracked only when some
/// contributing point carries them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min: Point,
    pub max: Point,
}

fn extend(lo: &mut Option<f64>, hi: &mut Option<f64>, value: Option<f64>) {
    if let Some(v) = value {
        *lo = Some(lo.map_or(v, |l| l.min(v)));
        *hi = Some(hi.map_or(v, |h| h.max(v)));
    }
}

impl Envelope {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    pub fn of_point(p: &Point) -> Self {
        Self { min: *p, max: *p }
    }

    /// Envelope of a segment, 2D only.
    pub fn of_segment(a: &Point, b: &Point) -> Self {
        Self {
            min: Point::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut env = Self::of_point(iter.next()?);
        for p in iter {
            env.expand_to_include(p);
        }
        Some(env)
    }

    pub fn expand_to_include(&mut self, p: &Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        extend(&mut self.min.z, &mut self.max.z, p.z);
        extend(&mut self.min.m, &mut self.max.m, p.m);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut env = *self;
        env.expand_to_include(&other.min);
        env.expand_to_include(&other.max);
        env
    }

    /// Planar overlap test with the boxes grown by `epsilon`.
    pub fn intersects(&self, other: &Self, epsilon: f64) -> bool {
        self.min.x <= other.max.x + epsilon
            && self.max.x >= other.min.x - epsilon
            && self.min.y <= other.max.y + epsilon
            && self.max.y >= other.min.y - epsilon
    }

    /// Like [`Envelope::intersects`], also checking Z when both carry it.
    pub fn intersects_3d(&self, other: &Self, epsilon: f64) -> bool {
        if !self.intersects(other, epsilon) {
            return false;
        }
        match (self.min.z, self.max.z, other.min.z, other.max.z) {
            (Some(a0), Some(a1), Some(b0), Some(b1)) => a0 <= b1 + epsilon && a1 >= b0 - epsilon,
            _ => true,
        }
    }

    pub fn contains_point(&self, p: &Point, epsilon: f64) -> bool {
        p.x >= self.min.x - epsilon
            && p.x <= self.max.x + epsilon
            && p.y >= self.min.y - epsilon
            && p.y <= self.max.y + epsilon
    }

    /// True when `other` lies inside this box.
    pub fn covers(&self, other: &Self, epsilon: f64) -> bool {
        self.contains_point(&other.min, epsilon) && self.contains_point(&other.max, epsilon)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
        )
    }

    pub fn expanded(&self, margin: f64) -> Self {
        let mut env = *self;
        env.min.x -= margin;
        env.min.y -= margin;
        env.max.x += margin;
        env.max.y += margin;
        env
    }

    /// The two-point (min corner, max corner) line used by `envelope()`.
    pub fn to_line_string(&self) -> LineString {
        LineString::new(vec![self.min, self.max])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let pts = [Point::new(1.0, 5.0), Point::new(-2.0, 3.0), Point::new(4.0, -1.0)];
        let env = Envelope::from_points(&pts).unwrap();
        assert_eq!(env.min, Point::new(-2.0, -1.0));
        assert_eq!(env.max, Point::new(4.0, 5.0));
        assert!(Envelope::from_points(&[]).is_none());
    }

    #[test]
    fn test_tracks_z_only_when_present() {
        let pts = [Point::new(0.0, 0.0), Point::new_z(1.0, 1.0, 5.0), Point::new_z(2.0, 2.0, -1.0)];
        let env = Envelope::from_points(&pts).unwrap();
        assert_eq!(env.min.z, Some(-1.0));
        assert_eq!(env.max.z, Some(5.0));
        assert_eq!(env.min.m, None);
    }

    #[test]
    fn test_intersects_with_epsilon() {
        let a = Envelope::new(Point::new(0.0, 0.0), Point::new(1.0, 1.0));
        let b = Envelope::new(Point::new(1.0 + 1e-9, 0.0), Point::new(2.0, 1.0));
        let c = Envelope::new(Point::new(1.5, 0.0), Point::new(2.0, 1.0));
        assert!(a.intersects(&b, 1e-7));
        assert!(!a.intersects(&c, 1e-7));
    }

    #[test]
    fn test_intersects_3d() {
        let a = Envelope::new(Point::new_z(0.0, 0.0, 0.0), Point::new_z(1.0, 1.0, 1.0));
        let b = Envelope::new(Point::new_z(0.0, 0.0, 2.0), Point::new_z(1.0, 1.0, 3.0));
        assert!(a.intersects(&b, 1e-7));
        assert!(!a.intersects_3d(&b, 1e-7));
    }
}
