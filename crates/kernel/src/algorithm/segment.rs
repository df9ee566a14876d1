use crate::geometry::Point;

use super::predicates::{is_collinear, is_on_segment};

/// Intersection of two closed segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    None,
    Point(Point),
    /// Collinear overlap, ordered along the first segment.
    Overlap(Point, Point),
}

impl SegmentIntersection {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// A non-parallel crossing with its parameters on each segment, both in
/// `[0, 1]` (up to epsilon).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    pub point: Point,
    pub s: f64,
    pub t: f64,
}

/// Intersect `p1 -> p2` with `p3 -> p4`, returning `None` when the segments
/// are parallel (collinear overlaps included) or do not meet.
pub fn crossing(p1: &Point, p2: &Point, p3: &Point, p4: &Point, epsilon: f64) -> Option<Crossing> {
    let u = *p2 - *p1;
    let v = *p4 - *p3;
    let w = *p1 - *p3;
    let denom = v.x * u.y - v.y * u.x;
    if denom.abs() <= epsilon * u.length() * v.length() || denom == 0.0 {
        return None;
    }
    let s = (v.y * w.x - v.x * w.y) / denom;
    if s < -epsilon || s > 1.0 + epsilon {
        return None;
    }
    let t = (u.y * w.x - u.x * w.y) / denom;
    if t < -epsilon || t > 1.0 + epsilon {
        return None;
    }
    Some(Crossing {
        point: p1.lerp(p2, s).to_2d(),
        s: s.clamp(0.0, 1.0),
        t: t.clamp(0.0, 1.0),
    })
}

/// Full intersection of two closed segments, including collinear overlap.
pub fn intersect_segments(
    p1: &Point,
    p2: &Point,
    p3: &Point,
    p4: &Point,
    epsilon: f64,
) -> SegmentIntersection {
    if p1.equals_2d(p2, epsilon) {
        return if is_on_segment(p1, p3, p4, epsilon) {
            SegmentIntersection::Point(p1.to_2d())
        } else {
            SegmentIntersection::None
        };
    }
    if p3.equals_2d(p4, epsilon) {
        return if is_on_segment(p3, p1, p2, epsilon) {
            SegmentIntersection::Point(p3.to_2d())
        } else {
            SegmentIntersection::None
        };
    }
    if let Some(c) = crossing(p1, p2, p3, p4, epsilon) {
        return SegmentIntersection::Point(c.point);
    }
    collinear_overlap(p1, p2, p3, p4, epsilon)
}

pub fn segments_intersect(p1: &Point, p2: &Point, p3: &Point, p4: &Point, epsilon: f64) -> bool {
    !intersect_segments(p1, p2, p3, p4, epsilon).is_none()
}

fn collinear_overlap(
    p1: &Point,
    p2: &Point,
    p3: &Point,
    p4: &Point,
    epsilon: f64,
) -> SegmentIntersection {
    if !is_collinear(p1, p2, p3, epsilon) || !is_collinear(p1, p2, p4, epsilon) {
        return SegmentIntersection::None;
    }
    let u = *p2 - *p1;
    let len2 = u.length_squared();
    let param = |p: &Point| (*p - *p1).dot(&u) / len2;
    let (t3, t4) = (param(p3), param(p4));
    let lo = t3.min(t4).max(0.0);
    let hi = t3.max(t4).min(1.0);
    let len = len2.sqrt();
    if (hi - lo) * len < -epsilon {
        return SegmentIntersection::None;
    }
    let a = p1.lerp(p2, lo).to_2d();
    if (hi - lo) * len <= epsilon {
        return SegmentIntersection::Point(a);
    }
    SegmentIntersection::Overlap(a, p1.lerp(p2, hi).to_2d())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-7;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_proper_crossing() {
        let r = intersect_segments(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, -1.0), &p(1.0, 1.0), EPS);
        assert_eq!(r, SegmentIntersection::Point(p(1.0, 0.0)));
        let c = crossing(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, -1.0), &p(1.0, 1.0), EPS).unwrap();
        assert!((c.s - 0.5).abs() < 1e-12);
        assert!((c.t - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_and_touching() {
        assert!(!segments_intersect(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, -1.0), &p(2.0, 1.0), EPS));
        let r = intersect_segments(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 0.0), &p(1.0, 5.0), EPS);
        assert_eq!(r, SegmentIntersection::Point(p(1.0, 0.0)));
    }

    #[test]
    fn test_collinear_overlap() {
        let r = intersect_segments(&p(0.0, 0.0), &p(4.0, 0.0), &p(6.0, 0.0), &p(2.0, 0.0), EPS);
        assert_eq!(r, SegmentIntersection::Overlap(p(2.0, 0.0), p(4.0, 0.0)));
        let end_to_end = intersect_segments(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0), EPS);
        assert_eq!(end_to_end, SegmentIntersection::Point(p(1.0, 0.0)));
        let apart = intersect_segments(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0), &p(3.0, 0.0), EPS);
        assert!(apart.is_none());
    }

    #[test]
    fn test_parallel_offset_lines() {
        assert!(!segments_intersect(&p(0.0, 0.0), &p(4.0, 0.0), &p(0.0, 1.0), &p(4.0, 1.0), EPS));
    }

    #[test]
    fn test_degenerate_segment_on_other() {
        let r = intersect_segments(&p(1.0, 0.0), &p(1.0, 0.0), &p(0.0, 0.0), &p(2.0, 0.0), EPS);
        assert_eq!(r, SegmentIntersection::Point(p(1.0, 0.0)));
    }
}
