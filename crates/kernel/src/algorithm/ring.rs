//! Ring measures, orientation and ray-crossing point location.

use crate::geometry::{Point, Polygon, SimpleFeature};
use crate::relate::Location;

/// Orientation of a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Clockwise,
    CounterClockwise,
    /// Area within epsilon of zero.
    Degenerate,
}

/// Signed area, positive for counter-clockwise rings. The ring may be given
/// open or closed.
pub fn signed_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        sum += (a.x + b.x) * (b.y - a.y);
    }
    0.5 * sum
}

/// Area centroid of a ring; falls back to the vertex average for a ring
/// without area.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len();
    // Relative to the first vertex, so far-off rings keep their precision.
    let o = points[0];
    let (mut cx, mut cy, mut twice_area) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let a = points[i] - o;
        let b = points[(i + 1) % n] - o;
        let cross = a.x * b.y - b.x * a.y;
        twice_area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    if twice_area.abs() < f64::EPSILON {
        let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Some(Point::new(sx / n as f64, sy / n as f64));
    }
    Some(Point::new(
        o.x + cx / (3.0 * twice_area),
        o.y + cy / (3.0 * twice_area),
    ))
}

pub fn orientation(points: &[Point], epsilon: f64) -> Orientation {
    let area = signed_area(points);
    if area > epsilon {
        Orientation::CounterClockwise
    } else if area < -epsilon {
        Orientation::Clockwise
    } else {
        Orientation::Degenerate
    }
}

pub fn is_ccw(points: &[Point], epsilon: f64) -> bool {
    orientation(points, epsilon) == Orientation::CounterClockwise
}

/// Reverse rings as needed so the exterior is counter-clockwise and every
/// hole clockwise.
pub fn correct_polygon(polygon: &mut Polygon, epsilon: f64) {
    for (i, ring) in polygon.rings_mut().iter_mut().enumerate() {
        let wanted = if i == 0 {
            Orientation::CounterClockwise
        } else {
            Orientation::Clockwise
        };
        let actual = orientation(ring.points(), epsilon);
        if actual != wanted && actual != Orientation::Degenerate {
            ring.reverse();
        }
    }
}

/// Exterior counter-clockwise and every hole clockwise.
pub fn is_polygon_consistent(polygon: &Polygon, epsilon: f64) -> bool {
    polygon.rings().iter().enumerate().all(|(i, ring)| {
        let o = orientation(ring.points(), epsilon);
        if i == 0 {
            o == Orientation::CounterClockwise
        } else {
            o == Orientation::Clockwise
        }
    })
}

// ─── Ray crossing ────────────────────────────────────────────────────────────

/// Crossing counters for a horizontal ray from a test point.
///
/// Crossings to the right and to the left of the point are counted
/// separately, each against its own half-open straddle rule. A point on an
/// edge makes the two parities differ, which is how boundary is detected
/// even for horizontal edges the straddle rules skip.
#[derive(Debug, Clone, Copy)]
pub struct RayCrossings {
    point: Point,
    epsilon: f64,
    right: usize,
    left: usize,
    on_boundary: bool,
}

impl RayCrossings {
    pub fn new(point: Point, epsilon: f64) -> Self {
        Self {
            point,
            epsilon,
            right: 0,
            left: 0,
            on_boundary: false,
        }
    }

    /// Account for the edge `p1 -> p2`. Returns `true` as soon as the point
    /// is known to be on the boundary.
    pub fn add_edge(&mut self, p1: &Point, p2: &Point) -> bool {
        if self.on_boundary {
            return true;
        }
        let eps = self.epsilon;
        let (px, h) = (self.point.x, self.point.y);
        if p1.equals_2d(&self.point, eps) {
            self.on_boundary = true;
            return true;
        }
        let right_straddle = (p2.y > h - eps) != (p1.y > h - eps);
        let left_straddle = (p2.y < h + eps) != (p1.y < h + eps);
        if right_straddle || left_straddle {
            let x = ((p2.x - px) * (p1.y - h) - (p1.x - px) * (p2.y - h)) / (p1.y - p2.y);
            if right_straddle && x > eps {
                self.right += 1;
            }
            if left_straddle && x < -eps {
                self.left += 1;
            }
            if x.abs() < eps {
                self.on_boundary = true;
                return true;
            }
        }
        false
    }

    pub fn add_ring(&mut self, ring: &[Point]) -> bool {
        for w in ring.windows(2) {
            if self.add_edge(&w[0], &w[1]) {
                return true;
            }
        }
        false
    }

    pub fn location(&self) -> Location {
        if self.on_boundary || self.right % 2 != self.left % 2 {
            Location::Boundary
        } else if self.right % 2 == 1 {
            Location::Interior
        } else {
            Location::Exterior
        }
    }
}

/// Locate `p` against a closed ring.
pub fn locate_in_ring(p: &Point, ring: &[Point], epsilon: f64) -> Location {
    let mut rc = RayCrossings::new(*p, epsilon);
    rc.add_ring(ring);
    rc.location()
}

/// Locate `p` against a polygon. Crossings accumulate over all rings, so a
/// point inside a hole has even parity and lands outside.
pub fn locate_in_polygon(p: &Point, polygon: &Polygon, epsilon: f64) -> Location {
    let Some(exterior) = polygon.exterior_ring() else {
        return Location::Exterior;
    };
    if exterior.is_empty() {
        return Location::Exterior;
    }
    let mut rc = RayCrossings::new(*p, epsilon);
    for ring in polygon.rings() {
        if rc.add_ring(ring.points()) {
            return Location::Boundary;
        }
    }
    rc.location()
}
