//! Point/segment classification primitives.
//!
//! All tests are planar and epsilon-tolerant: distances below `epsilon`
//! count as zero.

use crate::geometry::Point;

/// Where a point lies relative to the directed segment `a -> b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLinePosition {
    Left,
    Right,
    /// On the supporting line, before `a`.
    Before,
    /// On the supporting line, past `b`.
    After,
    /// Strictly inside the segment.
    Between,
    AtStart,
    AtEnd,
}

impl PointLinePosition {
    pub fn is_on_segment(&self) -> bool {
        matches!(self, Self::Between | Self::AtStart | Self::AtEnd)
    }

    pub fn is_collinear(&self) -> bool {
        !matches!(self, Self::Left | Self::Right)
    }
}

/// Classify `p` against the segment `a -> b` using the perpendicular
/// distance and the distance along the segment.
pub fn point_line_position(a: &Point, b: &Point, p: &Point, epsilon: f64) -> PointLinePosition {
    let n = *b - *a;
    let r = *p - *a;
    let len = n.length();
    if len < epsilon {
        return if p.equals_2d(a, epsilon) {
            PointLinePosition::AtStart
        } else {
            PointLinePosition::After
        };
    }
    let offset = n.perp_dot(&r) / len;
    if offset > epsilon {
        return PointLinePosition::Left;
    }
    if offset < -epsilon {
        return PointLinePosition::Right;
    }
    let along = r.dot(&n) / len;
    if along.abs() < epsilon {
        PointLinePosition::AtStart
    } else if (along - len).abs() < epsilon {
        PointLinePosition::AtEnd
    } else if along < 0.0 {
        PointLinePosition::Before
    } else if along > len {
        PointLinePosition::After
    } else {
        PointLinePosition::Between
    }
}

/// `p` lies on the infinite line through `a` and `b`.
pub fn is_collinear(a: &Point, b: &Point, p: &Point, epsilon: f64) -> bool {
    point_line_position(a, b, p, epsilon).is_collinear()
}

/// `p` lies inside the bounding box of `a` and `b`, grown by `epsilon`.
pub fn is_between(a: &Point, b: &Point, p: &Point, epsilon: f64) -> bool {
    p.x >= a.x.min(b.x) - epsilon
        && p.x <= a.x.max(b.x) + epsilon
        && p.y >= a.y.min(b.y) - epsilon
        && p.y <= a.y.max(b.y) + epsilon
}

/// `p` lies on the closed segment `a`–`b`.
pub fn is_on_segment(p: &Point, a: &Point, b: &Point, epsilon: f64) -> bool {
    point_line_position(a, b, p, epsilon).is_on_segment()
}

/// Direction of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// Counter-clockwise.
    Left,
    /// Clockwise.
    Right,
    Straight,
}

/// Sign of the cross product of `p2 - p1` and `p4 - p3`, with an
/// epsilon band around zero.
///
/// The second vector is translated to start at `p1` and the shorter of the
/// two is classified against the longer one, so the band is measured on the
/// longer vector.
pub fn cross_turn(p1: &Point, p2: &Point, p3: &Point, p4: &Point, epsilon: f64) -> Turn {
    let p = *p4 + (*p1 - *p3);
    if (*p2 - *p1).length_squared() > (p - *p1).length_squared() {
        match point_line_position(p1, p2, &p, epsilon) {
            PointLinePosition::Left => Turn::Left,
            PointLinePosition::Right => Turn::Right,
            _ => Turn::Straight,
        }
    } else {
        match point_line_position(p1, &p, p2, epsilon) {
            PointLinePosition::Left => Turn::Right,
            PointLinePosition::Right => Turn::Left,
            _ => Turn::Straight,
        }
    }
}

/// Turn made at `b` when walking `a -> b -> c`.
pub fn orientation(a: &Point, b: &Point, c: &Point, epsilon: f64) -> Turn {
    cross_turn(a, b, b, c, epsilon)
}
