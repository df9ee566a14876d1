//! Raw offset curves ("convolutions") of points and polylines.
//!
//! The curve produced here self-intersects wherever the offset folds over
//! itself; [`super::graph`] untangles it into rings.

use std::f64::consts::TAU;

use crate::algorithm::predicates::{Turn, cross_turn};
use crate::algorithm::segment::crossing;
use crate::geometry::{Point, Vec2};

use super::EndCap;

/// Closed regular polygon of `4 * quadrant_segments` vertices around
/// `center`, first vertex one step counter-clockwise of `+x`.
pub fn point_ring(center: &Point, distance: f64, quadrant_segments: u32) -> Vec<Point> {
    let q = quadrant_segments.max(1);
    let angle = std::f64::consts::FRAC_PI_2 / f64::from(q);
    let (sin, cos) = angle.sin_cos();
    let center = center.to_2d();
    let steps = 4 * q as usize;
    let mut v = Vec2::new(distance, 0.0);
    let mut ring = Vec::with_capacity(steps + 1);
    for _ in 0..steps {
        v = v.rotate(cos, sin);
        ring.push(center + v);
    }
    ring.push(ring[0]);
    ring
}

/// Walks a polyline down one side and back up the other, emitting the
/// offset vertices in order.
///
/// The window `s0 -> s1 -> s2` holds the last three input vertices;
/// `off00 -> off01` is the offset of `s0 -> s1` and `off10 -> off11` the
/// offset of `s1 -> s2`.
#[derive(Debug)]
pub struct Convolver {
    distance: f64,
    angle: f64,
    cos: f64,
    sin: f64,
    end_cap: EndCap,
    epsilon: f64,
    out: Vec<Point>,
    s0: Point,
    s1: Point,
    s2: Point,
    off00: Point,
    off01: Point,
    off10: Point,
    off11: Point,
}

impl Convolver {
    pub fn new(distance: f64, quadrant_segments: u32, end_cap: EndCap, epsilon: f64) -> Self {
        let angle = std::f64::consts::FRAC_PI_2 / f64::from(quadrant_segments.max(1));
        let (sin, cos) = angle.sin_cos();
        let origin = Point::default();
        Self {
            distance,
            angle,
            cos,
            sin,
            end_cap,
            epsilon,
            out: Vec::new(),
            s0: origin,
            s1: origin,
            s2: origin,
            off00: origin,
            off01: origin,
            off10: origin,
            off11: origin,
        }
    }

    fn push(&mut self, p: Point) {
        if self.out.last() != Some(&p) {
            self.out.push(p);
        }
    }

    /// The segment `p0 -> p1` moved `distance` to its right.
    fn offset(&self, p0: &Point, p1: &Point) -> (Point, Point) {
        let dir = *p1 - *p0;
        let len = dir.length();
        if len == 0.0 {
            return (*p0, *p1);
        }
        let u = dir.right_normal() * (self.distance / len);
        (*p0 + u, *p1 + u)
    }

    /// Arc around `center` from `from` to `to`, stepping by the quadrant
    /// angle. Both ends are emitted exactly.
    fn add_turn(&mut self, center: &Point, from: Point, to: Point, ccw: bool) {
        let end = (to - *center).angle();
        let mut start = (from - *center).angle();
        if ccw && start >= end {
            start -= TAU;
        } else if !ccw && start <= end {
            start += TAU;
        }
        let steps = ((start - end).abs() / self.angle).round() as usize;
        let sin = if ccw { self.sin } else { -self.sin };

        self.push(from);
        let mut v = from - *center;
        for _ in 1..steps {
            v = v.rotate(self.cos, sin);
            self.push(*center + v);
        }
        self.push(to);
    }

    /// Start a walk along `p0 -> p1` without emitting anything.
    fn begin(&mut self, p0: Point, p1: Point) {
        self.s1 = p0;
        self.s2 = p1;
        (self.off10, self.off11) = self.offset(&p0, &p1);
    }

    /// Advance the window to `p` and emit the joint at the old `s2`.
    fn add_segment(&mut self, p: Point) {
        self.s0 = self.s1;
        self.s1 = self.s2;
        self.s2 = p;
        self.off00 = self.off10;
        self.off01 = self.off11;
        (self.off10, self.off11) = self.offset(&self.s1, &self.s2);
        if self.s1 == self.s2 {
            return;
        }

        let (s0, s1, s2) = (self.s0, self.s1, self.s2);
        match cross_turn(&s0, &s1, &s1, &s2, self.epsilon) {
            Turn::Left => self.add_turn(&s1, self.off01, self.off10, true),
            Turn::Right => {
                match crossing(&self.off00, &self.off01, &self.off10, &self.off11, self.epsilon) {
                    Some(c) => self.push(c.point),
                    None if self.off01.distance_to(&self.off10) < self.distance / 1000.0 => {
                        self.push(self.off01);
                    }
                    // The offsets miss each other; leave a loop through the
                    // vertex for the deconvolution to cut away.
                    None => {
                        self.push(self.off01);
                        self.push(s1);
                        self.push(self.off10);
                    }
                }
            }
            // A full reversal folds back on itself; round it like a cap.
            Turn::Straight if (s1 - s0).dot(&(s2 - s1)) < 0.0 => {
                self.add_turn(&s1, self.off01, self.off10, true);
            }
            Turn::Straight => {}
        }
    }

    /// Cap at `p1` for a walk arriving along `p0 -> p1`.
    fn add_line_end(&mut self, p0: &Point, p1: &Point) {
        let (left, _) = self.offset(p1, p0);
        let (_, right) = self.offset(p0, p1);
        match self.end_cap {
            EndCap::Round => self.add_turn(p1, right, left, true),
            EndCap::Flat => {
                self.push(right);
                self.push(left);
            }
        }
    }

    /// Raw convolution of a polyline. `line` must be 2D with consecutive
    /// duplicates removed; returns `None` when fewer than two distinct
    /// points remain.
    pub fn line(mut self, line: &[Point]) -> Option<Vec<Point>> {
        let n = line.len();
        if n < 2 {
            return None;
        }
        if n == 2 {
            if line[0] == line[1] {
                return None;
            }
            self.add_line_end(&line[0], &line[1]);
            self.add_line_end(&line[1], &line[0]);
            return Some(self.out);
        }

        // Down the right side.
        self.begin(line[0], line[1]);
        for p in &line[2..] {
            self.add_segment(*p);
        }
        let last = line[n - 1];
        let before = line[..n - 1].iter().rev().find(|p| **p != last)?;
        self.add_line_end(before, &last);

        // And back up the other.
        self.begin(line[n - 1], line[n - 2]);
        for p in line[..n - 2].iter().rev() {
            self.add_segment(*p);
        }
        let first = line[0];
        let after = line[1..].iter().find(|p| **p != first)?;
        self.add_line_end(after, &first);

        Some(self.out)
    }
}
