//! Minimum planar distance between geometries.

use crate::Tolerance;
use crate::geometry::{Geometry, GeometryKind, Point, SimpleFeature};
use crate::relate::Location;

use super::locate::PointLocator;
use super::segment::segments_intersect;

pub fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    let ab = *b - *a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance_to(a);
    }
    let t = ((*p - *a).dot(&ab) / len2).clamp(0.0, 1.0);
    p.distance_to(&(*a + ab * t))
}

pub fn segment_segment_distance(a0: &Point, a1: &Point, b0: &Point, b1: &Point, epsilon: f64) -> f64 {
    if segments_intersect(a0, a1, b0, b1, epsilon) {
        return 0.0;
    }
    point_segment_distance(a0, b0, b1)
        .min(point_segment_distance(a1, b0, b1))
        .min(point_segment_distance(b0, a0, a1))
        .min(point_segment_distance(b1, a0, a1))
}

/// A geometry flattened into isolated points, segments and areas.
struct Parts<'a> {
    points: Vec<Point>,
    segments: Vec<(Point, Point)>,
    areas: Vec<&'a Geometry>,
}

fn decompose(g: &Geometry) -> Parts<'_> {
    let mut parts = Parts {
        points: Vec::new(),
        segments: Vec::new(),
        areas: Vec::new(),
    };
    collect(g, &mut parts);
    parts
}

fn push_line(pts: &[Point], parts: &mut Parts<'_>) {
    if pts.len() == 1 {
        parts.points.push(pts[0]);
    }
    parts.segments.extend(pts.windows(2).map(|w| (w[0], w[1])));
}

fn collect<'a>(g: &'a Geometry, parts: &mut Parts<'a>) {
    match g.kind() {
        GeometryKind::Point(p) if p.is_empty_point() => {}
        GeometryKind::Point(p) => parts.points.push(*p),
        GeometryKind::MultiPoint(mp) => parts.points.extend_from_slice(mp.points()),
        GeometryKind::LineString(l) => push_line(l.points(), parts),
        GeometryKind::MultiLineString(ml) => {
            for l in ml.lines() {
                push_line(l.points(), parts);
            }
        }
        GeometryKind::Polygon(poly) => {
            for r in poly.rings() {
                push_line(r.points(), parts);
            }
            parts.areas.push(g);
        }
        GeometryKind::MultiPolygon(mp) => {
            for r in mp.polygons().iter().flat_map(|p| p.rings()) {
                push_line(r.points(), parts);
            }
            parts.areas.push(g);
        }
        GeometryKind::PolyhedralSurface(s) => {
            for r in s.patches().iter().flat_map(|p| p.rings()) {
                push_line(r.points(), parts);
            }
            parts.areas.push(g);
        }
        GeometryKind::GeometryCollection(gc) => {
            for child in gc.geometries() {
                collect(child, parts);
            }
        }
    }
}

/// Distance from `p` to the nearest point of `g`; zero inside an area.
pub fn point_geometry_distance(p: &Point, g: &Geometry, epsilon: f64) -> f64 {
    let parts = decompose(g);
    let locator = PointLocator::new(epsilon);
    if parts
        .areas
        .iter()
        .any(|a| locator.locate(p, a) != Location::Exterior)
    {
        return 0.0;
    }
    let from_points = parts.points.iter().map(|q| p.distance_to(q));
    let from_segments = parts
        .segments
        .iter()
        .map(|(a, b)| point_segment_distance(p, a, b));
    from_points.chain(from_segments).fold(f64::INFINITY, f64::min)
}

/// Minimum planar distance between two geometries, zero when they
/// intersect. Infinite if either is empty.
pub fn distance(a: &Geometry, b: &Geometry, epsilon: f64) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    let pa = decompose(a);
    let pb = decompose(b);
    let locator = PointLocator::new(epsilon);

    // A part of one lying inside an area of the other.
    let first_vertex = |parts: &Parts<'_>| {
        parts
            .points
            .first()
            .copied()
            .or_else(|| parts.segments.first().map(|s| s.0))
    };
    if let Some(v) = first_vertex(&pa) {
        if pb.areas.iter().any(|g| locator.locate(&v, g) != Location::Exterior) {
            return 0.0;
        }
    }
    if let Some(v) = first_vertex(&pb) {
        if pa.areas.iter().any(|g| locator.locate(&v, g) != Location::Exterior) {
            return 0.0;
        }
    }

    let mut best = f64::INFINITY;
    for p in &pa.points {
        for q in &pb.points {
            best = best.min(p.distance_to(q));
        }
        for (s0, s1) in &pb.segments {
            best = best.min(point_segment_distance(p, s0, s1));
        }
    }
    for (a0, a1) in &pa.segments {
        for q in &pb.points {
            best = best.min(point_segment_distance(q, a0, a1));
        }
        for (b0, b1) in &pb.segments {
            best = best.min(segment_segment_distance(a0, a1, b0, b1, epsilon));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}

impl Geometry {
    /// Minimum planar distance to `other`.
    pub fn distance(&self, other: &Geometry) -> f64 {
        distance(self, other, Tolerance::global().epsilon)
    }
}
