//! The general relate computation.
//!
//! Every edge of both inputs is split at all mutual intersections, so the
//! pieces form a planar arrangement in which each node, each open sub-edge
//! and each face lies entirely in one cell of A's and one cell of B's
//! partition. Sampling one point per node, per sub-edge and per face side
//! labels the arrangement, and the labels fill the matrix.

use tracing::debug;

use crate::algorithm::PointLocator;
use crate::algorithm::predicates::is_on_segment;
use crate::algorithm::segment::{SegmentIntersection, intersect_segments};
use crate::geometry::{Envelope, Geometry, GeometryKind, Point, Polygon};
use crate::index::Bsp;

use super::{IntersectionMatrix, Location};

/// Which input an edge or point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Point,
    to: Point,
    /// Part of a polygon ring, so areas lie on either side.
    ring: bool,
}

#[derive(Debug, Default)]
struct Arrangement {
    edges: Vec<Edge>,
    points: Vec<Point>,
}

impl Arrangement {
    fn add_path(&mut self, pts: &[Point], ring: bool, epsilon: f64) {
        let mut any = false;
        for w in pts.windows(2) {
            if !w[0].equals_2d(&w[1], epsilon) {
                self.edges.push(Edge {
                    from: w[0].to_2d(),
                    to: w[1].to_2d(),
                    ring,
                });
                any = true;
            }
        }
        if !any {
            if let Some(p) = pts.first() {
                self.points.push(p.to_2d());
            }
        }
    }

    fn add_polygon(&mut self, polygon: &Polygon, epsilon: f64) {
        for ring in polygon.rings() {
            self.add_path(ring.points(), true, epsilon);
        }
    }

    fn add(&mut self, g: &Geometry, epsilon: f64) {
        match g.kind() {
            GeometryKind::Point(p) if p.is_empty_point() => {}
            GeometryKind::Point(p) => self.points.push(p.to_2d()),
            GeometryKind::MultiPoint(mp) => self.points.extend(mp.points().iter().map(Point::to_2d)),
            GeometryKind::LineString(l) => self.add_path(l.points(), false, epsilon),
            GeometryKind::MultiLineString(ml) => {
                for l in ml.lines() {
                    self.add_path(l.points(), false, epsilon);
                }
            }
            GeometryKind::Polygon(p) => self.add_polygon(p, epsilon),
            GeometryKind::MultiPolygon(mp) => {
                for p in mp.polygons() {
                    self.add_polygon(p, epsilon);
                }
            }
            GeometryKind::PolyhedralSurface(s) => {
                for p in s.patches() {
                    self.add_polygon(p, epsilon);
                }
            }
            GeometryKind::GeometryCollection(gc) => {
                for child in gc.geometries() {
                    self.add(child, epsilon);
                }
            }
        }
    }
}

/// Cut every edge at its intersections with every other edge and at the
/// isolated points lying on it.
fn split_edges(edges: &[(Side, Edge)], points: &[Point], epsilon: f64) -> Vec<(Side, Edge)> {
    let index = Bsp::build(
        edges
            .iter()
            .enumerate()
            .map(|(i, (_, e))| (i, Envelope::of_segment(&e.from, &e.to))),
    );
    let mut cuts: Vec<Vec<Point>> = vec![Vec::new(); edges.len()];
    for (i, (_, e)) in edges.iter().enumerate() {
        for j in index.query(&Envelope::of_segment(&e.from, &e.to), epsilon) {
            if j <= i {
                continue;
            }
            let f = &edges[j].1;
            match intersect_segments(&e.from, &e.to, &f.from, &f.to, epsilon) {
                SegmentIntersection::None => {}
                SegmentIntersection::Point(p) => {
                    cuts[i].push(p);
                    cuts[j].push(p);
                }
                SegmentIntersection::Overlap(p, q) => {
                    cuts[i].extend([p, q]);
                    cuts[j].extend([p, q]);
                }
            }
        }
    }
    for p in points {
        for i in index.query(&Envelope::of_point(p), epsilon) {
            let e = &edges[i].1;
            if is_on_segment(p, &e.from, &e.to, epsilon) {
                cuts[i].push(*p);
            }
        }
    }

    let mut out = Vec::with_capacity(edges.len());
    for ((side, e), mut at) in edges.iter().zip(cuts) {
        let dir = e.to - e.from;
        at.sort_by(|p, q| (*p - e.from).dot(&dir).total_cmp(&(*q - e.from).dot(&dir)));
        let mut start = e.from;
        for p in at.into_iter().chain(std::iter::once(e.to)) {
            if p.equals_2d(&start, epsilon) {
                continue;
            }
            out.push((*side, Edge { from: start, to: p, ring: e.ring }));
            start = p;
        }
    }
    out
}

/// Distinct points, merging those within `epsilon` of each other.
fn distinct(mut points: Vec<Point>, epsilon: f64) -> Vec<Point> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x));
    let mut kept: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        let duplicate = kept
            .iter()
            .rev()
            .take_while(|q| q.x >= p.x - epsilon)
            .any(|q| q.equals_2d(&p, epsilon));
        if !duplicate {
            kept.push(p);
        }
    }
    kept
}

/// Compute the full matrix of `a` against `b`.
pub fn compute(a: &Geometry, b: &Geometry, locator: &PointLocator) -> IntersectionMatrix {
    let eps = locator.epsilon;
    let mut arr_a = Arrangement::default();
    arr_a.add(a, eps);
    let mut arr_b = Arrangement::default();
    arr_b.add(b, eps);

    let edges: Vec<(Side, Edge)> = arr_a
        .edges
        .iter()
        .map(|e| (Side::A, *e))
        .chain(arr_b.edges.iter().map(|e| (Side::B, *e)))
        .collect();
    let isolated: Vec<Point> = arr_a.points.iter().chain(&arr_b.points).copied().collect();
    let pieces = split_edges(&edges, &isolated, eps);

    let nodes = distinct(
        pieces
            .iter()
            .flat_map(|(_, e)| [e.from, e.to])
            .chain(isolated.iter().copied())
            .collect(),
        eps,
    );
    debug!(edges = edges.len(), pieces = pieces.len(), nodes = nodes.len(), "relate arrangement built");

    let mut m = IntersectionMatrix::empty();
    m.set(Location::Exterior, Location::Exterior, Some(2));
    let mut label = |p: &Point, dim: u8, m: &mut IntersectionMatrix| {
        m.set_at_least(locator.locate(p, a), locator.locate(p, b), dim);
    };

    for node in &nodes {
        label(node, 0, &mut m);
    }
    for (_, e) in &pieces {
        label(&e.from.midpoint(&e.to), 1, &mut m);
    }

    // Faces, sampled just off either side of every ring piece.
    for (_, e) in pieces.iter().filter(|(_, e)| e.ring) {
        let d = e.to - e.from;
        let len = d.length();
        let delta = (1e3 * eps).min(0.25 * len);
        if delta <= 10.0 * eps {
            continue;
        }
        let Some(unit) = d.normalize() else {
            continue;
        };
        let mid = e.from.midpoint(&e.to);
        for offset in [unit.right_normal() * delta, -(unit.right_normal() * delta)] {
            let sample = mid + offset;
            let (la, lb) = (locator.locate(&sample, a), locator.locate(&sample, b));
            if la != Location::Boundary && lb != Location::Boundary {
                m.set_at_least(la, lb, 2);
            }
        }
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LineString;

    const EPS: f64 = 1e-7;

    fn square(x0: f64, y0: f64, size: f64) -> Geometry {
        Polygon::new(LineString::from_xy(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]))
        .into()
    }

    fn relate(a: &Geometry, b: &Geometry) -> String {
        compute(a, b, &PointLocator::new(EPS)).to_string()
    }

    #[test]
    fn test_overlapping_squares() {
        assert_eq!(relate(&square(0.0, 0.0, 2.0), &square(1.0, 1.0, 2.0)), "212101212");
    }

    #[test]
    fn test_squares_sharing_an_edge() {
        assert_eq!(relate(&square(0.0, 0.0, 1.0), &square(1.0, 0.0, 1.0)), "FF2F11212");
    }

    #[test]
    fn test_squares_touching_at_corner() {
        assert_eq!(relate(&square(0.0, 0.0, 1.0), &square(1.0, 1.0, 1.0)), "FF2F01212");
    }

    #[test]
    fn test_crossing_lines() {
        let a: Geometry = LineString::from_xy(&[(0.0, 0.0), (2.0, 2.0)]).into();
        let b: Geometry = LineString::from_xy(&[(0.0, 2.0), (2.0, 0.0)]).into();
        assert_eq!(relate(&a, &b), "0F1FF0102");
    }

    #[test]
    fn test_collinear_overlapping_lines() {
        let a: Geometry = LineString::from_xy(&[(0.0, 0.0), (2.0, 0.0)]).into();
        let b: Geometry = LineString::from_xy(&[(1.0, 0.0), (3.0, 0.0)]).into();
        assert_eq!(relate(&a, &b), "1010F0102");
    }

    #[test]
    fn test_line_through_polygon() {
        let line: Geometry = LineString::from_xy(&[(-1.0, 1.0), (3.0, 1.0)]).into();
        assert_eq!(relate(&line, &square(0.0, 0.0, 2.0)), "101FF0212");
    }

    #[test]
    fn test_line_inside_polygon_hole() {
        let mut poly = Polygon::new(LineString::from_xy(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (0.0, 0.0),
        ]));
        poly.add_ring(LineString::from_xy(&[(2.0, 2.0), (2.0, 8.0), (8.0, 8.0), (8.0, 2.0), (2.0, 2.0)]));
        let line: Geometry = LineString::from_xy(&[(4.0, 4.0), (6.0, 6.0)]).into();
        assert_eq!(relate(&line, &poly.into()), "FF1FF0212");
    }
}
