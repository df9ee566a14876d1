//! Matrices and intersection tests that avoid building the full arrangement.

use crate::algorithm::PointLocator;
use crate::algorithm::ring::locate_in_ring;
use crate::algorithm::segment::segments_intersect;
use crate::geometry::{Envelope, Geometry, GeometryKind, Point, Polygon, SimpleFeature};

use super::{IntersectionMatrix, Location, RelateMode};

/// Matrix of two geometries whose point sets do not meet.
pub fn disjoint_matrix(a: &Geometry, b: &Geometry) -> IntersectionMatrix {
    let mut m = IntersectionMatrix::empty();
    m.set(Location::Exterior, Location::Exterior, Some(2));
    if !a.is_empty() {
        m.set(Location::Interior, Location::Exterior, Some(a.dimension()));
        if let Some(boundary) = a.boundary().filter(|g| !g.is_empty()) {
            m.set(Location::Boundary, Location::Exterior, Some(boundary.dimension()));
        }
    }
    if !b.is_empty() {
        m.set(Location::Exterior, Location::Interior, Some(b.dimension()));
        if let Some(boundary) = b.boundary().filter(|g| !g.is_empty()) {
            m.set(Location::Exterior, Location::Boundary, Some(boundary.dimension()));
        }
    }
    m
}

fn envelopes_meet(a: &Envelope, b: &Envelope, mode: RelateMode, epsilon: f64) -> bool {
    match mode {
        RelateMode::Planar => a.intersects(b, epsilon),
        RelateMode::Spatial => a.intersects_3d(b, epsilon),
    }
}

/// Whether anything of `g` other than the single point `p` exists.
fn has_more_than(g: &Geometry, p: &Point, locator: &PointLocator) -> bool {
    if g.dimension() > 0 {
        return true;
    }
    let mut other = false;
    g.for_each_point(&mut |q| other |= !locator.points_equal(p, q));
    other
}

/// Matrix of point `p` (as A) against `other` (as B).
fn point_matrix(p: &Point, other: &Geometry, locator: &PointLocator) -> IntersectionMatrix {
    let mut m = IntersectionMatrix::empty();
    m.set(Location::Exterior, Location::Exterior, Some(2));
    m.set(Location::Interior, locator.locate(p, other), Some(0));
    if !other.is_empty() && has_more_than(other, p, locator) {
        m.set(Location::Exterior, Location::Interior, Some(other.dimension()));
    }
    if let Some(boundary) = other.boundary().filter(|g| !g.is_empty()) {
        if has_more_than(&boundary, p, locator) {
            m.set(Location::Exterior, Location::Boundary, Some(boundary.dimension()));
        }
    }
    m
}

fn segments_of(g: &Geometry) -> Vec<(Point, Point)> {
    let mut out = Vec::new();
    let mut push = |pts: &[Point]| out.extend(pts.windows(2).map(|w| (w[0], w[1])));
    match g.kind() {
        GeometryKind::LineString(l) => push(l.points()),
        GeometryKind::MultiLineString(ml) => ml.lines().iter().for_each(|l| push(l.points())),
        GeometryKind::Polygon(p) => p.rings().iter().for_each(|r| push(r.points())),
        _ => {}
    }
    out
}

fn any_segments_meet(a: &[(Point, Point)], b: &[(Point, Point)], epsilon: f64) -> bool {
    a.iter().any(|(a0, a1)| {
        let ea = Envelope::of_segment(a0, a1);
        b.iter().any(|(b0, b1)| {
            ea.intersects(&Envelope::of_segment(b0, b1), epsilon)
                && segments_intersect(a0, a1, b0, b1, epsilon)
        })
    })
}

fn simple_shell(g: &Geometry) -> Option<&Polygon> {
    g.as_polygon()
        .filter(|p| p.num_interior_rings() == 0 && p.exterior_ring().is_some_and(|r| r.num_points() > 3))
}

/// Matrix for pairs that need no arrangement, or `None` when the general
/// computation is required.
pub fn fast_matrix(
    a: &Geometry,
    b: &Geometry,
    mode: RelateMode,
    locator: &PointLocator,
) -> Option<IntersectionMatrix> {
    let eps = locator.epsilon;
    if a.is_empty() || b.is_empty() {
        return Some(disjoint_matrix(a, b));
    }
    if let (Some(ea), Some(eb)) = (a.bounds(), b.bounds()) {
        if !envelopes_meet(&ea, &eb, mode, eps) {
            return Some(disjoint_matrix(a, b));
        }
    }

    if let Some(p) = a.as_point() {
        return Some(point_matrix(p, b, locator));
    }
    if let Some(p) = b.as_point() {
        return Some(point_matrix(p, a, locator).transposed());
    }

    let lineal = |g: &Geometry| {
        matches!(
            g.kind(),
            GeometryKind::LineString(_) | GeometryKind::MultiLineString(_)
        )
    };
    if lineal(a) && lineal(b) {
        return if any_segments_meet(&segments_of(a), &segments_of(b), eps) {
            None
        } else {
            Some(disjoint_matrix(a, b))
        };
    }

    if let (Some(pa), Some(pb)) = (simple_shell(a), simple_shell(b)) {
        if any_segments_meet(&segments_of(a), &segments_of(b), eps) {
            return None;
        }
        let (ra, rb) = (pa.exterior_ring()?.points(), pb.exterior_ring()?.points());
        let within: IntersectionMatrix = "2FF1FF212".parse().ok()?;
        if locate_in_ring(&ra[0], rb, eps) == Location::Interior {
            return Some(within);
        }
        if locate_in_ring(&rb[0], ra, eps) == Location::Interior {
            return Some(within.transposed());
        }
        return Some(disjoint_matrix(a, b));
    }
    None
}

// ─── Intersection test ───────────────────────────────────────────────────────

/// Vertices, segments and areas of a geometry, with one representative
/// vertex per connected part.
#[derive(Default)]
struct Pieces<'a> {
    representatives: Vec<Point>,
    points: Vec<Point>,
    segments: Vec<(Point, Point)>,
    areas: Vec<&'a Geometry>,
}

impl<'a> Pieces<'a> {
    fn of(g: &'a Geometry) -> Self {
        let mut pieces = Self::default();
        pieces.collect(g);
        pieces
    }

    fn line(&mut self, pts: &[Point]) {
        if let Some(first) = pts.first() {
            self.representatives.push(*first);
        }
        if pts.len() == 1 {
            self.points.push(pts[0]);
        }
        self.segments.extend(pts.windows(2).map(|w| (w[0], w[1])));
    }

    fn polygon(&mut self, polygon: &Polygon) {
        for ring in polygon.rings() {
            self.line(ring.points());
        }
    }

    fn collect(&mut self, g: &'a Geometry) {
        match g.kind() {
            GeometryKind::Point(p) if p.is_empty_point() => {}
            GeometryKind::Point(p) => {
                self.points.push(*p);
                self.representatives.push(*p);
            }
            GeometryKind::MultiPoint(mp) => {
                self.points.extend_from_slice(mp.points());
                self.representatives.extend_from_slice(mp.points());
            }
            GeometryKind::LineString(l) => self.line(l.points()),
            GeometryKind::MultiLineString(ml) => ml.lines().iter().for_each(|l| self.line(l.points())),
            GeometryKind::Polygon(p) => {
                self.polygon(p);
                self.areas.push(g);
            }
            GeometryKind::MultiPolygon(mp) => {
                mp.polygons().iter().for_each(|p| self.polygon(p));
                self.areas.push(g);
            }
            GeometryKind::PolyhedralSurface(s) => {
                s.patches().iter().for_each(|p| self.polygon(p));
                self.areas.push(g);
            }
            GeometryKind::GeometryCollection(gc) => {
                for child in gc.geometries() {
                    self.collect(child);
                }
            }
        }
    }
}

/// Whether two geometries share at least one point.
pub fn intersects(a: &Geometry, b: &Geometry, mode: RelateMode, locator: &PointLocator) -> bool {
    let eps = locator.epsilon;
    if a.is_empty() || b.is_empty() {
        return false;
    }
    match (a.bounds(), b.bounds()) {
        (Some(ea), Some(eb)) if envelopes_meet(&ea, &eb, mode, eps) => {}
        _ => return false,
    }
    let (pa, pb) = (Pieces::of(a), Pieces::of(b));

    // Isolated points against everything of the other side.
    if pa.points.iter().any(|p| locator.locate(p, b) != Location::Exterior)
        || pb.points.iter().any(|p| locator.locate(p, a) != Location::Exterior)
    {
        return true;
    }
    // A part lying wholly inside an area of the other side.
    if pa
        .representatives
        .iter()
        .any(|p| pb.areas.iter().any(|g| locator.locate(p, g) != Location::Exterior))
        || pb
            .representatives
            .iter()
            .any(|p| pa.areas.iter().any(|g| locator.locate(p, g) != Location::Exterior))
    {
        return true;
    }
    any_segments_meet(&pa.segments, &pb.segments, eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LineString, MultiPolygon};

    const EPS: f64 = 1e-7;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::new(LineString::from_xy(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]))
    }

    fn locator() -> PointLocator {
        PointLocator::new(EPS)
    }

    #[test]
    fn test_disjoint_matrix_by_dimension() {
        let line: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]).into();
        let poly: Geometry = square(5.0, 5.0, 1.0).into();
        assert_eq!(disjoint_matrix(&line, &poly).to_string(), "FF1FF0212");
        let pt: Geometry = Point::new(9.0, 9.0).into();
        assert_eq!(disjoint_matrix(&pt, &pt).to_string(), "FF0FFF0F2");
    }

    #[test]
    fn test_point_on_line_end() {
        let line: Geometry = LineString::from_xy(&[(0.0, 0.0), (2.0, 0.0)]).into();
        let end: Geometry = Point::new(2.0, 0.0).into();
        let m = fast_matrix(&end, &line, RelateMode::Planar, &locator()).unwrap();
        assert_eq!(m.to_string(), "F0FFFF102");
        let t = fast_matrix(&line, &end, RelateMode::Planar, &locator()).unwrap();
        assert_eq!(t, m.transposed());
    }

    #[test]
    fn test_nested_shells() {
        let big: Geometry = square(0.0, 0.0, 10.0).into();
        let small: Geometry = square(2.0, 2.0, 1.0).into();
        let m = fast_matrix(&small, &big, RelateMode::Planar, &locator()).unwrap();
        assert_eq!(m.to_string(), "2FF1FF212");
        let t = fast_matrix(&big, &small, RelateMode::Planar, &locator()).unwrap();
        assert_eq!(t.to_string(), "212FF1FF2");
    }

    #[test]
    fn test_crossing_shells_need_arrangement() {
        let a: Geometry = square(0.0, 0.0, 2.0).into();
        let b: Geometry = square(1.0, 1.0, 2.0).into();
        assert!(fast_matrix(&a, &b, RelateMode::Planar, &locator()).is_none());
    }

    #[test]
    fn test_intersects_second_part_inside() {
        let far_and_inside: Geometry =
            MultiPolygon::new(vec![square(50.0, 50.0, 1.0), square(2.0, 2.0, 1.0)]).into();
        let big: Geometry = square(0.0, 0.0, 10.0).into();
        assert!(intersects(&far_and_inside, &big, RelateMode::Planar, &locator()));
        let far: Geometry = square(50.0, 50.0, 1.0).into();
        assert!(!intersects(&far, &big, RelateMode::Planar, &locator()));
    }

    #[test]
    fn test_spatial_mode_separates_by_z() {
        let a: Geometry = Point::new_z(1.0, 1.0, 0.0).into();
        let b: Geometry = Point::new_z(1.0, 1.0, 5.0).into();
        assert!(intersects(&a, &b, RelateMode::Planar, &PointLocator::new(EPS)));
        assert!(!intersects(&a, &b, RelateMode::Spatial, &PointLocator::spatial(EPS)));
    }
}
