use serde::{Deserialize, Serialize};

use super::collection::MultiLineString;
use super::line_string::LineString;
use super::point::Point;
use super::{Geometry, GeometryError, GeometryType, SimpleFeature};
use crate::Tolerance;
use crate::algorithm::ring::{self, Orientation};
use crate::algorithm::simple;
use crate::relate::Location;

/// A planar surface bounded by one exterior ring and zero or more holes.
///
/// Ring 0 is the exterior. The exterior is expected counter-clockwise and
/// holes clockwise; [`Polygon::correct_orientation`] enforces that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    rings: Vec<LineString>,
}

impl Polygon {
    pub fn new(exterior: LineString) -> Self {
        Self {
            rings: vec![exterior],
        }
    }

    pub fn from_rings(rings: Vec<LineString>) -> Self {
        Self { rings }
    }

    /// Append a ring, taking ownership. The first ring added is the exterior.
    pub fn add_ring(&mut self, ring: LineString) {
        self.rings.push(ring);
    }

    /// Append a copy of `ring`.
    pub fn add_ring_copy(&mut self, ring: &LineString) {
        self.rings.push(ring.clone());
    }

    pub fn remove_ring(&mut self, index: usize) -> Result<LineString, GeometryError> {
        if index >= self.rings.len() {
            return Err(GeometryError::IndexOutOfRange {
                what: "ring",
                index,
                len: self.rings.len(),
            });
        }
        Ok(self.rings.remove(index))
    }

    pub fn rings(&self) -> &[LineString] {
        &self.rings
    }

    pub fn rings_mut(&mut self) -> &mut Vec<LineString> {
        &mut self.rings
    }

    pub fn into_rings(self) -> Vec<LineString> {
        self.rings
    }

    pub fn exterior_ring(&self) -> Option<&LineString> {
        self.rings.first()
    }

    pub fn interior_rings(&self) -> &[LineString] {
        self.rings.get(1..).unwrap_or(&[])
    }

    pub fn num_interior_rings(&self) -> usize {
        self.rings.len().saturating_sub(1)
    }

    pub fn interior_ring_n(&self, index: usize) -> Option<&LineString> {
        self.interior_rings().get(index)
    }

    /// Exterior area minus hole area.
    pub fn area(&self) -> f64 {
        let mut rings = self.rings.iter();
        let Some(exterior) = rings.next() else {
            return 0.0;
        };
        let holes: f64 = rings.map(|r| ring::signed_area(r.points()).abs()).sum();
        ring::signed_area(exterior.points()).abs() - holes
    }

    /// Area-weighted centroid, holes subtracted.
    pub fn centroid(&self) -> Option<Point> {
        let mut weight = 0.0;
        let (mut cx, mut cy) = (0.0, 0.0);
        for (i, r) in self.rings.iter().enumerate() {
            let area = ring::signed_area(r.points()).abs();
            let Some(c) = ring::centroid(r.points()) else {
                continue;
            };
            let signed = if i == 0 { area } else { -area };
            cx += c.x * signed;
            cy += c.y * signed;
            weight += signed;
        }
        if weight.abs() < f64::EPSILON {
            return self.exterior_ring().and_then(|r| ring::centroid(r.points()));
        }
        Some(Point::new(cx / weight, cy / weight))
    }

    /// Make the exterior counter-clockwise and every hole clockwise.
    pub fn correct_orientation(&mut self) {
        ring::correct_polygon(self, Tolerance::global().epsilon);
    }

    pub fn is_orientation_consistent(&self) -> bool {
        ring::is_polygon_consistent(self, Tolerance::global().epsilon)
    }
}

impl SimpleFeature for Polygon {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Polygon
    }

    fn dimension(&self) -> u8 {
        2
    }

    fn is_empty(&self) -> bool {
        self.rings.iter().all(|r| r.is_empty())
    }

    fn is_simple(&self) -> bool {
        let eps = Tolerance::global().epsilon;
        self.rings.iter().all(|r| r.is_simple())
            && self.rings.iter().enumerate().all(|(i, a)| {
                self.rings[i + 1..]
                    .iter()
                    .all(|b| !simple::rings_cross(a.points(), b.points(), eps))
            })
    }

    /// Every ring closed with at least four points, the rings simple and
    /// not crossing, and every hole inside the exterior.
    fn is_valid(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let eps = Tolerance::global().epsilon;
        let rings_ok = self
            .rings
            .iter()
            .all(|r| r.num_points() >= 4 && r.is_closed_within(eps));
        if !rings_ok || !self.is_simple() {
            return false;
        }
        if ring::orientation(self.rings[0].points(), eps) == Orientation::Degenerate {
            return false;
        }
        let exterior = self.rings[0].points();
        self.interior_rings().iter().all(|hole| {
            hole.points()
                .iter()
                .map(|p| ring::locate_in_ring(p, exterior, eps))
                .find(|loc| *loc != Location::Boundary)
                .is_none_or(|loc| loc == Location::Interior)
        })
    }

    fn boundary(&self) -> Option<Geometry> {
        if self.is_empty() {
            return None;
        }
        Some(MultiLineString::new(self.rings.clone()).into())
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        for r in &self.rings {
            r.for_each_point(f);
        }
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        for r in &mut self.rings {
            r.for_each_point_mut(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> LineString {
        LineString::from_xy(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ])
    }

    #[test]
    fn test_ring_accessors() {
        let mut poly = Polygon::new(square(0.0, 0.0, 10.0));
        poly.add_ring_copy(&square(2.0, 2.0, 2.0).reversed());
        poly.add_ring(square(6.0, 6.0, 2.0).reversed());
        assert_eq!(poly.num_interior_rings(), 2);
        assert!(poly.interior_ring_n(1).is_some());
        assert!(poly.interior_ring_n(2).is_none());
        assert!(matches!(
            poly.remove_ring(5),
            Err(GeometryError::IndexOutOfRange { index: 5, len: 3, .. })
        ));
        assert!(poly.remove_ring(2).is_ok());
        assert_eq!(poly.num_interior_rings(), 1);
    }

    #[test]
    fn test_area_subtracts_holes() {
        let mut poly = Polygon::new(square(0.0, 0.0, 10.0));
        poly.add_ring(square(2.0, 2.0, 2.0).reversed());
        assert!((poly.area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_centroid() {
        let poly = Polygon::new(square(0.0, 0.0, 2.0));
        let c = poly.centroid().unwrap();
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correct_orientation() {
        let mut poly = Polygon::new(square(0.0, 0.0, 10.0).reversed());
        poly.add_ring(square(2.0, 2.0, 2.0));
        assert!(!poly.is_orientation_consistent());
        poly.correct_orientation();
        assert!(poly.is_orientation_consistent());
    }

    #[test]
    fn test_validity() {
        let mut poly = Polygon::new(square(0.0, 0.0, 10.0));
        poly.add_ring(square(2.0, 2.0, 2.0).reversed());
        assert!(poly.is_valid());

        let mut outside_hole = Polygon::new(square(0.0, 0.0, 10.0));
        outside_hole.add_ring(square(20.0, 20.0, 2.0).reversed());
        assert!(!outside_hole.is_valid());

        let open = Polygon::new(LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]));
        assert!(!open.is_valid());
    }

    #[test]
    fn test_crossing_rings_not_simple() {
        let mut poly = Polygon::new(square(0.0, 0.0, 10.0));
        poly.add_ring(square(8.0, 8.0, 4.0).reversed());
        assert!(!poly.is_simple());
    }

    #[test]
    fn test_boundary_is_rings() {
        let poly = Polygon::new(square(0.0, 0.0, 1.0));
        let b = poly.boundary().unwrap();
        assert_eq!(b.geometry_type(), GeometryType::MultiLineString);
        assert_eq!(b.dimension(), 1);
    }
}
