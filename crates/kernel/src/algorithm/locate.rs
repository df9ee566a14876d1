use crate::geometry::{Geometry, GeometryKind, LineString, Point, Polygon, SimpleFeature};
use crate::relate::Location;

use super::predicates::point_line_position;
use super::ring::locate_in_polygon;

/// Locates points against the interior, boundary or exterior of a geometry.
///
/// Curves follow the mod-2 boundary rule: an end point shared by an even
/// number of open curves is interior. Collections report the strongest
/// location of any member, interior before boundary before exterior.
#[derive(Debug, Clone, Copy)]
pub struct PointLocator {
    pub epsilon: f64,
    /// Compare Z when matching points against points.
    pub spatial: bool,
}

impl PointLocator {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon,
            spatial: false,
        }
    }

    pub fn spatial(epsilon: f64) -> Self {
        Self {
            epsilon,
            spatial: true,
        }
    }

    pub fn points_equal(&self, a: &Point, b: &Point) -> bool {
        if self.spatial {
            a.equals_3d(b, self.epsilon)
        } else {
            a.equals_2d(b, self.epsilon)
        }
    }

    pub fn locate(&self, p: &Point, geometry: &Geometry) -> Location {
        if let Some(env) = geometry.bounds() {
            if !env.contains_point(p, self.epsilon) {
                return Location::Exterior;
            }
        } else {
            return Location::Exterior;
        }
        match geometry.kind() {
            GeometryKind::Point(q) => self.locate_in_points(p, std::slice::from_ref(q)),
            GeometryKind::MultiPoint(mp) => self.locate_in_points(p, mp.points()),
            GeometryKind::LineString(l) => self.locate_in_lines(p, std::slice::from_ref(l)),
            GeometryKind::MultiLineString(ml) => self.locate_in_lines(p, ml.lines()),
            GeometryKind::Polygon(poly) => self.locate_in_polygons(p, std::slice::from_ref(poly)),
            GeometryKind::MultiPolygon(mp) => self.locate_in_polygons(p, mp.polygons()),
            GeometryKind::PolyhedralSurface(s) => self.locate_in_polygons(p, s.patches()),
            GeometryKind::GeometryCollection(gc) => {
                strongest(gc.geometries().iter().map(|g| self.locate(p, g)))
            }
        }
    }

    fn locate_in_points(&self, p: &Point, points: &[Point]) -> Location {
        if points.iter().any(|q| self.points_equal(p, q)) {
            Location::Interior
        } else {
            Location::Exterior
        }
    }

    fn locate_in_lines(&self, p: &Point, lines: &[LineString]) -> Location {
        let mut endpoint_hits = 0usize;
        let mut on_line = false;
        for line in lines {
            let pts = line.points();
            if pts.is_empty() {
                continue;
            }
            if pts.len() == 1 {
                on_line |= self.points_equal(p, &pts[0]);
                continue;
            }
            if !line.is_closed_within(self.epsilon) {
                let (start, end) = (&pts[0], &pts[pts.len() - 1]);
                if self.points_equal(p, start) {
                    endpoint_hits += 1;
                }
                if self.points_equal(p, end) {
                    endpoint_hits += 1;
                }
            }
            if !on_line {
                on_line = line
                    .segments()
                    .any(|(a, b)| point_line_position(a, b, p, self.epsilon).is_on_segment());
            }
        }
        if endpoint_hits % 2 == 1 {
            Location::Boundary
        } else if on_line || endpoint_hits > 0 {
            Location::Interior
        } else {
            Location::Exterior
        }
    }

    fn locate_in_polygons(&self, p: &Point, polygons: &[Polygon]) -> Location {
        strongest(
            polygons
                .iter()
                .map(|poly| locate_in_polygon(p, poly, self.epsilon)),
        )
    }
}

fn strongest(locations: impl Iterator<Item = Location>) -> Location {
    let mut best = Location::Exterior;
    for loc in locations {
        match loc {
            Location::Interior => return Location::Interior,
            Location::Boundary => best = Location::Boundary,
            Location::Exterior => {}
        }
    }
    best
}
