//! Centroids of whole geometries.
//!
//! Only the parts of the highest dimension contribute: areas weighted by
//! area, curves by segment length, points equally.

use crate::geometry::{Geometry, GeometryKind, Point, Polygon, SimpleFeature};

#[derive(Debug, Default)]
struct Accumulator {
    x: f64,
    y: f64,
    weight: f64,
}

impl Accumulator {
    fn add(&mut self, p: &Point, weight: f64) {
        self.x += p.x * weight;
        self.y += p.y * weight;
        self.weight += weight;
    }

    fn finish(&self) -> Option<Point> {
        (self.weight > 0.0).then(|| Point::new(self.x / self.weight, self.y / self.weight))
    }
}

fn add_polygon(acc: &mut Accumulator, polygon: &Polygon) {
    if let Some(c) = polygon.centroid() {
        acc.add(&c, polygon.area().abs());
    }
}

fn add_path(acc: &mut Accumulator, points: &[Point]) {
    for w in points.windows(2) {
        acc.add(&w[0].midpoint(&w[1]), w[0].distance_to(&w[1]));
    }
}

fn collect(acc: &mut Accumulator, g: &Geometry, dim: u8) {
    match (g.kind(), dim) {
        (GeometryKind::Point(p), 0) => acc.add(p, 1.0),
        (GeometryKind::MultiPoint(mp), 0) => mp.points().iter().for_each(|p| acc.add(p, 1.0)),
        (GeometryKind::LineString(l), 1) => add_path(acc, l.points()),
        (GeometryKind::MultiLineString(ml), 1) => ml.lines().iter().for_each(|l| add_path(acc, l.points())),
        (GeometryKind::Polygon(p), 2) => add_polygon(acc, p),
        (GeometryKind::MultiPolygon(mp), 2) => mp.polygons().iter().for_each(|p| add_polygon(acc, p)),
        (GeometryKind::PolyhedralSurface(s), 2) => s.patches().iter().for_each(|p| add_polygon(acc, p)),
        (GeometryKind::GeometryCollection(gc), _) => {
            for child in gc.geometries() {
                if !child.is_empty() && child.dimension() == dim {
                    collect(acc, child, dim);
                }
            }
        }
        _ => {}
    }
}

pub fn centroid(g: &Geometry) -> Option<Point> {
    if g.is_empty() {
        return None;
    }
    let mut acc = Accumulator::default();
    collect(&mut acc, g, g.dimension());
    acc.finish().or_else(|| {
        // Zero-length curves or zero-area rings: fall back to the vertices.
        let mut fallback = Accumulator::default();
        g.for_each_point(&mut |p| fallback.add(p, 1.0));
        fallback.finish()
    })
}

impl Geometry {
    /// Planar centroid of the highest-dimensional parts.
    pub fn centroid(&self) -> Option<Point> {
        centroid(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GeometryCollection, LineString, MultiPoint};

    fn close(p: &Point, x: f64, y: f64) -> bool {
        (p.x - x).abs() < 1e-9 && (p.y - y).abs() < 1e-9
    }

    #[test]
    fn test_point_centroids() {
        let p: Geometry = Point::new(3.0, 4.0).into();
        assert!(close(&p.centroid().unwrap(), 3.0, 4.0));
        let mp: Geometry = MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(2.0, 4.0)]).into();
        assert!(close(&mp.centroid().unwrap(), 1.0, 2.0));
    }

    #[test]
    fn test_line_centroid_is_length_weighted() {
        let l: Geometry = LineString::from_xy(&[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0)]).into();
        // Midpoints (2, 0) weight 4 and (4, 1) weight 2.
        let c = l.centroid().unwrap();
        assert!(close(&c, 16.0 / 6.0, 2.0 / 6.0));
    }

    #[test]
    fn test_collection_uses_highest_dimension() {
        let square: Geometry = Polygon::new(LineString::from_xy(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]))
        .into();
        let gc: Geometry =
            GeometryCollection::from_geometries(vec![Point::new(100.0, 100.0).into(), square]).into();
        assert!(close(&gc.centroid().unwrap(), 1.0, 1.0));
    }

    #[test]
    fn test_degenerate_line_falls_back_to_vertices() {
        let l: Geometry = LineString::from_xy(&[(1.0, 1.0), (1.0, 1.0)]).into();
        assert!(close(&l.centroid().unwrap(), 1.0, 1.0));
        assert!(Geometry::empty(crate::geometry::GeometryType::Polygon).centroid().is_none());
    }
}
