//! Heterogeneous and type-constrained collections.
//!
//! The Multi* types hold their children as concrete values, so the typed
//! `add_*` methods cannot be misused. The `add_geometry` forms accept any
//! [`Geometry`] and reject the wrong kind with [`GeometryError::WrongChildKind`].

use serde::{Deserialize, Serialize};

use super::line_string::LineString;
use super::point::Point;
use super::polygon::Polygon;
use super::{Geometry, GeometryError, GeometryKind, GeometryType, SimpleFeature};
use crate::Tolerance;

fn wrong_kind(collection: GeometryType, found: &Geometry) -> GeometryError {
    GeometryError::WrongChildKind {
        collection,
        found: found.geometry_type(),
    }
}

// ─── MultiPoint ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiPoint {
    points: Vec<Point>,
}

impl MultiPoint {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> Result<(), GeometryError> {
        match geometry.into_kind() {
            GeometryKind::Point(p) => {
                self.points.push(p);
                Ok(())
            }
            other => Err(wrong_kind(GeometryType::MultiPoint, &other.into())),
        }
    }

    pub fn add_geometry_copy(&mut self, geometry: &Geometry) -> Result<(), GeometryError> {
        match geometry.kind() {
            GeometryKind::Point(p) => {
                self.points.push(*p);
                Ok(())
            }
            _ => Err(wrong_kind(GeometryType::MultiPoint, geometry)),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }
}

impl SimpleFeature for MultiPoint {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::MultiPoint
    }

    fn dimension(&self) -> u8 {
        0
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// No two points coincide.
    fn is_simple(&self) -> bool {
        let eps = Tolerance::global().epsilon;
        self.points.iter().enumerate().all(|(i, a)| {
            self.points[i + 1..]
                .iter()
                .all(|b| !a.equals_3d(b, eps))
        })
    }

    fn is_valid(&self) -> bool {
        self.points.iter().all(Point::is_finite)
    }

    fn boundary(&self) -> Option<Geometry> {
        None
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        self.points.iter().for_each(f)
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        self.points.iter_mut().for_each(f)
    }
}

// ─── MultiLineString ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiLineString {
    lines: Vec<LineString>,
}

impl MultiLineString {
    pub fn new(lines: Vec<LineString>) -> Self {
        Self { lines }
    }

    pub fn add_line_string(&mut self, line: LineString) {
        self.lines.push(line);
    }

    pub fn add_line_string_copy(&mut self, line: &LineString) {
        self.lines.push(line.clone());
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> Result<(), GeometryError> {
        match geometry.into_kind() {
            GeometryKind::LineString(l) => {
                self.lines.push(l);
                Ok(())
            }
            other => Err(wrong_kind(GeometryType::MultiLineString, &other.into())),
        }
    }

    pub fn add_geometry_copy(&mut self, geometry: &Geometry) -> Result<(), GeometryError> {
        match geometry.kind() {
            GeometryKind::LineString(l) => {
                self.lines.push(l.clone());
                Ok(())
            }
            _ => Err(wrong_kind(GeometryType::MultiLineString, geometry)),
        }
    }

    pub fn lines(&self) -> &[LineString] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<LineString> {
        &mut self.lines
    }

    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn length(&self) -> f64 {
        self.lines.iter().map(LineString::length).sum()
    }

    /// End points of the open members that occur an odd number of times
    /// (the mod-2 boundary rule).
    pub fn boundary_points(&self, epsilon: f64) -> Vec<Point> {
        let mut counted: Vec<(Point, usize)> = Vec::new();
        for line in &self.lines {
            if line.num_points() < 2 || line.is_closed_within(epsilon) {
                continue;
            }
            for end in [line.start_point(), line.end_point()].into_iter().flatten() {
                match counted.iter_mut().find(|(p, _)| p.equals_2d(end, epsilon)) {
                    Some((_, n)) => *n += 1,
                    None => counted.push((*end, 1)),
                }
            }
        }
        counted
            .into_iter()
            .filter(|(_, n)| n % 2 == 1)
            .map(|(p, _)| p)
            .collect()
    }
}

impl SimpleFeature for MultiLineString {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::MultiLineString
    }

    fn dimension(&self) -> u8 {
        1
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(LineString::is_empty)
    }

    fn is_simple(&self) -> bool {
        self.lines.iter().all(LineString::is_simple)
    }

    fn is_valid(&self) -> bool {
        self.lines.iter().all(LineString::is_valid)
    }

    fn boundary(&self) -> Option<Geometry> {
        let points = self.boundary_points(Tolerance::global().epsilon);
        if points.is_empty() {
            return None;
        }
        Some(MultiPoint::new(points).into())
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        for l in &self.lines {
            l.for_each_point(f);
        }
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        for l in &mut self.lines {
            l.for_each_point_mut(f);
        }
    }
}

// ─── MultiPolygon ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultiPolygon {
    polygons: Vec<Polygon>,
}

impl MultiPolygon {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    pub fn add_polygon(&mut self, polygon: Polygon) {
        self.polygons.push(polygon);
    }

    pub fn add_polygon_copy(&mut self, polygon: &Polygon) {
        self.polygons.push(polygon.clone());
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> Result<(), GeometryError> {
        match geometry.into_kind() {
            GeometryKind::Polygon(p) => {
                self.polygons.push(p);
                Ok(())
            }
            other => Err(wrong_kind(GeometryType::MultiPolygon, &other.into())),
        }
    }

    pub fn add_geometry_copy(&mut self, geometry: &Geometry) -> Result<(), GeometryError> {
        match geometry.kind() {
            GeometryKind::Polygon(p) => {
                self.polygons.push(p.clone());
                Ok(())
            }
            _ => Err(wrong_kind(GeometryType::MultiPolygon, geometry)),
        }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn polygons_mut(&mut self) -> &mut Vec<Polygon> {
        &mut self.polygons
    }

    pub fn into_polygons(self) -> Vec<Polygon> {
        self.polygons
    }

    pub fn num_polygons(&self) -> usize {
        self.polygons.len()
    }

    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon::area).sum()
    }
}

impl SimpleFeature for MultiPolygon {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::MultiPolygon
    }

    fn dimension(&self) -> u8 {
        2
    }

    fn is_empty(&self) -> bool {
        self.polygons.iter().all(Polygon::is_empty)
    }

    fn is_simple(&self) -> bool {
        self.polygons.iter().all(Polygon::is_simple)
    }

    fn is_valid(&self) -> bool {
        self.polygons.iter().all(Polygon::is_valid)
    }

    fn boundary(&self) -> Option<Geometry> {
        let rings: Vec<LineString> = self
            .polygons
            .iter()
            .flat_map(|p| p.rings().iter().cloned())
            .filter(|r| !r.is_empty())
            .collect();
        if rings.is_empty() {
            return None;
        }
        Some(MultiLineString::new(rings).into())
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        for p in &self.polygons {
            p.for_each_point(f);
        }
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        for p in &mut self.polygons {
            p.for_each_point_mut(f);
        }
    }
}

// ─── GeometryCollection ──────────────────────────────────────────────────────

/// An ordered, heterogeneous collection that owns its children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryCollection {
    geometries: Vec<Geometry>,
}

impl GeometryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_geometries(geometries: Vec<Geometry>) -> Self {
        Self { geometries }
    }

    /// Append a child, taking ownership.
    pub fn add_geometry(&mut self, geometry: Geometry) {
        self.geometries.push(geometry);
    }

    /// Append a deep copy of `geometry`.
    pub fn add_geometry_copy(&mut self, geometry: &Geometry) {
        self.geometries.push(geometry.clone());
    }

    pub fn remove_geometry(&mut self, index: usize) -> Result<Geometry, GeometryError> {
        if index >= self.geometries.len() {
            return Err(GeometryError::IndexOutOfRange {
                what: "geometry",
                index,
                len: self.geometries.len(),
            });
        }
        Ok(self.geometries.remove(index))
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn geometries_mut(&mut self) -> &mut Vec<Geometry> {
        &mut self.geometries
    }

    pub fn into_geometries(self) -> Vec<Geometry> {
        self.geometries
    }

    pub fn num_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn geometry_n(&self, index: usize) -> Option<&Geometry> {
        self.geometries.get(index)
    }
}

impl SimpleFeature for GeometryCollection {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::GeometryCollection
    }

    /// Largest child dimension.
    fn dimension(&self) -> u8 {
        self.geometries
            .iter()
            .map(|g| g.dimension())
            .max()
            .unwrap_or(0)
    }

    fn is_empty(&self) -> bool {
        self.geometries.iter().all(|g| g.is_empty())
    }

    fn is_simple(&self) -> bool {
        self.geometries.iter().all(|g| g.is_simple())
    }

    fn is_valid(&self) -> bool {
        self.geometries.iter().all(|g| g.is_valid())
    }

    fn boundary(&self) -> Option<Geometry> {
        let parts: Vec<Geometry> = self.geometries.iter().filter_map(|g| g.boundary()).collect();
        if parts.is_empty() {
            return None;
        }
        Some(GeometryCollection::from_geometries(parts).into())
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        for g in &self.geometries {
            g.for_each_point(f);
        }
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        for g in &mut self.geometries {
            g.for_each_point_mut(f);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_point_rejects_wrong_kind() {
        let mut mp = MultiPoint::default();
        assert!(mp.add_geometry(Point::new(1.0, 2.0).into()).is_ok());
        let line: Geometry = LineString::from_xy(&[(0.0, 0.0), (1.0, 1.0)]).into();
        let err = mp.add_geometry_copy(&line).unwrap_err();
        assert_eq!(
            err,
            GeometryError::WrongChildKind {
                collection: GeometryType::MultiPoint,
                found: GeometryType::LineString,
            }
        );
        assert_eq!(mp.num_points(), 1);
    }

    #[test]
    fn test_multi_polygon_rejects_point() {
        let mut mp = MultiPolygon::default();
        let err = mp.add_geometry(Point::new(0.0, 0.0).into()).unwrap_err();
        assert!(matches!(err, GeometryError::WrongChildKind { found: GeometryType::Point, .. }));
    }

    #[test]
    fn test_multi_line_string_mod2_boundary() {
        // Two lines meeting end to end: the shared node is interior.
        let mls = MultiLineString::new(vec![
            LineString::from_xy(&[(0.0, 0.0), (1.0, 0.0)]),
            LineString::from_xy(&[(1.0, 0.0), (2.0, 0.0)]),
        ]);
        let pts = mls.boundary_points(1e-7);
        assert_eq!(pts.len(), 2);
        assert!(pts.iter().all(|p| !p.equals_2d(&Point::new(1.0, 0.0), 1e-7)));
    }

    #[test]
    fn test_multi_point_simplicity() {
        let dup = MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(0.0, 0.0)]);
        assert!(!dup.is_simple());
        let distinct = MultiPoint::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(distinct.is_simple());
    }

    #[test]
    fn test_collection_copy_and_remove() {
        let mut gc = GeometryCollection::new();
        let p: Geometry = Point::new(1.0, 1.0).into();
        gc.add_geometry_copy(&p);
        gc.add_geometry(p);
        assert_eq!(gc.num_geometries(), 2);
        assert!(gc.remove_geometry(2).is_err());
        let removed = gc.remove_geometry(0).unwrap();
        assert_eq!(removed.as_point(), Some(&Point::new(1.0, 1.0)));
        assert_eq!(gc.num_geometries(), 1);
    }

    #[test]
    fn test_empty_collection() {
        let gc = GeometryCollection::new();
        assert!(gc.is_empty());
        assert_eq!(gc.dimension(), 0);
        assert!(gc.boundary().is_none());
    }
}
