use serde::{Deserialize, Serialize};

use super::collection::MultiPoint;
use super::point::Point;
use super::{Geometry, GeometryType, SimpleFeature};
use crate::Tolerance;
use crate::algorithm::{distance, simple};

/// A curve with linear interpolation between its points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    points: Vec<Point>,
}

impl LineString {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build from `(x, y)` pairs.
    pub fn from_xy(coords: &[(f64, f64)]) -> Self {
        Self::new(coords.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    pub fn point_n(&self, index: usize) -> Option<&Point> {
        self.points.get(index)
    }

    pub fn start_point(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn end_point(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Consecutive point pairs.
    pub fn segments(&self) -> impl Iterator<Item = (&Point, &Point)> + '_ {
        self.points.windows(2).map(|w| (&w[0], &w[1]))
    }

    /// First and last point coincide within the global epsilon.
    pub fn is_closed(&self) -> bool {
        self.is_closed_within(Tolerance::global().epsilon)
    }

    pub fn is_closed_within(&self, epsilon: f64) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() > 1 => a.equals_3d(b, epsilon),
            _ => false,
        }
    }

    /// Closed and simple.
    pub fn is_ring(&self) -> bool {
        self.is_closed() && self.is_simple()
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| a.distance_to(b)).sum()
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn reversed(&self) -> Self {
        let mut line = self.clone();
        line.reverse();
        line
    }

    /// Drop interior points whose accumulated deviation from the chord
    /// through their neighbours stays within `epsilon`. The end points are
    /// always kept. Returns the number of removed points.
    pub fn remove_collinear_points(&mut self, epsilon: f64) -> usize {
        let n = self.points.len();
        if n < 3 {
            return 0;
        }
        let mut kept = Vec::with_capacity(n);
        let mut start = self.points[0];
        kept.push(start);
        let mut accumulated = 0.0;
        for i in 1..n - 1 {
            let middle = self.points[i];
            let end = self.points[i + 1];
            accumulated += distance::point_segment_distance(&middle, &start, &end);
            if accumulated > epsilon {
                kept.push(middle);
                accumulated = 0.0;
                start = middle;
            }
        }
        kept.push(self.points[n - 1]);
        let removed = n - kept.len();
        self.points = kept;
        removed
    }
}

impl SimpleFeature for LineString {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::LineString
    }

    fn dimension(&self) -> u8 {
        1
    }

    fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn is_simple(&self) -> bool {
        simple::is_simple_path(&self.points, Tolerance::global().epsilon)
    }

    fn is_valid(&self) -> bool {
        if self.points.is_empty() {
            return true;
        }
        let eps = Tolerance::global().epsilon;
        let first = self.points[0];
        self.points.iter().all(Point::is_finite)
            && self.points.iter().any(|p| !p.equals_2d(&first, eps))
    }

    /// The two end points, or nothing for a closed or empty curve.
    fn boundary(&self) -> Option<Geometry> {
        if self.points.len() < 2 || self.is_closed() {
            return None;
        }
        let (start, end) = (self.points[0], self.points[self.points.len() - 1]);
        Some(MultiPoint::new(vec![start, end]).into())
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        self.points.iter().for_each(f)
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        self.points.iter_mut().for_each(f)
    }
}

impl FromIterator<Point> for LineString {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
