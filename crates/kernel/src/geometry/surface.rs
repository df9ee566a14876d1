use serde::{Deserialize, Serialize};

use super::collection::MultiLineString;
use super::line_string::LineString;
use super::point::Point;
use super::polygon::Polygon;
use super::{Geometry, GeometryError, GeometryType, SimpleFeature};
use crate::Tolerance;

/// A surface made of polygon patches joined along shared edges.
/// TIN input decodes to this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyhedralSurface {
    patches: Vec<Polygon>,
}

impl PolyhedralSurface {
    pub fn new(patches: Vec<Polygon>) -> Self {
        Self { patches }
    }

    pub fn add_patch(&mut self, patch: Polygon) {
        self.patches.push(patch);
    }

    pub fn add_patch_copy(&mut self, patch: &Polygon) {
        self.patches.push(patch.clone());
    }

    pub fn remove_patch(&mut self, index: usize) -> Result<Polygon, GeometryError> {
        if index >= self.patches.len() {
            return Err(GeometryError::IndexOutOfRange {
                what: "patch",
                index,
                len: self.patches.len(),
            });
        }
        Ok(self.patches.remove(index))
    }

    pub fn patches(&self) -> &[Polygon] {
        &self.patches
    }

    pub fn patches_mut(&mut self) -> &mut Vec<Polygon> {
        &mut self.patches
    }

    pub fn num_patches(&self) -> usize {
        self.patches.len()
    }

    pub fn patch_n(&self, index: usize) -> Option<&Polygon> {
        self.patches.get(index)
    }

    pub fn area(&self) -> f64 {
        self.patches.iter().map(Polygon::area).sum()
    }

    /// Ring edges used by exactly one patch, in either direction.
    fn free_edges(&self, epsilon: f64) -> Vec<(Point, Point)> {
        let edges: Vec<(Point, Point)> = self
            .patches
            .iter()
            .flat_map(|p| p.rings().iter())
            .flat_map(|r| r.segments().map(|(a, b)| (*a, *b)))
            .collect();
        let same = |a: &(Point, Point), b: &(Point, Point)| {
            (a.0.equals_3d(&b.0, epsilon) && a.1.equals_3d(&b.1, epsilon))
                || (a.0.equals_3d(&b.1, epsilon) && a.1.equals_3d(&b.0, epsilon))
        };
        edges
            .iter()
            .enumerate()
            .filter(|(i, e)| {
                !edges
                    .iter()
                    .enumerate()
                    .any(|(j, other)| *i != j && same(e, other))
            })
            .map(|(_, e)| *e)
            .collect()
    }
}

impl SimpleFeature for PolyhedralSurface {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::PolyhedralSurface
    }

    fn dimension(&self) -> u8 {
        2
    }

    fn is_empty(&self) -> bool {
        self.patches.iter().all(Polygon::is_empty)
    }

    fn is_simple(&self) -> bool {
        self.patches.iter().all(Polygon::is_simple)
    }

    fn is_valid(&self) -> bool {
        self.patches.iter().all(Polygon::is_valid)
    }

    /// Edges not shared between two patches; empty for a closed shell.
    fn boundary(&self) -> Option<Geometry> {
        let edges = self.free_edges(Tolerance::global().epsilon);
        if edges.is_empty() {
            return None;
        }
        let lines = edges
            .into_iter()
            .map(|(a, b)| LineString::new(vec![a, b]))
            .collect();
        Some(MultiLineString::new(lines).into())
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        for p in &self.patches {
            p.for_each_point(f);
        }
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        for p in &mut self.patches {
            p.for_each_point_mut(f);
        }
    }
}
