//! Union and difference of polygon sets on the buffer node graph.
//!
//! All rings go into one graph and are split against each other. Each
//! resulting sub-edge is kept, flipped or dropped by probing the result's
//! membership just left and right of its midpoint, so that the kept edges
//! always run with the result on their left. Tracing those edges yields
//! counter-clockwise shells and clockwise holes.

use tracing::{debug, instrument};

use crate::Tolerance;
use crate::algorithm::ring::locate_in_polygon;
use crate::geometry::{Point, Polygon};
use crate::relate::Location;

use super::graph::{NodeGraph, assemble};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayOp {
    Union,
    Difference,
}

fn inside_any(p: &Point, polygons: &[Polygon], epsilon: f64) -> bool {
    polygons
        .iter()
        .any(|poly| locate_in_polygon(p, poly, epsilon) == Location::Interior)
}

/// `a op b`. For a union, overlapping members of `a` itself are merged too.
#[instrument(skip_all, fields(op = ?op, a = a.len(), b = b.len()))]
pub fn overlay(a: &[Polygon], b: &[Polygon], op: OverlayOp, tolerance: Tolerance) -> Vec<Polygon> {
    let eps = tolerance.epsilon;
    let mut graph = NodeGraph::new(tolerance);
    for poly in a.iter().chain(b) {
        for ring in poly.rings() {
            graph.add_path(ring.points(), false);
        }
    }
    graph.resolve();

    let member = |p: &Point| {
        let (in_a, in_b) = (inside_any(p, a, eps), inside_any(p, b, eps));
        match op {
            OverlayOp::Union => in_a || in_b,
            OverlayOp::Difference => in_a && !in_b,
        }
    };

    let mut keep = Vec::new();
    for (from, to) in graph.undirected_edges() {
        let (Some(p), Some(q)) = (graph.point(from), graph.point(to)) else {
            continue;
        };
        let d = q - p;
        let Some(unit) = d.normalize() else {
            continue;
        };
        let delta = (1e3 * eps).min(0.25 * d.length());
        let mid = p.midpoint(&q);
        let right = unit.right_normal() * delta;
        match (member(&(mid - right)), member(&(mid + right))) {
            (true, false) => keep.push((from, to)),
            (false, true) => keep.push((to, from)),
            _ => {}
        }
    }
    debug!(kept = keep.len(), "overlay edges classified");

    graph.clear_edges();
    for (from, to) in keep {
        graph.add_edge(from, to);
    }
    assemble(graph.extract_rings(), eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::LineString;

    fn square(x0: f64, y0: f64, size: f64) -> Polygon {
        Polygon::new(LineString::from_xy(&[
            (x0, y0),
            (x0 + size, y0),
            (x0 + size, y0 + size),
            (x0, y0 + size),
            (x0, y0),
        ]))
    }

    fn total_area(polys: &[Polygon]) -> f64 {
        polys.iter().map(Polygon::area).sum()
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let out = overlay(&[square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)], &[], OverlayOp::Union, Tolerance::default());
        assert_eq!(out.len(), 1);
        assert!((total_area(&out) - 7.0).abs() < 1e-9);
        assert_eq!(out[0].exterior_ring().unwrap().num_points(), 9);
    }

    #[test]
    fn test_union_of_disjoint_squares() {
        let out = overlay(&[square(0.0, 0.0, 1.0)], &[square(5.0, 0.0, 1.0)], OverlayOp::Union, Tolerance::default());
        assert_eq!(out.len(), 2);
        assert!((total_area(&out) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_of_squares_sharing_an_edge() {
        let out = overlay(&[square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)], &[], OverlayOp::Union, Tolerance::default());
        assert_eq!(out.len(), 1);
        assert!((total_area(&out) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_cuts_a_hole() {
        let out = overlay(&[square(0.0, 0.0, 10.0)], &[square(2.0, 2.0, 2.0)], OverlayOp::Difference, Tolerance::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].num_interior_rings(), 1);
        assert!((out[0].area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_clips_an_edge() {
        let out = overlay(&[square(0.0, 0.0, 2.0)], &[square(1.0, -1.0, 4.0)], OverlayOp::Difference, Tolerance::default());
        assert_eq!(out.len(), 1);
        assert!((total_area(&out) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_removing_everything() {
        let out = overlay(&[square(1.0, 1.0, 1.0)], &[square(0.0, 0.0, 5.0)], OverlayOp::Difference, Tolerance::default());
        assert!(out.is_empty());
    }
}
