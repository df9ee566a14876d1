//! Directed node graph used to untangle raw offset curves and to overlay
//! areas.
//!
//! Nodes and edges live in slot maps so that splitting and merging can
//! retire keys without invalidating the others. Every live edge is kept in
//! a [`Bsp`] keyed by its [`EdgeId`].

use std::collections::{HashMap, HashSet};

use slotmap::{SlotMap, new_key_type};
use tracing::{debug, trace, warn};

use crate::Tolerance;
use crate::algorithm::distance::point_segment_distance;
use crate::algorithm::ring::{locate_in_ring, signed_area};
use crate::algorithm::segment::crossing;
use crate::geometry::{Envelope, LineString, Point, Polygon, Vec2};
use crate::index::Bsp;
use crate::relate::Location;

// ─── Keys ────────────────────────────────────────────────────────────────────

new_key_type! {
    pub struct NodeId;
    pub struct EdgeId;
}

#[derive(Debug, Clone)]
struct Node {
    point: Point,
    outgoing: Vec<NodeId>,
    incoming: Vec<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    from: NodeId,
    to: NodeId,
}

/// Where one edge has to be cut because of another.
#[derive(Debug, Clone, Copy)]
enum Cut {
    /// A node of the other edge lies inside the first.
    OnFirst(NodeId),
    /// A node of the first edge lies inside the other.
    OnSecond(NodeId),
    /// The two cross properly at a point that is no existing node.
    Cross(Point),
}

/// Closed rings traced out of a graph, sorted by orientation.
#[derive(Debug, Default, Clone)]
pub struct Rings {
    /// Counter-clockwise rings.
    pub shells: Vec<LineString>,
    /// Clockwise rings.
    pub holes: Vec<LineString>,
}

// ─── Graph ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct NodeGraph {
    nodes: SlotMap<NodeId, Node>,
    edges: SlotMap<EdgeId, Edge>,
    by_ends: HashMap<(NodeId, NodeId), EdgeId>,
    index: Bsp<EdgeId>,
    epsilon: f64,
    position_epsilon: f64,
}

impl NodeGraph {
    pub fn new(tolerance: Tolerance) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            by_ends: HashMap::new(),
            index: Bsp::new(),
            epsilon: tolerance.epsilon,
            position_epsilon: tolerance.position_epsilon(),
        }
    }

    /// A graph holding `points` as one closed loop of directed edges.
    pub fn from_loop(points: &[Point], tolerance: Tolerance) -> Self {
        let mut graph = Self::new(tolerance);
        graph.add_path(points, true);
        graph
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn add_node(&mut self, point: Point) -> NodeId {
        self.nodes.insert(Node {
            point: point.to_2d(),
            outgoing: Vec::new(),
            incoming: Vec::new(),
        })
    }

    /// One node per point and an edge between consecutive points, plus a
    /// closing edge when `closed`.
    pub fn add_path(&mut self, points: &[Point], closed: bool) {
        let ids: Vec<NodeId> = points.iter().map(|p| self.add_node(*p)).collect();
        for w in ids.windows(2) {
            self.add_edge(w[0], w[1]);
        }
        if closed {
            if let (Some(&first), Some(&last)) = (ids.first(), ids.last()) {
                self.add_edge(last, first);
            }
        }
    }

    pub fn point(&self, node: NodeId) -> Option<Point> {
        self.nodes.get(node).map(|n| n.point)
    }

    /// Add `from -> to` unless it is a loop or already present.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        if from == to || self.by_ends.contains_key(&(from, to)) {
            return None;
        }
        let (a, b) = (self.nodes.get(from)?.point, self.nodes.get(to)?.point);
        let id = self.edges.insert(Edge { from, to });
        self.by_ends.insert((from, to), id);
        self.index.insert(id, Envelope::of_segment(&a, &b));
        self.nodes[from].outgoing.push(to);
        self.nodes[to].incoming.push(from);
        Some(id)
    }

    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> bool {
        let Some(id) = self.by_ends.remove(&(from, to)) else {
            return false;
        };
        self.edges.remove(id);
        self.index.remove(&id);
        if let Some(n) = self.nodes.get_mut(from) {
            n.outgoing.retain(|k| *k != to);
        }
        if let Some(n) = self.nodes.get_mut(to) {
            n.incoming.retain(|k| *k != from);
        }
        true
    }

    pub fn remove_node(&mut self, node: NodeId) {
        let Some(n) = self.nodes.get(node) else {
            return;
        };
        let (outgoing, incoming) = (n.outgoing.clone(), n.incoming.clone());
        for to in outgoing {
            self.remove_edge(node, to);
        }
        for from in incoming {
            self.remove_edge(from, node);
        }
        self.nodes.remove(node);
    }

    /// Drop every edge, keeping the nodes.
    pub fn clear_edges(&mut self) {
        self.edges.clear();
        self.by_ends.clear();
        self.index = Bsp::new();
        for n in self.nodes.values_mut() {
            n.outgoing.clear();
            n.incoming.clear();
        }
    }

    /// Each edge once, regardless of direction.
    pub fn undirected_edges(&self) -> Vec<(NodeId, NodeId)> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for e in self.edges.values() {
            let key = if e.from < e.to { (e.from, e.to) } else { (e.to, e.from) };
            if seen.insert(key) {
                out.push((e.from, e.to));
            }
        }
        out
    }

    fn ends(&self, edge: &Edge) -> (Point, Point) {
        (self.nodes[edge.from].point, self.nodes[edge.to].point)
    }

    /// Move every edge of `gone` onto `keep` and delete `gone`.
    fn merge_into(&mut self, keep: NodeId, gone: NodeId) {
        let Some(n) = self.nodes.get(gone) else {
            return;
        };
        let (outgoing, incoming) = (n.outgoing.clone(), n.incoming.clone());
        for to in outgoing {
            self.remove_edge(gone, to);
            self.add_edge(keep, to);
        }
        for from in incoming {
            self.remove_edge(from, gone);
            self.add_edge(from, keep);
        }
        self.nodes.remove(gone);
    }

    /// Merge nodes lying within the position epsilon of each other.
    /// Returns the number of nodes removed.
    pub fn coalesce(&mut self) -> usize {
        let mut points = Bsp::build(self.nodes.iter().map(|(id, n)| (id, Envelope::of_point(&n.point))));
        let ids: Vec<NodeId> = self.nodes.keys().collect();
        let mut merged = 0;
        for id in ids {
            let Some(p) = self.point(id) else {
                continue;
            };
            for other in points.query(&Envelope::of_point(&p), self.position_epsilon) {
                if other == id {
                    continue;
                }
                let near = self
                    .point(other)
                    .is_some_and(|q| q.distance_to(&p) < self.position_epsilon);
                if near {
                    self.merge_into(id, other);
                    points.remove(&other);
                    merged += 1;
                }
            }
        }
        merged
    }

    /// Whether `p` lies on `a -> b` away from both ends.
    fn inside_segment(&self, p: &Point, a: &Point, b: &Point) -> bool {
        point_segment_distance(p, a, b) < self.position_epsilon
            && p.distance_to(a) >= self.position_epsilon
            && p.distance_to(b) >= self.position_epsilon
    }

    fn find_cut(&self, e: &Edge, f: &Edge) -> Option<Cut> {
        let (a, b) = self.ends(e);
        let (c, d) = self.ends(f);
        let shared = |n: NodeId, edge: &Edge| n == edge.from || n == edge.to;

        for (n, p) in [(f.from, c), (f.to, d)] {
            if !shared(n, e) && self.inside_segment(&p, &a, &b) {
                return Some(Cut::OnFirst(n));
            }
        }
        for (n, p) in [(e.from, a), (e.to, b)] {
            if !shared(n, f) && self.inside_segment(&p, &c, &d) {
                return Some(Cut::OnSecond(n));
            }
        }
        if shared(f.from, e) || shared(f.to, e) {
            return None;
        }
        let x = crossing(&a, &b, &c, &d, self.epsilon)?.point;
        let at_end = [a, b, c, d]
            .iter()
            .any(|q| q.distance_to(&x) < self.position_epsilon);
        (!at_end).then_some(Cut::Cross(x))
    }

    /// Replace `edge` by two edges through `at`.
    fn split_edge(&mut self, edge: Edge, at: NodeId, pending: &mut Vec<EdgeId>) {
        self.remove_edge(edge.from, edge.to);
        pending.extend(self.add_edge(edge.from, at));
        pending.extend(self.add_edge(at, edge.to));
    }

    /// Split edges at every mutual intersection until no two edges cross
    /// and no node lies inside an edge. Returns the number of cuts made.
    pub fn split_crossings(&mut self) -> usize {
        let mut pending: Vec<EdgeId> = self.edges.keys().collect();
        let mut budget = 16 * self.edges.len() + 1024;
        let mut cuts = 0;

        'edges: while let Some(id) = pending.pop() {
            let Some(edge) = self.edges.get(id).copied() else {
                continue;
            };
            let (a, b) = self.ends(&edge);
            for other_id in self.index.query(&Envelope::of_segment(&a, &b), self.position_epsilon) {
                if other_id == id {
                    continue;
                }
                let Some(other) = self.edges.get(other_id).copied() else {
                    continue;
                };
                let Some(cut) = self.find_cut(&edge, &other) else {
                    continue;
                };
                if budget == 0 {
                    warn!(cuts, nodes = self.nodes.len(), "split budget exhausted");
                    return cuts;
                }
                budget -= 1;
                cuts += 1;
                match cut {
                    Cut::OnFirst(n) => {
                        trace!(node = ?n, "edge split at node");
                        self.split_edge(edge, n, &mut pending);
                        continue 'edges;
                    }
                    Cut::OnSecond(n) => {
                        trace!(node = ?n, "edge split at node");
                        self.split_edge(other, n, &mut pending);
                    }
                    Cut::Cross(p) => {
                        trace!(x = p.x, y = p.y, "edges split at crossing");
                        let n = self.add_node(p);
                        self.split_edge(edge, n, &mut pending);
                        self.split_edge(other, n, &mut pending);
                        continue 'edges;
                    }
                }
            }
        }
        cuts
    }

    /// Coalesce close nodes, then split every crossing.
    pub fn resolve(&mut self) {
        let merged = self.coalesce();
        let cuts = self.split_crossings();
        debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            merged,
            cuts,
            "node graph resolved"
        );
    }

    /// Remove every node closer than `min_distance` to one of `reference`'s
    /// segments. Returns the number of nodes removed.
    pub fn prune_near(&mut self, reference: &[(Point, Point)], min_distance: f64) -> usize {
        let segments = Bsp::build(
            reference
                .iter()
                .enumerate()
                .map(|(i, (a, b))| (i, Envelope::of_segment(a, b))),
        );
        let doomed: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(_, n)| {
                segments
                    .query(&Envelope::of_point(&n.point), min_distance)
                    .into_iter()
                    .any(|i| {
                        let (a, b) = &reference[i];
                        point_segment_distance(&n.point, a, b) < min_distance
                    })
            })
            .map(|(id, _)| id)
            .collect();
        for id in &doomed {
            self.remove_node(*id);
        }
        doomed.len()
    }

    /// The outgoing neighbour turning most clockwise from `heading`.
    fn rightmost(
        &self,
        node: NodeId,
        heading: Vec2,
        traversed: &HashSet<(NodeId, NodeId)>,
    ) -> Option<NodeId> {
        let here = self.nodes.get(node)?;
        here.outgoing
            .iter()
            .filter(|n| !traversed.contains(&(node, **n)))
            .map(|n| {
                let dir = self.nodes[*n].point - here.point;
                (*n, heading.perp_dot(&dir).atan2(heading.dot(&dir)))
            })
            .min_by(|x, y| x.1.total_cmp(&y.1))
            .map(|(n, _)| n)
    }

    /// Trace closed rings by always taking the most clockwise turn, starting
    /// from each node in order of increasing x. An edge belongs to at most
    /// one ring.
    pub fn extract_rings(&self) -> Rings {
        let mut order: Vec<NodeId> = self.nodes.keys().collect();
        order.sort_by(|a, b| {
            let (p, q) = (self.nodes[*a].point, self.nodes[*b].point);
            p.x.total_cmp(&q.x).then(p.y.total_cmp(&q.y))
        });

        let mut traversed: HashSet<(NodeId, NodeId)> = HashSet::new();
        let mut rings = Rings::default();
        for start in order {
            let mut path = vec![start];
            let mut on_path: HashMap<NodeId, usize> = HashMap::from([(start, 0)]);
            let mut heading = Vec2::X;
            let mut current = start;
            while path.len() <= self.nodes.len() {
                let Some(next) = self.rightmost(current, heading, &traversed) else {
                    break;
                };
                if let Some(&at) = on_path.get(&next) {
                    let cycle = &path[at..];
                    traversed.extend(cycle.windows(2).map(|w| (w[0], w[1])));
                    traversed.insert((current, next));
                    self.classify(cycle, &mut rings);
                    break;
                }
                heading = self.nodes[next].point - self.nodes[current].point;
                on_path.insert(next, path.len());
                path.push(next);
                current = next;
            }
        }
        debug!(shells = rings.shells.len(), holes = rings.holes.len(), "rings extracted");
        rings
    }

    fn classify(&self, cycle: &[NodeId], rings: &mut Rings) {
        let mut points: Vec<Point> = cycle.iter().map(|n| self.nodes[*n].point).collect();
        if let Some(first) = points.first().copied() {
            points.push(first);
        }
        let area = signed_area(&points);
        if points.len() < 4 || area.abs() <= self.epsilon {
            warn!(points = points.len(), area, "degenerate ring dropped");
            return;
        }
        if area > 0.0 {
            rings.shells.push(LineString::new(points));
        } else {
            rings.holes.push(LineString::new(points));
        }
    }
}

// ─── Assembly ────────────────────────────────────────────────────────────────

/// Pair every hole with the smallest shell containing it. Holes outside
/// every shell are dropped.
pub fn assemble(rings: Rings, epsilon: f64) -> Vec<Polygon> {
    let mut shells: Vec<(f64, Polygon)> = rings
        .shells
        .into_iter()
        .map(|r| (signed_area(r.points()).abs(), Polygon::new(r)))
        .collect();
    shells.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut orphans = 0;
    for hole in rings.holes {
        let owner = shells.iter_mut().find(|(_, shell)| {
            let Some(ring) = shell.exterior_ring() else {
                return false;
            };
            let mut located = hole
                .points()
                .iter()
                .map(|p| locate_in_ring(p, ring.points(), epsilon))
                .filter(|l| *l != Location::Boundary);
            located.next().is_none_or(|l| l == Location::Interior)
        });
        match owner {
            Some((_, shell)) => shell.add_ring(hole),
            None => orphans += 1,
        }
    }
    if orphans > 0 {
        debug!(orphans, "holes outside every shell dropped");
    }
    shells.into_iter().map(|(_, p)| p).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tol() -> Tolerance {
        Tolerance::default()
    }

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    #[test]
    fn test_simple_loop_is_one_shell() {
        let g = NodeGraph::from_loop(&pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]), tol());
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_edges(), 4);
        let rings = g.extract_rings();
        assert_eq!(rings.shells.len(), 1);
        assert!(rings.holes.is_empty());
        assert!((signed_area(rings.shells[0].points()) - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_clockwise_loop_is_a_hole() {
        let g = NodeGraph::from_loop(&pts(&[(0.0, 0.0), (0.0, 3.0), (4.0, 3.0), (4.0, 0.0)]), tol());
        let rings = g.extract_rings();
        assert!(rings.shells.is_empty());
        assert_eq!(rings.holes.len(), 1);
    }

    #[test]
    fn test_coalesce_rewires_neighbours() {
        let mut g = NodeGraph::from_loop(
            &pts(&[(0.0, 0.0), (2.0, 0.0), (2.0, 0.0000001), (2.0, 2.0), (0.0, 2.0)]),
            tol(),
        );
        assert_eq!(g.coalesce(), 1);
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_edges(), 4);
        assert_eq!(g.extract_rings().shells.len(), 1);
    }

    #[test]
    fn test_figure_eight_splits_into_two_loops() {
        // A bow tie: one lobe counter-clockwise, the other clockwise.
        let mut g = NodeGraph::from_loop(&pts(&[(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]), tol());
        g.resolve();
        assert_eq!(g.num_nodes(), 5);
        assert_eq!(g.num_edges(), 6);
        let rings = g.extract_rings();
        assert_eq!(rings.shells.len() + rings.holes.len(), 2);
        assert_eq!(rings.shells.len(), 1);
    }

    #[test]
    fn test_node_on_edge_interior_is_cut() {
        let mut g = NodeGraph::new(tol());
        g.add_path(&pts(&[(0.0, 0.0), (4.0, 0.0)]), false);
        g.add_path(&pts(&[(2.0, 0.0), (2.0, 2.0)]), false);
        g.coalesce();
        assert_eq!(g.split_crossings(), 1);
        assert_eq!(g.num_edges(), 3);
    }

    #[test]
    fn test_prune_removes_close_nodes() {
        let mut g = NodeGraph::from_loop(&pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 3.0), (0.0, 3.0)]), tol());
        let reference = [(Point::new(0.0, -1.0), Point::new(4.0, -1.0))];
        assert_eq!(g.prune_near(&reference, 1.5), 2);
        assert_eq!(g.num_nodes(), 2);
        assert_eq!(g.num_edges(), 1);
        assert!(g.extract_rings().shells.is_empty());
    }

    #[test]
    fn test_assemble_assigns_hole_to_smallest_shell() {
        let outer = LineString::new(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]));
        let inner = LineString::new(pts(&[(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0), (2.0, 2.0)]));
        let hole = LineString::new(pts(&[(3.0, 3.0), (3.0, 4.0), (4.0, 4.0), (4.0, 3.0), (3.0, 3.0)]));
        let stray = LineString::new(pts(&[(20.0, 20.0), (20.0, 21.0), (21.0, 21.0), (21.0, 20.0), (20.0, 20.0)]));
        let polys = assemble(
            Rings {
                shells: vec![outer, inner],
                holes: vec![hole, stray],
            },
            1e-7,
        );
        assert_eq!(polys.len(), 2);
        assert_eq!(polys[0].num_interior_rings(), 1);
        assert_eq!(polys[1].num_interior_rings(), 0);
    }
}
