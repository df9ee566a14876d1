//! Buffer (offset) engine.
//!
//! A buffer is built in two stages. [`offset`] walks the input and emits a
//! raw, self-intersecting offset curve; [`graph`] splits that curve at its
//! crossings, discards the parts that came too close to the input and
//! traces the remaining rings. Areas and collections are combined with the
//! crate-internal area overlay.

pub mod graph;
pub mod offset;
pub(crate) mod overlay;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Tolerance;
use crate::algorithm::ring::signed_area;
use crate::geometry::{
    Geometry, GeometryCollection, GeometryKind, LineString, MultiPolygon, Point, Polygon,
    SimpleFeature,
};

use graph::{NodeGraph, Rings, assemble};
use offset::{Convolver, point_ring};
use overlay::{OverlayOp, overlay};

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Shape of the ends of a buffered open curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndCap {
    /// Half circle around each end point.
    #[default]
    Round,
    /// Cut square at each end point.
    Flat,
}

/// How the buffers of the members of a collection are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnionPolicy {
    /// Union everything into one (multi)polygon.
    #[default]
    Merge,
    /// Keep one buffer per member in a geometry collection.
    Disjoint,
}

/// Parameters of a buffer operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferParams {
    /// Arc segments per quarter circle. Values below one are treated as one.
    pub quadrant_segments: u32,
    pub end_cap: EndCap,
    pub union_policy: UnionPolicy,
    /// Offset vertices closer to the input than this multiple of the
    /// distance are discarded before rings are traced.
    pub spurious_ring_factor: f64,
}

impl Default for BufferParams {
    fn default() -> Self {
        Self {
            quadrant_segments: 8,
            end_cap: EndCap::Round,
            union_policy: UnionPolicy::Merge,
            spurious_ring_factor: 0.8,
        }
    }
}

impl BufferParams {
    pub fn with_quadrant_segments(mut self, segments: u32) -> Self {
        self.quadrant_segments = segments.max(1);
        self
    }

    pub fn with_end_cap(mut self, end_cap: EndCap) -> Self {
        self.end_cap = end_cap;
        self
    }

    pub fn with_union_policy(mut self, union_policy: UnionPolicy) -> Self {
        self.union_policy = union_policy;
        self
    }

    pub fn with_spurious_ring_factor(mut self, factor: f64) -> Self {
        self.spurious_ring_factor = factor;
        self
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

fn polygons_into_geometry(mut polygons: Vec<Polygon>) -> Option<Geometry> {
    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::from),
        _ => Some(MultiPolygon::new(polygons).into()),
    }
}

fn into_polygons(g: Geometry) -> Vec<Polygon> {
    match g.into_kind() {
        GeometryKind::Polygon(p) => vec![p],
        GeometryKind::MultiPolygon(mp) => mp.into_polygons(),
        GeometryKind::GeometryCollection(gc) => gc
            .geometries()
            .iter()
            .cloned()
            .flat_map(into_polygons)
            .collect(),
        _ => Vec::new(),
    }
}

fn largest(rings: Vec<LineString>) -> Option<LineString> {
    rings
        .into_iter()
        .max_by(|a, b| signed_area(a.points()).abs().total_cmp(&signed_area(b.points()).abs()))
}

/// Computes the region within a distance of a geometry.
///
/// Degenerate results are `None`: a negative distance around a point or a
/// curve, a curve whose points all coincide, or an inset that swallows the
/// whole area.
#[derive(Debug, Clone)]
pub struct Buffer {
    params: BufferParams,
    tolerance: Tolerance,
}

impl Buffer {
    pub fn new(params: BufferParams) -> Self {
        Self::with_tolerance(params, Tolerance::global())
    }

    pub fn with_tolerance(params: BufferParams, tolerance: Tolerance) -> Self {
        Self { params, tolerance }
    }

    pub fn params(&self) -> &BufferParams {
        &self.params
    }

    /// Buffer `geometry` by the signed `distance`. A zero distance or an
    /// empty input returns a copy of the input.
    #[instrument(skip(self, geometry), fields(kind = %geometry.geometry_type()))]
    pub fn apply(&self, geometry: &Geometry, distance: f64) -> Option<Geometry> {
        if distance == 0.0 || geometry.is_empty() {
            return Some(geometry.clone());
        }
        let result = self.buffer(geometry, distance);
        if result.is_none() {
            debug!("buffer is degenerate");
        }
        result
    }

    fn buffer(&self, geometry: &Geometry, distance: f64) -> Option<Geometry> {
        match geometry.kind() {
            GeometryKind::Point(p) => self.point(p, distance).map(Geometry::from),
            GeometryKind::LineString(l) => self.line(l.points(), distance),
            GeometryKind::Polygon(p) => self.polygon(p, distance),
            GeometryKind::MultiPoint(mp) => self.combine(
                mp.points()
                    .iter()
                    .filter_map(|p| self.point(p, distance).map(Geometry::from))
                    .collect(),
            ),
            GeometryKind::MultiLineString(ml) => self.combine(
                ml.lines()
                    .iter()
                    .filter_map(|l| self.line(l.points(), distance))
                    .collect(),
            ),
            GeometryKind::MultiPolygon(mp) => self.combine(
                mp.polygons()
                    .iter()
                    .filter_map(|p| self.polygon(p, distance))
                    .collect(),
            ),
            GeometryKind::PolyhedralSurface(s) => self.combine(
                s.patches()
                    .iter()
                    .filter_map(|p| self.polygon(p, distance))
                    .collect(),
            ),
            GeometryKind::GeometryCollection(gc) => self.combine(
                gc.geometries()
                    .iter()
                    .filter(|g| !g.is_empty())
                    .filter_map(|g| self.buffer(g, distance))
                    .collect(),
            ),
        }
    }

    fn point(&self, p: &Point, distance: f64) -> Option<Polygon> {
        if distance < 0.0 || p.is_empty_point() {
            return None;
        }
        Some(Polygon::new(LineString::new(point_ring(
            p,
            distance,
            self.params.quadrant_segments,
        ))))
    }

    fn line(&self, points: &[Point], distance: f64) -> Option<Geometry> {
        let rings = self.line_rings(points, distance, self.params.end_cap)?;
        polygons_into_geometry(assemble(rings, self.tolerance.epsilon))
    }

    /// Rings of the region within `distance` of a polyline.
    fn line_rings(&self, points: &[Point], distance: f64, end_cap: EndCap) -> Option<Rings> {
        if distance < 0.0 {
            return None;
        }
        let mut line: LineString = points.iter().map(Point::to_2d).collect();
        line.remove_collinear_points(self.tolerance.epsilon);
        let points = line.points();
        match points {
            [] => None,
            [p] => Some(Rings {
                shells: vec![LineString::new(point_ring(p, distance, self.params.quadrant_segments))],
                holes: Vec::new(),
            }),
            _ => {
                let raw = Convolver::new(
                    distance,
                    self.params.quadrant_segments,
                    end_cap,
                    self.tolerance.epsilon,
                )
                .line(points)?;
                self.deconvolve(&raw, points, distance)
            }
        }
    }

    /// Untangle a raw offset curve of `reference` into rings.
    #[instrument(skip_all, fields(raw = raw.len()))]
    fn deconvolve(&self, raw: &[Point], reference: &[Point], distance: f64) -> Option<Rings> {
        if raw.len() < 3 {
            return None;
        }
        let mut graph = NodeGraph::from_loop(raw, self.tolerance);
        graph.resolve();

        let segments: Vec<(Point, Point)> = reference.windows(2).map(|w| (w[0], w[1])).collect();
        let pruned = graph.prune_near(&segments, self.params.spurious_ring_factor * distance);
        let rings = graph.extract_rings();
        debug!(
            pruned,
            shells = rings.shells.len(),
            holes = rings.holes.len(),
            "offset curve deconvolved"
        );
        (!rings.shells.is_empty() || !rings.holes.is_empty()).then_some(rings)
    }

    fn polygon(&self, polygon: &Polygon, distance: f64) -> Option<Geometry> {
        let exterior = polygon.exterior_ring().filter(|r| !r.is_empty())?;
        let width = distance.abs();
        let outline = self.line_rings(exterior.points(), width, EndCap::Round)?;

        let mut result: Vec<Polygon> = if distance > 0.0 {
            largest(outline.shells).map(Polygon::new).into_iter().collect()
        } else {
            outline
                .holes
                .iter()
                .map(|h| Polygon::new(h.reversed()))
                .collect()
        };

        for hole in polygon.interior_rings() {
            if result.is_empty() {
                break;
            }
            let Some(around) = self.line_rings(hole.points(), width, EndCap::Round) else {
                continue;
            };
            // Growing the area shrinks each hole to the insets of its
            // outline; shrinking the area grows it to the outline's shell.
            let cutters: Vec<Polygon> = if distance > 0.0 {
                around.holes.iter().map(|h| Polygon::new(h.reversed())).collect()
            } else {
                largest(around.shells).map(Polygon::new).into_iter().collect()
            };
            if !cutters.is_empty() {
                result = overlay(&result, &cutters, OverlayOp::Difference, self.tolerance);
            }
        }
        polygons_into_geometry(result)
    }

    fn combine(&self, parts: Vec<Geometry>) -> Option<Geometry> {
        match (parts.len(), self.params.union_policy) {
            (0, _) => None,
            (_, UnionPolicy::Disjoint) => Some(GeometryCollection::from_geometries(parts).into()),
            (1, UnionPolicy::Merge) => parts.into_iter().next(),
            (_, UnionPolicy::Merge) => {
                let polygons: Vec<Polygon> = parts.into_iter().flat_map(into_polygons).collect();
                polygons_into_geometry(overlay(&polygons, &[], OverlayOp::Union, self.tolerance))
            }
        }
    }
}

impl Geometry {
    /// Buffer with default parameters and the global tolerance.
    pub fn buffer(&self, distance: f64) -> Option<Geometry> {
        self.buffer_with(distance, &BufferParams::default())
    }

    pub fn buffer_with(&self, distance: f64, params: &BufferParams) -> Option<Geometry> {
        Buffer::new(*params).apply(self, distance)
    }
}
