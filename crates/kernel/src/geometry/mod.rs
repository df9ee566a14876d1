//! The Simple Features object model.
//!
//! Every node exclusively owns its children: a [`LineString`] owns its
//! points, a [`Polygon`] its rings, a [`PolyhedralSurface`] its patches and a
//! [`GeometryCollection`] its child geometries. `Clone` is the deep copy.

pub mod collection;
pub mod crs;
pub mod envelope;
pub mod line_string;
pub mod point;
pub mod polygon;
pub mod surface;
pub mod vector;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use collection::{GeometryCollection, MultiLineString, MultiPoint, MultiPolygon};
pub use crs::{CoordinateSystem, CrsBinding, MathTransform};
pub use envelope::Envelope;
pub use line_string::LineString;
pub use point::Point;
pub use polygon::Polygon;
pub use surface::PolyhedralSurface;
pub use vector::Vec2;

/// The closed set of geometry variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    PolyhedralSurface,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    /// Base WKB type code, without Z/M offset.
    pub fn code(&self) -> u32 {
        match self {
            Self::Point => 1,
            Self::LineString => 2,
            Self::Polygon => 3,
            Self::MultiPoint => 4,
            Self::MultiLineString => 5,
            Self::MultiPolygon => 6,
            Self::GeometryCollection => 7,
            Self::PolyhedralSurface => 15,
        }
    }

    /// WKB type code with the Z (+1000), M (+2000) or ZM (+3000) offset.
    pub fn wkb_code(&self, with_z: bool, with_m: bool) -> u32 {
        let offset = match (with_z, with_m) {
            (false, false) => 0,
            (true, false) => 1000,
            (false, true) => 2000,
            (true, true) => 3000,
        };
        self.code() + offset
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::PolyhedralSurface => "PolyhedralSurface",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }

    /// Upper-case WKT tag.
    pub fn wkt_tag(&self) -> &'static str {
        match self {
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::PolyhedralSurface => "POLYHEDRALSURFACE",
            Self::MultiPoint => "MULTIPOINT",
            Self::MultiLineString => "MULTILINESTRING",
            Self::MultiPolygon => "MULTIPOLYGON",
            Self::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural misuse of the geometry tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("cannot add a {found} to a {collection}")]
    WrongChildKind {
        collection: GeometryType,
        found: GeometryType,
    },
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

/// The capability set shared by every geometry variant.
pub trait SimpleFeature {
    fn geometry_type(&self) -> GeometryType;

    /// Topological dimension: 0 for points, 1 for curves, 2 for surfaces.
    fn dimension(&self) -> u8;

    fn is_empty(&self) -> bool;

    /// Free of unintended self-intersection.
    fn is_simple(&self) -> bool;

    fn is_valid(&self) -> bool;

    /// The topological boundary, or `None` when it is empty.
    fn boundary(&self) -> Option<Geometry>;

    fn for_each_point(&self, f: &mut dyn FnMut(&Point));

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point));

    fn wkb_geometry_type(&self, with_z: bool, with_m: bool) -> u32 {
        self.geometry_type().wkb_code(with_z, with_m)
    }

    fn is_3d(&self) -> bool {
        let mut found = false;
        self.for_each_point(&mut |p| found |= p.has_z());
        found
    }

    fn is_measured(&self) -> bool {
        let mut found = false;
        self.for_each_point(&mut |p| found |= p.has_m());
        found
    }

    fn bounds(&self) -> Option<Envelope> {
        let mut env: Option<Envelope> = None;
        self.for_each_point(&mut |p| match env.as_mut() {
            Some(e) => e.expand_to_include(p),
            None => env = Some(Envelope::of_point(p)),
        });
        env
    }

    /// Bounding box as a two-point (min, max) line; empty for an empty
    /// geometry.
    fn envelope(&self) -> LineString {
        self.bounds()
            .map(|e| e.to_line_string())
            .unwrap_or_default()
    }
}

impl SimpleFeature for Point {
    fn geometry_type(&self) -> GeometryType {
        GeometryType::Point
    }

    fn dimension(&self) -> u8 {
        0
    }

    fn is_empty(&self) -> bool {
        self.is_empty_point()
    }

    fn is_simple(&self) -> bool {
        true
    }

    fn is_valid(&self) -> bool {
        self.is_empty_point() || self.is_finite()
    }

    fn boundary(&self) -> Option<Geometry> {
        None
    }

    // The empty point has no coordinates to visit.
    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        if !self.is_empty_point() {
            f(self)
        }
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        if !self.is_empty_point() {
            f(self)
        }
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────────

/// Variant payload of a [`Geometry`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    PolyhedralSurface(PolyhedralSurface),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    GeometryCollection(GeometryCollection),
}

impl GeometryKind {
    fn feature(&self) -> &dyn SimpleFeature {
        match self {
            Self::Point(g) => g,
            Self::LineString(g) => g,
            Self::Polygon(g) => g,
            Self::PolyhedralSurface(g) => g,
            Self::MultiPoint(g) => g,
            Self::MultiLineString(g) => g,
            Self::MultiPolygon(g) => g,
            Self::GeometryCollection(g) => g,
        }
    }

    fn feature_mut(&mut self) -> &mut dyn SimpleFeature {
        match self {
            Self::Point(g) => g,
            Self::LineString(g) => g,
            Self::Polygon(g) => g,
            Self::PolyhedralSurface(g) => g,
            Self::MultiPoint(g) => g,
            Self::MultiLineString(g) => g,
            Self::MultiPolygon(g) => g,
            Self::GeometryCollection(g) => g,
        }
    }
}

/// A geometry node together with its (optional) coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    kind: GeometryKind,
    #[serde(skip)]
    crs: CrsBinding,
}

impl Geometry {
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            crs: CrsBinding::default(),
        }
    }

    /// An empty geometry of the given type.
    pub fn empty(geometry_type: GeometryType) -> Self {
        let kind = match geometry_type {
            GeometryType::Point => GeometryKind::Point(Point::EMPTY),
            GeometryType::LineString => GeometryKind::LineString(LineString::default()),
            GeometryType::Polygon => GeometryKind::Polygon(Polygon::default()),
            GeometryType::PolyhedralSurface => {
                GeometryKind::PolyhedralSurface(PolyhedralSurface::default())
            }
            GeometryType::MultiPoint => GeometryKind::MultiPoint(MultiPoint::default()),
            GeometryType::MultiLineString => {
                GeometryKind::MultiLineString(MultiLineString::default())
            }
            GeometryType::MultiPolygon => GeometryKind::MultiPolygon(MultiPolygon::default()),
            GeometryType::GeometryCollection => {
                GeometryKind::GeometryCollection(GeometryCollection::default())
            }
        };
        Self::new(kind)
    }

    pub fn kind(&self) -> &GeometryKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut GeometryKind {
        &mut self.kind
    }

    pub fn into_kind(self) -> GeometryKind {
        self.kind
    }

    pub fn as_point(&self) -> Option<&Point> {
        match &self.kind {
            GeometryKind::Point(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_line_string(&self) -> Option<&LineString> {
        match &self.kind {
            GeometryKind::LineString(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon> {
        match &self.kind {
            GeometryKind::Polygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_multi_polygon(&self) -> Option<&MultiPolygon> {
        match &self.kind {
            GeometryKind::MultiPolygon(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&GeometryCollection> {
        match &self.kind {
            GeometryKind::GeometryCollection(c) => Some(c),
            _ => None,
        }
    }

    /// The bound coordinate system, if any is set and still alive.
    pub fn coordinate_system(&self) -> Option<Arc<dyn CoordinateSystem>> {
        self.crs.get()
    }

    /// Reproject every owned point with `transform` and rebind this node
    /// and all nested geometries to `cs`.
    pub fn set_coordinate_system(
        &mut self,
        cs: &Arc<dyn CoordinateSystem>,
        transform: &dyn MathTransform,
    ) {
        self.crs = CrsBinding::bind(cs);
        match &mut self.kind {
            GeometryKind::GeometryCollection(c) => {
                for child in c.geometries_mut() {
                    child.set_coordinate_system(cs, transform);
                }
            }
            kind => kind
                .feature_mut()
                .for_each_point_mut(&mut |p| transform.transform(p)),
        }
    }

    /// Iterate over the non-collection parts, flattening nested collections.
    pub fn for_each_part(&self, f: &mut dyn FnMut(&Geometry)) {
        match &self.kind {
            GeometryKind::GeometryCollection(c) => {
                for child in c.geometries() {
                    child.for_each_part(f);
                }
            }
            _ => f(self),
        }
    }
}

impl SimpleFeature for Geometry {
    fn geometry_type(&self) -> GeometryType {
        self.kind.feature().geometry_type()
    }

    fn dimension(&self) -> u8 {
        self.kind.feature().dimension()
    }

    fn is_empty(&self) -> bool {
        self.kind.feature().is_empty()
    }

    fn is_simple(&self) -> bool {
        self.kind.feature().is_simple()
    }

    fn is_valid(&self) -> bool {
        self.kind.feature().is_valid()
    }

    fn boundary(&self) -> Option<Geometry> {
        self.kind.feature().boundary()
    }

    fn for_each_point(&self, f: &mut dyn FnMut(&Point)) {
        self.kind.feature().for_each_point(f)
    }

    fn for_each_point_mut(&mut self, f: &mut dyn FnMut(&mut Point)) {
        self.kind.feature_mut().for_each_point_mut(f)
    }
}

impl From<GeometryKind> for Geometry {
    fn from(kind: GeometryKind) -> Self {
        Self::new(kind)
    }
}

impl From<Point> for Geometry {
    fn from(g: Point) -> Self {
        Self::new(GeometryKind::Point(g))
    }
}

impl From<LineString> for Geometry {
    fn from(g: LineString) -> Self {
        Self::new(GeometryKind::LineString(g))
    }
}

impl From<Polygon> for Geometry {
    fn from(g: Polygon) -> Self {
        Self::new(GeometryKind::Polygon(g))
    }
}

impl From<PolyhedralSurface> for Geometry {
    fn from(g: PolyhedralSurface) -> Self {
        Self::new(GeometryKind::PolyhedralSurface(g))
    }
}

impl From<MultiPoint> for Geometry {
    fn from(g: MultiPoint) -> Self {
        Self::new(GeometryKind::MultiPoint(g))
    }
}

impl From<MultiLineString> for Geometry {
    fn from(g: MultiLineString) -> Self {
        Self::new(GeometryKind::MultiLineString(g))
    }
}

impl From<MultiPolygon> for Geometry {
    fn from(g: MultiPolygon) -> Self {
        Self::new(GeometryKind::MultiPolygon(g))
    }
}

impl From<GeometryCollection> for Geometry {
    fn from(g: GeometryCollection) -> Self {
        Self::new(GeometryKind::GeometryCollection(g))
    }
}
