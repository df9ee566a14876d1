//! DE-9IM relate engine and the named spatial predicates.

pub mod fast;
pub mod graph;
pub mod matrix;

use std::cell::OnceCell;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::Tolerance;
use crate::algorithm::PointLocator;
use crate::geometry::{Geometry, SimpleFeature};

pub use matrix::{IntersectionMatrix, Location, PatternError};

/// Whether point equality and envelope rejection look at Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RelateMode {
    #[default]
    Planar,
    Spatial,
}

/// A comparison of two geometries. The matrix is computed on first use
/// and cached for the life of the comparison.
#[derive(Debug)]
pub struct Relate<'a> {
    a: &'a Geometry,
    b: &'a Geometry,
    mode: RelateMode,
    locator: PointLocator,
    matrix: OnceCell<IntersectionMatrix>,
}

impl<'a> Relate<'a> {
    pub fn new(a: &'a Geometry, b: &'a Geometry) -> Self {
        Self::with_mode(a, b, RelateMode::Planar)
    }

    pub fn with_mode(a: &'a Geometry, b: &'a Geometry, mode: RelateMode) -> Self {
        Self::with_tolerance(a, b, mode, Tolerance::global())
    }

    pub fn with_tolerance(a: &'a Geometry, b: &'a Geometry, mode: RelateMode, tolerance: Tolerance) -> Self {
        let locator = match mode {
            RelateMode::Planar => PointLocator::new(tolerance.epsilon),
            RelateMode::Spatial => PointLocator::spatial(tolerance.epsilon),
        };
        Self {
            a,
            b,
            mode,
            locator,
            matrix: OnceCell::new(),
        }
    }

    pub fn mode(&self) -> RelateMode {
        self.mode
    }

    /// The intersection matrix of A against B.
    pub fn matrix(&self) -> &IntersectionMatrix {
        self.matrix.get_or_init(|| self.compute())
    }

    #[instrument(skip(self), fields(a = %self.a.geometry_type(), b = %self.b.geometry_type()))]
    fn compute(&self) -> IntersectionMatrix {
        if let Some(m) = fast::fast_matrix(self.a, self.b, self.mode, &self.locator) {
            debug!(matrix = %m, "fast path");
            return m;
        }
        let m = graph::compute(self.a, self.b, &self.locator);
        debug!(matrix = %m, "computed from arrangement");
        m
    }

    fn dims(&self) -> (u8, u8) {
        (self.a.dimension(), self.b.dimension())
    }

    /// Two empty geometries are equal whatever their types.
    pub fn equals(&self) -> bool {
        match (self.a.is_empty(), self.b.is_empty()) {
            (true, true) => return true,
            (true, false) | (false, true) => return false,
            (false, false) => {}
        }
        if self.a.dimension() != self.b.dimension() {
            return false;
        }
        if let (Some(p), Some(q)) = (self.a.as_point(), self.b.as_point()) {
            return self.locator.points_equal(p, q);
        }
        self.matrix().is("T*F**FFF*")
    }

    /// Decided without a matrix.
    pub fn intersects(&self) -> bool {
        fast::intersects(self.a, self.b, self.mode, &self.locator)
    }

    pub fn disjoint(&self) -> bool {
        !self.intersects()
    }

    pub fn touches(&self) -> bool {
        let m = self.matrix();
        m.is("FT*******") || m.is("F**T*****") || m.is("F***T****")
    }

    pub fn crosses(&self) -> bool {
        let m = self.matrix();
        match self.dims() {
            (0, 1) | (0, 2) | (1, 2) => m.is("T*T******"),
            (1, 0) | (2, 0) | (2, 1) => m.is("T*****T**"),
            (1, 1) => m.is("0********"),
            _ => false,
        }
    }

    pub fn within(&self) -> bool {
        self.matrix().is("T*F**F***")
    }

    /// `within` read off the transposed matrix.
    pub fn contains(&self) -> bool {
        self.matrix().transposed().is("T*F**F***")
    }

    pub fn overlaps(&self) -> bool {
        let m = self.matrix();
        match self.dims() {
            (0, 0) | (2, 2) => m.is("T*T***T**"),
            (1, 1) => m.is("1*T***T**"),
            _ => false,
        }
    }

    /// Match the matrix against a pattern over `T F * 0 1 2`.
    pub fn relate(&self, pattern: &str) -> Result<bool, PatternError> {
        self.matrix().matches(pattern)
    }
}

impl Geometry {
    pub fn relate(&self, other: &Geometry) -> IntersectionMatrix {
        *Relate::new(self, other).matrix()
    }

    pub fn relate_pattern(&self, other: &Geometry, pattern: &str) -> Result<bool, PatternError> {
        Relate::new(self, other).relate(pattern)
    }

    pub fn equals(&self, other: &Geometry) -> bool {
        Relate::new(self, other).equals()
    }

    pub fn disjoint(&self, other: &Geometry) -> bool {
        Relate::new(self, other).disjoint()
    }

    pub fn intersects(&self, other: &Geometry) -> bool {
        Relate::new(self, other).intersects()
    }

    pub fn touches(&self, other: &Geometry) -> bool {
        Relate::new(self, other).touches()
    }

    pub fn crosses(&self, other: &Geometry) -> bool {
        Relate::new(self, other).crosses()
    }

    pub fn within(&self, other: &Geometry) -> bool {
        Relate::new(self, other).within()
    }

    pub fn contains(&self, other: &Geometry) -> bool {
        Relate::new(self, other).contains()
    }

    pub fn overlaps(&self, other: &Geometry) -> bool {
        Relate::new(self, other).overlaps()
    }
}
