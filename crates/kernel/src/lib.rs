//! OGC Simple Features geometry kernel.
//!
//! A typed geometry tree, a WKT/WKB codec, a DE-9IM relate engine and a
//! buffer (offset) engine, all running on epsilon-tolerant `f64` arithmetic.

pub mod algorithm;
pub mod buffer;
pub mod codec;
pub mod geometry;
pub mod index;
pub mod relate;

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

// Re-export the types most callers need at crate root.
pub use buffer::{Buffer, BufferParams, EndCap, UnionPolicy};
pub use codec::{ByteOrder, CodecError};
pub use geometry::{
    Geometry, GeometryCollection, GeometryError, GeometryKind, GeometryType, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, PolyhedralSurface, Polygon, SimpleFeature,
};
pub use relate::{IntersectionMatrix, Location, Relate, RelateMode};

/// Tolerance configuration for every equality, collinearity and
/// betweenness test in the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Coordinates closer than this are considered coincident.
    pub epsilon: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { epsilon: 1e-7 }
    }
}

/// Errors raised while establishing configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("tolerance must be finite and positive, got {0}")]
    InvalidEpsilon(f64),
    #[error("global tolerance is already initialized to {0:?}")]
    AlreadyInitialized(Tolerance),
}

static GLOBAL_TOLERANCE: OnceLock<Tolerance> = OnceLock::new();

impl Tolerance {
    pub fn new(epsilon: f64) -> Result<Self, ConfigError> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ConfigError::InvalidEpsilon(epsilon));
        }
        Ok(Self { epsilon })
    }

    /// Install this tolerance as the process-wide value.
    ///
    /// Must happen before the first call to [`Tolerance::global`]; the
    /// global is write-once and every later attempt fails.
    pub fn install(self) -> Result<(), ConfigError> {
        GLOBAL_TOLERANCE
            .set(self)
            .map_err(|_| ConfigError::AlreadyInitialized(Tolerance::global()))?;
        info!(epsilon = self.epsilon, "global tolerance installed");
        Ok(())
    }

    /// The process-wide tolerance, defaulting on first read.
    pub fn global() -> Tolerance {
        *GLOBAL_TOLERANCE.get_or_init(Tolerance::default)
    }

    /// Coalescing distance for nodes produced by offset arithmetic.
    pub fn position_epsilon(&self) -> f64 {
        self.epsilon * 10.0
    }

    pub fn is_zero(&self, value: f64) -> bool {
        value.abs() < self.epsilon
    }

    pub fn approx_eq(&self, a: f64, b: f64) -> bool {
        (a - b).abs() < self.epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tolerance() {
        let tol = Tolerance::default();
        assert_eq!(tol.epsilon, 1e-7);
        assert!((tol.position_epsilon() - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        assert!(matches!(Tolerance::new(0.0), Err(ConfigError::InvalidEpsilon(_))));
        assert!(matches!(Tolerance::new(-1.0), Err(ConfigError::InvalidEpsilon(_))));
        assert!(matches!(Tolerance::new(f64::NAN), Err(ConfigError::InvalidEpsilon(_))));
        assert!(Tolerance::new(1e-9).is_ok());
    }

    #[test]
    fn test_global_is_write_once() {
        let current = Tolerance::global();
        let err = Tolerance { epsilon: 1e-3 }.install().unwrap_err();
        assert_eq!(err, ConfigError::AlreadyInitialized(current));
        assert_eq!(Tolerance::global(), current);
    }

    #[test]
    fn test_approx_eq() {
        let tol = Tolerance::default();
        assert!(tol.approx_eq(1.0, 1.0 + 1e-9));
        assert!(!tol.approx_eq(1.0, 1.0 + 1e-5));
        assert!(tol.is_zero(-5e-8));
    }
}
