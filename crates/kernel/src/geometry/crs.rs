//! Hooks for the external coordinate-system subsystem.
//!
//! The kernel never looks inside a coordinate system. Geometries only keep a
//! weak reference to one and apply a caller-supplied per-point transform when
//! rebound.

use std::fmt;
use std::sync::{Arc, Weak};

use super::point::Point;

/// A coordinate reference system owned outside the kernel.
pub trait CoordinateSystem: fmt::Debug + Send + Sync {
    /// Human-readable identifier, e.g. an authority code.
    fn name(&self) -> &str;
}

/// Per-point reprojection supplied alongside a coordinate system.
pub trait MathTransform {
    fn transform(&self, point: &mut Point);
}

impl<F> MathTransform for F
where
    F: Fn(&mut Point),
{
    fn transform(&self, point: &mut Point) {
        self(point)
    }
}

/// Non-owning link from a geometry to its coordinate system.
#[derive(Clone, Default)]
pub struct CrsBinding(Option<Weak<dyn CoordinateSystem>>);

impl CrsBinding {
    pub fn bind(cs: &Arc<dyn CoordinateSystem>) -> Self {
        Self(Some(Arc::downgrade(cs)))
    }

    /// The bound system, if one was set and is still alive.
    pub fn get(&self) -> Option<Arc<dyn CoordinateSystem>> {
        self.0.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.0.is_some()
    }
}

impl PartialEq for CrsBinding {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Weak::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for CrsBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(cs) => write!(f, "CrsBinding({})", cs.name()),
            None if self.is_bound() => f.write_str("CrsBinding(<dropped>)"),
            None => f.write_str("CrsBinding(None)"),
        }
    }
}
