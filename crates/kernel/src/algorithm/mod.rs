//! Planar predicates and measures shared by the relate and buffer engines.

pub mod centroid;
pub mod distance;
pub mod locate;
pub mod predicates;
pub mod ring;
pub mod segment;
pub mod simple;

pub use locate::PointLocator;
pub use predicates::{PointLinePosition, Turn};
pub use ring::Orientation;
pub use segment::SegmentIntersection;
