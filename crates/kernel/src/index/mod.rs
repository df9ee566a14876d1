//! Ephemeral spatial indexing for edge proximity queries.

pub mod bsp;

pub use bsp::Bsp;
