//! Mathematical utilities: neighbor distance metrics.

pub mod distance;

pub use distance::*;
