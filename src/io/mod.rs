//! Input/output helpers.
//!
//! - artifact load/write (`artifacts`)
//! - CSV batch input and prediction output (`batch`)

pub mod artifacts;
pub mod batch;

pub use artifacts::*;
pub use batch::*;
