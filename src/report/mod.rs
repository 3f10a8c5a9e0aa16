//! Presentation of prediction results: text lines, neighbor tables, JSON, and
//! artifact summaries.

pub mod format;

pub use format::*;
