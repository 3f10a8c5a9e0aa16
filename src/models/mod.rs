//! Premium regression model.
//!
//! Only k-nearest-neighbors is supported; the model file carries its own `k`,
//! weighting scheme, and distance power.

pub mod knn;

pub use knn::*;
