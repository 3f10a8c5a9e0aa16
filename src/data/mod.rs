//! Synthetic data sources.

pub mod demo;

pub use demo::{DemoConfig, demo_record, generate_demo_artifacts};
