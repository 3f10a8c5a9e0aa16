//! `premium-knn` library crate.
//!
//! The binary (`premium`) is a thin wrapper around this library so that:
//!
//! - encoding and prediction are testable without spawning processes
//! - the TUI, prompt, and one-shot commands share one pipeline

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod encoding;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod tui;

#[cfg(test)]
mod testing;
