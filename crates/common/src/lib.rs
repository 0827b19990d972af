//! Auricle Common Utilities
//!
//! Shared infrastructure for all Auricle crates:
//! - Error types and result aliases
//! - Clock-time helpers for progress reporting
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
