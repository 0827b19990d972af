//! Auricle Job Model
//!
//! Defines the data contracts shared between the UI layer and the render
//! orchestrator:
//! - **Jobs:** one entry per (source track, resolved output name) pair
//! - **Options:** output directory and audio bitrate for a run
//! - **Still image:** the decoded cover picture every video is built from
//! - **Progress:** per-job position/duration samples emitted during a run

pub mod job;
pub mod options;
pub mod progress;
pub mod still;

pub use job::*;
pub use options::*;
pub use progress::*;
pub use still::*;
