//! Auricle Render Engine
//!
//! Turns one still image and a set of audio tracks into one MP4 per
//! track. All tracks render concurrently inside a single shared
//! GStreamer pipeline.
//!
//! # Pipeline Architecture
//!
//! ```text
//! cover.png ─ appsrc ─ videoconvert ─ imagefreeze ─ x264enc ────────────┐
//!                                                                 mp4mux ─ <name>.mp4
//! track.flac ─ filesrc ─ decodebin3 ┄ audioconvert ─ audioresample ─ fdkaacenc ┘
//! ```
//!
//! The [`Orchestrator`] owns the graph through the [`RenderEngine`]
//! trait. It links each decoder once its audio stream appears, forwards
//! end-of-stream from the audio encoder into the muxer so the frozen
//! video leg ends with the audio, samples progress, and releases every
//! handle exactly once.

pub mod engine;
pub mod gst_engine;
pub mod orchestrator;
pub mod reporter;
mod runtime;

#[cfg(test)]
mod testing;

pub use engine::*;
pub use gst_engine::{missing_elements, DiscoveredPad, GstEngine, REQUIRED_ELEMENTS};
pub use orchestrator::{Orchestrator, RenderObserver, RenderState, RunOutcome};
pub use reporter::DEFAULT_SAMPLE_INTERVAL;
