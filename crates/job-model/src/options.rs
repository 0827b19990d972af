//! Per-run output options.

use std::path::{Path, PathBuf};

use auricle_common::config::clamp_audio_bitrate_kbps;
use serde::{Deserialize, Serialize};

/// Output settings shared by every job in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    output_dir: PathBuf,
    audio_bitrate_kbps: u32,
}

impl RenderOptions {
    /// Create options; the bitrate is clamped to the supported range.
    pub fn new(output_dir: impl Into<PathBuf>, audio_bitrate_kbps: u32) -> Self {
        let clamped = clamp_audio_bitrate_kbps(audio_bitrate_kbps);
        if clamped != audio_bitrate_kbps {
            tracing::debug!(
                requested = audio_bitrate_kbps,
                clamped,
                "Audio bitrate clamped"
            );
        }
        Self {
            output_dir: output_dir.into(),
            audio_bitrate_kbps: clamped,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn audio_bitrate_kbps(&self) -> u32 {
        self.audio_bitrate_kbps
    }

    /// Bitrate in bits per second, as encoders expect it.
    pub fn audio_bitrate_bps(&self) -> u32 {
        self.audio_bitrate_kbps * 1000
    }
}
