//! The execution engine seam.
//!
//! The orchestrator never touches media elements directly. It asks a
//! [`RenderEngine`] to build chains, hand out muxer inputs and install
//! probes, and learns about asynchronous happenings (a decoder exposing
//! its stream, an end-of-stream passing a probe, the whole graph ending)
//! through [`EngineEvent`]s on a channel.

use std::fmt;
use std::path::Path;

use auricle_common::error::AuricleResult;
use auricle_job_model::{JobId, StillImage};
use tokio::sync::mpsc;

/// Handle to a muxer input acquired for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MuxInputId(pub u64);

/// Handle to an installed end-of-stream probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProbeId(pub u64);

/// Which encoder feeds a muxer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MuxInputKind {
    Audio,
    Video,
}

impl MuxInputKind {
    /// Request-pad template on an MP4 muxer.
    pub fn pad_template(self) -> &'static str {
        match self {
            Self::Audio => "audio_%u",
            Self::Video => "video_%u",
        }
    }
}

impl fmt::Display for MuxInputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => f.write_str("audio"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Where an end-of-stream probe watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbePoint {
    /// Output of the job's audio encoder. End-of-stream here means every
    /// audio byte has been encoded.
    AudioEncoderOutput,
    /// Input of the job's file writer. End-of-stream here means the muxer
    /// has finalized the container.
    SinkInput,
}

impl fmt::Display for ProbePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AudioEncoderOutput => f.write_str("audio-encoder-output"),
            Self::SinkInput => f.write_str("sink-input"),
        }
    }
}

/// Everything needed to build one job's chains.
#[derive(Debug, Clone, Copy)]
pub struct ChainPlan<'a> {
    pub source: &'a Path,
    pub output_path: &'a Path,
    pub audio_bitrate_bps: u32,
    pub image: &'a StillImage,
}

/// Asynchronous notifications from the engine.
///
/// `P` is the engine's handle for a freshly decoded stream.
#[derive(Debug)]
pub enum EngineEvent<P> {
    /// A job's decoder exposed a decoded stream.
    PadDiscovered { job: JobId, pad: P },

    /// A job's decoder has exposed every stream it is going to expose.
    /// Sent after the last [`PadDiscovered`](EngineEvent::PadDiscovered)
    /// of that job, or as soon as the source is known to carry no audio.
    StreamsSettled { job: JobId },

    /// End-of-stream passed a probe.
    ProbeEos { job: JobId, point: ProbePoint },

    /// The whole graph reached end-of-stream.
    Finished,

    /// The engine reported an error; the run cannot continue.
    Failed { message: String },
}

pub type EventSender<P> = mpsc::UnboundedSender<EngineEvent<P>>;
pub type EventReceiver<P> = mpsc::UnboundedReceiver<EngineEvent<P>>;

/// Create the channel an engine reports on.
///
/// The sender side may be used from any thread, including media
/// streaming threads that are not part of the async runtime.
pub fn event_channel<P>() -> (EventSender<P>, EventReceiver<P>) {
    mpsc::unbounded_channel()
}

/// One shared execution graph holding every job's chains.
///
/// Handles returned by the engine stay valid until released through the
/// matching call or until [`RenderEngine::stop`]. Releasing a handle twice
/// is a bug in the caller.
pub trait RenderEngine {
    /// A decoded stream waiting to be linked or discarded.
    type DecodedPad: Send + 'static;

    /// Build the still-image video chain, the audio chain (up to its
    /// dynamic decoder) and the muxer plus file writer for `job`.
    fn add_job_chains(&mut self, job: JobId, plan: &ChainPlan<'_>) -> AuricleResult<()>;

    /// Request a muxer input for `job` and link the matching encoder to it.
    fn request_mux_input(&mut self, job: JobId, kind: MuxInputKind) -> AuricleResult<MuxInputId>;

    /// Give a muxer input back to its muxer.
    fn release_mux_input(&mut self, input: MuxInputId);

    /// Watch `point` of `job` for end-of-stream; reported as
    /// [`EngineEvent::ProbeEos`].
    fn install_eos_probe(&mut self, job: JobId, point: ProbePoint) -> AuricleResult<ProbeId>;

    fn remove_probe(&mut self, probe: ProbeId);

    /// Start reporting `job`'s decoded streams as
    /// [`EngineEvent::PadDiscovered`], followed by one
    /// [`EngineEvent::StreamsSettled`]. Must be called before [`play`].
    ///
    /// [`play`]: RenderEngine::play
    fn watch_decoder(&mut self, job: JobId) -> AuricleResult<()>;

    /// Link a discovered stream into `job`'s audio encoder.
    fn link_decoded_stream(&mut self, job: JobId, pad: Self::DecodedPad) -> AuricleResult<()>;

    /// Dispose of a discovered stream nobody wants.
    fn discard_stream(&mut self, job: JobId, pad: Self::DecodedPad);

    /// Push end-of-stream into a muxer input. Returns whether it was
    /// accepted.
    fn send_eos(&mut self, input: MuxInputId) -> bool;

    /// Current position of `job`'s written output, in nanoseconds.
    fn query_position(&self, job: JobId) -> Option<u64>;

    /// Total duration of `job`'s decoded audio, in nanoseconds.
    fn query_duration(&self, job: JobId) -> Option<u64>;

    /// Start every chain.
    fn play(&mut self) -> AuricleResult<()>;

    /// Bring the whole graph to rest. Called once, before handles are
    /// released.
    fn stop(&mut self);
}
