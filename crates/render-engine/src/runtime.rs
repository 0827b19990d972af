//! Per-job bookkeeping while a render is live.

use auricle_job_model::RenderJob;

use crate::engine::{MuxInputId, MuxInputKind, ProbeId, ProbePoint, RenderEngine};

/// Whether a job's decoded audio has reached its encoder yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioLink {
    AwaitingLink,
    Linked,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MuxInputHandle {
    pub id: MuxInputId,
    pub kind: MuxInputKind,
    /// End-of-stream reached this input, either by flowing through the
    /// chain or by being forwarded.
    pub eos_delivered: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ProbeHandle {
    pub id: ProbeId,
    pub point: ProbePoint,
}

/// A job plus every engine handle it currently owns.
#[derive(Debug)]
pub(crate) struct JobRuntime {
    pub job: RenderJob,
    pub audio_link: AudioLink,
    pub mux_inputs: Vec<MuxInputHandle>,
    pub probes: Vec<ProbeHandle>,
    pub finished: bool,
    pub finish_reported: bool,
}

impl JobRuntime {
    pub fn new(job: RenderJob) -> Self {
        Self {
            job,
            audio_link: AudioLink::AwaitingLink,
            mux_inputs: Vec::new(),
            probes: Vec::new(),
            finished: false,
            finish_reported: false,
        }
    }

    /// Take the probe installed at `point`, if it is still installed.
    pub fn take_probe(&mut self, point: ProbePoint) -> Option<ProbeHandle> {
        let idx = self.probes.iter().position(|p| p.point == point)?;
        Some(self.probes.swap_remove(idx))
    }

    pub fn holds_handles(&self) -> bool {
        !self.mux_inputs.is_empty() || !self.probes.is_empty()
    }

    /// Remove every probe, then give every muxer input back.
    ///
    /// Handles are drained as they go, so calling this again releases
    /// nothing.
    pub fn release_handles<E: RenderEngine>(&mut self, engine: &mut E) {
        for probe in self.probes.drain(..) {
            engine.remove_probe(probe.id);
        }
        for input in self.mux_inputs.drain(..) {
            engine.release_mux_input(input.id);
        }
    }
}
