//! An in-memory engine that records every call.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use auricle_common::error::{AuricleError, AuricleResult};
use auricle_job_model::JobId;

use crate::engine::{
    ChainPlan, EngineEvent, EventSender, MuxInputId, MuxInputKind, ProbeId, ProbePoint,
    RenderEngine,
};

/// A decoded stream as the fake engine reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakePad(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    AddChains(JobId),
    RequestInput(JobId, MuxInputKind),
    ReleaseInput(JobId, MuxInputKind),
    InstallProbe(JobId, ProbePoint),
    RemoveProbe(JobId, ProbePoint),
    WatchDecoder(JobId),
    Link(JobId, FakePad),
    Discard(JobId, FakePad),
    SendEos(JobId, MuxInputKind),
    Play,
    Stop,
}

#[derive(Debug, Default)]
pub struct Ledger {
    pub calls: Vec<Call>,
    pub live_inputs: BTreeMap<MuxInputId, (JobId, MuxInputKind)>,
    pub live_probes: BTreeMap<ProbeId, (JobId, ProbePoint)>,
    pub inputs_acquired: usize,
    pub probes_installed: usize,
    pub positions: BTreeMap<JobId, (Option<u64>, Option<u64>)>,
    pub fail_add_chains: Option<JobId>,
    sink_eos: BTreeSet<JobId>,
    jobs: BTreeSet<JobId>,
    next_handle: u64,
}

impl Ledger {
    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|&&c| c == call).count()
    }

    pub fn position_of(&self, call: Call) -> Option<usize> {
        self.calls.iter().position(|&c| c == call)
    }

    pub fn stop_calls(&self) -> usize {
        self.count(Call::Stop)
    }

    pub fn eos_sent(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::SendEos(..)))
            .count()
    }
}

/// Engine double.
///
/// Forwarding end-of-stream into a job's video input is treated as the
/// moment that job's file is finalized: the sink probe fires for it, and
/// once every job has finalized the whole graph reports end-of-stream.
pub struct FakeEngine {
    pub ledger: Rc<RefCell<Ledger>>,
    events: EventSender<FakePad>,
}

impl FakeEngine {
    pub fn new(events: EventSender<FakePad>) -> Self {
        Self {
            ledger: Rc::new(RefCell::new(Ledger::default())),
            events,
        }
    }

    fn handle(ledger: &mut Ledger) -> u64 {
        ledger.next_handle += 1;
        ledger.next_handle
    }
}

impl RenderEngine for FakeEngine {
    type DecodedPad = FakePad;

    fn add_job_chains(&mut self, job: JobId, _plan: &ChainPlan<'_>) -> AuricleResult<()> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::AddChains(job));
        if ledger.fail_add_chains == Some(job) {
            return Err(AuricleError::engine("no such element"));
        }
        ledger.jobs.insert(job);
        Ok(())
    }

    fn request_mux_input(&mut self, job: JobId, kind: MuxInputKind) -> AuricleResult<MuxInputId> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::RequestInput(job, kind));
        let id = MuxInputId(Self::handle(&mut ledger));
        ledger.live_inputs.insert(id, (job, kind));
        ledger.inputs_acquired += 1;
        Ok(id)
    }

    fn release_mux_input(&mut self, input: MuxInputId) {
        let mut ledger = self.ledger.borrow_mut();
        let Some((job, kind)) = ledger.live_inputs.remove(&input) else {
            panic!("muxer input {input:?} released twice");
        };
        ledger.calls.push(Call::ReleaseInput(job, kind));
    }

    fn install_eos_probe(&mut self, job: JobId, point: ProbePoint) -> AuricleResult<ProbeId> {
        let mut ledger = self.ledger.borrow_mut();
        ledger.calls.push(Call::InstallProbe(job, point));
        let id = ProbeId(Self::handle(&mut ledger));
        ledger.live_probes.insert(id, (job, point));
        ledger.probes_installed += 1;
        Ok(id)
    }

    fn remove_probe(&mut self, probe: ProbeId) {
        let mut ledger = self.ledger.borrow_mut();
        let Some((job, point)) = ledger.live_probes.remove(&probe) else {
            panic!("probe {probe:?} removed twice");
        };
        ledger.calls.push(Call::RemoveProbe(job, point));
    }

    fn watch_decoder(&mut self, job: JobId) -> AuricleResult<()> {
        self.ledger.borrow_mut().calls.push(Call::WatchDecoder(job));
        Ok(())
    }

    fn link_decoded_stream(&mut self, job: JobId, pad: FakePad) -> AuricleResult<()> {
        self.ledger.borrow_mut().calls.push(Call::Link(job, pad));
        Ok(())
    }

    fn discard_stream(&mut self, job: JobId, pad: FakePad) {
        self.ledger.borrow_mut().calls.push(Call::Discard(job, pad));
    }

    fn send_eos(&mut self, input: MuxInputId) -> bool {
        let mut ledger = self.ledger.borrow_mut();
        let Some(&(job, kind)) = ledger.live_inputs.get(&input) else {
            return false;
        };
        ledger.calls.push(Call::SendEos(job, kind));

        if kind == MuxInputKind::Video && ledger.sink_eos.insert(job) {
            let watched = ledger
                .live_probes
                .values()
                .any(|&(j, p)| j == job && p == ProbePoint::SinkInput);
            if watched {
                let _ = self.events.send(EngineEvent::ProbeEos {
                    job,
                    point: ProbePoint::SinkInput,
                });
            }
            if ledger.sink_eos == ledger.jobs {
                let _ = self.events.send(EngineEvent::Finished);
            }
        }
        true
    }

    fn query_position(&self, job: JobId) -> Option<u64> {
        self.ledger.borrow().positions.get(&job).and_then(|p| p.0)
    }

    fn query_duration(&self, job: JobId) -> Option<u64> {
        self.ledger.borrow().positions.get(&job).and_then(|p| p.1)
    }

    fn play(&mut self) -> AuricleResult<()> {
        self.ledger.borrow_mut().calls.push(Call::Play);
        Ok(())
    }

    fn stop(&mut self) {
        self.ledger.borrow_mut().calls.push(Call::Stop);
    }
}
