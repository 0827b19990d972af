//! Drives one shared render graph from start to completion.

use std::fs::File;
use std::time::Duration;

use auricle_common::error::{AuricleError, AuricleResult};
use auricle_job_model::{JobId, RenderJob, RenderJobSet, RenderOptions, RenderProgress, StillImage};
use tokio::time::MissedTickBehavior;

use crate::engine::{ChainPlan, EngineEvent, EventReceiver, MuxInputKind, ProbePoint, RenderEngine};
use crate::reporter::{sample_progress, DEFAULT_SAMPLE_INTERVAL};
use crate::runtime::{AudioLink, JobRuntime, MuxInputHandle, ProbeHandle};

/// Receives everything a render has to tell its user.
pub trait RenderObserver {
    /// The run failed. Called at most once, and never together with
    /// [`on_complete`](RenderObserver::on_complete).
    fn on_error(&mut self, message: &str);

    /// A non-empty progress snapshot.
    fn on_progress(&mut self, progress: &[RenderProgress]);

    /// Every job's output has been written.
    fn on_complete(&mut self);
}

/// Lifecycle of an [`Orchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// Collecting jobs.
    Idle,
    /// Graph built and playing; waiting for [`Orchestrator::run`].
    Started,
    Running,
    Completed,
    Failed,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed { message: String },
}

/// What the event loop does after an event has been handled.
#[derive(Debug, PartialEq, Eq)]
enum LoopAction {
    Continue,
    Complete,
    Fail(String),
}

enum Wake<P> {
    Event(Option<EngineEvent<P>>),
    Tick,
}

/// Owns the shared engine and every job rendered through it.
///
/// Dropping the orchestrator at any point stops the engine (if a graph
/// was built) and then releases every handle still held by a job.
pub struct Orchestrator<E: RenderEngine> {
    engine: E,
    events: EventReceiver<E::DecodedPad>,
    observer: Box<dyn RenderObserver>,
    jobs: Vec<JobRuntime>,
    state: RenderState,
    graph_built: bool,
    engine_stopped: bool,
    sample_interval: Duration,
}

impl<E: RenderEngine> Orchestrator<E> {
    /// `events` must be the receiving end of the channel `engine` reports on.
    pub fn new(
        engine: E,
        events: EventReceiver<E::DecodedPad>,
        observer: Box<dyn RenderObserver>,
    ) -> Self {
        Self {
            engine,
            events,
            observer,
            jobs: Vec::new(),
            state: RenderState::Idle,
            graph_built: false,
            engine_stopped: false,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Queue a job. Only possible before [`start`](Self::start).
    pub fn add_job(&mut self, job: RenderJob) -> AuricleResult<JobId> {
        if self.state != RenderState::Idle {
            return Err(AuricleError::invalid_state(
                "Jobs cannot be added once rendering has started",
            ));
        }
        self.jobs.push(JobRuntime::new(job));
        Ok(JobId(self.jobs.len() - 1))
    }

    /// Queue every job of `set`, in order.
    pub fn add_jobs(&mut self, set: RenderJobSet) -> AuricleResult<()> {
        for job in set {
            self.add_job(job)?;
        }
        Ok(())
    }

    /// Build the graph for every queued job and set it playing.
    ///
    /// Every source is opened before anything is built, so an unreadable
    /// input fails here with no graph element created.
    pub fn start(&mut self, image: StillImage, options: &RenderOptions) -> AuricleResult<()> {
        if self.state != RenderState::Idle {
            return Err(AuricleError::invalid_state("Render already started"));
        }
        if self.jobs.is_empty() {
            return Err(AuricleError::render("Nothing to render"));
        }

        for runtime in &self.jobs {
            let source = &runtime.job.source;
            if let Err(e) = File::open(source) {
                return Err(match e.kind() {
                    std::io::ErrorKind::NotFound => AuricleError::file_not_found(source),
                    _ => AuricleError::Io(e),
                });
            }
        }
        std::fs::create_dir_all(options.output_dir())?;
        let image = image.into_even_dimensions()?;

        self.graph_built = true;
        if let Err(e) = self.build_graph(&image, options) {
            tracing::error!(error = %e, "Failed to build render pipeline");
            self.teardown();
            self.state = RenderState::Failed;
            return Err(e);
        }

        self.state = RenderState::Started;
        Ok(())
    }

    fn build_graph(&mut self, image: &StillImage, options: &RenderOptions) -> AuricleResult<()> {
        for (idx, runtime) in self.jobs.iter_mut().enumerate() {
            let job = JobId(idx);
            let output_path = runtime.job.output_path(options.output_dir());
            tracing::info!(
                job = %job,
                source = %runtime.job.source.display(),
                output = %output_path.display(),
                "Adding job to render"
            );

            self.engine.add_job_chains(
                job,
                &ChainPlan {
                    source: &runtime.job.source,
                    output_path: &output_path,
                    audio_bitrate_bps: options.audio_bitrate_bps(),
                    image,
                },
            )?;

            for kind in [MuxInputKind::Audio, MuxInputKind::Video] {
                let id = self.engine.request_mux_input(job, kind)?;
                runtime.mux_inputs.push(MuxInputHandle {
                    id,
                    kind,
                    eos_delivered: false,
                });
            }
            for point in [ProbePoint::AudioEncoderOutput, ProbePoint::SinkInput] {
                let id = self.engine.install_eos_probe(job, point)?;
                runtime.probes.push(ProbeHandle { id, point });
            }
            self.engine.watch_decoder(job)?;
        }

        self.engine.play()
    }

    /// Process engine events and sample progress until the engine reports
    /// end-of-stream or an error.
    pub async fn run(&mut self) -> AuricleResult<RunOutcome> {
        if self.state != RenderState::Started {
            return Err(AuricleError::invalid_state(format!(
                "Cannot run a render in state {:?}",
                self.state
            )));
        }
        self.state = RenderState::Running;

        let mut ticker = tokio::time::interval(self.sample_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        let outcome = loop {
            let wake = tokio::select! {
                event = self.events.recv() => Wake::Event(event),
                _ = ticker.tick() => Wake::Tick,
            };

            let action = match wake {
                Wake::Event(Some(event)) => self.handle_event(event),
                Wake::Event(None) => LoopAction::Fail("Render engine went away".to_string()),
                Wake::Tick => {
                    self.report_progress();
                    LoopAction::Continue
                }
            };

            match action {
                LoopAction::Continue => {}
                LoopAction::Complete => {
                    self.report_progress();
                    self.state = RenderState::Completed;
                    tracing::info!(jobs = self.jobs.len(), "Render complete");
                    self.observer.on_complete();
                    break RunOutcome::Completed;
                }
                LoopAction::Fail(message) => {
                    self.state = RenderState::Failed;
                    tracing::error!(error = %message, "Render failed");
                    self.observer.on_error(&message);
                    break RunOutcome::Failed { message };
                }
            }
        };

        Ok(outcome)
    }

    fn handle_event(&mut self, event: EngineEvent<E::DecodedPad>) -> LoopAction {
        match event {
            EngineEvent::PadDiscovered { job, pad } => self.on_pad_discovered(job, pad),
            EngineEvent::StreamsSettled { job } => self.on_streams_settled(job),
            EngineEvent::ProbeEos {
                job,
                point: ProbePoint::AudioEncoderOutput,
            } => {
                self.forward_eos(job);
                LoopAction::Continue
            }
            EngineEvent::ProbeEos {
                job,
                point: ProbePoint::SinkInput,
            } => {
                self.mark_finished(job);
                LoopAction::Continue
            }
            EngineEvent::Finished => LoopAction::Complete,
            EngineEvent::Failed { message } => LoopAction::Fail(message),
        }
    }

    fn on_pad_discovered(&mut self, job: JobId, pad: E::DecodedPad) -> LoopAction {
        let Some(runtime) = self.jobs.get_mut(job.index()) else {
            tracing::warn!(job = %job, "Decoded stream for unknown job");
            self.engine.discard_stream(job, pad);
            return LoopAction::Continue;
        };

        match runtime.audio_link {
            AudioLink::AwaitingLink => match self.engine.link_decoded_stream(job, pad) {
                Ok(()) => {
                    runtime.audio_link = AudioLink::Linked;
                    tracing::debug!(job = %job, "Decoded audio linked");
                    LoopAction::Continue
                }
                Err(e) => LoopAction::Fail(e.to_string()),
            },
            AudioLink::Linked => {
                tracing::warn!(job = %job, "Ignoring additional decoded stream");
                self.engine.discard_stream(job, pad);
                LoopAction::Continue
            }
        }
    }

    /// A decoder that settles without an audio stream would leave its
    /// muxer, and with it the whole shared graph, waiting forever.
    fn on_streams_settled(&mut self, job: JobId) -> LoopAction {
        let Some(runtime) = self.jobs.get(job.index()) else {
            return LoopAction::Continue;
        };
        match runtime.audio_link {
            AudioLink::Linked => LoopAction::Continue,
            AudioLink::AwaitingLink => {
                let basename = runtime
                    .job
                    .source
                    .file_name()
                    .unwrap_or(runtime.job.source.as_os_str())
                    .to_string_lossy();
                tracing::warn!(
                    job = %job,
                    source = %runtime.job.source.display(),
                    "No audio stream"
                );
                LoopAction::Fail(format!("{basename} has no audio stream"))
            }
        }
    }

    /// The audio encoder has drained: end every muxer input of `job` that
    /// is still open so the muxer can finalize.
    fn forward_eos(&mut self, job: JobId) {
        let Some(runtime) = self.jobs.get_mut(job.index()) else {
            return;
        };
        if let Some(probe) = runtime.take_probe(ProbePoint::AudioEncoderOutput) {
            self.engine.remove_probe(probe.id);
        }

        tracing::info!(job = %job, name = %runtime.job.result_name, "Forwarding end-of-stream");
        for input in &mut runtime.mux_inputs {
            if input.eos_delivered {
                continue;
            }
            input.eos_delivered = true;
            if input.kind == MuxInputKind::Audio {
                // The audio encoder's own end-of-stream is already on its way.
                continue;
            }
            if !self.engine.send_eos(input.id) {
                tracing::warn!(
                    job = %job,
                    input = %input.kind,
                    "Muxer input refused end-of-stream"
                );
            }
        }
    }

    fn mark_finished(&mut self, job: JobId) {
        let Some(runtime) = self.jobs.get_mut(job.index()) else {
            return;
        };
        if runtime.finished {
            return;
        }
        runtime.finished = true;
        runtime.release_handles(&mut self.engine);
        tracing::info!(job = %job, name = %runtime.job.result_name, "Job finished");
    }

    fn report_progress(&mut self) {
        let snapshot = sample_progress(&self.engine, &mut self.jobs);
        if !snapshot.is_empty() {
            self.observer.on_progress(&snapshot);
        }
    }

    /// Stop the engine and release everything. Also done on drop.
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.graph_built && !self.engine_stopped {
            self.engine_stopped = true;
            self.engine.stop();
        }
        for runtime in &mut self.jobs {
            if runtime.holds_handles() {
                runtime.release_handles(&mut self.engine);
            }
        }
    }
}

impl<E: RenderEngine> Drop for Orchestrator<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    use super::*;
    use crate::engine::{event_channel, EventSender};
    use crate::testing::{Call, FakeEngine, FakePad, Ledger};

    #[derive(Debug, Default)]
    struct Recorded {
        errors: Vec<String>,
        snapshots: Vec<Vec<RenderProgress>>,
        completions: usize,
    }

    impl Recorded {
        fn finished_count(&self, job: JobId) -> usize {
            self.snapshots
                .iter()
                .flatten()
                .filter(|p| p.job == job && p.finished)
                .count()
        }
    }

    struct Recorder(Rc<RefCell<Recorded>>);

    impl RenderObserver for Recorder {
        fn on_error(&mut self, message: &str) {
            self.0.borrow_mut().errors.push(message.to_string());
        }

        fn on_progress(&mut self, progress: &[RenderProgress]) {
            self.0.borrow_mut().snapshots.push(progress.to_vec());
        }

        fn on_complete(&mut self) {
            self.0.borrow_mut().completions += 1;
        }
    }

    struct Harness {
        orchestrator: Orchestrator<FakeEngine>,
        ledger: Rc<RefCell<Ledger>>,
        recorded: Rc<RefCell<Recorded>>,
        events: EventSender<FakePad>,
        dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(tracks: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let (tx, rx) = event_channel();
            let engine = FakeEngine::new(tx.clone());
            let ledger = engine.ledger.clone();
            let recorded = Rc::new(RefCell::new(Recorded::default()));
            let mut orchestrator =
                Orchestrator::new(engine, rx, Box::new(Recorder(recorded.clone())))
                    .with_sample_interval(Duration::from_millis(5));

            for track in tracks {
                let source = dir.path().join(format!("{track}.flac"));
                std::fs::write(&source, b"fLaC").unwrap();
                orchestrator.add_job(RenderJob::new(source, *track)).unwrap();
            }

            Self {
                orchestrator,
                ledger,
                recorded,
                events: tx,
                dir,
            }
        }

        fn options(&self) -> RenderOptions {
            RenderOptions::new(self.dir.path().join("out"), 384)
        }

        fn start(&mut self) -> AuricleResult<()> {
            let options = self.options();
            self.orchestrator.start(image(3, 3), &options)
        }

        fn send(&self, event: EngineEvent<FakePad>) {
            self.events.send(event).unwrap();
        }

        fn audio_done(&self, job: usize) {
            self.send(EngineEvent::ProbeEos {
                job: JobId(job),
                point: ProbePoint::AudioEncoderOutput,
            });
        }

        fn pad(&self, job: usize, pad: u32) {
            self.send(EngineEvent::PadDiscovered {
                job: JobId(job),
                pad: FakePad(pad),
            });
        }
    }

    fn image(width: u32, height: u32) -> StillImage {
        StillImage::from_raw(vec![0; (width * height * 3) as usize], width, height, false).unwrap()
    }

    fn assert_all_released(ledger: &Ledger) {
        assert!(ledger.live_inputs.is_empty(), "leaked inputs: {:?}", ledger.live_inputs);
        assert!(ledger.live_probes.is_empty(), "leaked probes: {:?}", ledger.live_probes);
        let releases = ledger
            .calls
            .iter()
            .filter(|c| matches!(c, Call::ReleaseInput(..)))
            .count();
        let removals = ledger
            .calls
            .iter()
            .filter(|c| matches!(c, Call::RemoveProbe(..)))
            .count();
        assert_eq!(releases, ledger.inputs_acquired);
        assert_eq!(removals, ledger.probes_installed);
    }

    #[tokio::test]
    async fn test_two_jobs_complete() {
        let mut h = Harness::new(&["one", "two"]);
        h.start().unwrap();
        assert_eq!(h.orchestrator.state(), RenderState::Started);
        h.ledger.borrow_mut().positions.insert(JobId(0), (Some(5), Some(10)));

        h.pad(0, 1);
        h.pad(1, 2);
        h.audio_done(0);
        h.audio_done(1);

        let outcome = h.orchestrator.run().await.unwrap();
        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(h.orchestrator.state(), RenderState::Completed);

        let recorded = h.recorded.borrow();
        assert_eq!(recorded.completions, 1);
        assert!(recorded.errors.is_empty());
        assert_eq!(recorded.finished_count(JobId(0)), 1);
        assert_eq!(recorded.finished_count(JobId(1)), 1);

        let ledger = h.ledger.borrow();
        assert_eq!(ledger.count(Call::Link(JobId(0), FakePad(1))), 1);
        assert_eq!(ledger.count(Call::Link(JobId(1), FakePad(2))), 1);
        assert_eq!(ledger.count(Call::SendEos(JobId(0), MuxInputKind::Video)), 1);
        assert_eq!(ledger.count(Call::SendEos(JobId(1), MuxInputKind::Video)), 1);
        assert_eq!(ledger.count(Call::SendEos(JobId(0), MuxInputKind::Audio)), 0);
        // Finished jobs give their handles back while the graph still runs.
        assert_all_released(&ledger);
        assert_eq!(ledger.stop_calls(), 0);
    }

    #[tokio::test]
    async fn test_graph_built_for_every_job_before_play() {
        let mut h = Harness::new(&["a", "b"]);
        h.start().unwrap();

        let ledger = h.ledger.borrow();
        let play = ledger.position_of(Call::Play).unwrap();
        for job in [JobId(0), JobId(1)] {
            assert!(ledger.position_of(Call::AddChains(job)).unwrap() < play);
            assert!(ledger.position_of(Call::WatchDecoder(job)).unwrap() < play);
            assert_eq!(ledger.count(Call::RequestInput(job, MuxInputKind::Audio)), 1);
            assert_eq!(ledger.count(Call::RequestInput(job, MuxInputKind::Video)), 1);
            assert_eq!(ledger.count(Call::InstallProbe(job, ProbePoint::SinkInput)), 1);
            assert_eq!(
                ledger.count(Call::InstallProbe(job, ProbePoint::AudioEncoderOutput)),
                1
            );
        }
        assert!(h.dir.path().join("out").is_dir());
    }

    #[tokio::test]
    async fn test_teardown_mid_run_releases_everything_once() {
        let mut h = Harness::new(&["a", "b", "c"]);
        h.start().unwrap();
        h.pad(0, 1);
        h.pad(1, 2);
        h.audio_done(0);

        let interrupted =
            tokio::time::timeout(Duration::from_millis(30), h.orchestrator.run()).await;
        assert!(interrupted.is_err());
        assert_eq!(h.orchestrator.state(), RenderState::Running);

        let Harness {
            orchestrator,
            ledger,
            recorded,
            ..
        } = h;
        drop(orchestrator);

        let ledger = ledger.borrow();
        assert_eq!(ledger.stop_calls(), 1);
        assert_all_released(&ledger);

        // Job 0 finished and released on its own; the rest only after stop.
        let stop = ledger.position_of(Call::Stop).unwrap();
        let job0_release = ledger
            .position_of(Call::ReleaseInput(JobId(0), MuxInputKind::Audio))
            .unwrap();
        assert!(job0_release < stop);
        for job in [JobId(1), JobId(2)] {
            for kind in [MuxInputKind::Audio, MuxInputKind::Video] {
                assert!(ledger.position_of(Call::ReleaseInput(job, kind)).unwrap() > stop);
            }
        }

        let recorded = recorded.borrow();
        assert_eq!(recorded.completions, 0);
        assert!(recorded.errors.is_empty());
    }

    #[tokio::test]
    async fn test_engine_error_stops_run_once() {
        let mut h = Harness::new(&["a", "b"]);
        h.start().unwrap();
        h.pad(0, 1);
        h.pad(1, 2);
        h.send(EngineEvent::Failed {
            message: "Internal data stream error.".to_string(),
        });
        h.audio_done(0);

        let outcome = h.orchestrator.run().await.unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Failed {
                message: "Internal data stream error.".to_string()
            }
        );
        assert_eq!(h.orchestrator.state(), RenderState::Failed);

        {
            let recorded = h.recorded.borrow();
            assert_eq!(recorded.errors, vec!["Internal data stream error.".to_string()]);
            assert_eq!(recorded.completions, 0);
        }
        {
            // Nothing after the error is acted on, and no job is finalized.
            let ledger = h.ledger.borrow();
            assert_eq!(ledger.eos_sent(), 0);
            assert_eq!(ledger.live_inputs.len(), 4);
            assert_eq!(ledger.live_probes.len(), 4);
        }

        assert!(h.orchestrator.run().await.is_err());
        assert_eq!(h.recorded.borrow().errors.len(), 1);

        h.orchestrator.shutdown();
        h.orchestrator.shutdown();
        let ledger = h.ledger.borrow();
        assert_eq!(ledger.stop_calls(), 1);
        assert_all_released(&ledger);
    }

    #[tokio::test]
    async fn test_second_decoded_stream_is_discarded() {
        let mut h = Harness::new(&["a"]);
        h.start().unwrap();
        h.pad(0, 1);
        h.pad(0, 2);
        h.audio_done(0);

        assert_eq!(h.orchestrator.run().await.unwrap(), RunOutcome::Completed);
        let ledger = h.ledger.borrow();
        assert_eq!(ledger.count(Call::Link(JobId(0), FakePad(1))), 1);
        assert_eq!(ledger.count(Call::Discard(JobId(0), FakePad(2))), 1);
    }

    #[tokio::test]
    async fn test_track_without_audio_fails_the_run() {
        let mut h = Harness::new(&["cover", "song"]);
        h.start().unwrap();
        h.pad(1, 7);
        h.send(EngineEvent::StreamsSettled { job: JobId(1) });
        h.send(EngineEvent::StreamsSettled { job: JobId(0) });

        let outcome = tokio::time::timeout(Duration::from_secs(5), h.orchestrator.run())
            .await
            .expect("run must not wait for audio that never comes")
            .unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Failed {
                message: "cover.flac has no audio stream".to_string()
            }
        );
        assert_eq!(h.orchestrator.state(), RenderState::Failed);
        assert_eq!(
            h.recorded.borrow().errors,
            vec!["cover.flac has no audio stream".to_string()]
        );

        h.orchestrator.shutdown();
        let ledger = h.ledger.borrow();
        assert_eq!(ledger.count(Call::Link(JobId(1), FakePad(7))), 1);
        assert_eq!(ledger.stop_calls(), 1);
        assert_all_released(&ledger);
    }

    #[tokio::test]
    async fn test_settled_decoder_with_audio_keeps_running() {
        let mut h = Harness::new(&["a"]);
        h.start().unwrap();
        h.pad(0, 1);
        h.send(EngineEvent::StreamsSettled { job: JobId(0) });
        h.audio_done(0);

        assert_eq!(h.orchestrator.run().await.unwrap(), RunOutcome::Completed);
        assert!(h.recorded.borrow().errors.is_empty());
    }

    #[tokio::test]
    async fn test_progress_is_sampled_while_running() {
        let mut h = Harness::new(&["a"]);
        h.start().unwrap();
        h.ledger
            .borrow_mut()
            .positions
            .insert(JobId(0), (Some(3_000), Some(2_000)));

        let _ = tokio::time::timeout(Duration::from_millis(40), h.orchestrator.run()).await;

        let recorded = h.recorded.borrow();
        assert!(!recorded.snapshots.is_empty());
        for snapshot in &recorded.snapshots {
            assert_eq!(snapshot, &vec![RenderProgress::running(JobId(0), 2_000, 2_000)]);
        }
    }

    #[tokio::test]
    async fn test_missing_source_fails_before_building() {
        let mut h = Harness::new(&["a"]);
        h.orchestrator
            .add_job(RenderJob::new(PathBuf::from("/no/such/file.mp3"), "b"))
            .unwrap();

        let err = h.start().unwrap_err();
        assert!(matches!(err, AuricleError::FileNotFound { .. }));
        assert_eq!(h.orchestrator.state(), RenderState::Idle);

        drop(h.orchestrator);
        assert!(h.ledger.borrow().calls.is_empty());
    }

    #[tokio::test]
    async fn test_build_failure_tears_down_partial_graph() {
        let mut h = Harness::new(&["a", "b"]);
        h.ledger.borrow_mut().fail_add_chains = Some(JobId(1));

        assert!(h.start().is_err());
        assert_eq!(h.orchestrator.state(), RenderState::Failed);
        let ledger = h.ledger.borrow();
        assert_eq!(ledger.stop_calls(), 1);
        assert_eq!(ledger.count(Call::Play), 0);
        assert_all_released(&ledger);
    }

    #[tokio::test]
    async fn test_lifecycle_misuse_is_rejected() {
        let mut h = Harness::new(&["a"]);
        assert!(matches!(
            h.orchestrator.run().await,
            Err(AuricleError::InvalidState { .. })
        ));

        h.start().unwrap();
        assert!(matches!(h.start(), Err(AuricleError::InvalidState { .. })));
        assert!(h
            .orchestrator
            .add_job(RenderJob::new(Path::new("/x.mp3"), "x"))
            .is_err());
        assert_eq!(h.orchestrator.job_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_job_set_is_rejected() {
        let mut h = Harness::new(&[]);
        assert!(h.start().is_err());
        assert!(h.ledger.borrow().calls.is_empty());
    }

    #[tokio::test]
    async fn test_odd_image_is_evened_before_building() {
        let mut h = Harness::new(&["a"]);
        let options = h.options();
        h.orchestrator.start(image(101, 50), &options).unwrap();
        assert_eq!(h.ledger.borrow().count(Call::Play), 1);
    }
}
