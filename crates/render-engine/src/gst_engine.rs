//! GStreamer implementation of [`RenderEngine`].
//!
//! Per job the graph holds:
//!
//! ```text
//! appsrc ! videoconvert ! imagefreeze ! x264enc ──────────────┐
//!                                                              ├─ mp4mux ! filesink
//! filesrc ! decodebin3 ~> audioconvert ! audioresample ! fdkaacenc ─┘
//! ```
//!
//! `~>` is linked once decodebin3 exposes its decoded audio pad. Every
//! job lives in the same pipeline and shares its bus and clock.
//!
//! A decoder that announces its last pad, or a stream collection with no
//! audio in it, is reported as [`EngineEvent::StreamsSettled`] so a track
//! without audio ends the run instead of stalling every muxer.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use auricle_common::error::{AuricleError, AuricleResult};
use auricle_job_model::{JobId, StillImage};
use auricle_metadata::init_gstreamer;
use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;

use crate::engine::{
    event_channel, ChainPlan, EngineEvent, EventSender, MuxInputId, MuxInputKind, ProbeId,
    ProbePoint, RenderEngine,
};
use crate::orchestrator::{Orchestrator, RenderObserver};

/// Element factories a render needs.
pub const REQUIRED_ELEMENTS: &[&str] = &[
    "appsrc",
    "videoconvert",
    "imagefreeze",
    "x264enc",
    "filesrc",
    "typefind",
    "decodebin3",
    "audioconvert",
    "audioresample",
    "fdkaacenc",
    "mp4mux",
    "filesink",
    "fakesink",
];

/// Required element factories that are not installed.
pub fn missing_elements() -> AuricleResult<Vec<&'static str>> {
    init_gstreamer()?;
    Ok(REQUIRED_ELEMENTS
        .iter()
        .copied()
        .filter(|name| gst::ElementFactory::find(name).is_none())
        .collect())
}

/// A decoded audio pad, held blocked until it is linked or discarded.
#[derive(Debug)]
pub struct DiscoveredPad {
    pad: gst::Pad,
    block: Option<gst::PadProbeId>,
}

impl DiscoveredPad {
    fn unblock(&mut self) {
        if let Some(block) = self.block.take() {
            self.pad.remove_probe(block);
        }
    }
}

struct JobElements {
    video_encoder: gst::Element,
    decoder: gst::Element,
    audio_convert: gst::Element,
    audio_encoder: gst::Element,
    mux: gst::Element,
    sink: gst::Element,
}

struct MuxInput {
    mux: gst::Element,
    pad: gst::Pad,
}

struct InstalledProbe {
    pad: gst::Pad,
    id: gst::PadProbeId,
}

pub struct GstEngine {
    pipeline: gst::Pipeline,
    events: EventSender<DiscoveredPad>,
    jobs: BTreeMap<JobId, JobElements>,
    mux_inputs: HashMap<MuxInputId, MuxInput>,
    probes: HashMap<ProbeId, InstalledProbe>,
    next_handle: u64,
    stopped: bool,
}

impl GstEngine {
    /// Create an empty render pipeline reporting on `events`.
    pub fn new(events: EventSender<DiscoveredPad>) -> AuricleResult<Self> {
        init_gstreamer()?;

        let pipeline = gst::Pipeline::with_name("render-pipeline");
        let bus = pipeline
            .bus()
            .ok_or_else(|| AuricleError::engine("Render pipeline has no bus"))?;

        let bus_events = events.clone();
        bus.set_sync_handler(move |_, msg| {
            match msg.view() {
                gst::MessageView::Eos(_) => {
                    let _ = bus_events.send(EngineEvent::Finished);
                }
                gst::MessageView::StreamCollection(msg) => {
                    let collection = msg.stream_collection();
                    let types: Vec<gst::StreamType> =
                        collection.iter().map(|stream| stream.stream_type()).collect();
                    if lacks_audio(&types) {
                        if let Some(job) = msg.src().and_then(owning_job) {
                            tracing::debug!(job = %job, ?types, "Source has no audio stream");
                            let _ = bus_events.send(EngineEvent::StreamsSettled { job });
                        }
                    }
                }
                gst::MessageView::Error(err) => {
                    tracing::debug!(
                        source = ?err.src().map(|s| s.path_string()),
                        debug = ?err.debug(),
                        "Render pipeline error"
                    );
                    let _ = bus_events.send(EngineEvent::Failed {
                        message: err.error().to_string(),
                    });
                }
                _ => {}
            }
            gst::BusSyncReply::Drop
        });

        Ok(Self {
            pipeline,
            events,
            jobs: BTreeMap::new(),
            mux_inputs: HashMap::new(),
            probes: HashMap::new(),
            next_handle: 0,
            stopped: false,
        })
    }

    fn job(&self, job: JobId) -> AuricleResult<&JobElements> {
        self.jobs
            .get(&job)
            .ok_or_else(|| AuricleError::engine(format!("Job {job} has no chains")))
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn build_image_source(
        &self,
        job: JobId,
        plan: &ChainPlan<'_>,
    ) -> AuricleResult<gst::Element> {
        let (caps, frame) = still_frame(plan.image)?;

        let appsrc = make_element("appsrc", format!("job{}-image", job.index()))?
            .dynamic_cast::<gst_app::AppSrc>()
            .map_err(|_| AuricleError::engine("appsrc is not an AppSrc"))?;
        appsrc.set_caps(Some(&caps));

        // The single frame goes out on the first request, followed at once
        // by end-of-stream; imagefreeze repeats it for the whole video.
        let pending = Mutex::new(Some(frame));
        appsrc.set_callbacks(
            gst_app::AppSrcCallbacks::builder()
                .need_data(move |appsrc, _| {
                    let Some(frame) = pending.lock().ok().and_then(|mut f| f.take()) else {
                        return;
                    };
                    if let Err(e) = appsrc.push_buffer(frame) {
                        tracing::warn!(error = ?e, "Failed to push still frame");
                    }
                    if let Err(e) = appsrc.end_of_stream() {
                        tracing::warn!(error = ?e, "Failed to end still image stream");
                    }
                })
                .build(),
        );

        Ok(appsrc.upcast())
    }
}

impl RenderEngine for GstEngine {
    type DecodedPad = DiscoveredPad;

    fn add_job_chains(&mut self, job: JobId, plan: &ChainPlan<'_>) -> AuricleResult<()> {
        if self.jobs.contains_key(&job) {
            return Err(AuricleError::invalid_state(format!(
                "Job {job} already has chains"
            )));
        }
        let n = job.index();
        let source = plan.source.to_string_lossy().into_owned();
        let output = plan.output_path.to_string_lossy().into_owned();

        let image_src = self.build_image_source(job, plan)?;
        let image_convert = make_element("videoconvert", format!("job{n}-videoconvert"))?;
        let image_freeze = make_element("imagefreeze", format!("job{n}-imagefreeze"))?;
        let video_encoder = make_element("x264enc", format!("job{n}-x264enc"))?;

        let audio_src = gst::ElementFactory::make("filesrc")
            .name(format!("job{n}-filesrc"))
            .property("location", source.as_str())
            .build()
            .map_err(|e| AuricleError::engine(format!("Failed to create filesrc: {e}")))?;
        let decoder = make_element("decodebin3", decoder_name(job))?;
        let audio_convert = make_element("audioconvert", format!("job{n}-audioconvert"))?;
        let audio_resample = make_element("audioresample", format!("job{n}-audioresample"))?;
        let audio_encoder = gst::ElementFactory::make("fdkaacenc")
            .name(format!("job{n}-fdkaacenc"))
            .property("bitrate", i32::try_from(plan.audio_bitrate_bps).unwrap_or(i32::MAX))
            .build()
            .map_err(|e| AuricleError::engine(format!("Failed to create fdkaacenc: {e}")))?;

        let mux = make_element("mp4mux", format!("job{n}-mp4mux"))?;
        let sink = gst::ElementFactory::make("filesink")
            .name(format!("job{n}-filesink"))
            .property("location", output.as_str())
            .property("sync", false)
            .build()
            .map_err(|e| AuricleError::engine(format!("Failed to create filesink: {e}")))?;

        self.pipeline
            .add_many([
                &image_src,
                &image_convert,
                &image_freeze,
                &video_encoder,
                &audio_src,
                &decoder,
                &audio_convert,
                &audio_resample,
                &audio_encoder,
                &mux,
                &sink,
            ])
            .map_err(|e| AuricleError::engine(format!("Failed to add job {job} chains: {e}")))?;

        let link_err = |what: &str, e: gst::glib::BoolError| {
            AuricleError::engine(format!("Failed to link {what} for job {job}: {e}"))
        };
        gst::Element::link_many([&image_src, &image_convert, &image_freeze, &video_encoder])
            .map_err(|e| link_err("video chain", e))?;
        audio_src
            .link(&decoder)
            .map_err(|e| link_err("audio source", e))?;
        gst::Element::link_many([&audio_convert, &audio_resample, &audio_encoder])
            .map_err(|e| link_err("audio encoder chain", e))?;
        mux.link(&sink).map_err(|e| link_err("muxer output", e))?;

        tracing::info!(
            job = %job,
            source = %plan.source.display(),
            output = %plan.output_path.display(),
            "Added job to render pipeline"
        );

        self.jobs.insert(
            job,
            JobElements {
                video_encoder,
                decoder,
                audio_convert,
                audio_encoder,
                mux,
                sink,
            },
        );
        Ok(())
    }

    fn request_mux_input(&mut self, job: JobId, kind: MuxInputKind) -> AuricleResult<MuxInputId> {
        let elements = self.job(job)?;
        let mux = elements.mux.clone();
        let encoder = match kind {
            MuxInputKind::Audio => &elements.audio_encoder,
            MuxInputKind::Video => &elements.video_encoder,
        };
        let encoder_pad = encoder.static_pad("src").ok_or_else(|| {
            AuricleError::engine(format!("{kind} encoder of job {job} has no src pad"))
        })?;

        let pad = mux.request_pad_simple(kind.pad_template()).ok_or_else(|| {
            AuricleError::engine(format!("Muxer of job {job} refused a {kind} input"))
        })?;
        if let Err(e) = encoder_pad.link(&pad) {
            mux.release_request_pad(&pad);
            return Err(AuricleError::engine(format!(
                "Failed to link {kind} encoder of job {job}: {e:?}"
            )));
        }

        let id = MuxInputId(self.next_handle());
        self.mux_inputs.insert(id, MuxInput { mux, pad });
        Ok(id)
    }

    fn release_mux_input(&mut self, input: MuxInputId) {
        let Some(MuxInput { mux, pad }) = self.mux_inputs.remove(&input) else {
            tracing::warn!(input = input.0, "Muxer input released twice");
            return;
        };
        if let Some(peer) = pad.peer() {
            if let Err(e) = peer.unlink(&pad) {
                tracing::debug!(input = input.0, error = ?e, "Muxer input was already unlinked");
            }
        }
        mux.release_request_pad(&pad);
    }

    fn install_eos_probe(&mut self, job: JobId, point: ProbePoint) -> AuricleResult<ProbeId> {
        let elements = self.job(job)?;
        let pad = match point {
            ProbePoint::AudioEncoderOutput => elements.audio_encoder.static_pad("src"),
            ProbePoint::SinkInput => elements.sink.static_pad("sink"),
        }
        .ok_or_else(|| AuricleError::engine(format!("Job {job} has no pad at {point}")))?;

        let events = self.events.clone();
        let id = pad
            .add_probe(gst::PadProbeType::EVENT_DOWNSTREAM, move |_, info| {
                if let Some(gst::PadProbeData::Event(ref event)) = info.data {
                    if event.type_() == gst::EventType::Eos {
                        let _ = events.send(EngineEvent::ProbeEos { job, point });
                    }
                }
                gst::PadProbeReturn::Ok
            })
            .ok_or_else(|| AuricleError::engine(format!("Failed to watch {point} of job {job}")))?;

        let handle = ProbeId(self.next_handle());
        self.probes.insert(handle, InstalledProbe { pad, id });
        Ok(handle)
    }

    fn remove_probe(&mut self, probe: ProbeId) {
        match self.probes.remove(&probe) {
            Some(InstalledProbe { pad, id }) => pad.remove_probe(id),
            None => tracing::warn!(probe = probe.0, "Probe removed twice"),
        }
    }

    fn watch_decoder(&mut self, job: JobId) -> AuricleResult<()> {
        let decoder = self.job(job)?.decoder.clone();
        let events = self.events.clone();
        let pipeline = self.pipeline.downgrade();

        let settled_events = events.clone();
        decoder.connect_no_more_pads(move |_| {
            let _ = settled_events.send(EngineEvent::StreamsSettled { job });
        });

        decoder.connect_pad_added(move |_, pad| {
            if !is_audio_pad(pad) {
                if let Some(pipeline) = pipeline.upgrade() {
                    if let Err(e) = drain_into_fakesink(&pipeline, pad) {
                        tracing::warn!(
                            job = %job,
                            pad = %pad.name(),
                            error = %e,
                            "Failed to drain non-audio stream"
                        );
                    }
                }
                return;
            }

            // Hold data back until the orchestrator has linked the pad.
            let block = pad.add_probe(gst::PadProbeType::BLOCK_DOWNSTREAM, |_, _| {
                gst::PadProbeReturn::Ok
            });
            let discovered = DiscoveredPad {
                pad: pad.clone(),
                block,
            };
            if let Err(e) = events.send(EngineEvent::PadDiscovered {
                job,
                pad: discovered,
            }) {
                // Nobody is listening any more; let the stream flow.
                let mut discovered = match e.0 {
                    EngineEvent::PadDiscovered { pad, .. } => pad,
                    _ => return,
                };
                discovered.unblock();
            }
        });
        Ok(())
    }

    fn link_decoded_stream(&mut self, job: JobId, mut pad: DiscoveredPad) -> AuricleResult<()> {
        let target = self
            .job(job)?
            .audio_convert
            .static_pad("sink")
            .ok_or_else(|| {
                AuricleError::engine(format!("Audio converter of job {job} has no sink pad"))
            })?;

        let linked = pad.pad.link(&target);
        pad.unblock();
        linked.map_err(|e| {
            AuricleError::engine(format!("Failed to link decoded audio of job {job}: {e:?}"))
        })?;
        tracing::debug!(job = %job, pad = %pad.pad.name(), "Linked decoded audio");
        Ok(())
    }

    fn discard_stream(&mut self, job: JobId, mut pad: DiscoveredPad) {
        if let Err(e) = drain_into_fakesink(&self.pipeline, &pad.pad) {
            tracing::warn!(
                job = %job,
                pad = %pad.pad.name(),
                error = %e,
                "Failed to drain extra stream"
            );
        }
        pad.unblock();
    }

    fn send_eos(&mut self, input: MuxInputId) -> bool {
        match self.mux_inputs.get(&input) {
            Some(MuxInput { pad, .. }) => pad.send_event(gst::event::Eos::new()),
            None => false,
        }
    }

    fn query_position(&self, job: JobId) -> Option<u64> {
        let sink = &self.jobs.get(&job)?.sink;
        sink.query_position::<gst::ClockTime>()
            .map(gst::ClockTime::nseconds)
    }

    fn query_duration(&self, job: JobId) -> Option<u64> {
        let decoder = &self.jobs.get(&job)?.decoder;
        decoder
            .query_duration::<gst::ClockTime>()
            .map(gst::ClockTime::nseconds)
    }

    fn play(&mut self) -> AuricleResult<()> {
        self.pipeline.set_state(gst::State::Playing).map_err(|e| {
            AuricleError::engine(format!("Failed to start render pipeline: {e:?}"))
        })?;
        tracing::info!(jobs = self.jobs.len(), "Render pipeline playing");
        Ok(())
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        if let Some(bus) = self.pipeline.bus() {
            bus.unset_sync_handler();
        }
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            tracing::warn!(error = ?e, "Failed to stop render pipeline");
        }
        tracing::debug!("Render pipeline stopped");
    }
}

impl Drop for GstEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Caps and the single buffer for `image`, with rows padded to the
/// stride the caps imply.
fn still_frame(image: &StillImage) -> AuricleResult<(gst::Caps, gst::Buffer)> {
    let format = if image.has_alpha() {
        gst_video::VideoFormat::Rgba
    } else {
        gst_video::VideoFormat::Rgb
    };
    let info = gst_video::VideoInfo::builder(format, image.width(), image.height())
        .fps(gst::Fraction::new(0, 1))
        .build()
        .map_err(|e| AuricleError::engine(format!("Invalid still image format: {e}")))?;
    let caps = info
        .to_caps()
        .map_err(|e| AuricleError::engine(format!("Failed to build image caps: {e}")))?;

    let stride = usize::try_from(info.stride()[0]).unwrap_or(image.row_bytes());
    let frame = gst::Buffer::from_mut_slice(image.packed_to_stride(stride));
    Ok((caps, frame))
}

fn make_element(factory: &str, name: String) -> AuricleResult<gst::Element> {
    gst::ElementFactory::make(factory)
        .name(name)
        .build()
        .map_err(|e| AuricleError::engine(format!("Failed to create {factory}: {e}")))
}

fn decoder_name(job: JobId) -> String {
    format!("job{}-decodebin3", job.index())
}

/// The job whose decoder `object` is, or lives inside.
fn owning_job(object: &gst::Object) -> Option<JobId> {
    let mut current = Some(object.clone());
    while let Some(obj) = current {
        if let Some(job) = job_of_decoder_name(&obj.name()) {
            return Some(job);
        }
        current = obj.parent();
    }
    None
}

fn job_of_decoder_name(name: &str) -> Option<JobId> {
    name.strip_prefix("job")?
        .strip_suffix("-decodebin3")?
        .parse()
        .ok()
        .map(JobId)
}

/// Whether a non-empty stream collection carries no audio at all.
fn lacks_audio(types: &[gst::StreamType]) -> bool {
    !types.is_empty() && !types.iter().any(|t| t.contains(gst::StreamType::AUDIO))
}

fn is_audio_pad(pad: &gst::Pad) -> bool {
    if let Some(stream) = pad.stream() {
        return stream.stream_type().contains(gst::StreamType::AUDIO);
    }
    pad.current_caps()
        .unwrap_or_else(|| pad.query_caps(None))
        .structure(0)
        .is_some_and(|s| s.name().starts_with("audio/"))
}

/// Give `pad` a private fakesink so it neither stalls nor errors the graph.
fn drain_into_fakesink(pipeline: &gst::Pipeline, pad: &gst::Pad) -> Result<(), String> {
    let sink = gst::ElementFactory::make("fakesink")
        .property("sync", false)
        .build()
        .map_err(|e| e.to_string())?;
    pipeline.add(&sink).map_err(|e| e.to_string())?;
    let sink_pad = sink
        .static_pad("sink")
        .ok_or_else(|| "fakesink has no sink pad".to_string())?;
    pad.link(&sink_pad).map_err(|e| format!("{e:?}"))?;
    sink.sync_state_with_parent().map_err(|e| e.to_string())?;
    Ok(())
}

impl Orchestrator<GstEngine> {
    /// An orchestrator driving a fresh GStreamer pipeline.
    pub fn with_gstreamer(observer: Box<dyn RenderObserver>) -> AuricleResult<Self> {
        let (events, receiver) = event_channel();
        let engine = GstEngine::new(events)?;
        Ok(Orchestrator::new(engine, receiver, observer))
    }
}
