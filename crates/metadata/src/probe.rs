//! The tag probe: decode a file just far enough to read its tags.
//!
//! The probe pipeline is `filesrc ! typefind ! decodebin3 ! fakesink`,
//! taken to PAUSED. Tag messages are collected from the bus until the
//! pipeline finishes prerolling (ASYNC_DONE) or reports an error.

use std::path::Path;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use auricle_common::error::{AuricleError, AuricleResult};
use auricle_template::TemplateVars;
use gst::glib;
use gst::prelude::*;
use gstreamer as gst;

use crate::file_vars::file_vars;
use crate::tags::{TagTable, TagValue};

/// Reads the tags of one file.
#[derive(Debug, Clone)]
pub struct TagProbe {
    /// Upper bound on how long prerolling may take.
    timeout: Duration,
}

impl Default for TagProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl TagProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Probe `path` and return its full variable table: the file-derived
    /// variables overlaid with every tag read.
    ///
    /// `on_tag` is called each time a tag arrives, with the tag name and
    /// the values now recorded for it. A pipeline error or a timeout ends
    /// the probe early but keeps the tags read so far; only a missing file
    /// or a pipeline that cannot be built is an `Err`.
    pub fn run<F>(&self, path: &Path, mut on_tag: F) -> AuricleResult<ProbeOutcome>
    where
        F: FnMut(&str, &[String]),
    {
        if !path.is_file() {
            return Err(AuricleError::file_not_found(path));
        }
        init_gstreamer()?;

        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pipeline = build_probe_pipeline(path)?;
        let bus = pipeline
            .bus()
            .ok_or_else(|| AuricleError::metadata("Tag pipeline has no bus"))?;

        if let Err(e) = pipeline.set_state(gst::State::Paused) {
            // The reason is posted on the bus and picked up below.
            tracing::debug!(path = %path.display(), error = ?e, "Tag pipeline refused to pause");
        }

        let mut table = TagTable::new();
        let deadline = Instant::now() + self.timeout;
        let error = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let timeout = gst::ClockTime::from_nseconds(remaining.as_nanos() as u64);
            let Some(msg) = bus.timed_pop(timeout) else {
                break Some(format!(
                    "Reading tags of {basename} timed out after {}s",
                    self.timeout.as_secs()
                ));
            };

            match msg.view() {
                gst::MessageView::Tag(tag) => {
                    let tags = tag.tags();
                    for (name, values) in tags.iter_generic() {
                        let name = name.to_string();
                        let recorded = table.update(&name, values.filter_map(|v| tag_value(v)));
                        tracing::trace!(path = %path.display(), tag = %name, ?recorded, "Tag read");
                        on_tag(&name, recorded);
                    }
                }
                gst::MessageView::AsyncDone(_) => break None,
                gst::MessageView::Error(err) => {
                    break Some(format!(
                        "Pipeline for {basename} tags got error: {}",
                        err.error()
                    ));
                }
                _ => {}
            }
        };

        if let Err(e) = pipeline.set_state(gst::State::Null) {
            tracing::warn!(path = %path.display(), error = ?e, "Failed to stop tag pipeline");
        }

        tracing::debug!(
            path = %path.display(),
            tags = table.len(),
            complete = error.is_none(),
            "Tags probed"
        );
        Ok(ProbeOutcome::new(path, table, error))
    }
}

/// What a probe read from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// File variables overlaid with the tags that were read.
    pub vars: TemplateVars,
    /// Notification text when the probe stopped before prerolling.
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn new(path: &Path, table: TagTable, error: Option<String>) -> Self {
        let mut vars = file_vars(path);
        vars.merge(table.into_vars());
        Self { vars, error }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Probe `path` with the default timeout.
pub fn probe_tags(path: &Path) -> AuricleResult<ProbeOutcome> {
    TagProbe::default().run(path, |_, _| {})
}

/// Probe `path` with the default timeout, reporting each tag as it arrives.
pub fn probe_tags_with<F>(path: &Path, on_tag: F) -> AuricleResult<ProbeOutcome>
where
    F: FnMut(&str, &[String]),
{
    TagProbe::default().run(path, on_tag)
}

/// Initialize GStreamer once per process.
pub fn init_gstreamer() -> AuricleResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(AuricleError::engine(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

fn build_probe_pipeline(path: &Path) -> AuricleResult<gst::Pipeline> {
    let location = path.to_string_lossy().into_owned();
    let pipeline = gst::Pipeline::with_name("tag-pipeline");

    let src = gst::ElementFactory::make("filesrc")
        .property("location", location.as_str())
        .build()
        .map_err(|e| AuricleError::metadata(format!("Failed to create filesrc: {e}")))?;
    let typefind = make_element("typefind")?;
    let decoder = make_element("decodebin3")?;
    let sink = make_element("fakesink")?;

    pipeline
        .add_many([&src, &typefind, &decoder, &sink])
        .map_err(|e| AuricleError::metadata(format!("Failed to assemble tag pipeline: {e}")))?;
    gst::Element::link_many([&src, &typefind, &decoder])
        .map_err(|e| AuricleError::metadata(format!("Failed to link tag pipeline: {e}")))?;

    let pipeline_weak = pipeline.downgrade();
    let sink_weak = sink.downgrade();
    decoder.connect_pad_added(move |_, pad| {
        let (Some(pipeline), Some(sink)) = (pipeline_weak.upgrade(), sink_weak.upgrade()) else {
            return;
        };
        let Some(sink_pad) = sink.static_pad("sink") else {
            return;
        };

        if !sink_pad.is_linked() {
            if let Err(e) = pad.link(&sink_pad) {
                tracing::warn!(pad = %pad.name(), error = ?e, "Failed to link decoded stream");
            }
            return;
        }

        // Further streams (cover art, video) get a sink of their own so
        // they cannot stall prerolling.
        let Ok(extra) = gst::ElementFactory::make("fakesink").build() else {
            return;
        };
        if pipeline.add(&extra).is_err() {
            return;
        }
        let linked = extra
            .static_pad("sink")
            .is_some_and(|extra_pad| pad.link(&extra_pad).is_ok());
        if !linked || extra.sync_state_with_parent().is_err() {
            tracing::debug!(pad = %pad.name(), "Could not drain extra decoded stream");
        }
    });

    Ok(pipeline)
}

fn make_element(factory: &str) -> AuricleResult<gst::Element> {
    gst::ElementFactory::make(factory)
        .build()
        .map_err(|e| AuricleError::metadata(format!("Failed to create {factory}: {e}")))
}

/// Convert one tag value; unsupported types yield `None`.
fn tag_value(value: &glib::Value) -> Option<TagValue> {
    let ty = value.type_();
    if ty == glib::Type::BOOL {
        value.get::<bool>().ok().map(TagValue::Bool)
    } else if ty == glib::Type::I32 {
        value.get::<i32>().ok().map(TagValue::I32)
    } else if ty == glib::Type::U32 {
        value.get::<u32>().ok().map(TagValue::U32)
    } else if ty == glib::Type::I64 {
        value.get::<i64>().ok().map(TagValue::I64)
    } else if ty == glib::Type::U64 {
        value.get::<u64>().ok().map(TagValue::U64)
    } else if ty == glib::Type::F32 {
        value.get::<f32>().ok().map(TagValue::F32)
    } else if ty == glib::Type::F64 {
        value.get::<f64>().ok().map(TagValue::F64)
    } else if ty == glib::Type::STRING {
        value.get::<String>().ok().map(TagValue::Str)
    } else {
        None
    }
}
