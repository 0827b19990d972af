//! Auricle Metadata Extractor
//!
//! Reads the tags of an audio file by running a short decode probe and
//! exposes them as template variables, together with the file-derived
//! `path`, `basename` and `name` variables every track carries.

pub mod file_vars;
pub mod probe;
pub mod tags;

pub use file_vars::{file_vars, strip_extension, VAR_BASENAME, VAR_NAME, VAR_PATH};
pub use probe::{init_gstreamer, probe_tags, probe_tags_with, ProbeOutcome, TagProbe};
pub use tags::{TagTable, TagValue};
