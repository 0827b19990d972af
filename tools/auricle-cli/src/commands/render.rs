//! Render one video per track.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use auricle_common::clock::format_clock;
use auricle_common::config::AppConfig;
use auricle_job_model::{RenderJobSet, RenderOptions, RenderProgress, StillImage};
use auricle_render_engine::{Orchestrator, RenderObserver, RunOutcome};
use auricle_template::resolve_result_name;

use super::tags::track_vars;

pub struct RenderArgs {
    pub image: PathBuf,
    pub output: Option<PathBuf>,
    pub bitrate: Option<u32>,
    pub template: Option<String>,
    pub override_template: Option<String>,
    pub tracks: Vec<PathBuf>,
}

pub async fn run(args: RenderArgs, config: &AppConfig) -> anyhow::Result<()> {
    let output_dir = args
        .output
        .or_else(|| config.render.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let template = args
        .template
        .unwrap_or_else(|| config.render.name_template.clone());
    let requested_kbps = args.bitrate.unwrap_or(config.render.audio_bitrate_kbps);
    let options = RenderOptions::new(output_dir, requested_kbps);
    if options.audio_bitrate_kbps() != requested_kbps {
        println!(
            "Audio bitrate {requested_kbps} kbps is out of range, using {} kbps",
            options.audio_bitrate_kbps()
        );
    }

    let image = StillImage::open(&args.image)
        .with_context(|| format!("Failed to load image {}", args.image.display()))?;

    let jobs = build_jobs(&args.tracks, &template, args.override_template.as_deref())?;

    println!(
        "Rendering {} track(s) into {}",
        jobs.len(),
        options.output_dir().display()
    );
    for (id, job) in jobs.iter() {
        println!(
            "  {id} {} -> {}",
            job.source.display(),
            job.output_path(options.output_dir()).display()
        );
    }

    let names = jobs.iter().map(|(_, job)| job.result_name.clone()).collect();
    let mut orchestrator = Orchestrator::with_gstreamer(Box::new(ConsoleProgress::new(names)))?;
    orchestrator.add_jobs(jobs)?;
    orchestrator.start(image, &options)?;
    let outcome = orchestrator.run().await?;
    orchestrator.shutdown();

    match outcome {
        RunOutcome::Completed => {
            println!("Render complete");
            Ok(())
        }
        RunOutcome::Failed { message } => {
            anyhow::bail!("Error in render pipeline: {message}")
        }
    }
}

/// Resolve every track's output name and collect the job set.
fn build_jobs(
    tracks: &[PathBuf],
    template: &str,
    override_template: Option<&str>,
) -> anyhow::Result<RenderJobSet> {
    let mut jobs = RenderJobSet::new();
    for track in tracks {
        let vars = track_vars(track);
        let name = resolve_result_name(template, override_template, &vars);
        if name.trim().is_empty() {
            anyhow::bail!(
                "Template resolves to an empty name for {}",
                track.display()
            );
        }
        jobs.add(track.clone(), name);
    }

    let duplicates = jobs.duplicate_result_names();
    if !duplicates.is_empty() {
        anyhow::bail!(
            "Several tracks would be written to the same file: {}",
            duplicates.join(", ")
        );
    }
    Ok(jobs)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RowState {
    Waiting,
    Running { position_ns: u64, duration_ns: u64 },
    Done,
}

/// Prints one status line that is rewritten on every progress sample.
///
/// Samples are transient, so the last known state of every job is kept
/// here.
struct ConsoleProgress {
    names: Vec<String>,
    rows: Vec<RowState>,
}

impl ConsoleProgress {
    fn new(names: Vec<String>) -> Self {
        let rows = vec![RowState::Waiting; names.len()];
        Self { names, rows }
    }

    fn apply(&mut self, progress: &[RenderProgress]) {
        for p in progress {
            let Some(row) = self.rows.get_mut(p.job.index()) else {
                continue;
            };
            *row = if p.finished {
                RowState::Done
            } else {
                RowState::Running {
                    position_ns: p.position_ns,
                    duration_ns: p.duration_ns,
                }
            };
        }
    }

    fn status_line(&self) -> String {
        self.names
            .iter()
            .zip(&self.rows)
            .map(|(name, row)| match *row {
                RowState::Waiting => format!("{name}: waiting"),
                RowState::Running {
                    position_ns,
                    duration_ns,
                } => format!(
                    "{name}: {}/{} ({:.0}%)",
                    format_clock(position_ns),
                    format_clock(duration_ns),
                    auricle_common::clock::fraction(position_ns, duration_ns) * 100.0
                ),
                RowState::Done => format!("{name}: done"),
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl RenderObserver for ConsoleProgress {
    fn on_error(&mut self, message: &str) {
        println!();
        tracing::error!(error = %message, "Render pipeline error");
    }

    fn on_progress(&mut self, progress: &[RenderProgress]) {
        self.apply(progress);
        print!("\r  {}  ", self.status_line());
        let _ = std::io::stdout().flush();
    }

    fn on_complete(&mut self) {
        println!();
    }
}
