//! Auricle CLI: turn music tracks and a cover image into MP4 videos.
//!
//! Usage:
//!   auricle render --image <IMAGE> <AUDIO>...   Render one video per track
//!   auricle tags <AUDIO>...                     Show the variables of each track
//!   auricle check                               Check GStreamer plugins

use std::path::PathBuf;

use auricle_common::config::AppConfig;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "auricle",
    about = "Render music tracks with a still image into MP4 videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one video per audio track
    Render {
        /// Still image shown for the whole video
        #[arg(short, long)]
        image: PathBuf,

        /// Output directory (defaults to the configured one, then ".")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Audio bitrate in kbps, clamped to 128..=512
        #[arg(short, long)]
        bitrate: Option<u32>,

        /// Output name template, e.g. "@{artist} - @{title}"
        #[arg(short, long)]
        template: Option<String>,

        /// Template applied on top of the first; "@{default}" is its result
        #[arg(long = "override")]
        override_template: Option<String>,

        /// Audio tracks to render
        #[arg(required = true)]
        tracks: Vec<PathBuf>,
    },

    /// Show the template variables each track exposes
    Tags {
        /// Print the variables as JSON
        #[arg(long)]
        json: bool,

        /// Audio tracks to probe
        #[arg(required = true)]
        tracks: Vec<PathBuf>,
    },

    /// Check that the required GStreamer elements are installed
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep GStreamer quiet unless asked otherwise.
    if std::env::var_os("GST_DEBUG").is_none() {
        std::env::set_var("GST_DEBUG", if cli.verbose { "4" } else { "2" });
    }

    let config = AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    auricle_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Render {
            image,
            output,
            bitrate,
            template,
            override_template,
            tracks,
        } => {
            commands::render::run(
                commands::render::RenderArgs {
                    image,
                    output,
                    bitrate,
                    template,
                    override_template,
                    tracks,
                },
                &config,
            )
            .await
        }
        Commands::Tags { json, tracks } => commands::tags::run(tracks, json),
        Commands::Check => commands::check::run(),
    }
}
