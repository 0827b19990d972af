//! Show the template variables of each track.

use std::collections::BTreeMap;
use std::path::PathBuf;

use auricle_metadata::{file_vars, probe_tags_with, ProbeOutcome};
use auricle_template::TemplateVars;

pub fn run(tracks: Vec<PathBuf>, json: bool) -> anyhow::Result<()> {
    let mut tables = BTreeMap::new();

    for track in tracks {
        let vars = track_vars(&track);
        if !json {
            print_table(&track, &vars);
        }
        tables.insert(track.display().to_string(), vars);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
    }
    Ok(())
}

/// Probe a track. Tags read before a probe error are kept; a track that
/// cannot be probed at all falls back to its file-derived variables.
pub(crate) fn track_vars(track: &std::path::Path) -> TemplateVars {
    let probed = probe_tags_with(track, |name, values| {
        tracing::debug!(track = %track.display(), tag = name, ?values, "Tag");
    });
    match probed {
        Ok(ProbeOutcome { vars, error }) => {
            if let Some(message) = error {
                eprintln!("{message}");
            }
            vars
        }
        Err(e) => {
            eprintln!("{e}");
            file_vars(track)
        }
    }
}

fn print_table(track: &std::path::Path, vars: &TemplateVars) {
    println!("{}", track.display());
    let width = vars.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    for (name, values) in vars.iter() {
        println!("  {name:>width$}  {}", values.join(", "));
    }
    println!();
}
