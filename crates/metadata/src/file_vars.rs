//! Variables every track has, whatever its tags say.

use std::path::{Path, PathBuf};

use auricle_template::TemplateVars;

/// Absolute source path.
pub const VAR_PATH: &str = "path";
/// File name with extension.
pub const VAR_BASENAME: &str = "basename";
/// File name without extension.
pub const VAR_NAME: &str = "name";

/// Cut `basename` at its last `.`.
///
/// A name that starts with its only dot, such as `.hidden`, strips to
/// the empty string.
pub fn strip_extension(basename: &str) -> &str {
    match basename.rfind('.') {
        Some(dot) => &basename[..dot],
        None => basename,
    }
}

/// Build the `path`, `basename` and `name` variables for `path`.
pub fn file_vars(path: &Path) -> TemplateVars {
    let absolute = absolute_path(path);
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| absolute.to_string_lossy().into_owned());
    let name = strip_extension(&basename).to_string();

    let mut vars = TemplateVars::new();
    vars.set_single(VAR_PATH, absolute.to_string_lossy());
    vars.set_single(VAR_BASENAME, basename);
    vars.set_single(VAR_NAME, name);
    vars
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot resolve working directory");
            path.to_path_buf()
        }
    }
}
