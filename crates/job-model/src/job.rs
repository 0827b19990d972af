//! Render jobs and the job set handed to the orchestrator.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Container extension of every rendered file.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Position of a job within a run. Progress samples refer to jobs by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub usize);

impl JobId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One music file destined for one output video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJob {
    /// Source audio file.
    pub source: PathBuf,

    /// Output base name, without directory or extension.
    pub result_name: String,
}

impl RenderJob {
    pub fn new(source: impl Into<PathBuf>, result_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            result_name: result_name.into(),
        }
    }

    /// `<output_dir>/<result_name>.mp4`
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.{OUTPUT_EXTENSION}", self.result_name))
    }
}

/// Ordered set of jobs collected before a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderJobSet {
    jobs: Vec<RenderJob>,
}

impl RenderJobSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job and return its id.
    pub fn add(&mut self, source: impl Into<PathBuf>, result_name: impl Into<String>) -> JobId {
        self.jobs.push(RenderJob::new(source, result_name));
        JobId(self.jobs.len() - 1)
    }

    /// Remove a job. Ids of later jobs shift down by one.
    pub fn remove(&mut self, id: JobId) -> Option<RenderJob> {
        (id.0 < self.jobs.len()).then(|| self.jobs.remove(id.0))
    }

    pub fn get(&self, id: JobId) -> Option<&RenderJob> {
        self.jobs.get(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (JobId, &RenderJob)> {
        self.jobs.iter().enumerate().map(|(i, job)| (JobId(i), job))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    /// Result names that more than one job would write to.
    pub fn duplicate_result_names(&self) -> Vec<&str> {
        let mut seen = std::collections::BTreeMap::<&str, usize>::new();
        for job in &self.jobs {
            *seen.entry(job.result_name.as_str()).or_default() += 1;
        }
        seen.into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(name, _)| name)
            .collect()
    }
}

impl IntoIterator for RenderJobSet {
    type Item = RenderJob;
    type IntoIter = std::vec::IntoIter<RenderJob>;

    fn into_iter(self) -> Self::IntoIter {
        self.jobs.into_iter()
    }
}
