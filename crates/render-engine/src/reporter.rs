//! Progress sampling.
//!
//! Every tick each job is asked for its written position and decoded
//! duration. Jobs whose queries fail this tick are left out; finished
//! jobs are reported exactly once and then never again.

use std::time::Duration;

use auricle_job_model::{JobId, RenderProgress};

use crate::engine::RenderEngine;
use crate::runtime::JobRuntime;

/// How often progress is sampled while rendering.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Take one progress snapshot across `jobs`, in job order.
pub(crate) fn sample_progress<E: RenderEngine>(
    engine: &E,
    jobs: &mut [JobRuntime],
) -> Vec<RenderProgress> {
    let mut snapshot = Vec::with_capacity(jobs.len());

    for (idx, runtime) in jobs.iter_mut().enumerate() {
        let job = JobId(idx);

        if runtime.finished {
            if !runtime.finish_reported {
                runtime.finish_reported = true;
                snapshot.push(RenderProgress::finished(job));
            }
            continue;
        }

        let (Some(position), Some(duration)) =
            (engine.query_position(job), engine.query_duration(job))
        else {
            continue;
        };
        snapshot.push(RenderProgress::running(job, position, duration));
    }

    snapshot
}
