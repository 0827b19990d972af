//! Progress samples emitted while a run is in flight.

use serde::{Deserialize, Serialize};

use crate::job::JobId;

/// One job's state at one sampling tick.
///
/// Samples are transient: the orchestrator produces a fresh batch on every
/// tick and keeps none of them. A job reported with `finished = true` is
/// never reported again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderProgress {
    pub job: JobId,

    /// Elapsed position in nanoseconds, never greater than `duration_ns`.
    pub position_ns: u64,

    /// Total duration in nanoseconds.
    pub duration_ns: u64,

    pub finished: bool,
}

impl RenderProgress {
    /// A running job's sample; `position_ns` is clamped to `duration_ns`
    /// because decoders may overshoot slightly near end-of-stream.
    pub fn running(job: JobId, position_ns: u64, duration_ns: u64) -> Self {
        Self {
            job,
            position_ns: position_ns.min(duration_ns),
            duration_ns,
            finished: false,
        }
    }

    pub fn finished(job: JobId) -> Self {
        Self {
            job,
            position_ns: 0,
            duration_ns: 0,
            finished: true,
        }
    }

    /// Completed fraction in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        if self.finished {
            return 1.0;
        }
        auricle_common::clock::fraction(self.position_ns, self.duration_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_clamped_to_duration() {
        let p = RenderProgress::running(JobId(0), 12_000, 10_000);
        assert_eq!(p.position_ns, 10_000);
        assert_eq!(p.fraction(), 1.0);
    }

    #[test]
    fn test_fraction() {
        let p = RenderProgress::running(JobId(1), 2_500, 10_000);
        assert!((p.fraction() - 0.25).abs() < 1e-9);
        assert_eq!(RenderProgress::finished(JobId(1)).fraction(), 1.0);
    }
}
