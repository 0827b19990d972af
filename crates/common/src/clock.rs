//! Clock-time helpers for progress reporting.
//!
//! The media engine reports positions and durations as nanosecond counts.
//! These helpers convert them for display and for ratio computations.

/// Nanoseconds per second.
pub const NSECS_PER_SEC: u64 = 1_000_000_000;

/// Convert a nanosecond value to seconds.
pub fn ns_to_secs(ns: u64) -> f64 {
    ns as f64 / NSECS_PER_SEC as f64
}

/// Convert seconds to nanoseconds.
pub fn secs_to_ns(secs: f64) -> u64 {
    (secs * NSECS_PER_SEC as f64) as u64
}

/// Format a clock time as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_clock(ns: u64) -> String {
    let total_secs = ns / NSECS_PER_SEC;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Fraction `position / duration` in `[0.0, 1.0]`.
///
/// A zero duration yields `0.0` rather than a division by zero.
pub fn fraction(position_ns: u64, duration_ns: u64) -> f64 {
    if duration_ns == 0 {
        return 0.0;
    }
    (position_ns.min(duration_ns) as f64 / duration_ns as f64).clamp(0.0, 1.0)
}
