//! Metrics recording seam for path resolution.
//!
//! The path resolver reports into a [`MetricsRecorder`] but does not own the
//! metrics backend. The library ships a tracing-backed recorder and a no-op
//! recorder; embedders wire in their own implementation.

use std::time::Duration;

/// Instrument name for the duration of a whole path-resolution call.
pub const PATH_RESOLUTION_TIMER: &str = "dependency_path_resolution";

/// Instrument name for the count of paths found, labeled by cyclic flag.
pub const PATHS_FOUND_COUNTER: &str = "dependency_paths_found";

/// Sink for the resolver's timing and path-count observations.
///
/// Implementations must accept zero counts: the resolver records both label
/// values (`cyclic = true` and `cyclic = false`) on every call so dashboards
/// stay dense even when one category is absent.
pub trait MetricsRecorder: Send + Sync {
    /// Record the wall-clock duration of one operation.
    fn observe_duration(&self, instrument: &'static str, elapsed: Duration);

    /// Record how many paths were found under one `cyclic` label value.
    fn count_paths(&self, instrument: &'static str, cyclic: bool, count: u64);
}

/// Recorder that emits observations as structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRecorder;

impl MetricsRecorder for LogRecorder {
    fn observe_duration(&self, instrument: &'static str, elapsed: Duration) {
        // u128 microseconds won't exceed u64::MAX for any realistic duration
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_us = elapsed.as_micros() as u64;
        tracing::debug!(instrument, elapsed_us, "duration observed");
    }

    fn count_paths(&self, instrument: &'static str, cyclic: bool, count: u64) {
        tracing::debug!(instrument, cyclic, count, "paths counted");
    }
}

/// Recorder that discards all observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl MetricsRecorder for NoopRecorder {
    fn observe_duration(&self, _instrument: &'static str, _elapsed: Duration) {}

    fn count_paths(&self, _instrument: &'static str, _cyclic: bool, _count: u64) {}
}
