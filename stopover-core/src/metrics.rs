//! Metrics sink injected into the search engine.
//!
//! The engine reports through this trait instead of a process-wide
//! monitoring store, so embedders decide where the numbers go.

use std::time::Duration;

/// Receiver for per-search telemetry. All methods have empty defaults, so a
/// sink only implements what it cares about.
pub trait SearchMetrics {
    /// Number of vertices settled by one engine run.
    fn vertices_visited(&self, _count: usize) {}

    /// A run hit its wall-clock deadline and returned a partial result.
    fn search_timed_out(&self) {}

    /// Total wall-clock time of a complete two-leg request.
    fn search_finished(&self, _elapsed: Duration) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl SearchMetrics for NoopMetrics {}
