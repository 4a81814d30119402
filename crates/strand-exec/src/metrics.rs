//! Per-frame metrics for the runtime.
//!
//! [`FrameMetrics`] captures the timing of each `run_frame` phase and the
//! amount of work each one did. Durations are in microseconds.

/// Timing and volume metrics collected during a single frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Wall-clock time for the whole frame.
    pub total_us: u64,
    /// Time spent sweeping stale nodes.
    pub sweep_us: u64,
    /// Time spent compacting the arena.
    pub prune_us: u64,
    /// Time spent re-sorting dependency groups.
    pub sort_us: u64,
    /// Time spent in execute functions (including shadow mirroring and merge).
    pub execute_us: u64,
    /// Nodes disposed by the sweep.
    pub disposed_nodes: usize,
    /// Bytes reclaimed by compaction.
    pub reclaimed_bytes: usize,
    /// Records moved by compaction.
    pub moved_records: usize,
    /// Dependency groups whose sibling order was recomputed.
    pub sorted_groups: usize,
    /// Execute calls made, composites included.
    pub executed_nodes: usize,
    /// Record bytes in use after the frame.
    pub live_bytes: usize,
    /// Arena capacity after the frame.
    pub capacity_bytes: usize,
}
