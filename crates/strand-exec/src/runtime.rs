//! Frame orchestration.
//!
//! [`Runtime`] owns the primary store and runs the per-frame pipeline:
//!
//! 1. advance the frame counter
//! 2. sweep stale and marked nodes
//! 3. prune, if the sweep disposed anything
//! 4. re-sort dependency groups flagged `NEEDS_SORT`
//! 5. execute the tree depth-first from the root
//!
//! The host allocates and ticks nodes through [`Runtime::store_mut`]
//! between frames and calls [`Runtime::run_frame`] once per frame.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;

use strand_arena::{NodeFlags, NodeStore, SnapshotError};
use strand_core::{FrameId, NodeId, Status};

use crate::config::RuntimeConfig;
use crate::context::ExecContext;
use crate::error::FrameError;
use crate::metrics::FrameMetrics;
use crate::registry::TaskRegistry;
use crate::shadow;
use crate::topo::{sort_children, SortScratch};

/// Result of a successful [`Runtime::run_frame`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameReport {
    /// The frame that ran.
    pub frame: FrameId,
    /// Status of the root, or `None` if the store had no root.
    pub root_status: Option<Status>,
    /// Timing and volume of each phase.
    pub metrics: FrameMetrics,
}

/// Single-threaded frame loop over one node store.
pub struct Runtime {
    config: RuntimeConfig,
    registry: Arc<TaskRegistry>,
    store: NodeStore,
    shadow: Option<NodeStore>,
    scratch: SortScratch,
    sort_queue: Vec<NodeId>,
    last_metrics: FrameMetrics,
}

impl Runtime {
    /// Create a runtime with an empty store.
    ///
    /// Returns `Err(FrameError::Arena)` if `config.store` is invalid.
    pub fn new(config: RuntimeConfig, registry: Arc<TaskRegistry>) -> Result<Self, FrameError> {
        let store = registry.new_store(config.store.clone())?;
        Ok(Self {
            config,
            registry,
            store,
            shadow: None,
            scratch: SortScratch::new(),
            sort_queue: Vec::new(),
            last_metrics: FrameMetrics::default(),
        })
    }

    /// The configuration this runtime was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The type registry.
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// The primary store.
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Mutable access to the primary store, for allocating and ticking.
    pub fn store_mut(&mut self) -> &mut NodeStore {
        &mut self.store
    }

    /// The scratch store of the last shadowed frame, if any.
    pub fn shadow(&self) -> Option<&NodeStore> {
        self.shadow.as_ref()
    }

    /// Metrics of the most recent frame.
    pub fn last_metrics(&self) -> &FrameMetrics {
        &self.last_metrics
    }

    /// Run one frame.
    ///
    /// A dependency cycle aborts the frame before anything executes; the
    /// sweep and prune that already happened are kept.
    pub fn run_frame(&mut self) -> Result<FrameReport, FrameError> {
        let frame_start = Instant::now();
        let mut metrics = FrameMetrics::default();

        let frame = self.store.advance_frame();

        let sweep_start = Instant::now();
        let sweep = self.store.sweep();
        metrics.sweep_us = sweep_start.elapsed().as_micros() as u64;
        metrics.disposed_nodes = sweep.disposed;

        if sweep.disposed > 0 {
            let prune_start = Instant::now();
            let prune = self.store.prune();
            metrics.prune_us = prune_start.elapsed().as_micros() as u64;
            metrics.reclaimed_bytes = prune.reclaimed_bytes;
            metrics.moved_records = prune.moved_records;
        }

        let sort_start = Instant::now();
        metrics.sorted_groups = self.resort_dirty_groups()?;
        metrics.sort_us = sort_start.elapsed().as_micros() as u64;

        let execute_start = Instant::now();
        let root = self.store.root();
        let root_status = if !root.is_valid() {
            None
        } else if self.config.shadow {
            Some(self.execute_shadowed(root, &mut metrics))
        } else {
            let mut ctx = ExecContext::new(&mut self.store, &self.registry);
            let status = ctx.execute(root);
            metrics.executed_nodes = ctx.executed_nodes();
            Some(status)
        };
        metrics.execute_us = execute_start.elapsed().as_micros() as u64;

        metrics.live_bytes = self.store.live_bytes();
        metrics.capacity_bytes = self.store.capacity();
        metrics.total_us = frame_start.elapsed().as_micros() as u64;

        tracing::debug!(
            frame = %frame,
            disposed = metrics.disposed_nodes,
            reclaimed_bytes = metrics.reclaimed_bytes,
            sorted_groups = metrics.sorted_groups,
            executed = metrics.executed_nodes,
            total_us = metrics.total_us,
            "frame complete"
        );

        self.last_metrics = metrics.clone();
        Ok(FrameReport {
            frame,
            root_status,
            metrics,
        })
    }

    /// Sort every sortable node flagged `NEEDS_SORT`; clear the flag elsewhere.
    fn resort_dirty_groups(&mut self) -> Result<usize, FrameError> {
        let root = self.store.root();
        if !root.is_valid() {
            return Ok(0);
        }
        self.sort_queue.clear();
        let store = &self.store;
        self.sort_queue.extend(
            std::iter::once(root)
                .chain(store.descendants(root))
                .filter(|&id| store.flags(id).contains(NodeFlags::NEEDS_SORT)),
        );

        let mut sorted = 0;
        for i in 0..self.sort_queue.len() {
            let id = self.sort_queue[i];
            if self.registry.is_sortable(self.store.type_tag(id)) {
                sort_children(
                    &mut self.store,
                    self.registry.layouts(),
                    id,
                    &mut self.scratch,
                )?;
                sorted += 1;
            } else {
                self.store.remove_flags(id, NodeFlags::NEEDS_SORT);
            }
        }
        Ok(sorted)
    }

    fn execute_shadowed(&mut self, root: NodeId, metrics: &mut FrameMetrics) -> Status {
        let scratch = self.shadow.get_or_insert_with(|| self.store.clone());
        shadow::mirror(scratch, &self.store);
        let mut ctx = ExecContext::new(scratch, &self.registry);
        let status = ctx.execute(root);
        metrics.executed_nodes = ctx.executed_nodes();
        let merged = shadow::merge_dirty(&mut self.store, scratch);
        tracing::trace!(merged, "shadow merge");
        status
    }

    /// Write the primary store to `w`.
    pub fn write_snapshot(&self, w: &mut dyn Write) -> Result<(), SnapshotError> {
        strand_arena::write_snapshot(w, &self.store)
    }

    /// Replace the primary store with a snapshot read from `r`.
    pub fn read_snapshot(&mut self, r: &mut dyn Read) -> Result<(), SnapshotError> {
        strand_arena::read_snapshot(r, &mut self.store)
    }
}
