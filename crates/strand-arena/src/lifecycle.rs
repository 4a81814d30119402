//! Tick tracking, sweep and prune.
//!
//! A node stays alive only while the host ticks it every frame. At the
//! start of each frame the store advances its counter and [`sweep`]s:
//! every node whose tick frame is stale, or which is marked for delete,
//! is unlinked and its whole detached subtree flagged disposed. [`prune`]
//! then closes the holes in one forward pass over the record region.
//!
//! [`sweep`]: NodeStore::sweep
//! [`prune`]: NodeStore::prune

use strand_core::{FrameId, NodeId};

use crate::header::{NodeFlags, COUNT_OFFSET, SELF_OFFSET, TAG_OFFSET, TICK_OFFSET};
use crate::store::NodeStore;

/// Outcome of one [`NodeStore::sweep`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Nodes whose liveness was evaluated.
    pub visited: usize,
    /// Nodes flagged disposed, descendants included.
    pub disposed: usize,
}

/// Outcome of one [`NodeStore::prune`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Bytes returned to the free region.
    pub reclaimed_bytes: usize,
    /// Live records that changed offset.
    pub moved_records: usize,
}

impl NodeStore {
    /// Keep `id` alive through the next sweep.
    ///
    /// Stamps "current frame + 1" into the tick word, preserving every
    /// flag. A pending [`mark_for_delete`](Self::mark_for_delete) still wins.
    pub fn tick(&mut self, id: NodeId) {
        debug_assert!(self.is_valid(id), "tick() on dead node {id}");
        let word = self.tick_word(id).with_frame(self.frame.next());
        self.set_tick_word(id, word);
    }

    /// Tick `id` and every node below it.
    pub fn tick_subtree(&mut self, id: NodeId) {
        self.tick(id);
        let mut child = self.first_child(id);
        while child.is_valid() {
            self.tick_subtree(child);
            child = self.next_sibling(child);
        }
    }

    /// Move to the next frame. Nodes not ticked since become stale.
    pub fn advance_frame(&mut self) -> FrameId {
        self.frame = self.frame.next();
        self.frame
    }

    #[inline]
    fn should_dispose(&self, id: NodeId) -> bool {
        let word = self.tick_word(id);
        word.contains(NodeFlags::MARKED_FOR_DELETE) || word.frame() != self.frame
    }

    /// Unlink and dispose every stale or marked node, with its subtree.
    ///
    /// Disposed records keep their space until [`prune`](Self::prune).
    pub fn sweep(&mut self) -> SweepStats {
        let mut stats = SweepStats::default();
        let root = self.root;
        let mut current = root;
        while current.is_valid() {
            stats.visited += 1;
            if self.should_dispose(current) {
                // Successor must be found while `current` is still linked.
                let next = self.next_skipping_subtree(current, root);
                stats.disposed += self.dispose_subtree(current);
                current = next;
            } else {
                current = self.next_until_ancestor(current, root);
            }
        }
        if stats.disposed > 0 {
            tracing::trace!(
                frame = %self.frame,
                visited = stats.visited,
                disposed = stats.disposed,
                "sweep"
            );
        }
        stats
    }

    fn dispose_subtree(&mut self, id: NodeId) -> usize {
        self.unlink(id);
        let mut disposed = 0;
        let mut node = id;
        while node.is_valid() {
            self.insert_flags(node, NodeFlags::DISPOSED);
            disposed += 1;
            node = self.next_until_ancestor(node, id);
        }
        self.node_count -= disposed;
        disposed
    }

    #[inline]
    fn record_size_at(&self, offset: usize) -> usize {
        let tag = strand_core::TypeTag(self.buffer.read_u16(offset + TAG_OFFSET));
        let count = self.buffer.read_u32(offset + COUNT_OFFSET);
        let layout = self.layouts.get(tag);
        debug_assert!(layout.is_some(), "record at {offset} has unknown tag {tag}");
        layout.map_or(crate::header::HEADER_SIZE, |l| l.record_size(count))
    }

    #[inline]
    fn is_disposed_at(&self, offset: usize) -> bool {
        self.buffer.read_u32(offset + TICK_OFFSET) & NodeFlags::DISPOSED.bits() != 0
    }

    /// Reclaim the space of disposed records.
    ///
    /// A single forward pass over `[0, write_offset)`: disposed records
    /// release their identifier, and each following run of live records is
    /// moved back over the gap in one copy with its TOC offsets rewritten.
    /// Identifiers of live nodes never change.
    pub fn prune(&mut self) -> PruneStats {
        let mut stats = PruneStats::default();
        let end = self.buffer.write_offset();
        let mut read = 0;
        let mut write = 0;
        while read < end {
            if self.is_disposed_at(read) {
                let size = self.record_size_at(read);
                let id = NodeId(self.buffer.read_i32(read + SELF_OFFSET));
                self.buffer.release_identifier(id);
                stats.reclaimed_bytes += size;
                read += size;
                continue;
            }

            let run_start = read;
            let shift = run_start - write;
            let mut moved = 0;
            while read < end && !self.is_disposed_at(read) {
                if shift > 0 {
                    let id = NodeId(self.buffer.read_i32(read + SELF_OFFSET));
                    self.buffer.set_offset(id, read - shift);
                    moved += 1;
                }
                read += self.record_size_at(read);
            }
            let len = read - run_start;
            if shift > 0 {
                self.buffer.copy_within(run_start, len, write);
                stats.moved_records += moved;
            }
            write += len;
        }
        self.buffer.set_write_offset(write);
        if stats.reclaimed_bytes > 0 {
            self.version.bump();
            tracing::trace!(
                reclaimed_bytes = stats.reclaimed_bytes,
                moved_records = stats.moved_records,
                write_offset = write,
                "prune"
            );
        }
        stats
    }
}
