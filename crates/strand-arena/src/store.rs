//! Typed node records linked into a tree on top of the arena.
//!
//! [`NodeStore`] owns one [`ArenaBuffer`] and treats each allocation as a
//! node record: a [`NodeHeader`] followed by its payload. Records are
//! linked by identifier (parent, first child, next and previous sibling),
//! never by offset, so links survive growth and compaction untouched.
//!
//! Offsets are resolved from the TOC on every access. Nothing in this
//! module holds an offset across a call that may grow or compact.

use std::sync::Arc;

use strand_core::{FrameId, NodeId, StoreVersion, TypeTag};

use crate::buffer::{ArenaBuffer, RECORD_ALIGN};
use crate::config::StoreConfig;
use crate::error::ArenaError;
use crate::header::{
    NodeFlags, NodeHeader, TickWord, COUNT_OFFSET, FIRST_CHILD_OFFSET, HEADER_SIZE,
    NEXT_SIBLING_OFFSET, PARENT_OFFSET, PREVIOUS_SIBLING_OFFSET, SELF_OFFSET, TAG_OFFSET,
    TICK_OFFSET,
};
use crate::layout::LayoutTable;
use crate::payload::Payload;

/// Arena of typed node records addressed by stable [`NodeId`]s.
///
/// A store holds at most one tree. Nodes are appended as the last child
/// of their parent; the first parentless allocation becomes the root.
///
/// One store is mutated by one thread at a time. Run independent stores
/// on separate workers for parallelism.
#[derive(Clone, Debug)]
pub struct NodeStore {
    pub(crate) buffer: ArenaBuffer,
    pub(crate) layouts: Arc<LayoutTable>,
    pub(crate) root: NodeId,
    pub(crate) frame: FrameId,
    pub(crate) version: StoreVersion,
    pub(crate) node_count: usize,
}

impl NodeStore {
    /// Create an empty store.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` if `config` fails validation.
    pub fn new(config: StoreConfig, layouts: Arc<LayoutTable>) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self {
            buffer: ArenaBuffer::new(config.initial_capacity, config.max_capacity),
            layouts,
            root: NodeId::INVALID,
            frame: FrameId(0),
            version: StoreVersion(0),
            node_count: 0,
        })
    }

    // ── Store-level queries ──────────────────────────────────────

    /// The layout table this store was built with.
    pub fn layouts(&self) -> &Arc<LayoutTable> {
        &self.layouts
    }

    /// The underlying arena buffer.
    pub fn buffer(&self) -> &ArenaBuffer {
        &self.buffer
    }

    /// The tree root, or [`NodeId::INVALID`] if the store is empty.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The current frame.
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    /// The structural version.
    pub fn version(&self) -> StoreVersion {
        self.version
    }

    /// Number of linked, non-disposed nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Bytes occupied by records (`[0, write_offset)`).
    pub fn live_bytes(&self) -> usize {
        self.buffer.write_offset()
    }

    /// Buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Whether `id` names a live node.
    ///
    /// False for the sentinel, free slots, reassigned slots and nodes that
    /// were disposed but not yet pruned.
    pub fn is_valid(&self, id: NodeId) -> bool {
        match self.buffer.try_resolve(id) {
            Some(offset) => {
                self.buffer.read_i32(offset + SELF_OFFSET) == id.0
                    && !TickWord(self.buffer.read_u32(offset + TICK_OFFSET))
                        .contains(NodeFlags::DISPOSED)
            }
            None => false,
        }
    }

    /// Identifiers of every occupied TOC slot, in slot order.
    pub fn live_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.buffer.toc_len())
            .filter(|&i| self.buffer.toc_entry(i) >= 0)
            .map(|i| NodeId(i as i32))
    }

    // ── Header access ────────────────────────────────────────────

    #[inline]
    pub(crate) fn offset(&self, id: NodeId) -> usize {
        debug_assert!(self.buffer.try_resolve(id).is_some(), "unknown node {id}");
        self.buffer.resolve(id)
    }

    #[inline]
    fn link(&self, id: NodeId, field: usize) -> NodeId {
        NodeId(self.buffer.read_i32(self.offset(id) + field))
    }

    #[inline]
    fn set_link(&mut self, id: NodeId, field: usize, to: NodeId) {
        let offset = self.offset(id);
        self.buffer.write_i32(offset + field, to.0);
    }

    /// Decoded copy of `id`'s header.
    pub fn header(&self, id: NodeId) -> NodeHeader {
        NodeHeader::decode(self.buffer.bytes(self.offset(id), HEADER_SIZE))
    }

    /// Parent of `id`.
    #[inline]
    pub fn parent(&self, id: NodeId) -> NodeId {
        self.link(id, PARENT_OFFSET)
    }

    /// First child of `id`.
    #[inline]
    pub fn first_child(&self, id: NodeId) -> NodeId {
        self.link(id, FIRST_CHILD_OFFSET)
    }

    /// Next sibling of `id`.
    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> NodeId {
        self.link(id, NEXT_SIBLING_OFFSET)
    }

    /// Previous sibling of `id`.
    #[inline]
    pub fn previous_sibling(&self, id: NodeId) -> NodeId {
        self.link(id, PREVIOUS_SIBLING_OFFSET)
    }

    /// Last child of `id`. Walks the sibling chain.
    pub fn last_child(&self, id: NodeId) -> NodeId {
        let mut last = NodeId::INVALID;
        let mut child = self.first_child(id);
        while child.is_valid() {
            last = child;
            child = self.next_sibling(child);
        }
        last
    }

    /// Number of direct children of `id`.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Payload type of `id`.
    #[inline]
    pub fn type_tag(&self, id: NodeId) -> TypeTag {
        TypeTag(self.buffer.read_u16(self.offset(id) + TAG_OFFSET))
    }

    /// Number of payload elements of `id`.
    #[inline]
    pub fn element_count(&self, id: NodeId) -> u32 {
        self.buffer.read_u32(self.offset(id) + COUNT_OFFSET)
    }

    /// Liveness word of `id`.
    #[inline]
    pub fn tick_word(&self, id: NodeId) -> TickWord {
        TickWord(self.buffer.read_u32(self.offset(id) + TICK_OFFSET))
    }

    #[inline]
    pub(crate) fn set_tick_word(&mut self, id: NodeId, word: TickWord) {
        let offset = self.offset(id);
        self.buffer.write_u32(offset + TICK_OFFSET, word.0);
    }

    /// Flag bits of `id`.
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.tick_word(id).flags()
    }

    /// Set `flags` on `id`.
    pub fn insert_flags(&mut self, id: NodeId, flags: NodeFlags) {
        let word = self.tick_word(id).with(flags);
        self.set_tick_word(id, word);
    }

    /// Clear `flags` on `id`.
    pub fn remove_flags(&mut self, id: NodeId, flags: NodeFlags) {
        let word = self.tick_word(id).without(flags);
        self.set_tick_word(id, word);
    }

    // ── Traversal ────────────────────────────────────────────────

    /// Direct children of `id` in sibling order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            store: self,
            next: self.first_child(id),
        }
    }

    /// Every node below `id` in pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            store: self,
            ancestor: id,
            next: self.first_child(id),
        }
    }

    /// Pre-order successor of `id` within the subtree rooted at `ancestor`.
    ///
    /// Children first, else the next sibling, else climb towards
    /// `ancestor` looking for an unvisited sibling. Returns
    /// [`NodeId::INVALID`] once the subtree is exhausted. Iterative, so
    /// depth is unbounded.
    pub fn next_until_ancestor(&self, id: NodeId, ancestor: NodeId) -> NodeId {
        let first = self.first_child(id);
        if first.is_valid() {
            return first;
        }
        self.next_skipping_subtree(id, ancestor)
    }

    /// Like [`next_until_ancestor`](Self::next_until_ancestor) but does not
    /// descend into `id`'s children.
    pub fn next_skipping_subtree(&self, id: NodeId, ancestor: NodeId) -> NodeId {
        let mut current = id;
        loop {
            if current == ancestor {
                return NodeId::INVALID;
            }
            let next = self.next_sibling(current);
            if next.is_valid() {
                return next;
            }
            current = self.parent(current);
            if !current.is_valid() {
                return NodeId::INVALID;
            }
        }
    }

    // ── Allocation ───────────────────────────────────────────────

    /// Allocate a node holding one `value`.
    ///
    /// Appends the node as the last child of `parent`, or makes it the
    /// root when `parent` is [`NodeId::INVALID`] and the store is empty.
    pub fn allocate<T: Payload>(
        &mut self,
        value: &T,
        tag: TypeTag,
        parent: NodeId,
    ) -> Result<NodeId, ArenaError> {
        self.check_element_size::<T>(tag)?;
        let id = self.allocate_zeroed(tag, 1, parent)?;
        let start = self.offset(id) + HEADER_SIZE;
        value.encode(self.buffer.bytes_mut(start, T::SIZE));
        Ok(id)
    }

    /// Allocate a node holding `values.len()` elements.
    pub fn allocate_array<T: Payload>(
        &mut self,
        values: &[T],
        tag: TypeTag,
        parent: NodeId,
    ) -> Result<NodeId, ArenaError> {
        self.check_element_size::<T>(tag)?;
        let count = u32::try_from(values.len()).map_err(|_| ArenaError::CapacityExceeded {
            requested: values.len().saturating_mul(T::SIZE),
            limit: self.buffer.max_capacity(),
        })?;
        let id = self.allocate_zeroed(tag, count, parent)?;
        let start = self.offset(id) + HEADER_SIZE;
        let bytes = self.buffer.bytes_mut(start, T::SIZE * values.len());
        for (i, value) in values.iter().enumerate() {
            value.encode(&mut bytes[i * T::SIZE..]);
        }
        Ok(id)
    }

    /// Allocate a node with `count` zeroed elements of type `tag`.
    pub fn allocate_zeroed(
        &mut self,
        tag: TypeTag,
        count: u32,
        parent: NodeId,
    ) -> Result<NodeId, ArenaError> {
        let record_size = self
            .layouts
            .get(tag)
            .ok_or(ArenaError::UnregisteredType { tag })?
            .record_size(count);
        if parent.is_valid() {
            if !self.is_valid(parent) {
                return Err(ArenaError::InvalidParent { parent });
            }
        } else if self.root.is_valid() {
            return Err(ArenaError::RootOccupied { root: self.root });
        }

        let id = self.buffer.create_identifier()?;
        let offset = self.buffer.allocate_raw(record_size, RECORD_ALIGN)?;
        self.buffer.set_offset(id, offset);

        let previous = if parent.is_valid() {
            self.last_child(parent)
        } else {
            NodeId::INVALID
        };
        let header = NodeHeader {
            self_id: id,
            parent,
            first_child: NodeId::INVALID,
            next_sibling: NodeId::INVALID,
            previous_sibling: previous,
            type_tag: tag,
            element_count: count,
            tick: TickWord::new(self.frame.next()),
        };
        header.encode(self.buffer.bytes_mut(offset, HEADER_SIZE));

        if parent.is_valid() {
            if previous.is_valid() {
                self.set_link(previous, NEXT_SIBLING_OFFSET, id);
            } else {
                self.set_link(parent, FIRST_CHILD_OFFSET, id);
            }
            self.insert_flags(parent, NodeFlags::NEEDS_SORT);
        } else {
            self.root = id;
        }

        self.node_count += 1;
        self.version.bump();
        Ok(id)
    }

    fn check_element_size<T: Payload>(&self, tag: TypeTag) -> Result<(), ArenaError> {
        let layout = self
            .layouts
            .get(tag)
            .ok_or(ArenaError::UnregisteredType { tag })?;
        if layout.element_size != T::SIZE {
            return Err(ArenaError::PayloadSizeMismatch {
                tag,
                expected: layout.element_size,
                found: T::SIZE,
            });
        }
        Ok(())
    }

    // ── Payload access ───────────────────────────────────────────

    #[inline]
    pub(crate) fn element_size(&self, tag: TypeTag) -> usize {
        let size = self.layouts.get(tag).map(|l| l.element_size);
        debug_assert!(size.is_some(), "tag {tag} has no layout");
        size.unwrap_or(0)
    }

    /// Payload bytes of `id` (unpadded: `element_size * element_count`).
    pub fn payload_bytes(&self, id: NodeId) -> &[u8] {
        let offset = self.offset(id);
        let len = self.element_size(self.type_tag(id)) * self.element_count(id) as usize;
        self.buffer.bytes(offset + HEADER_SIZE, len)
    }

    /// Mutable payload bytes of `id`. Marks the node [`NodeFlags::DIRTY`].
    pub fn payload_bytes_mut(&mut self, id: NodeId) -> &mut [u8] {
        self.insert_flags(id, NodeFlags::DIRTY);
        let offset = self.offset(id);
        let len = self.element_size(self.type_tag(id)) * self.element_count(id) as usize;
        self.buffer.bytes_mut(offset + HEADER_SIZE, len)
    }

    /// Decode the first payload element of `id`.
    pub fn read<T: Payload>(&self, id: NodeId) -> T {
        self.read_element(id, 0)
    }

    /// Encode `value` as the first payload element of `id`.
    pub fn write<T: Payload>(&mut self, id: NodeId, value: &T) {
        self.write_element(id, 0, value)
    }

    /// Decode payload element `index` of `id`.
    pub fn read_element<T: Payload>(&self, id: NodeId, index: u32) -> T {
        debug_assert_eq!(self.element_size(self.type_tag(id)), T::SIZE);
        debug_assert!(index < self.element_count(id), "element {index} out of range");
        let start = index as usize * T::SIZE;
        T::decode(&self.payload_bytes(id)[start..start + T::SIZE])
    }

    /// Encode `value` as payload element `index` of `id`.
    pub fn write_element<T: Payload>(&mut self, id: NodeId, index: u32, value: &T) {
        debug_assert_eq!(self.element_size(self.type_tag(id)), T::SIZE);
        debug_assert!(index < self.element_count(id), "element {index} out of range");
        let start = index as usize * T::SIZE;
        value.encode(&mut self.payload_bytes_mut(id)[start..start + T::SIZE]);
    }

    // ── Structural edits ─────────────────────────────────────────

    /// Make `id` its parent's first child.
    ///
    /// Pure relinking: the payload does not move. Sibling order is the
    /// execution order among siblings of an unsorted parent.
    pub fn bring_to_front(&mut self, id: NodeId) {
        debug_assert!(self.is_valid(id), "bring_to_front() on dead node {id}");
        let parent = self.parent(id);
        if !parent.is_valid() || self.first_child(parent) == id {
            return;
        }
        self.detach_from_siblings(id, parent);
        let old_first = self.first_child(parent);
        self.set_link(id, PREVIOUS_SIBLING_OFFSET, NodeId::INVALID);
        self.set_link(id, NEXT_SIBLING_OFFSET, old_first);
        if old_first.is_valid() {
            self.set_link(old_first, PREVIOUS_SIBLING_OFFSET, id);
        }
        self.set_link(parent, FIRST_CHILD_OFFSET, id);
        self.version.bump();
    }

    /// Request disposal of `id` at the next sweep, whatever its ticks say.
    pub fn mark_for_delete(&mut self, id: NodeId) {
        debug_assert!(self.is_valid(id), "mark_for_delete() on dead node {id}");
        self.insert_flags(id, NodeFlags::MARKED_FOR_DELETE);
    }

    /// Request a dependency resort of `id`'s children before the next execution.
    pub fn mark_needs_sort(&mut self, id: NodeId) {
        debug_assert!(self.is_valid(id), "mark_needs_sort() on dead node {id}");
        self.insert_flags(id, NodeFlags::NEEDS_SORT);
    }

    /// Replace `parent`'s sibling chain with `order`.
    ///
    /// `order` must be a permutation of the current children. Only links
    /// change; no payload moves.
    pub fn reorder_children(&mut self, parent: NodeId, order: &[NodeId]) {
        debug_assert_eq!(self.child_count(parent), order.len());
        let mut previous = NodeId::INVALID;
        for &child in order {
            debug_assert_eq!(self.parent(child), parent, "{child} is not a child of {parent}");
            self.set_link(child, PREVIOUS_SIBLING_OFFSET, previous);
            if previous.is_valid() {
                self.set_link(previous, NEXT_SIBLING_OFFSET, child);
            }
            previous = child;
        }
        if previous.is_valid() {
            self.set_link(previous, NEXT_SIBLING_OFFSET, NodeId::INVALID);
        }
        self.set_link(
            parent,
            FIRST_CHILD_OFFSET,
            order.first().copied().unwrap_or(NodeId::INVALID),
        );
        self.version.bump();
    }

    /// Detach `id` from its parent and siblings.
    ///
    /// The subtree below `id` stays linked to `id`.
    pub(crate) fn unlink(&mut self, id: NodeId) {
        let parent = self.parent(id);
        self.detach_from_siblings(id, parent);
        self.set_link(id, PARENT_OFFSET, NodeId::INVALID);
        self.set_link(id, NEXT_SIBLING_OFFSET, NodeId::INVALID);
        self.set_link(id, PREVIOUS_SIBLING_OFFSET, NodeId::INVALID);
        if parent.is_valid() {
            self.insert_flags(parent, NodeFlags::NEEDS_SORT);
        }
        if self.root == id {
            self.root = NodeId::INVALID;
        }
        self.version.bump();
    }

    fn detach_from_siblings(&mut self, id: NodeId, parent: NodeId) {
        let previous = self.previous_sibling(id);
        let next = self.next_sibling(id);
        if previous.is_valid() {
            self.set_link(previous, NEXT_SIBLING_OFFSET, next);
        } else if parent.is_valid() {
            self.set_link(parent, FIRST_CHILD_OFFSET, next);
        }
        if next.is_valid() {
            self.set_link(next, PREVIOUS_SIBLING_OFFSET, previous);
        }
    }

    /// Drop every node, keeping the buffer allocation and the frame counter.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.root = NodeId::INVALID;
        self.node_count = 0;
        self.version.bump();
    }

    /// Make `self` an exact copy of `other`, reusing this store's buffer.
    pub fn mirror_from(&mut self, other: &NodeStore) {
        self.buffer.mirror_from(&other.buffer);
        self.layouts = Arc::clone(&other.layouts);
        self.root = other.root;
        self.frame = other.frame;
        self.version = other.version;
        self.node_count = other.node_count;
    }
}

/// Iterator over a node's direct children.
pub struct Children<'a> {
    store: &'a NodeStore,
    next: NodeId,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        if !current.is_valid() {
            return None;
        }
        self.next = self.store.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator over a node's descendants.
pub struct Descendants<'a> {
    store: &'a NodeStore,
    ancestor: NodeId,
    next: NodeId,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next;
        if !current.is_valid() {
            return None;
        }
        self.next = self.store.next_until_ancestor(current, self.ancestor);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TypeLayout;
    use proptest::prelude::*;

    const GROUP: TypeTag = TypeTag(16);
    const SCALAR: TypeTag = TypeTag(17);
    const VEC3: TypeTag = TypeTag(18);
    const BYTE: TypeTag = TypeTag(19);

    fn layouts() -> Arc<LayoutTable> {
        let mut table = LayoutTable::new();
        table.insert(GROUP, TypeLayout::of::<()>());
        table.insert(SCALAR, TypeLayout::of::<f32>());
        table.insert(VEC3, TypeLayout::of::<[f32; 3]>());
        table.insert(BYTE, TypeLayout::of::<u8>());
        Arc::new(table)
    }

    fn store() -> NodeStore {
        NodeStore::new(StoreConfig::new(256), layouts()).unwrap()
    }

    #[test]
    fn first_parentless_allocation_becomes_root() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        assert_eq!(s.root(), root);
        assert!(s.is_valid(root));
        assert_eq!(s.header(root).self_id, root);
        assert_eq!(s.node_count(), 1);
    }

    #[test]
    fn second_root_is_rejected() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let err = s.allocate(&(), GROUP, NodeId::INVALID).unwrap_err();
        assert_eq!(err, ArenaError::RootOccupied { root });
    }

    #[test]
    fn children_append_in_creation_order() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let mut version = s.version();
        let mut next = |s: &mut NodeStore, value: f32| {
            let id = s.allocate(&value, SCALAR, root).unwrap();
            assert!(s.version() > version);
            version = s.version();
            id
        };
        let a = next(&mut s, 1.0);
        let b = next(&mut s, 2.0);
        let c = next(&mut s, 3.0);
        assert_eq!(s.children(root).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(s.previous_sibling(c), b);
        assert_eq!(s.last_child(root), c);
        assert_eq!(s.parent(b), root);
    }

    #[test]
    fn unknown_tag_and_size_mismatch() {
        let mut s = store();
        assert_eq!(
            s.allocate(&(), TypeTag(99), NodeId::INVALID).unwrap_err(),
            ArenaError::UnregisteredType { tag: TypeTag(99) }
        );
        assert!(matches!(
            s.allocate(&1u64, SCALAR, NodeId::INVALID),
            Err(ArenaError::PayloadSizeMismatch { expected: 4, found: 8, .. })
        ));
    }

    #[test]
    fn invalid_parent_rejected() {
        let mut s = store();
        s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        assert_eq!(
            s.allocate(&1.0f32, SCALAR, NodeId(42)).unwrap_err(),
            ArenaError::InvalidParent { parent: NodeId(42) }
        );
    }

    #[test]
    fn array_payload_round_trip() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let v = s
            .allocate_array(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]], VEC3, root)
            .unwrap();
        assert_eq!(s.element_count(v), 2);
        assert_eq!(s.read_element::<[f32; 3]>(v, 1), [4.0, 5.0, 6.0]);
        s.write_element(v, 0, &[7.0f32, 8.0, 9.0]);
        assert_eq!(s.read::<[f32; 3]>(v), [7.0, 8.0, 9.0]);
    }

    #[test]
    fn payload_write_sets_dirty() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let a = s.allocate(&1.0f32, SCALAR, root).unwrap();
        assert!(!s.flags(a).contains(NodeFlags::DIRTY));
        s.write(a, &2.0f32);
        assert!(s.flags(a).contains(NodeFlags::DIRTY));
    }

    #[test]
    fn adding_child_flags_parent_for_sort() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        assert!(!s.flags(root).contains(NodeFlags::NEEDS_SORT));
        s.allocate(&1.0f32, SCALAR, root).unwrap();
        assert!(s.flags(root).contains(NodeFlags::NEEDS_SORT));
    }

    #[test]
    fn bring_to_front_relinks_without_moving_payload() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let a = s.allocate(&1.0f32, SCALAR, root).unwrap();
        let b = s.allocate(&2.0f32, SCALAR, root).unwrap();
        let c = s.allocate(&3.0f32, SCALAR, root).unwrap();
        let offset_c = s.buffer().resolve(c);
        let version = s.version();

        s.bring_to_front(c);
        assert_eq!(s.children(root).collect::<Vec<_>>(), vec![c, a, b]);
        assert_eq!(s.previous_sibling(a), c);
        assert_eq!(s.next_sibling(b), NodeId::INVALID);
        assert_eq!(s.buffer().resolve(c), offset_c);
        assert!(s.version() > version);

        s.bring_to_front(b);
        assert_eq!(s.children(root).collect::<Vec<_>>(), vec![b, c, a]);
        assert_eq!(s.next_sibling(a), NodeId::INVALID);
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let a = s.allocate(&(), GROUP, root).unwrap();
        let a1 = s.allocate(&1.0f32, SCALAR, a).unwrap();
        let a2 = s.allocate(&(), GROUP, a).unwrap();
        let a2x = s.allocate(&2.0f32, SCALAR, a2).unwrap();
        let b = s.allocate(&3.0f32, SCALAR, root).unwrap();
        assert_eq!(
            s.descendants(root).collect::<Vec<_>>(),
            vec![a, a1, a2, a2x, b]
        );
        // Walking a subtree never escapes it.
        assert_eq!(s.descendants(a).collect::<Vec<_>>(), vec![a1, a2, a2x]);
        assert_eq!(s.descendants(a1).count(), 0);
    }

    #[test]
    fn deep_chains_traverse_iteratively() {
        let mut s = store();
        let mut parent = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let root = parent;
        for _ in 0..10_000 {
            parent = s.allocate(&(), GROUP, parent).unwrap();
        }
        assert_eq!(s.descendants(root).count(), 10_000);
    }

    #[test]
    fn reorder_children_rewrites_chain() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let a = s.allocate(&1.0f32, SCALAR, root).unwrap();
        let b = s.allocate(&2.0f32, SCALAR, root).unwrap();
        let c = s.allocate(&3.0f32, SCALAR, root).unwrap();
        s.reorder_children(root, &[b, c, a]);
        assert_eq!(s.children(root).collect::<Vec<_>>(), vec![b, c, a]);
        assert_eq!(s.previous_sibling(b), NodeId::INVALID);
        assert_eq!(s.previous_sibling(a), c);
        assert_eq!(s.next_sibling(a), NodeId::INVALID);
    }

    #[test]
    fn growth_keeps_identifiers_resolvable() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let ids: Vec<NodeId> = (0..200)
            .map(|i| s.allocate(&(i as f32), SCALAR, root).unwrap())
            .collect();
        assert!(s.capacity() > 256);
        for (i, &id) in ids.iter().enumerate() {
            assert_eq!(s.read::<f32>(id), i as f32);
        }
    }

    #[test]
    fn capacity_ceiling_is_reported() {
        let config = StoreConfig::new(256).with_max_capacity(512);
        let mut s = NodeStore::new(config, layouts()).unwrap();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        let result = (0..100).try_for_each(|_| s.allocate(&0.0f32, SCALAR, root).map(|_| ()));
        assert!(matches!(
            result,
            Err(ArenaError::CapacityExceeded { limit: 512, .. })
        ));
    }

    #[test]
    fn clear_empties_store() {
        let mut s = store();
        let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
        s.allocate(&1.0f32, SCALAR, root).unwrap();
        s.clear();
        assert_eq!(s.root(), NodeId::INVALID);
        assert_eq!(s.live_bytes(), 0);
        assert!(!s.is_valid(root));
    }

    #[derive(Clone, Debug)]
    enum Sample {
        Byte(u8),
        Scalar(f32),
        Vec3([f32; 3]),
    }

    fn arb_value() -> impl Strategy<Value = Sample> {
        prop_oneof![
            any::<u8>().prop_map(Sample::Byte),
            (-1e6f32..1e6).prop_map(Sample::Scalar),
            prop::array::uniform3(-1e6f32..1e6).prop_map(Sample::Vec3),
        ]
    }

    proptest! {
        #[test]
        fn allocate_read_back(values in prop::collection::vec(arb_value(), 1..64)) {
            let mut s = store();
            let root = s.allocate(&(), GROUP, NodeId::INVALID).unwrap();
            let ids: Vec<NodeId> = values
                .iter()
                .map(|v| match v {
                    Sample::Byte(b) => s.allocate(b, BYTE, root).unwrap(),
                    Sample::Scalar(f) => s.allocate(f, SCALAR, root).unwrap(),
                    Sample::Vec3(v) => s.allocate(v, VEC3, root).unwrap(),
                })
                .collect();
            for (id, value) in ids.iter().zip(&values) {
                prop_assert_eq!(s.header(*id).self_id, *id);
                match value {
                    Sample::Byte(b) => prop_assert_eq!(s.read::<u8>(*id), *b),
                    Sample::Scalar(f) => prop_assert_eq!(s.read::<f32>(*id), *f),
                    Sample::Vec3(v) => prop_assert_eq!(s.read::<[f32; 3]>(*id), *v),
                }
            }
        }
    }
}
