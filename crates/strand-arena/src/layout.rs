//! Per-type payload layouts.
//!
//! A [`LayoutTable`] maps each [`TypeTag`] to its element size and the
//! byte offsets of its dependency fields. Compaction uses it to compute
//! record strides; the scheduler uses it to discover dependency edges.
//! The table is built once and shared immutably (`Arc<LayoutTable>`).

use smallvec::SmallVec;
use strand_core::TypeTag;

use crate::buffer::{align_up, RECORD_ALIGN};
use crate::header::HEADER_SIZE;
use crate::payload::Payload;

/// Layout of one node type's payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeLayout {
    /// Encoded size of one payload element in bytes.
    pub element_size: usize,
    /// Required alignment of the payload; at most [`RECORD_ALIGN`].
    pub alignment: usize,
    /// Byte offsets (within one element) of `NodeId` fields the node reads.
    pub inputs: SmallVec<[u32; 4]>,
    /// Byte offsets (within one element) of `NodeId` fields the node writes.
    pub outputs: SmallVec<[u32; 4]>,
    /// Whether the node's children are ordered by their dependency edges.
    pub sortable: bool,
}

impl TypeLayout {
    /// Layout for payload type `T` with no dependency fields.
    pub fn of<T: Payload>() -> Self {
        Self::with_size(T::SIZE)
    }

    /// Layout for an element of `element_size` bytes.
    pub fn with_size(element_size: usize) -> Self {
        Self {
            element_size,
            alignment: RECORD_ALIGN,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            sortable: false,
        }
    }

    /// Bytes of payload for `count` elements, padded to the record stride.
    pub fn payload_bytes(&self, count: u32) -> usize {
        align_up(self.element_size * count as usize, RECORD_ALIGN)
    }

    /// Full record size (header plus padded payload) for `count` elements.
    pub fn record_size(&self, count: u32) -> usize {
        HEADER_SIZE + self.payload_bytes(count)
    }

    /// Whether this layout declares any dependency field.
    pub fn has_dependencies(&self) -> bool {
        !self.inputs.is_empty() || !self.outputs.is_empty()
    }
}

/// Immutable tag-indexed table of [`TypeLayout`]s.
#[derive(Clone, Debug, Default)]
pub struct LayoutTable {
    entries: Vec<Option<TypeLayout>>,
}

impl LayoutTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `layout` for `tag`, returning any layout it replaced.
    pub fn insert(&mut self, tag: TypeTag, layout: TypeLayout) -> Option<TypeLayout> {
        let index = tag.0 as usize;
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        self.entries[index].replace(layout)
    }

    /// Layout registered for `tag`.
    #[inline]
    pub fn get(&self, tag: TypeTag) -> Option<&TypeLayout> {
        self.entries.get(tag.0 as usize)?.as_ref()
    }

    /// Whether `tag` has a layout.
    pub fn contains(&self, tag: TypeTag) -> bool {
        self.get(tag).is_some()
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether no tag is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered `(tag, layout)` pairs in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (TypeTag, &TypeLayout)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|l| (TypeTag(i as u16), l)))
    }
}
