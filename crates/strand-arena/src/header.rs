//! Fixed-size node header and the packed tick word.
//!
//! Every record starts with a 32-byte little-endian header:
//!
//! ```text
//! off  size  field
//!   0     4  self id
//!   4     4  parent id
//!   8     4  first child id
//!  12     4  next sibling id
//!  16     4  previous sibling id
//!  20     2  type tag
//!  22     2  reserved (zero)
//!  24     4  element count
//!  28     4  tick word: frame (low 27 bits) | flags (high 5 bits)
//! ```
//!
//! The payload follows immediately at offset 32.

use std::fmt;
use std::ops::BitOr;

use strand_core::{FrameId, NodeId, TypeTag};

/// Size of a node header in bytes.
pub const HEADER_SIZE: usize = 32;

pub(crate) const SELF_OFFSET: usize = 0;
pub(crate) const PARENT_OFFSET: usize = 4;
pub(crate) const FIRST_CHILD_OFFSET: usize = 8;
pub(crate) const NEXT_SIBLING_OFFSET: usize = 12;
pub(crate) const PREVIOUS_SIBLING_OFFSET: usize = 16;
pub(crate) const TAG_OFFSET: usize = 20;
pub(crate) const COUNT_OFFSET: usize = 24;
pub(crate) const TICK_OFFSET: usize = 28;

/// Flag bits stored in the high bits of a [`TickWord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodeFlags(u32);

impl NodeFlags {
    /// No flags set.
    pub const NONE: NodeFlags = NodeFlags(0);
    /// The node's children must be re-sorted before the next execution.
    pub const NEEDS_SORT: NodeFlags = NodeFlags(1 << 27);
    /// The payload was written since the flag was last cleared.
    pub const DIRTY: NodeFlags = NodeFlags(1 << 28);
    /// The node has been unlinked and its space is reclaimable.
    pub const DISPOSED: NodeFlags = NodeFlags(1 << 29);
    /// The node's execute function returned success in the last executed frame.
    pub const SUCCEEDED: NodeFlags = NodeFlags(1 << 30);
    /// The node will be disposed at the next sweep regardless of ticks.
    pub const MARKED_FOR_DELETE: NodeFlags = NodeFlags(1 << 31);

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set.
    pub fn contains(self, other: NodeFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for NodeFlags {
    type Output = NodeFlags;

    fn bitor(self, rhs: NodeFlags) -> NodeFlags {
        NodeFlags(self.0 | rhs.0)
    }
}

/// Packed `(frame & FrameId::MASK) | flags` liveness word.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickWord(pub u32);

impl TickWord {
    /// A word stamped for `frame` with no flags.
    pub fn new(frame: FrameId) -> Self {
        Self(frame.masked())
    }

    /// The frame this node was last ticked for.
    pub fn frame(self) -> FrameId {
        FrameId(self.0 & FrameId::MASK)
    }

    /// The flag bits.
    pub fn flags(self) -> NodeFlags {
        NodeFlags(self.0 & !FrameId::MASK)
    }

    /// Restamp the frame bits, keeping every flag.
    pub fn with_frame(self, frame: FrameId) -> Self {
        Self((self.0 & !FrameId::MASK) | frame.masked())
    }

    /// Whether every bit of `flags` is set.
    pub fn contains(self, flags: NodeFlags) -> bool {
        self.flags().contains(flags)
    }

    /// Set `flags`.
    pub fn with(self, flags: NodeFlags) -> Self {
        Self(self.0 | flags.bits())
    }

    /// Clear `flags`.
    pub fn without(self, flags: NodeFlags) -> Self {
        Self(self.0 & !flags.bits())
    }
}

impl fmt::Debug for TickWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TickWord(frame={}, flags={:#x})", self.frame(), self.flags().bits())
    }
}

/// Decoded copy of a node header.
///
/// The store reads and writes individual header fields in place; this
/// struct is the convenient whole-header view for callers and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeHeader {
    /// The node's own identifier.
    pub self_id: NodeId,
    /// Parent, or [`NodeId::INVALID`] for the root and detached nodes.
    pub parent: NodeId,
    /// First child in sibling order.
    pub first_child: NodeId,
    /// Next sibling.
    pub next_sibling: NodeId,
    /// Previous sibling.
    pub previous_sibling: NodeId,
    /// Payload type.
    pub type_tag: TypeTag,
    /// Number of payload elements.
    pub element_count: u32,
    /// Liveness frame plus flags.
    pub tick: TickWord,
}

impl NodeHeader {
    /// Decode a header from the first [`HEADER_SIZE`] bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Self {
        let i32_at = |o: usize| {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&bytes[o..o + 4]);
            i32::from_le_bytes(buf)
        };
        let u32_at = |o: usize| i32_at(o) as u32;
        Self {
            self_id: NodeId(i32_at(SELF_OFFSET)),
            parent: NodeId(i32_at(PARENT_OFFSET)),
            first_child: NodeId(i32_at(FIRST_CHILD_OFFSET)),
            next_sibling: NodeId(i32_at(NEXT_SIBLING_OFFSET)),
            previous_sibling: NodeId(i32_at(PREVIOUS_SIBLING_OFFSET)),
            type_tag: TypeTag(u16::from_le_bytes([bytes[TAG_OFFSET], bytes[TAG_OFFSET + 1]])),
            element_count: u32_at(COUNT_OFFSET),
            tick: TickWord(u32_at(TICK_OFFSET)),
        }
    }

    /// Encode into the first [`HEADER_SIZE`] bytes of `out`.
    pub fn encode(&self, out: &mut [u8]) {
        let out = &mut out[..HEADER_SIZE];
        out[SELF_OFFSET..SELF_OFFSET + 4].copy_from_slice(&self.self_id.0.to_le_bytes());
        out[PARENT_OFFSET..PARENT_OFFSET + 4].copy_from_slice(&self.parent.0.to_le_bytes());
        out[FIRST_CHILD_OFFSET..FIRST_CHILD_OFFSET + 4]
            .copy_from_slice(&self.first_child.0.to_le_bytes());
        out[NEXT_SIBLING_OFFSET..NEXT_SIBLING_OFFSET + 4]
            .copy_from_slice(&self.next_sibling.0.to_le_bytes());
        out[PREVIOUS_SIBLING_OFFSET..PREVIOUS_SIBLING_OFFSET + 4]
            .copy_from_slice(&self.previous_sibling.0.to_le_bytes());
        out[TAG_OFFSET..TAG_OFFSET + 2].copy_from_slice(&self.type_tag.0.to_le_bytes());
        out[TAG_OFFSET + 2..COUNT_OFFSET].fill(0);
        out[COUNT_OFFSET..COUNT_OFFSET + 4].copy_from_slice(&self.element_count.to_le_bytes());
        out[TICK_OFFSET..TICK_OFFSET + 4].copy_from_slice(&self.tick.0.to_le_bytes());
    }
}
