//! Strongly-typed identifiers for nodes, node types, frames and store versions.

use std::fmt;

/// Stable handle to a node slot in the store's table of contents.
///
/// Carries no address. The slot's byte offset may change when the arena
/// grows or compacts, but the identifier stays valid until the node is
/// disposed and pruned; only then may the slot be handed out again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub i32);

impl NodeId {
    /// Sentinel for "no node" (absent parent, end of a sibling chain, ...).
    pub const INVALID: NodeId = NodeId(-1);

    /// Whether this identifier is not the sentinel.
    ///
    /// This only inspects the integer. Use the store's `is_valid()` to
    /// check that the slot still holds a live node.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }

    /// Slot index in the table of contents.
    ///
    /// Only meaningful when [`is_valid`](Self::is_valid) is true.
    #[inline]
    pub fn index(self) -> usize {
        debug_assert!(self.is_valid(), "index() on invalid NodeId");
        self.0 as usize
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#invalid")
        }
    }
}

impl From<i32> for NodeId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Identifies the type of a node's payload.
///
/// The type registry maps each tag to a payload layout and an optional
/// execute function. Tags below [`TypeTag::FIRST_USER`] are reserved for
/// the built-in control-flow variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(pub u16);

impl TypeTag {
    /// Runs children in order, stopping at the first non-success.
    pub const ALL_OF: TypeTag = TypeTag(0);
    /// Runs children in order, stopping at the first non-failure.
    pub const ANY_OF: TypeTag = TypeTag(1);
    /// Runs the first child only while a stored gate is open.
    pub const GUARDED: TypeTag = TypeTag(2);
    /// Runs one child per invocation, resuming where it left off.
    pub const RESUMABLE_SEQUENCE: TypeTag = TypeTag(3);
    /// Runs every child on every invocation.
    pub const CONCURRENT_ALL: TypeTag = TypeTag(4);

    /// First tag available to user-registered types.
    pub const FIRST_USER: TypeTag = TypeTag(16);

    /// Whether this tag lies in the reserved built-in range.
    pub fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_USER.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for TypeTag {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Frame counter value.
///
/// Only the low [`FrameId::BITS`] bits are stored in a node header, so
/// comparisons between a header and the store's frame use
/// [`masked`](Self::masked).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    /// Number of frame bits kept in a node's tick word.
    pub const BITS: u32 = 27;

    /// Mask selecting the frame bits of a tick word.
    pub const MASK: u32 = (1 << Self::BITS) - 1;

    /// The following frame, wrapping within [`MASK`](Self::MASK).
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1) & Self::MASK)
    }

    /// The frame value as stored in a tick word.
    pub fn masked(self) -> u32 {
        self.0 & Self::MASK
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FrameId {
    fn from(v: u32) -> Self {
        Self(v & Self::MASK)
    }
}

/// Structural version of a store.
///
/// Incremented on every allocation, unlink, re-splice and topology
/// resort, so external caches keyed on tree shape can detect staleness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreVersion(pub u64);

impl StoreVersion {
    /// Advance to the next version.
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

impl fmt::Display for StoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StoreVersion {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinel() {
        assert!(!NodeId::INVALID.is_valid());
        assert!(NodeId(0).is_valid());
        assert_eq!(NodeId::default(), NodeId::INVALID);
        assert_eq!(NodeId(7).to_string(), "#7");
        assert_eq!(NodeId::INVALID.to_string(), "#invalid");
    }

    #[test]
    fn reserved_tags() {
        assert!(TypeTag::ALL_OF.is_reserved());
        assert!(TypeTag::CONCURRENT_ALL.is_reserved());
        assert!(!TypeTag::FIRST_USER.is_reserved());
    }

    #[test]
    fn frame_wraps_within_mask() {
        let last = FrameId(FrameId::MASK);
        assert_eq!(last.next(), FrameId(0));
        assert_eq!(FrameId::from(u32::MAX).0, FrameId::MASK);
    }

    #[test]
    fn version_bumps() {
        let mut v = StoreVersion::default();
        v.bump();
        v.bump();
        assert_eq!(v, StoreVersion(2));
    }
}
