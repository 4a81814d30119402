//! Growable byte buffer with a tail-resident table of contents.
//!
//! [`ArenaBuffer`] holds node records bump-allocated from the front and a
//! table of contents (TOC) growing down from the back:
//!
//! ```text
//! 0                write_offset                 capacity - toc_bytes   capacity
//! ├── records ──────┤ ........... free ........... ├──── TOC (reversed) ────┤
//! ```
//!
//! TOC entry `i` is a little-endian `i32` byte offset for identifier `i`;
//! a negative value marks a free slot. Growth relocates both regions into
//! a buffer at least twice the size, so every stored offset stays valid.

use strand_core::NodeId;

use crate::error::ArenaError;

/// Stride of every record; all sizes are rounded up to this.
pub const RECORD_ALIGN: usize = 4;

/// Bytes per TOC entry.
pub(crate) const TOC_ENTRY_BYTES: usize = 4;

/// TOC value of an unused slot.
pub(crate) const FREE_SLOT: i32 = -1;

/// Round `n` up to a multiple of `align` (a power of two).
#[inline]
pub(crate) fn align_up(n: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (n + align - 1) & !(align - 1)
}

/// Records plus TOC in one contiguous `Vec<u8>`.
#[derive(Clone, Debug)]
pub struct ArenaBuffer {
    /// Backing storage. Its length is the capacity.
    data: Vec<u8>,
    /// Bump pointer: end of the record region.
    write_offset: usize,
    /// Number of TOC slots (live and free).
    toc_len: usize,
    /// No free slot exists below this index.
    free_hint: usize,
    /// Growth ceiling in bytes.
    max_capacity: usize,
}

impl ArenaBuffer {
    /// Create a zeroed buffer of `capacity` bytes that may grow to `max_capacity`.
    pub fn new(capacity: usize, max_capacity: usize) -> Self {
        debug_assert!(capacity % RECORD_ALIGN == 0);
        Self {
            data: vec![0; capacity],
            write_offset: 0,
            toc_len: 0,
            free_hint: 0,
            max_capacity,
        }
    }

    /// Total size of the backing storage in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// The growth ceiling in bytes.
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// End of the record region.
    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Number of TOC slots, live and free.
    pub fn toc_len(&self) -> usize {
        self.toc_len
    }

    /// Bytes occupied by the TOC.
    pub fn toc_bytes(&self) -> usize {
        self.toc_len * TOC_ENTRY_BYTES
    }

    /// Bytes between the record region and the TOC.
    pub fn free_bytes(&self) -> usize {
        self.capacity() - self.write_offset - self.toc_bytes()
    }

    /// Bump-allocate `size` bytes (rounded up to [`RECORD_ALIGN`]).
    ///
    /// Returns the byte offset of the zeroed region. Grows the buffer if
    /// needed; fails only when growth would pass the ceiling.
    pub fn allocate_raw(&mut self, size: usize, alignment: usize) -> Result<usize, ArenaError> {
        debug_assert!(
            alignment.is_power_of_two() && alignment <= RECORD_ALIGN,
            "unsupported alignment {alignment}"
        );
        let size = align_up(size, RECORD_ALIGN);
        self.reserve(size)?;
        let offset = self.write_offset;
        self.write_offset += size;
        self.data[offset..offset + size].fill(0);
        Ok(offset)
    }

    /// Hand out an identifier, reusing the lowest free slot if any.
    ///
    /// The returned slot stays free until [`set_offset`](Self::set_offset)
    /// is called for it.
    pub fn create_identifier(&mut self) -> Result<NodeId, ArenaError> {
        // Linear scan over the slots at or above the hint. The hint only
        // moves past slots observed to be occupied.
        for index in self.free_hint..self.toc_len {
            if self.toc_entry(index) < 0 {
                self.free_hint = index;
                return Ok(NodeId(index as i32));
            }
        }
        if self.toc_len >= i32::MAX as usize {
            return Err(ArenaError::IdentifierSpaceExhausted);
        }
        self.reserve(TOC_ENTRY_BYTES)?;
        let index = self.toc_len;
        self.toc_len += 1;
        self.set_toc_entry(index, FREE_SLOT);
        self.free_hint = index;
        Ok(NodeId(index as i32))
    }

    /// Current byte offset of `id`, or `None` for a free or unknown slot.
    #[inline]
    pub fn try_resolve(&self, id: NodeId) -> Option<usize> {
        if !id.is_valid() || id.index() >= self.toc_len {
            return None;
        }
        let entry = self.toc_entry(id.index());
        (entry >= 0).then_some(entry as usize)
    }

    /// Current byte offset of `id`.
    ///
    /// The identifier must refer to an occupied slot.
    #[inline]
    pub fn resolve(&self, id: NodeId) -> usize {
        let entry = self.toc_entry(id.index());
        debug_assert!(entry >= 0, "resolve() on free slot {id}");
        entry as usize
    }

    /// Point `id` at `offset`.
    #[inline]
    pub fn set_offset(&mut self, id: NodeId, offset: usize) {
        debug_assert!(offset <= self.write_offset);
        self.set_toc_entry(id.index(), offset as i32);
    }

    /// Return `id`'s slot to the free pool.
    pub fn release_identifier(&mut self, id: NodeId) {
        self.set_toc_entry(id.index(), FREE_SLOT);
        self.free_hint = self.free_hint.min(id.index());
    }

    /// Move the end of the record region (used by compaction).
    pub(crate) fn set_write_offset(&mut self, write_offset: usize) {
        debug_assert!(write_offset <= self.write_offset);
        self.write_offset = write_offset;
    }

    /// Forget every record and identifier, keeping the allocation.
    pub fn clear(&mut self) {
        self.write_offset = 0;
        self.toc_len = 0;
        self.free_hint = 0;
    }

    /// Shared view of `len` bytes at `offset`.
    #[inline]
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    /// Mutable view of `len` bytes at `offset`.
    #[inline]
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.data[offset..offset + len]
    }

    /// The whole record region.
    pub fn records(&self) -> &[u8] {
        &self.data[..self.write_offset]
    }

    /// Move `len` bytes from `src` to `dst` within the record region.
    pub(crate) fn copy_within(&mut self, src: usize, len: usize, dst: usize) {
        self.data.copy_within(src..src + len, dst);
    }

    #[inline]
    pub(crate) fn read_i32(&self, offset: usize) -> i32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[offset..offset + 4]);
        i32::from_le_bytes(buf)
    }

    #[inline]
    pub(crate) fn write_i32(&mut self, offset: usize, v: i32) {
        self.data[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub(crate) fn read_u32(&self, offset: usize) -> u32 {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.data[offset..offset + 4]);
        u32::from_le_bytes(buf)
    }

    #[inline]
    pub(crate) fn write_u32(&mut self, offset: usize, v: u32) {
        self.data[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
    }

    #[inline]
    pub(crate) fn read_u16(&self, offset: usize) -> u16 {
        let mut buf = [0u8; 2];
        buf.copy_from_slice(&self.data[offset..offset + 2]);
        u16::from_le_bytes(buf)
    }

    /// Raw TOC value for slot `index`.
    #[inline]
    pub fn toc_entry(&self, index: usize) -> i32 {
        self.read_i32(self.toc_position(index))
    }

    #[inline]
    fn set_toc_entry(&mut self, index: usize, v: i32) {
        let pos = self.toc_position(index);
        self.write_i32(pos, v);
    }

    #[inline]
    fn toc_position(&self, index: usize) -> usize {
        debug_assert!(index < self.toc_len, "TOC index {index} out of range");
        self.capacity() - (index + 1) * TOC_ENTRY_BYTES
    }

    /// Make sure `extra` more bytes fit between records and TOC.
    fn reserve(&mut self, extra: usize) -> Result<(), ArenaError> {
        let required = self
            .write_offset
            .checked_add(extra)
            .and_then(|n| n.checked_add(self.toc_bytes()))
            .ok_or(ArenaError::CapacityExceeded {
                requested: usize::MAX,
                limit: self.max_capacity,
            })?;
        if required <= self.capacity() {
            return Ok(());
        }
        let doubled = self.capacity().saturating_mul(2);
        let new_capacity = align_up(doubled.max(required), RECORD_ALIGN);
        let new_capacity = if new_capacity > self.max_capacity && required <= self.max_capacity {
            self.max_capacity
        } else {
            new_capacity
        };
        self.grow_to(new_capacity)
    }

    /// Relocate records and TOC into a buffer of `new_capacity` bytes.
    pub(crate) fn grow_to(&mut self, new_capacity: usize) -> Result<(), ArenaError> {
        if new_capacity > self.max_capacity {
            tracing::error!(
                requested = new_capacity,
                limit = self.max_capacity,
                "arena growth exceeds configured ceiling"
            );
            return Err(ArenaError::CapacityExceeded {
                requested: new_capacity,
                limit: self.max_capacity,
            });
        }
        if new_capacity <= self.capacity() {
            return Ok(());
        }
        let old_capacity = self.capacity();
        let toc_bytes = self.toc_bytes();
        let mut data = vec![0u8; new_capacity];
        data[..self.write_offset].copy_from_slice(&self.data[..self.write_offset]);
        data[new_capacity - toc_bytes..].copy_from_slice(&self.data[old_capacity - toc_bytes..]);
        self.data = data;
        tracing::trace!(
            old_capacity,
            new_capacity,
            write_offset = self.write_offset,
            toc_len = self.toc_len,
            "arena grown"
        );
        Ok(())
    }

    /// Make `self` a byte-for-byte mirror of `other`.
    ///
    /// Reuses the existing allocation when the capacities already agree.
    pub fn mirror_from(&mut self, other: &ArenaBuffer) {
        if self.data.len() != other.data.len() {
            self.data.resize(other.data.len(), 0);
        }
        let head = other.write_offset;
        let tail = other.capacity() - other.toc_bytes();
        self.data[..head].copy_from_slice(&other.data[..head]);
        self.data[tail..].copy_from_slice(&other.data[tail..]);
        self.write_offset = other.write_offset;
        self.toc_len = other.toc_len;
        self.free_hint = other.free_hint;
        self.max_capacity = other.max_capacity;
    }

    /// Replace the contents with restored snapshot regions.
    ///
    /// `capacity` must not exceed the ceiling and must hold both regions;
    /// the snapshot reader checks this before calling.
    pub(crate) fn restore(&mut self, capacity: usize, records: &[u8], toc: &[i32]) {
        let capacity = capacity.max(self.capacity());
        if self.data.len() != capacity {
            self.data = vec![0; capacity];
        }
        self.data[..records.len()].copy_from_slice(records);
        self.write_offset = records.len();
        self.toc_len = toc.len();
        self.free_hint = 0;
        for (index, &entry) in toc.iter().enumerate() {
            self.set_toc_entry(index, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_raw_bumps_and_rounds() {
        let mut buf = ArenaBuffer::new(256, 1024);
        assert_eq!(buf.allocate_raw(10, 4).unwrap(), 0);
        assert_eq!(buf.allocate_raw(4, 4).unwrap(), 12);
        assert_eq!(buf.write_offset(), 16);
    }

    #[test]
    fn identifiers_append_then_reuse_lowest_free() {
        let mut buf = ArenaBuffer::new(256, 1024);
        let a = buf.create_identifier().unwrap();
        buf.set_offset(a, 0);
        let b = buf.create_identifier().unwrap();
        buf.set_offset(b, 0);
        let c = buf.create_identifier().unwrap();
        buf.set_offset(c, 0);
        assert_eq!((a, b, c), (NodeId(0), NodeId(1), NodeId(2)));

        buf.release_identifier(b);
        assert_eq!(buf.try_resolve(b), None);
        assert_eq!(buf.create_identifier().unwrap(), b);
    }

    #[test]
    fn unfilled_identifier_is_handed_out_again() {
        let mut buf = ArenaBuffer::new(256, 1024);
        let a = buf.create_identifier().unwrap();
        assert_eq!(buf.create_identifier().unwrap(), a);
    }

    #[test]
    fn toc_lives_at_tail() {
        let mut buf = ArenaBuffer::new(256, 1024);
        buf.allocate_raw(8, 4).unwrap();
        let id = buf.create_identifier().unwrap();
        buf.set_offset(id, 4);
        assert_eq!(buf.toc_bytes(), 4);
        assert_eq!(buf.free_bytes(), 256 - 8 - 4);
        assert_eq!(buf.read_i32(252), 4);
    }

    #[test]
    fn growth_preserves_records_and_toc() {
        let mut buf = ArenaBuffer::new(256, 4096);
        let first = buf.allocate_raw(16, 4).unwrap();
        buf.bytes_mut(first, 4).copy_from_slice(&[1, 2, 3, 4]);
        let id = buf.create_identifier().unwrap();
        buf.set_offset(id, first);

        // Force a relocation.
        let second = buf.allocate_raw(400, 4).unwrap();
        assert!(buf.capacity() >= 512);
        assert_eq!(buf.bytes(first, 4), &[1, 2, 3, 4]);
        assert_eq!(buf.resolve(id), first);
        assert_eq!(second, 16);
    }

    #[test]
    fn growth_past_ceiling_fails() {
        let mut buf = ArenaBuffer::new(256, 512);
        let err = buf.allocate_raw(1024, 4).unwrap_err();
        assert!(matches!(err, ArenaError::CapacityExceeded { limit: 512, .. }));
        // Nothing was allocated.
        assert_eq!(buf.write_offset(), 0);
    }

    #[test]
    fn growth_clamps_to_ceiling_when_request_fits() {
        let mut buf = ArenaBuffer::new(256, 300);
        buf.allocate_raw(280, 4).unwrap();
        assert_eq!(buf.capacity(), 300);
    }

    #[test]
    fn mirror_copies_both_regions() {
        let mut src = ArenaBuffer::new(256, 1024);
        let off = src.allocate_raw(8, 4).unwrap();
        src.write_u32(off, 0xdead_beef);
        let id = src.create_identifier().unwrap();
        src.set_offset(id, off);

        let mut dst = ArenaBuffer::new(512, 1024);
        dst.mirror_from(&src);
        assert_eq!(dst.capacity(), 256);
        assert_eq!(dst.read_u32(off), 0xdead_beef);
        assert_eq!(dst.resolve(id), off);
    }
}
