//! Binary snapshot of a node store.
//!
//! All integers are little-endian. The stream is:
//!
//! ```text
//! magic "STRD" | version u8 | capacity u32 | frame u32 | root i32
//! | write_offset u32 | structural version u64
//! | records [u8; write_offset] | toc_len u32 | toc [i32; toc_len]
//! ```
//!
//! Only the record region and TOC are stored; the free gap between them
//! is not. Readers restore fields in the order they were written.

use std::io::{Read, Write};

use strand_core::{FrameId, NodeId, StoreVersion};

use crate::buffer::TOC_ENTRY_BYTES;
use crate::error::SnapshotError;
use crate::header::{NodeHeader, HEADER_SIZE};
use crate::store::NodeStore;

/// Magic bytes at the start of every snapshot.
pub const MAGIC: [u8; 4] = *b"STRD";

/// Current snapshot format version.
pub const FORMAT_VERSION: u8 = 1;

// ── Primitive helpers ───────────────────────────────────────────

fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), SnapshotError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn write_i32_le(w: &mut dyn Write, v: i32) -> Result<(), SnapshotError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_u8(r: &mut dyn Read) -> Result<u8, SnapshotError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u32_le(r: &mut dyn Read) -> Result<u32, SnapshotError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_i32_le(r: &mut dyn Read) -> Result<i32, SnapshotError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u64_le(r: &mut dyn Read) -> Result<u64, SnapshotError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn malformed(detail: impl Into<String>) -> SnapshotError {
    SnapshotError::Malformed {
        detail: detail.into(),
    }
}

// ── Encode / decode ─────────────────────────────────────────────

/// Write `store` to `w`.
pub fn write_snapshot(w: &mut dyn Write, store: &NodeStore) -> Result<(), SnapshotError> {
    let buffer = store.buffer();
    let capacity = u32::try_from(buffer.capacity())
        .map_err(|_| malformed("capacity does not fit in u32"))?;

    w.write_all(&MAGIC)?;
    w.write_all(&[FORMAT_VERSION])?;
    write_u32_le(w, capacity)?;
    write_u32_le(w, store.frame().0)?;
    write_i32_le(w, store.root().0)?;
    write_u32_le(w, buffer.write_offset() as u32)?;
    w.write_all(&store.version().0.to_le_bytes())?;
    w.write_all(buffer.records())?;
    write_u32_le(w, buffer.toc_len() as u32)?;
    for index in 0..buffer.toc_len() {
        write_i32_le(w, buffer.toc_entry(index))?;
    }
    Ok(())
}

/// Replace the contents of `store` with a snapshot read from `r`.
///
/// The declared capacity is checked against the store's ceiling before
/// anything is copied. On error `store` is left unchanged.
pub fn read_snapshot(r: &mut dyn Read, store: &mut NodeStore) -> Result<(), SnapshotError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(SnapshotError::InvalidMagic);
    }
    let version = read_u8(r)?;
    if version != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion { found: version });
    }

    let capacity = read_u32_le(r)? as usize;
    let limit = store.buffer().max_capacity();
    if capacity > limit {
        return Err(SnapshotError::CapacityMismatch {
            declared: capacity,
            limit,
        });
    }
    let frame = FrameId(read_u32_le(r)?);
    let root = NodeId(read_i32_le(r)?);
    let write_offset = read_u32_le(r)? as usize;
    let structural_version = StoreVersion(read_u64_le(r)?);
    if write_offset > capacity {
        return Err(malformed(format!(
            "write_offset {write_offset} exceeds capacity {capacity}"
        )));
    }

    let mut records = vec![0u8; write_offset];
    r.read_exact(&mut records)?;

    let toc_len = read_u32_le(r)? as usize;
    if write_offset + toc_len * TOC_ENTRY_BYTES > capacity {
        return Err(malformed(format!(
            "{toc_len} TOC entries do not fit beside {write_offset} record bytes"
        )));
    }
    let mut toc = Vec::with_capacity(toc_len);
    for index in 0..toc_len {
        let entry = read_i32_le(r)?;
        if entry >= 0 && entry as usize + HEADER_SIZE > write_offset {
            return Err(malformed(format!(
                "TOC entry {index} points past the record region"
            )));
        }
        toc.push(entry);
    }
    if root.is_valid() && toc.get(root.index()).is_none_or(|&e| e < 0) {
        return Err(malformed(format!("root {root} is not an occupied slot")));
    }
    let node_count = count_linked_nodes(&records, &toc, root)?;

    store.buffer.restore(capacity, &records, &toc);
    store.root = root;
    store.frame = frame;
    store.version = structural_version;
    store.node_count = node_count;
    tracing::debug!(
        capacity = store.capacity(),
        write_offset,
        toc_len,
        frame = %frame,
        "snapshot restored"
    );
    Ok(())
}

/// Count the nodes reachable from `root` by following the records' links.
///
/// Every followed link must name an occupied slot whose record carries
/// the same id. A well-formed tree visits each slot once and climbs to
/// each parent at most once, so the walk gives up after twice the TOC
/// length.
fn count_linked_nodes(records: &[u8], toc: &[i32], root: NodeId) -> Result<usize, SnapshotError> {
    if !root.is_valid() {
        return Ok(0);
    }
    let header = |id: NodeId| -> Result<NodeHeader, SnapshotError> {
        let offset = usize::try_from(id.0)
            .ok()
            .and_then(|index| toc.get(index))
            .copied()
            .filter(|&entry| entry >= 0)
            .ok_or_else(|| malformed(format!("link to {id} names a free slot")))?;
        let header = NodeHeader::decode(&records[offset as usize..]);
        if header.self_id != id {
            return Err(malformed(format!(
                "slot {id} holds the record of {}",
                header.self_id
            )));
        }
        Ok(header)
    };
    let budget = 2 * toc.len();
    let mut steps = 0;
    let mut step = || {
        steps += 1;
        if steps > budget {
            Err(malformed("node links form a cycle"))
        } else {
            Ok(())
        }
    };

    let mut count = 1;
    let mut id = root;
    loop {
        step()?;
        let mut current = header(id)?;
        let next = if current.first_child.is_valid() {
            current.first_child
        } else {
            let mut at = id;
            loop {
                if at == root {
                    break NodeId::INVALID;
                }
                if current.next_sibling.is_valid() {
                    break current.next_sibling;
                }
                at = current.parent;
                if !at.is_valid() {
                    break NodeId::INVALID;
                }
                step()?;
                current = header(at)?;
            }
        };
        if !next.is_valid() {
            return Ok(count);
        }
        count += 1;
        id = next;
    }
}
