//! Shadow-copy execution.
//!
//! In shadow mode the runtime mirrors the primary store into a scratch
//! store, executes there, then copies back only what execution wrote:
//! the payload and tick word of every record the scratch marks dirty.
//! Structural edits made during execution stay in the scratch.

use strand_arena::{NodeFlags, NodeStore};
use strand_core::NodeId;

/// Prepare `shadow` as a clean mirror of `primary`.
///
/// Dirty flags inherited from the primary are cleared so that the merge
/// sees only this frame's writes.
pub(crate) fn mirror(shadow: &mut NodeStore, primary: &NodeStore) {
    shadow.mirror_from(primary);
    for index in 0..shadow.buffer().toc_len() {
        if shadow.buffer().toc_entry(index) >= 0 {
            shadow.remove_flags(NodeId(index as i32), NodeFlags::DIRTY);
        }
    }
}

/// Copy dirty records from `shadow` back into `primary`.
///
/// Returns the number of records merged. Records the primary no longer
/// holds under the same tag and element count are skipped.
pub(crate) fn merge_dirty(primary: &mut NodeStore, shadow: &NodeStore) -> usize {
    let mut merged = 0;
    for id in shadow.live_ids() {
        if !shadow.flags(id).contains(NodeFlags::DIRTY) || !primary.is_valid(id) {
            continue;
        }
        if primary.type_tag(id) != shadow.type_tag(id)
            || primary.element_count(id) != shadow.element_count(id)
        {
            continue;
        }
        primary
            .payload_bytes_mut(id)
            .copy_from_slice(shadow.payload_bytes(id));
        primary.remove_flags(id, NodeFlags::SUCCEEDED);
        primary.insert_flags(id, shadow.flags(id));
        merged += 1;
    }
    merged
}
