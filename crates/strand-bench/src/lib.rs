//! Benchmark profiles for the Strand node runtime.
//!
//! - [`wide_tree`]: one all-of root with `n` counter leaves
//! - [`chain_group`]: a sortable group whose `n` children form a reversed
//!   dependency chain, so every sort has to move every child
//! - [`tick_all`]: keep every node in a runtime alive for one more frame

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use strand_core::{NodeId, TypeTag};
use strand_exec::Runtime;
use strand_test_utils::{runtime, Counter, Dependency, COUNTER, DEPENDENCY, SORTED_GROUP};

/// Runtime with an all-of root and `n` counter children.
pub fn wide_tree(n: usize) -> (Runtime, NodeId) {
    let mut rt = runtime(false);
    let store = rt.store_mut();
    let root = store
        .allocate_zeroed(TypeTag::ALL_OF, 1, NodeId::INVALID)
        .unwrap();
    for _ in 0..n {
        store.allocate(&Counter::default(), COUNTER, root).unwrap();
    }
    (rt, root)
}

/// Runtime with a sortable root whose children each read the next one.
///
/// Creation order is the exact reverse of dependency order.
pub fn chain_group(n: usize) -> (Runtime, NodeId) {
    let mut rt = runtime(false);
    let store = rt.store_mut();
    let root = store.allocate(&(), SORTED_GROUP, NodeId::INVALID).unwrap();
    let ids: Vec<NodeId> = (0..n)
        .map(|_| store.allocate(&Dependency::NONE, DEPENDENCY, root).unwrap())
        .collect();
    for pair in ids.windows(2) {
        store.write(pair[0], &Dependency::reading(&[pair[1]]));
    }
    (rt, root)
}

/// Tick the whole tree under `root`.
pub fn tick_all(rt: &mut Runtime, root: NodeId) {
    rt.store_mut().tick_subtree(root);
}
