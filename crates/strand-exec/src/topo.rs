//! Dependency ordering of a node's direct children (Kahn's algorithm).
//!
//! Edges come from the `NodeId` fields a type declares as inputs and
//! outputs:
//!
//! - child `c` reads sibling `x`: `x → c`
//! - child `c` writes sibling `y`: `c → y`
//! - child `p` writes and child `q` reads the same non-sibling node: `p → q`
//!
//! Among children that are ready at the same time, the current sibling
//! order wins, so independent siblings keep their relative order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use indexmap::IndexMap;
use smallvec::SmallVec;
use strand_arena::{LayoutTable, NodeFlags, NodeStore, Payload};
use strand_core::NodeId;

use crate::error::ScheduleError;

/// Reusable buffers for [`sort_children`].
///
/// Keep one per runtime so steady-state sorting does not allocate.
#[derive(Debug, Default)]
pub struct SortScratch {
    children: Vec<NodeId>,
    position: IndexMap<NodeId, usize>,
    producers: IndexMap<NodeId, SmallVec<[usize; 2]>>,
    consumers: IndexMap<NodeId, SmallVec<[usize; 2]>>,
    edges: Vec<SmallVec<[usize; 4]>>,
    in_degree: Vec<u32>,
    ready: BinaryHeap<Reverse<usize>>,
    order: Vec<NodeId>,
}

impl SortScratch {
    /// Empty scratch.
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.children.clear();
        self.position.clear();
        self.producers.clear();
        self.consumers.clear();
        self.edges.clear();
        self.in_degree.clear();
        self.ready.clear();
        self.order.clear();
    }

    fn add_edge(&mut self, from: usize, to: usize) {
        if from != to {
            self.edges[from].push(to);
            self.in_degree[to] += 1;
        }
    }
}

/// Reorder `parent`'s children so every producer precedes its consumers.
///
/// Clears `parent`'s `NEEDS_SORT` flag on success. Returns whether the
/// sibling order changed; the store's version is bumped only then.
pub fn sort_children(
    store: &mut NodeStore,
    layouts: &LayoutTable,
    parent: NodeId,
    scratch: &mut SortScratch,
) -> Result<bool, ScheduleError> {
    scratch.reset();
    scratch.children.extend(store.children(parent));
    let n = scratch.children.len();
    for (i, &child) in scratch.children.iter().enumerate() {
        scratch.position.insert(child, i);
    }
    scratch.edges.resize_with(n, SmallVec::new);
    scratch.in_degree.resize(n, 0);

    for ci in 0..n {
        let child = scratch.children[ci];
        let Some(layout) = layouts.get(store.type_tag(child)) else {
            continue;
        };
        if !layout.has_dependencies() {
            continue;
        }
        let payload = store.payload_bytes(child);
        for element in 0..store.element_count(child) as usize {
            let base = element * layout.element_size;
            for &offset in &layout.inputs {
                let target = NodeId::decode(&payload[base + offset as usize..]);
                if !target.is_valid() {
                    continue;
                }
                match scratch.position.get(&target).copied() {
                    Some(xi) => scratch.add_edge(xi, ci),
                    None => scratch.consumers.entry(target).or_default().push(ci),
                }
            }
            for &offset in &layout.outputs {
                let target = NodeId::decode(&payload[base + offset as usize..]);
                if !target.is_valid() {
                    continue;
                }
                match scratch.position.get(&target).copied() {
                    Some(yi) => scratch.add_edge(ci, yi),
                    None => scratch.producers.entry(target).or_default().push(ci),
                }
            }
        }
    }

    for p in 0..scratch.producers.len() {
        let Some((shared, writers)) = scratch.producers.get_index(p) else {
            continue;
        };
        let Some(readers) = scratch.consumers.get(shared) else {
            continue;
        };
        let pairs: SmallVec<[(usize, usize); 8]> = writers
            .iter()
            .flat_map(|&w| readers.iter().map(move |&r| (w, r)))
            .collect();
        for (w, r) in pairs {
            scratch.add_edge(w, r);
        }
    }

    for i in 0..n {
        if scratch.in_degree[i] == 0 {
            scratch.ready.push(Reverse(i));
        }
    }
    while let Some(Reverse(i)) = scratch.ready.pop() {
        scratch.order.push(scratch.children[i]);
        for e in 0..scratch.edges[i].len() {
            let next = scratch.edges[i][e];
            scratch.in_degree[next] -= 1;
            if scratch.in_degree[next] == 0 {
                scratch.ready.push(Reverse(next));
            }
        }
    }

    if scratch.order.len() < n {
        let remaining = n - scratch.order.len();
        tracing::warn!(%parent, remaining, "dependency cycle among children");
        return Err(ScheduleError::Cycle { parent, remaining });
    }

    store.remove_flags(parent, NodeFlags::NEEDS_SORT);
    let changed = scratch.order != scratch.children;
    if changed {
        store.reorder_children(parent, &scratch.order);
    }
    tracing::trace!(%parent, children = n, changed, "sorted dependency group");
    Ok(changed)
}
