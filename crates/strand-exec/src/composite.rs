//! Built-in control-flow node variants.
//!
//! | Variant | Runs | Stops at | Result |
//! |---|---|---|---|
//! | [`all_of`] | children in order | first non-success | that result, else success |
//! | [`any_of`] | children in order | first non-failure | that result, else last result |
//! | [`guarded`] | first child, if the gate is open | n/a | failure when closed |
//! | [`resumable_sequence`] | one child per call | n/a | running until exhausted |
//! | [`concurrent_all`] | every child, every call | n/a | first non-success, else success |
//!
//! Sibling links are re-read after each child runs, so a child may
//! restructure later siblings without invalidating the walk.

use strand_arena::Payload;
use strand_core::{FrameId, NodeId, Status, TypeTag};

use crate::context::ExecContext;
use crate::registry::TypeDecl;

/// Payload of a [`guarded`] node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Gate {
    /// Whether the first child may run.
    pub open: bool,
}

impl Payload for Gate {
    const SIZE: usize = 1;

    fn encode(&self, out: &mut [u8]) {
        self.open.encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            open: bool::decode(bytes),
        }
    }
}

/// Payload of a [`resumable_sequence`] node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SequenceState {
    /// Index of the child to run next.
    pub cursor: u32,
    /// Start over once every child has succeeded.
    pub looping: bool,
    /// Frame of the last invocation.
    pub last_run_frame: u32,
}

impl SequenceState {
    /// A fresh sequence.
    pub fn new(looping: bool) -> Self {
        Self {
            looping,
            ..Self::default()
        }
    }
}

impl Payload for SequenceState {
    const SIZE: usize = 9;

    fn encode(&self, out: &mut [u8]) {
        self.cursor.encode(&mut out[0..4]);
        self.last_run_frame.encode(&mut out[4..8]);
        self.looping.encode(&mut out[8..9]);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            cursor: u32::decode(&bytes[0..4]),
            last_run_frame: u32::decode(&bytes[4..8]),
            looping: bool::decode(&bytes[8..9]),
        }
    }
}

pub(crate) fn control_flow_decls() -> [TypeDecl; 5] {
    [
        TypeDecl::new::<()>(TypeTag::ALL_OF, "all_of").execute(all_of),
        TypeDecl::new::<()>(TypeTag::ANY_OF, "any_of").execute(any_of),
        TypeDecl::new::<Gate>(TypeTag::GUARDED, "guarded").execute(guarded),
        TypeDecl::new::<SequenceState>(TypeTag::RESUMABLE_SEQUENCE, "resumable_sequence")
            .execute(resumable_sequence),
        TypeDecl::new::<()>(TypeTag::CONCURRENT_ALL, "concurrent_all").execute(concurrent_all),
    ]
}

/// Run children in order until one does not succeed.
pub fn all_of(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let mut child = ctx.store().first_child(id);
    while child.is_valid() {
        let status = ctx.execute(child);
        if !status.is_success() {
            return status;
        }
        child = ctx.store().next_sibling(child);
    }
    Status::Success
}

/// Run children in order until one does not fail.
///
/// Returns the last child's failure when every child fails, and success
/// when there are no children.
pub fn any_of(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let mut result = Status::Success;
    let mut child = ctx.store().first_child(id);
    while child.is_valid() {
        result = ctx.execute(child);
        if !result.is_failure() {
            return result;
        }
        child = ctx.store().next_sibling(child);
    }
    result
}

/// Run the first child only while the [`Gate`] is open.
pub fn guarded(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let gate: Gate = ctx.read(id);
    if !gate.open {
        return Status::Failure;
    }
    let child = ctx.store().first_child(id);
    if child.is_valid() {
        ctx.execute(child)
    } else {
        Status::Success
    }
}

/// Run one child per call, advancing only when it succeeds.
///
/// The child under the cursor is re-run on failure or running. The
/// cursor restarts from the first child when the node was not run in
/// the previous frame.
pub fn resumable_sequence(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let frame = ctx.frame();
    let mut state: SequenceState = ctx.read(id);
    if FrameId(state.last_run_frame).next() != frame {
        state.cursor = 0;
    }
    state.last_run_frame = frame.0;

    let child = ctx.nth_child(id, state.cursor as usize);
    let status = if child.is_valid() {
        ctx.execute(child)
    } else {
        Status::Success
    };

    let result = match status {
        Status::Success => {
            if child.is_valid() {
                state.cursor += 1;
            }
            if ctx.nth_child(id, state.cursor as usize).is_valid() {
                Status::Running
            } else {
                if state.looping {
                    state.cursor = 0;
                }
                Status::Success
            }
        }
        other => other,
    };
    ctx.write(id, &state);
    result
}

/// Run every child, then report the first non-success.
pub fn concurrent_all(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let mut result = Status::Success;
    let mut child = ctx.store().first_child(id);
    while child.is_valid() {
        let status = ctx.execute(child);
        if result.is_success() {
            result = status;
        }
        child = ctx.store().next_sibling(child);
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::registry::TaskRegistry;
    use strand_arena::{NodeFlags, NodeStore, StoreConfig};

    const LEAF: TypeTag = TypeTag(16);

    /// Leaf whose payload is the status it reports; counts calls in the
    /// upper byte.
    fn scripted(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
        let [status, calls]: [u8; 2] = ctx.read(id);
        ctx.write(id, &[status, calls + 1]);
        Status::decode(&[status])
    }

    fn registry() -> Arc<TaskRegistry> {
        Arc::new(
            TaskRegistry::builder()
                .with_control_flow()
                .register(TypeDecl::new::<[u8; 2]>(LEAF, "scripted").execute(scripted))
                .build()
                .unwrap(),
        )
    }

    fn leaf(status: Status) -> [u8; 2] {
        let mut byte = [0u8];
        status.encode(&mut byte);
        [byte[0], 0]
    }

    fn calls(store: &NodeStore, id: NodeId) -> u8 {
        store.read::<[u8; 2]>(id)[1]
    }

    fn build(tag: TypeTag, leaves: &[Status]) -> (Arc<TaskRegistry>, NodeStore, NodeId, Vec<NodeId>) {
        let registry = registry();
        let mut store = registry.new_store(StoreConfig::default()).unwrap();
        let root = store
            .allocate_zeroed(tag, 1, NodeId::INVALID)
            .unwrap();
        let children = leaves
            .iter()
            .map(|&s| store.allocate(&leaf(s), LEAF, root).unwrap())
            .collect();
        (registry, store, root, children)
    }

    fn run(registry: &TaskRegistry, store: &mut NodeStore, root: NodeId) -> Status {
        ExecContext::new(store, registry).execute(root)
    }

    #[test]
    fn all_of_stops_at_first_non_success() {
        let (reg, mut store, root, kids) = build(
            TypeTag::ALL_OF,
            &[Status::Success, Status::Running, Status::Success],
        );
        assert_eq!(run(&reg, &mut store, root), Status::Running);
        assert_eq!(calls(&store, kids[1]), 1);
        assert_eq!(calls(&store, kids[2]), 0);
        assert!(!store.flags(root).contains(NodeFlags::SUCCEEDED));
        assert!(store.flags(kids[0]).contains(NodeFlags::SUCCEEDED));
    }

    #[test]
    fn empty_composites_succeed() {
        for tag in [TypeTag::ALL_OF, TypeTag::ANY_OF, TypeTag::CONCURRENT_ALL] {
            let (reg, mut store, root, _) = build(tag, &[]);
            assert_eq!(run(&reg, &mut store, root), Status::Success, "{tag}");
        }
    }

    #[test]
    fn any_of_stops_at_first_non_failure() {
        let (reg, mut store, root, kids) = build(
            TypeTag::ANY_OF,
            &[Status::Failure, Status::Success, Status::Failure],
        );
        assert_eq!(run(&reg, &mut store, root), Status::Success);
        assert_eq!(calls(&store, kids[2]), 0);
    }

    #[test]
    fn any_of_all_failing_fails() {
        let (reg, mut store, root, _) =
            build(TypeTag::ANY_OF, &[Status::Failure, Status::Failure]);
        assert_eq!(run(&reg, &mut store, root), Status::Failure);
    }

    #[test]
    fn guarded_respects_gate() {
        let (reg, mut store, root, kids) = build(TypeTag::GUARDED, &[Status::Running]);
        assert_eq!(run(&reg, &mut store, root), Status::Failure);
        assert_eq!(calls(&store, kids[0]), 0);

        store.write(root, &Gate { open: true });
        assert_eq!(run(&reg, &mut store, root), Status::Running);
        assert_eq!(calls(&store, kids[0]), 1);
    }

    #[test]
    fn concurrent_all_runs_every_child() {
        let (reg, mut store, root, kids) = build(
            TypeTag::CONCURRENT_ALL,
            &[Status::Success, Status::Failure, Status::Running],
        );
        assert_eq!(run(&reg, &mut store, root), Status::Failure);
        assert!(kids.iter().all(|&k| calls(&store, k) == 1));
    }

    #[test]
    fn sequence_loops_when_asked() {
        let (reg, mut store, root, kids) =
            build(TypeTag::RESUMABLE_SEQUENCE, &[Status::Success, Status::Success]);
        store.write(root, &SequenceState::new(true));

        let mut results = Vec::new();
        for _ in 0..4 {
            store.advance_frame();
            results.push(run(&reg, &mut store, root));
        }
        assert_eq!(
            results,
            vec![Status::Running, Status::Success, Status::Running, Status::Success]
        );
        assert_eq!(calls(&store, kids[0]), 2);
        assert_eq!(calls(&store, kids[1]), 2);
    }

    #[test]
    fn sequence_restarts_after_skipped_frame() {
        let (reg, mut store, root, kids) = build(
            TypeTag::RESUMABLE_SEQUENCE,
            &[Status::Success, Status::Running],
        );
        store.advance_frame();
        assert_eq!(run(&reg, &mut store, root), Status::Running);
        store.advance_frame();
        run(&reg, &mut store, root);
        assert_eq!(store.read::<SequenceState>(root).cursor, 1);

        // One frame without running resets the cursor.
        store.advance_frame();
        store.advance_frame();
        run(&reg, &mut store, root);
        assert_eq!(calls(&store, kids[0]), 2);
    }
}
