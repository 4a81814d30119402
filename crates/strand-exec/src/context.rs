//! Depth-first dispatch of execute functions.

use strand_arena::{NodeFlags, NodeStore, Payload};
use strand_core::{FrameId, NodeId, Status};

use crate::registry::TaskRegistry;

/// State handed to every execute function during one frame.
///
/// Owns no data: it borrows the store being executed and the registry
/// that resolves type tags to functions. Composite nodes recurse into
/// their children through [`execute`](Self::execute).
pub struct ExecContext<'a> {
    store: &'a mut NodeStore,
    registry: &'a TaskRegistry,
    executed: usize,
}

impl<'a> ExecContext<'a> {
    /// Create a context over `store`.
    pub fn new(store: &'a mut NodeStore, registry: &'a TaskRegistry) -> Self {
        Self {
            store,
            registry,
            executed: 0,
        }
    }

    /// Run `id`'s execute function and record the outcome in its header.
    ///
    /// Nodes whose type has no execute function are data and report
    /// [`Status::Success`].
    pub fn execute(&mut self, id: NodeId) -> Status {
        debug_assert!(self.store.is_valid(id), "execute() on dead node {id}");
        self.executed += 1;
        let tag = self.store.type_tag(id);
        let status = match self.registry.execute_fn(tag) {
            Some(f) => f(self, id),
            None => Status::Success,
        };
        if status.is_success() {
            self.store.insert_flags(id, NodeFlags::SUCCEEDED);
        } else {
            self.store.remove_flags(id, NodeFlags::SUCCEEDED);
        }
        status
    }

    /// The store being executed.
    pub fn store(&self) -> &NodeStore {
        self.store
    }

    /// Mutable access to the store being executed.
    pub fn store_mut(&mut self) -> &mut NodeStore {
        self.store
    }

    /// The registry in use.
    pub fn registry(&self) -> &TaskRegistry {
        self.registry
    }

    /// The frame being executed.
    pub fn frame(&self) -> FrameId {
        self.store.frame()
    }

    /// Number of [`execute`](Self::execute) calls made so far this frame.
    pub fn executed_nodes(&self) -> usize {
        self.executed
    }

    /// Decode `id`'s first payload element.
    pub fn read<T: Payload>(&self, id: NodeId) -> T {
        self.store.read(id)
    }

    /// Overwrite `id`'s first payload element.
    pub fn write<T: Payload>(&mut self, id: NodeId, value: &T) {
        self.store.write(id, value);
    }

    /// The `n`th child of `id`, or [`NodeId::INVALID`].
    pub fn nth_child(&self, id: NodeId, n: usize) -> NodeId {
        self.store.children(id).nth(n).unwrap_or(NodeId::INVALID)
    }
}
