//! Reusable task fixtures.
//!
//! - [`Scripted`]: fails a fixed number of times, then succeeds
//! - [`Counter`]: counts its invocations
//! - [`Dependency`]: declares two inputs and one output, records run order
//! - sorted group: a sortable all-of
//! - value: a plain `f32` data node
//! - spawner: allocates a fresh value child every time it runs

use strand_arena::Payload;
use strand_core::{NodeId, Status, TypeTag};
use strand_exec::composite::all_of;
use strand_exec::{ExecContext, TypeDecl};

pub const SCRIPTED: TypeTag = TypeTag(16);
pub const COUNTER: TypeTag = TypeTag(17);
pub const DEPENDENCY: TypeTag = TypeTag(18);
pub const SORTED_GROUP: TypeTag = TypeTag(19);
pub const VALUE: TypeTag = TypeTag(20);
pub const SPAWNER: TypeTag = TypeTag(21);

/// Leaf that returns `Failure` for its first `fail_count` calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Scripted {
    pub fail_count: u32,
    pub calls: u32,
}

impl Scripted {
    pub fn failing(fail_count: u32) -> Self {
        Self {
            fail_count,
            calls: 0,
        }
    }
}

impl Payload for Scripted {
    const SIZE: usize = 8;

    fn encode(&self, out: &mut [u8]) {
        self.fail_count.encode(&mut out[0..4]);
        self.calls.encode(&mut out[4..8]);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            fail_count: u32::decode(&bytes[0..4]),
            calls: u32::decode(&bytes[4..8]),
        }
    }
}

fn run_scripted(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let mut state: Scripted = ctx.read(id);
    let status = if state.calls < state.fail_count {
        Status::Failure
    } else {
        Status::Success
    };
    state.calls += 1;
    ctx.write(id, &state);
    status
}

pub fn scripted_decl() -> TypeDecl {
    TypeDecl::new::<Scripted>(SCRIPTED, "scripted").execute(run_scripted)
}

/// Leaf that counts its invocations and always succeeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counter {
    pub count: u32,
}

impl Payload for Counter {
    const SIZE: usize = 4;

    fn encode(&self, out: &mut [u8]) {
        self.count.encode(out);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            count: u32::decode(bytes),
        }
    }
}

fn run_counter(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let mut counter: Counter = ctx.read(id);
    counter.count += 1;
    ctx.write(id, &counter);
    Status::Success
}

pub fn counter_decl() -> TypeDecl {
    TypeDecl::new::<Counter>(COUNTER, "counter").execute(run_counter)
}

/// Task with two input fields and one output field.
///
/// `order` is set to the context's execute count when the task runs, so
/// tests can compare the run order of siblings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub inputs: [NodeId; 2],
    pub output: NodeId,
    pub order: u32,
}

impl Dependency {
    pub const NONE: Dependency = Dependency {
        inputs: [NodeId::INVALID; 2],
        output: NodeId::INVALID,
        order: 0,
    };

    pub fn reading(inputs: &[NodeId]) -> Self {
        let mut dep = Self::NONE;
        for (slot, &id) in dep.inputs.iter_mut().zip(inputs) {
            *slot = id;
        }
        dep
    }

    pub fn writing(output: NodeId) -> Self {
        Self {
            output,
            ..Self::NONE
        }
    }
}

impl Default for Dependency {
    fn default() -> Self {
        Self::NONE
    }
}

impl Payload for Dependency {
    const SIZE: usize = 16;

    fn encode(&self, out: &mut [u8]) {
        self.inputs.encode(&mut out[0..8]);
        self.output.encode(&mut out[8..12]);
        self.order.encode(&mut out[12..16]);
    }

    fn decode(bytes: &[u8]) -> Self {
        Self {
            inputs: <[NodeId; 2]>::decode(&bytes[0..8]),
            output: NodeId::decode(&bytes[8..12]),
            order: u32::decode(&bytes[12..16]),
        }
    }
}

fn run_dependency(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let mut dep: Dependency = ctx.read(id);
    dep.order = ctx.executed_nodes() as u32;
    ctx.write(id, &dep);
    Status::Success
}

pub fn dependency_decl() -> TypeDecl {
    TypeDecl::new::<Dependency>(DEPENDENCY, "dependency")
        .input(0)
        .input(4)
        .output(8)
        .execute(run_dependency)
}

pub fn sorted_group_decl() -> TypeDecl {
    TypeDecl::new::<()>(SORTED_GROUP, "sorted_group")
        .sortable()
        .execute(all_of)
}

pub fn value_decl() -> TypeDecl {
    TypeDecl::new::<f32>(VALUE, "value")
}

fn run_spawner(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    match ctx.store_mut().allocate(&0.0f32, VALUE, id) {
        Ok(_) => Status::Success,
        Err(_) => Status::Failure,
    }
}

pub fn spawner_decl() -> TypeDecl {
    TypeDecl::new::<()>(SPAWNER, "spawner").execute(run_spawner)
}
