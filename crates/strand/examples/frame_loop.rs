//! A host loop that churns short-lived nodes through a Strand runtime.
//!
//! Each frame the host spawns a particle under a sorted group, keeps the
//! newest few alive by ticking them, and lets the rest lapse. A producer
//! and a consumer share a data node so the group is dependency-ordered.
//!
//! Run with `RUST_LOG=strand_exec=debug,strand_arena=trace` to see each
//! frame's sweep, prune and sort.

use std::collections::VecDeque;

use strand::prelude::*;
use tracing_subscriber::EnvFilter;

const GROUP: TypeTag = TypeTag(16);
const PARTICLE: TypeTag = TypeTag(17);
const STAGE: TypeTag = TypeTag(18);
const SAMPLE: TypeTag = TypeTag(19);

const LIVE_PARTICLES: usize = 8;

/// `[reads, writes]` node links.
type Stage = [NodeId; 2];

fn age_particle(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let [x, age]: [f32; 2] = ctx.read(id);
    ctx.write(id, &[x + 0.5, age + 1.0]);
    Status::Success
}

fn run_stage(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
    let [reads, writes]: Stage = ctx.read(id);
    let input = if reads.is_valid() {
        ctx.read::<f32>(reads)
    } else {
        1.0
    };
    if writes.is_valid() {
        ctx.write(writes, &(input * 2.0));
    }
    Status::Success
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let registry = TaskRegistry::builder()
        .with_control_flow()
        .register(
            TypeDecl::new::<()>(GROUP, "group")
                .sortable()
                .execute(strand::exec::composite::all_of),
        )
        .register(TypeDecl::new::<[f32; 2]>(PARTICLE, "particle").execute(age_particle))
        .register(
            TypeDecl::new::<Stage>(STAGE, "stage")
                .input(0)
                .output(4)
                .execute(run_stage),
        )
        .register(TypeDecl::new::<f32>(SAMPLE, "sample"))
        .build()?;

    let config = RuntimeConfig {
        store: StoreConfig::new(4096),
        shadow: false,
    };
    let mut runtime = Runtime::new(config, registry.into())?;

    let store = runtime.store_mut();
    let root = store.allocate(&(), GROUP, NodeId::INVALID)?;
    let data_holder = store.allocate_zeroed(TypeTag::ALL_OF, 1, root)?;
    let sample = store.allocate(&0.0f32, SAMPLE, data_holder)?;
    // Created consumer-first; sorting puts the producer ahead.
    let consumer = store.allocate(&[sample, NodeId::INVALID], STAGE, root)?;
    let producer = store.allocate(&[NodeId::INVALID, sample], STAGE, root)?;

    let mut particles = VecDeque::new();
    for frame in 0..32 {
        let store = runtime.store_mut();
        store.tick(root);
        store.tick_subtree(data_holder);
        store.tick(consumer);
        store.tick(producer);

        particles.push_back(store.allocate(&[frame as f32, 0.0f32], PARTICLE, root)?);
        if particles.len() > LIVE_PARTICLES {
            particles.pop_front();
        }
        for &p in &particles {
            store.tick(p);
        }

        let report = runtime.run_frame()?;
        tracing::info!(
            frame = %report.frame,
            status = ?report.root_status,
            live_bytes = report.metrics.live_bytes,
            capacity = report.metrics.capacity_bytes,
            disposed = report.metrics.disposed_nodes,
            "frame"
        );
    }

    let store = runtime.store();
    let order: Vec<NodeId> = store.children(root).collect();
    let producer_first = order.iter().position(|&n| n == producer)
        < order.iter().position(|&n| n == consumer);
    tracing::info!(
        nodes = store.node_count(),
        sample = store.read::<f32>(sample),
        producer_first,
        "done"
    );
    Ok(())
}
