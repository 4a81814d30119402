//! Strand: a compacting node-store arena with a dependency-ordered frame runtime.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Strand sub-crates. For most users, adding `strand` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use strand::prelude::*;
//!
//! const TALLY: TypeTag = TypeTag(16);
//!
//! fn tally(ctx: &mut ExecContext<'_>, id: NodeId) -> Status {
//!     let n: u32 = ctx.read(id);
//!     ctx.write(id, &(n + 1));
//!     Status::Success
//! }
//!
//! let registry = TaskRegistry::builder()
//!     .with_control_flow()
//!     .register(TypeDecl::new::<u32>(TALLY, "tally").execute(tally))
//!     .build()
//!     .unwrap();
//! let mut runtime = Runtime::new(RuntimeConfig::default(), registry.into()).unwrap();
//!
//! let store = runtime.store_mut();
//! let root = store.allocate_zeroed(TypeTag::ALL_OF, 1, NodeId::INVALID).unwrap();
//! let counter = store.allocate(&0u32, TALLY, root).unwrap();
//!
//! for _ in 0..3 {
//!     runtime.store_mut().tick_subtree(root);
//!     let report = runtime.run_frame().unwrap();
//!     assert_eq!(report.root_status, Some(Status::Success));
//! }
//! assert_eq!(runtime.store().read::<u32>(counter), 3);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strand-core` | Identifiers and `Status` |
//! | [`arena`] | `strand-arena` | Node store, lifecycle, typed handles, snapshots |
//! | [`exec`] | `strand-exec` | Registry, scheduler, control flow, runtime |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Identifiers and the execute result type (`strand-core`).
pub use strand_core as types;

/// Node store, tick lifecycle, typed handles and snapshots (`strand-arena`).
///
/// [`arena::NodeStore`] is the main entry point; most of its API is also
/// reachable through [`exec::Runtime::store_mut`].
pub use strand_arena as arena;

/// Type registry, dependency sorting and the frame runtime (`strand-exec`).
pub use strand_exec as exec;

/// Common imports for typical Strand usage.
///
/// ```rust
/// use strand::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use strand_core::{FrameId, NodeId, Status, TypeTag};

    // Arena
    pub use strand_arena::{
        ArenaError, Identifier, NodeFlags, NodeStore, Payload, StoreConfig,
    };

    // Execution
    pub use strand_exec::{
        ExecContext, FrameError, FrameMetrics, FrameReport, Gate, RegistryError, Runtime,
        RuntimeConfig, SequenceState, TaskRegistry, TypeDecl,
    };
}
