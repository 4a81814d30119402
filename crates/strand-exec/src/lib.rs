//! Dependency-ordered execution of a Strand node tree.
//!
//! [`TaskRegistry`] declares node types; [`Runtime`] drives the frame
//! loop (sweep, prune, sort, execute) over a
//! [`NodeStore`](strand_arena::NodeStore). The five built-in control-flow
//! variants live in [`composite`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod composite;
pub mod config;
pub mod context;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod runtime;
mod shadow;
pub mod topo;

pub use composite::{Gate, SequenceState};
pub use config::RuntimeConfig;
pub use context::ExecContext;
pub use error::{FrameError, RegistryError, ScheduleError};
pub use metrics::FrameMetrics;
pub use registry::{ExecuteFn, TaskEntry, TaskRegistry, TaskRegistryBuilder, TypeDecl};
pub use runtime::{FrameReport, Runtime};
pub use topo::{sort_children, SortScratch};
