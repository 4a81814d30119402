//! Compacting node-store arena for Strand.
//!
//! One contiguous buffer holds every node record, bump-allocated from the
//! front, plus a table of contents at the tail that maps each stable
//! [`NodeId`](strand_core::NodeId) to the record's current byte offset.
//! Records move when the buffer grows or is compacted; identifiers do not.
//!
//! - [`buffer`]: the raw buffer and TOC
//! - [`store`]: node records linked into a tree
//! - [`lifecycle`]: tick, sweep and prune
//! - [`handle`]: typed identifiers and views
//! - [`snapshot`]: binary save and restore

#![deny(missing_docs)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod handle;
pub mod header;
pub mod layout;
pub mod lifecycle;
pub mod payload;
pub mod snapshot;
pub mod store;

pub use buffer::{ArenaBuffer, RECORD_ALIGN};
pub use config::StoreConfig;
pub use error::{ArenaError, SnapshotError};
pub use handle::{ArrayView, ArrayViewMut, Identifier, NodeMut, NodeRef};
pub use header::{NodeFlags, NodeHeader, TickWord, HEADER_SIZE};
pub use layout::{LayoutTable, TypeLayout};
pub use lifecycle::{PruneStats, SweepStats};
pub use payload::Payload;
pub use snapshot::{read_snapshot, write_snapshot};
pub use store::{Children, Descendants, NodeStore};
