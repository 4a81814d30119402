//! Core types for the Strand node runtime.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers shared by the arena and the executor ([`NodeId`],
//! [`TypeTag`], [`FrameId`], [`StoreVersion`]) and the [`Status`] result
//! every execute function reports.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod status;

pub use id::{FrameId, NodeId, StoreVersion, TypeTag};
pub use status::Status;
