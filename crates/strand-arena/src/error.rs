//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use strand_core::{NodeId, TypeTag};

/// Errors that can occur during store operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// Growing the buffer would exceed the configured ceiling.
    ///
    /// There is no partial-progress path: the request that triggered the
    /// growth did not happen.
    CapacityExceeded {
        /// Total buffer size in bytes the request needed.
        requested: usize,
        /// The configured `max_capacity`.
        limit: usize,
    },
    /// Every identifier the table of contents can address is in use.
    IdentifierSpaceExhausted,
    /// The store configuration failed validation.
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// A node was allocated with a type tag that has no layout.
    UnregisteredType {
        /// The unknown tag.
        tag: TypeTag,
    },
    /// The Rust payload type does not match the registered element size.
    PayloadSizeMismatch {
        /// Tag the allocation was made under.
        tag: TypeTag,
        /// Element size registered for the tag.
        expected: usize,
        /// Encoded size of the supplied payload type.
        found: usize,
    },
    /// The requested parent is not a live node.
    InvalidParent {
        /// The rejected parent.
        parent: NodeId,
    },
    /// A parentless allocation was requested while a root already exists.
    RootOccupied {
        /// The current root.
        root: NodeId,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { requested, limit } => {
                write!(
                    f,
                    "arena capacity exceeded: requested {requested} bytes, limit {limit} bytes"
                )
            }
            Self::IdentifierSpaceExhausted => write!(f, "identifier space exhausted"),
            Self::InvalidConfig { reason } => write!(f, "invalid store config: {reason}"),
            Self::UnregisteredType { tag } => write!(f, "type tag {tag} is not registered"),
            Self::PayloadSizeMismatch {
                tag,
                expected,
                found,
            } => {
                write!(
                    f,
                    "payload size mismatch for tag {tag}: registered {expected} bytes, got {found}"
                )
            }
            Self::InvalidParent { parent } => write!(f, "parent {parent} is not a live node"),
            Self::RootOccupied { root } => {
                write!(f, "store already has root {root}; supply a parent")
            }
        }
    }
}

impl Error for ArenaError {}

/// Errors that can occur while writing or reading a store snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    /// An I/O error occurred during read or write.
    Io(std::io::Error),
    /// The stream does not start with the expected `b"STRD"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the stream.
        found: u8,
    },
    /// The declared capacity exceeds what the destination store may hold.
    CapacityMismatch {
        /// Capacity declared by the snapshot.
        declared: usize,
        /// The destination's `max_capacity`.
        limit: usize,
    },
    /// The snapshot fields are inconsistent with each other.
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"STRD\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported snapshot version {found}")
            }
            Self::CapacityMismatch { declared, limit } => {
                write!(
                    f,
                    "snapshot capacity {declared} bytes exceeds store limit {limit} bytes"
                )
            }
            Self::Malformed { detail } => write!(f, "malformed snapshot: {detail}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
