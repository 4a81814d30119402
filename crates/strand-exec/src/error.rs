//! Error types for registry construction, scheduling and frame execution.

use std::error::Error;
use std::fmt;

use strand_arena::ArenaError;
use strand_core::{NodeId, TypeTag};

/// Errors detected while building a [`TaskRegistry`](crate::TaskRegistry).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// Two declarations use the same tag.
    DuplicateTag {
        /// The tag declared twice.
        tag: TypeTag,
        /// Name of the first declaration.
        first: &'static str,
        /// Name of the second declaration.
        second: &'static str,
    },
    /// A user declaration uses a tag reserved for built-in control flow.
    ReservedTag {
        /// The offending tag.
        tag: TypeTag,
        /// Name of the declaration.
        name: &'static str,
    },
    /// The declared alignment is larger than the arena record stride.
    UnsupportedAlignment {
        /// The offending tag.
        tag: TypeTag,
        /// Declared alignment in bytes.
        alignment: usize,
    },
    /// A dependency field does not fit a `NodeId` inside one element.
    FieldOutOfBounds {
        /// The offending tag.
        tag: TypeTag,
        /// Byte offset of the field.
        offset: u32,
        /// Element size of the type.
        element_size: usize,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateTag { tag, first, second } => {
                write!(f, "tag {tag} declared by both '{first}' and '{second}'")
            }
            Self::ReservedTag { tag, name } => {
                write!(f, "'{name}' uses tag {tag}, reserved for built-in control flow")
            }
            Self::UnsupportedAlignment { tag, alignment } => {
                write!(f, "tag {tag}: alignment {alignment} exceeds the 4-byte record stride")
            }
            Self::FieldOutOfBounds {
                tag,
                offset,
                element_size,
            } => {
                write!(
                    f,
                    "tag {tag}: dependency field at offset {offset} does not fit \
                     in a {element_size}-byte element"
                )
            }
        }
    }
}

impl Error for RegistryError {}

/// Errors from dependency ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleError {
    /// The children of `parent` have a dependency cycle.
    ///
    /// Dependency groups must be acyclic; this is a construction bug in
    /// the caller and the frame cannot run.
    Cycle {
        /// The sortable node whose children form the cycle.
        parent: NodeId,
        /// Children left with unresolved dependencies.
        remaining: usize,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cycle { parent, remaining } => {
                write!(
                    f,
                    "dependency cycle among children of {parent} ({remaining} unresolved)"
                )
            }
        }
    }
}

impl Error for ScheduleError {}

/// Errors returned by [`Runtime`](crate::Runtime) operations.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameError {
    /// The store could not be created or grown.
    Arena(ArenaError),
    /// A dependency group could not be ordered.
    Schedule(ScheduleError),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arena(e) => write!(f, "arena: {e}"),
            Self::Schedule(e) => write!(f, "schedule: {e}"),
        }
    }
}

impl Error for FrameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Arena(e) => Some(e),
            Self::Schedule(e) => Some(e),
        }
    }
}

impl From<ArenaError> for FrameError {
    fn from(e: ArenaError) -> Self {
        Self::Arena(e)
    }
}

impl From<ScheduleError> for FrameError {
    fn from(e: ScheduleError) -> Self {
        Self::Schedule(e)
    }
}
