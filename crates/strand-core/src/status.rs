//! The [`Status`] result of executing a node.

use std::fmt;

/// Outcome of one node execution.
///
/// `Running` signals multi-frame continuation. The state needed to resume
/// lives in the node's payload, never in a suspended call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The node finished its work this frame.
    Success,
    /// The node could not do its work this frame.
    Failure,
    /// The node has started but not finished its work.
    Running,
}

impl Status {
    /// Whether this is [`Status::Success`].
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    /// Whether this is [`Status::Failure`].
    pub fn is_failure(self) -> bool {
        self == Status::Failure
    }

    /// Whether this is [`Status::Running`].
    pub fn is_running(self) -> bool {
        self == Status::Running
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Running => write!(f, "running"),
        }
    }
}
