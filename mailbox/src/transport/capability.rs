//! Module dedicated to server capabilities.
//!
//! Capabilities are never errors: a missing capability only selects
//! an alternate code path.

use std::fmt;

use super::Transport;

pub const SORT: &str = "SORT";
pub const THREAD_REFERENCES: &str = "THREAD=REFERENCES";
pub const THREAD_ORDEREDSUBJECT: &str = "THREAD=ORDEREDSUBJECT";
pub const UNSELECT: &str = "UNSELECT";

/// The server-side threading algorithm.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ThreadAlgorithm {
    References,
    OrderedSubject,
}

impl ThreadAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::References => "REFERENCES",
            Self::OrderedSubject => "ORDEREDSUBJECT",
        }
    }
}

impl fmt::Display for ThreadAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The subset of server capabilities the message list cares about.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ServerCapabilities {
    /// The server supports the SORT command.
    pub sort: bool,

    /// The threading algorithm the server supports, if any.
    pub thread: Option<ThreadAlgorithm>,
}

impl ServerCapabilities {
    /// Detect capabilities from the given transport.
    ///
    /// `THREAD=REFERENCES` is preferred over `THREAD=ORDEREDSUBJECT`.
    pub fn detect(transport: &dyn Transport) -> Self {
        let thread = if transport.has_capability(THREAD_REFERENCES) {
            Some(ThreadAlgorithm::References)
        } else if transport.has_capability(THREAD_ORDEREDSUBJECT) {
            Some(ThreadAlgorithm::OrderedSubject)
        } else {
            None
        };

        Self {
            sort: transport.has_capability(SORT),
            thread,
        }
    }
}
