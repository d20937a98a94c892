//! Module dedicated to the retrieval strategy.
//!
//! The strategy decides which command retrieves the ordered message
//! identifiers, and whether the ordering has to be reproduced on the
//! client side.

use std::fmt;

use super::DisplayMode;
use crate::transport::{ServerCapabilities, ThreadAlgorithm};

/// The retrieval strategy.
///
/// | Display  | THREAD | SORT | Strategy                     |
/// |----------|--------|------|------------------------------|
/// | threaded | yes    | any  | [`ServerThread`]             |
/// | threaded | no     | any  | [`ClientThread`] (SEARCH)    |
/// | sorted   | any    | yes  | [`ServerSort`]               |
/// | sorted   | any    | no   | [`ClientSort`] (SEARCH)      |
/// | unsorted | any    | any  | [`Search`]                   |
///
/// [`ServerThread`]: RetrievalStrategy::ServerThread
/// [`ClientThread`]: RetrievalStrategy::ClientThread
/// [`ServerSort`]: RetrievalStrategy::ServerSort
/// [`ClientSort`]: RetrievalStrategy::ClientSort
/// [`Search`]: RetrievalStrategy::Search
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetrievalStrategy {
    /// Issue THREAD with the given algorithm.
    ServerThread(ThreadAlgorithm),

    /// Issue SEARCH, fetch the whole result set then thread it.
    ClientThread,

    /// Issue SORT.
    ServerSort,

    /// Issue SEARCH, fetch the whole result set then sort it.
    ClientSort,

    /// Issue SEARCH and keep the mailbox order.
    Search,
}

impl RetrievalStrategy {
    pub fn select(display: DisplayMode, caps: &ServerCapabilities) -> Self {
        match display {
            DisplayMode::Threaded => match caps.thread {
                Some(algorithm) => Self::ServerThread(algorithm),
                None => Self::ClientThread,
            },
            DisplayMode::Sorted if caps.sort => Self::ServerSort,
            DisplayMode::Sorted => Self::ClientSort,
            DisplayMode::Unsorted => Self::Search,
        }
    }

    /// Return `true` if the ordering needs the metadata of the whole
    /// result set. Otherwise the server returns the identifiers
    /// already ordered, and only the current page needs metadata.
    pub fn is_client_ordered(&self) -> bool {
        matches!(self, Self::ClientThread | Self::ClientSort)
    }
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServerThread(algorithm) => write!(f, "THREAD {algorithm}"),
            Self::ClientThread => write!(f, "SEARCH then client thread"),
            Self::ServerSort => write!(f, "SORT"),
            Self::ClientSort => write!(f, "SEARCH then client sort"),
            Self::Search => write!(f, "SEARCH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::transport::{ServerCapabilities, ThreadAlgorithm};

    use super::{DisplayMode, RetrievalStrategy};

    #[test]
    fn dispatch_table() {
        let none = ServerCapabilities::default();
        let sort = ServerCapabilities {
            sort: true,
            thread: None,
        };
        let thread = ServerCapabilities {
            sort: false,
            thread: Some(ThreadAlgorithm::OrderedSubject),
        };
        let all = ServerCapabilities {
            sort: true,
            thread: Some(ThreadAlgorithm::References),
        };

        let cases = [
            (
                DisplayMode::Threaded,
                &thread,
                RetrievalStrategy::ServerThread(ThreadAlgorithm::OrderedSubject),
            ),
            (
                DisplayMode::Threaded,
                &all,
                RetrievalStrategy::ServerThread(ThreadAlgorithm::References),
            ),
            (DisplayMode::Threaded, &sort, RetrievalStrategy::ClientThread),
            (DisplayMode::Threaded, &none, RetrievalStrategy::ClientThread),
            (DisplayMode::Sorted, &sort, RetrievalStrategy::ServerSort),
            (DisplayMode::Sorted, &all, RetrievalStrategy::ServerSort),
            (DisplayMode::Sorted, &thread, RetrievalStrategy::ClientSort),
            (DisplayMode::Sorted, &none, RetrievalStrategy::ClientSort),
            (DisplayMode::Unsorted, &all, RetrievalStrategy::Search),
            (DisplayMode::Unsorted, &none, RetrievalStrategy::Search),
        ];

        for (display, caps, expected) in cases {
            let strategy = RetrievalStrategy::select(display, caps);
            assert_eq!(expected, strategy, "{display:?} {caps:?}");
        }
    }

    #[test]
    fn ordering_side() {
        assert!(RetrievalStrategy::ClientSort.is_client_ordered());
        assert!(RetrievalStrategy::ClientThread.is_client_ordered());
        assert!(!RetrievalStrategy::ServerSort.is_client_ordered());
        assert!(!RetrievalStrategy::Search.is_client_ordered());
        assert!(!RetrievalStrategy::ServerThread(ThreadAlgorithm::References).is_client_ordered());
    }
}
