use std::{any::Any, result};

use thiserror::Error;

use crate::{message_list, AnyBoxedError, AnyError};

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build folder tree: mailbox listing is empty")]
    NoFolderListError,
    #[error("cannot find folder {0}")]
    NoSuchFolderError(String),
    #[error("cannot select folder {0}: folder is not selectable")]
    FolderNotSelectableError(String),
    #[error("cannot match folders: invalid pattern {1}")]
    InvalidPatternError(#[source] regex::Error, String),

    #[error(transparent)]
    MessageListError(#[from] message_list::Error),
    #[error(transparent)]
    TransportError(#[from] AnyBoxedError),
}

impl AnyError for Error {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<Error> for AnyBoxedError {
    fn from(err: Error) -> Self {
        Box::new(err)
    }
}
