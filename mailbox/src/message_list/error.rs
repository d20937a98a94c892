use std::{any::Any, result};

use thiserror::Error;

use crate::{
    message::{self, Id},
    sort, AnyBoxedError, AnyError,
};

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find message {0}: message may have been expunged")]
    MessageNotFoundError(Id),

    #[error(transparent)]
    MessageError(#[from] message::Error),
    #[error(transparent)]
    SortError(#[from] sort::Error),
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
