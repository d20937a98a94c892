use std::{any::Any, result};

use mailbox::{AnyBoxedError, AnyError};
use thiserror::Error;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot find mailbox {0}")]
    MailboxNotFoundError(String),
    #[error("cannot select mailbox {0}: mailbox has the \\Noselect attribute")]
    MailboxNotSelectableError(String),
    #[error("cannot execute {0}: no mailbox selected")]
    NoMailboxSelectedError(&'static str),
    #[error("cannot parse search expression {1}: unknown criterion {0}")]
    ParseSearchCriterionError(String, String),
    #[error("cannot parse search expression {0}: missing criterion argument")]
    ParseSearchArgumentError(String),
    #[error("cannot parse message appended to {0}")]
    ParseMessageError(String),
    #[error("cannot execute {0}: simulated server failure")]
    SimulatedError(String),
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
