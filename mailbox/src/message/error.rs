use std::result;

use thiserror::Error;

use super::Id;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot build summary of message {0}: envelope is missing")]
    MissingEnvelopeError(Id),
    #[error("cannot build summary of message {0}: size is missing")]
    MissingSizeError(Id),
}
