use std::result;

use thiserror::Error;

/// The global `Result` alias of the module.
pub type Result<T> = result::Result<T, Error>;

/// The global `Error` enum of the module.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot parse sort program: unknown sort key {0}")]
    SortProgError(String),
    #[error("cannot parse sort program: program is empty")]
    EmptySortProgError,
}
