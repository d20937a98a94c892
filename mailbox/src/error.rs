use std::{any::Any, error, result};

/// The global any `Result` alias of the library.
///
/// This is the result type returned by [`Transport`] operations. The
/// error is boxed because the concrete transport error is not known
/// at compilation time.
///
/// [`Transport`]: crate::transport::Transport
pub type AnyResult<T> = result::Result<T, AnyBoxedError>;

/// The global, downcastable any `Error` trait of the library.
///
/// Transport implementations make their own error type implement
/// this trait, so callers can downcast the error they receive back to
/// the concrete transport error.
pub trait AnyError: error::Error + Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// The global any boxed `Error` alias of the module.
pub type AnyBoxedError = Box<dyn AnyError + Send + 'static>;

impl error::Error for AnyBoxedError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.as_ref().source()
    }
}
