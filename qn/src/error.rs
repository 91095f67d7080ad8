use std::fmt;

use crate::Kind;

/// Errors raised by the core.
///
/// Every one of them ends the session: once a context has failed, it
/// keeps returning the same error.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Argument list exhausted.
    NotEnoughArguments,

    /// Argument list ended in a non-pair, non-nil tail.
    DottedArguments,

    /// Accessor called on the wrong kind of object.
    TypeMismatch { expected: Kind, got: Kind },

    /// Root stack capacity exceeded.
    StackOverflow,

    /// Arena exhausted even after a collection.
    OutOfMemory,

    /// Raised by the host or evaluator with its own message.
    Message(String),

    /// Rejected context configuration.
    InvalidSettings(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotEnoughArguments => write!(f, "not enough arguments"),
            Error::DottedArguments => write!(f, "dotted pair in arguments"),
            Error::TypeMismatch { expected, got } => {
                write!(f, "expected {}, got {}", expected, got)
            }
            Error::StackOverflow => write!(f, "stack overflow"),
            Error::OutOfMemory => write!(f, "out of memory"),
            Error::Message(msg) => write!(f, "{}", msg),
            Error::InvalidSettings(msg) => write!(f, "invalid settings: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
