//! Error types for the deferred runtime

use crate::runtime::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for deferred
///
/// Handler and executor faults never escape a promise boundary: they are
/// converted into rejections with [`Error::into_reason`]. The only place an
/// `Error` reaches the caller directly is a programming error such as building
/// an [`Outcome`](crate::Outcome) from an unknown status tag.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// A value raised by user code (a handler or an executor)
    #[error("Uncaught {0}")]
    Thrown(Value),

    /// Runtime error - TypeError, InvalidArgument, etc.
    #[error("{kind}: {message}")]
    RuntimeError { kind: ErrorKind, message: String },

    /// Internal error
    #[error("InternalError: {0}")]
    InternalError(String),

    /// Value could not be rendered as JSON
    #[error("SerializationError: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

/// Runtime error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum ErrorKind {
    /// TypeError - wrong type for operation
    TypeError,
    /// RangeError - value out of range
    RangeError,
    /// InvalidArgument - a recognised argument was expected
    InvalidArgument,
    /// Generic Error - user-raised errors without a more specific kind
    GenericError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::TypeError => write!(f, "TypeError"),
            ErrorKind::RangeError => write!(f, "RangeError"),
            ErrorKind::InvalidArgument => write!(f, "InvalidArgumentError"),
            ErrorKind::GenericError => write!(f, "Error"),
        }
    }
}

impl Error {
    /// Raise an arbitrary value, the way `throw value` would
    pub fn thrown(value: impl Into<Value>) -> Self {
        Error::Thrown(value.into())
    }

    /// Create a TypeError
    pub fn type_error(message: impl Into<String>) -> Self {
        Error::RuntimeError {
            kind: ErrorKind::TypeError,
            message: message.into(),
        }
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::RuntimeError {
            kind: ErrorKind::InvalidArgument,
            message: message.into(),
        }
    }

    /// Create the error returned for an unrecognised outcome status tag
    pub fn invalid_outcome_status(status: &str) -> Self {
        Self::invalid_argument(messages::invalid_outcome_status(status))
    }

    /// The runtime error kind, if this is a runtime error
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::RuntimeError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Convert the error into the reason carried by a rejected promise.
    ///
    /// A thrown value is carried as-is; every other error is carried as
    /// [`Value::Error`] holding its message.
    pub fn into_reason(self) -> Value {
        match self {
            Error::Thrown(value) => value,
            other => Value::Error(other.to_string()),
        }
    }
}

/// Result type alias for deferred
pub type Result<T> = std::result::Result<T, Error>;

/// Standardized error message templates
pub mod messages {
    pub const INVALID_OUTCOME_STATUS: &str = "Invalid promise outcome status";

    /// Format an "Invalid promise outcome status 'X'" message
    pub fn invalid_outcome_status(status: &str) -> String {
        format!("{} '{}'", INVALID_OUTCOME_STATUS, status)
    }
}
