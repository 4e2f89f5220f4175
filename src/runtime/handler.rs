//! Handler normalization
//!
//! Promise methods accept "a callback, nothing, or a constant" uniformly.
//! [`Handler`] closes over those three cases so chaining code never has to
//! inspect what it was given.

use super::value::{NativeFn, Value};
use crate::error::Result;
use std::fmt;
use std::rc::Rc;

/// A possibly-absent promise handler
#[derive(Clone, Default)]
pub enum Handler {
    /// No handler: arguments pass through unchanged
    #[default]
    Absent,
    /// A native callback
    Callback(NativeFn),
    /// A constant returned regardless of the arguments
    Constant(Value),
}

impl Handler {
    /// Wrap a callback receiving positional arguments
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Handler::Callback(Rc::new(f))
    }

    /// Wrap a one-argument callback; a missing argument is passed as undefined
    pub fn unary<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + 'static,
    {
        Handler::Callback(Rc::new(move |args: &[Value]| {
            f(args.first().cloned().unwrap_or_default())
        }))
    }

    pub fn constant(value: impl Into<Value>) -> Self {
        Handler::Constant(value.into())
    }

    /// Whether a `then` registration should subscribe for this handler
    pub fn is_present(&self) -> bool {
        !matches!(self, Handler::Absent)
    }

    /// Invoke the handler with positional arguments.
    ///
    /// An absent handler is the identity: no arguments yield undefined, one
    /// argument is returned as-is, several come back as an array.
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        match self {
            Handler::Absent => Ok(match args {
                [] => Value::Undefined,
                [single] => single.clone(),
                many => Value::Array(many.to_vec()),
            }),
            Handler::Callback(f) => f(args),
            Handler::Constant(value) => Ok(value.clone()),
        }
    }

    /// Call-or-identity with a single argument
    pub fn apply(&self, arg: Value) -> Result<Value> {
        match self {
            Handler::Absent => Ok(arg),
            _ => self.call(std::slice::from_ref(&arg)),
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Absent => write!(f, "Handler::Absent"),
            Handler::Callback(_) => write!(f, "Handler::Callback(..)"),
            Handler::Constant(value) => write!(f, "Handler::Constant({:?})", value),
        }
    }
}

impl From<NativeFn> for Handler {
    fn from(f: NativeFn) -> Self {
        Handler::Callback(f)
    }
}

impl From<Option<NativeFn>> for Handler {
    fn from(f: Option<NativeFn>) -> Self {
        f.map(Handler::Callback).unwrap_or_default()
    }
}
