//! Prelude module for convenient imports
//!
//! ```
//! use deferred::prelude::*;
//!
//! let doubled = Deferred::resolve(21).then(
//!     Handler::unary(|v| Ok(Value::from(v.as_number().unwrap_or(0.0) * 2.0))),
//!     Handler::Absent,
//! );
//! assert_eq!(doubled.value(), Some(Value::from(42)));
//! ```

// Promise types
pub use crate::runtime::{Deferred, Handler, NativeFn, PromiseState, PromiseWithResolvers, Resolver, Value};

// Combinators and outcomes
pub use crate::collections::{CallbackFanout, PromiseCollection};
pub use crate::outcome::{Outcome, OutcomeKind};

// Error handling
pub use crate::error::{Error, ErrorKind, Result};
