//! Promise runtime
//!
//! This module provides the promise state machine, the values it carries,
//! and the handler type used by chaining.

mod handler;
mod promise;
mod stats;
mod value;

pub use handler::Handler;
pub use promise::{Deferred, PromiseState, PromiseWithResolvers, Resolver};
pub use stats::{reset_stats, stats, PromiseStats};
pub use value::{NativeFn, Value};
