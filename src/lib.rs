//! Deferred: synchronous promises for single-threaded Rust
//!
//! A [`Deferred`] is a promise that never touches an event loop, a timer, or
//! another thread. Its executor runs inside the constructor, and every
//! `then` / `catch` / `finally` subscriber runs inside the `resolve` or
//! `reject` call that settles it. The `all`, `allSettled` and `race`
//! combinators are built on the same primitives through
//! [`PromiseCollection`].
//!
//! # Quick Start
//!
//! ```
//! use deferred::{Deferred, Handler, Value};
//!
//! let pending = Deferred::with_resolvers();
//! let shouted = pending.promise.then(
//!     Handler::unary(|v| Ok(Value::from(format!("{}!", v)))),
//!     Handler::Absent,
//! );
//! assert!(!shouted.is_settled());
//!
//! pending.resolve.settle("hello");
//! assert_eq!(shouted.value(), Some(Value::from("hello!")));
//! ```
//!
//! # Module Overview
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`runtime`] | [`Deferred`], [`Handler`], [`Value`], per-thread [`PromiseStats`] |
//! | [`collections`] | [`CallbackFanout`], [`PromiseCollection`] |
//! | [`outcome`] | [`Outcome`], [`OutcomeKind`] |
//! | [`error`](Error) | [`Error`], [`ErrorKind`], [`Result`] |
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (promise creation and settlement at
//! `trace`, fault conversion at `debug`). Install any subscriber to see them.

pub mod collections;
pub mod outcome;
pub mod prelude;
pub mod runtime;

mod error;

pub use collections::{CallbackFanout, PromiseCollection};
pub use error::{messages, Error, ErrorKind, Result};
pub use outcome::{Outcome, OutcomeKind};
pub use runtime::{
    reset_stats, stats, Deferred, Handler, NativeFn, PromiseState, PromiseStats,
    PromiseWithResolvers, Resolver, Value,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
