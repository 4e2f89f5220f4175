//! Promise Implementation
//!
//! [`Deferred`] is a settle-once cell with three subscriber fan-outs
//! (fulfilled, rejected, finally). Everything runs synchronously: the executor
//! runs inside the constructor, and subscribers run inside the `resolve` or
//! `reject` call that settles the promise. Nothing is ever queued for later.

use super::handler::Handler;
use super::stats;
use super::value::{NativeFn, Value};
use crate::collections::{CallbackFanout, PromiseCollection};
use crate::error::{Error, Result};
use crate::outcome::OutcomeKind;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// ID counter for Promise tracking
static PROMISE_ID: AtomicU64 = AtomicU64::new(1);

/// Promise state enum
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PromiseState {
    /// Promise is pending - not yet settled
    Pending,
    /// Promise is fulfilled with a value
    Fulfilled,
    /// Promise is rejected with a reason
    Rejected,
}

struct PromiseInner {
    id: u64,
    state: PromiseState,
    value: Option<Value>,
    reason: Option<Value>,
    on_fulfilled: CallbackFanout,
    on_rejected: CallbackFanout,
    on_finally: CallbackFanout,
}

impl PromiseInner {
    fn is_settled(&self) -> bool {
        self.state != PromiseState::Pending
    }

    /// Current state with the carried value or reason
    fn snapshot(&self) -> (u64, PromiseState, Value) {
        let payload = match self.state {
            PromiseState::Pending => Value::Undefined,
            PromiseState::Fulfilled => self.value.clone().unwrap_or_default(),
            PromiseState::Rejected => self.reason.clone().unwrap_or_default(),
        };
        (self.id, self.state, payload)
    }
}

/// Settle a promise, then run its subscribers.
///
/// The borrow is released before any subscriber runs, so subscribers may
/// re-enter the promise.
fn settle(promise: &Rc<RefCell<PromiseInner>>, kind: OutcomeKind, payload: Value) {
    let (id, subscribers, finally, _discarded) = {
        let mut inner = promise.borrow_mut();
        if inner.is_settled() {
            trace!(promise = inner.id, state = ?inner.state, "settle ignored, promise already settled");
            stats::record(|s| s.total_ignored_settles += 1);
            return;
        }

        let on_fulfilled = std::mem::take(&mut inner.on_fulfilled);
        let on_rejected = std::mem::take(&mut inner.on_rejected);
        let (subscribers, discarded) = match kind {
            OutcomeKind::Fulfilled => {
                inner.state = PromiseState::Fulfilled;
                inner.value = Some(payload.clone());
                (on_fulfilled, on_rejected)
            }
            OutcomeKind::Rejected => {
                inner.state = PromiseState::Rejected;
                inner.reason = Some(payload.clone());
                (on_rejected, on_fulfilled)
            }
        };
        let finally = std::mem::take(&mut inner.on_finally);
        (inner.id, subscribers, finally, discarded)
    };

    stats::record(|s| match kind {
        OutcomeKind::Fulfilled => s.total_fulfilled += 1,
        OutcomeKind::Rejected => s.total_rejected += 1,
    });
    trace!(
        promise = id,
        state = %kind,
        subscribers = subscribers.len(),
        finally = finally.len(),
        "promise settled"
    );

    report_faults(id, subscribers.call(std::slice::from_ref(&payload)));
    report_faults(id, finally.call(&[]));
}

fn report_faults(id: u64, results: Vec<Result<Value>>) {
    for err in results.into_iter().filter_map(|r| r.err()) {
        debug!(promise = id, error = %err, "subscriber raised during settlement");
    }
}

/// Convert a handler fault into the reason of the downstream promise
fn fault_to_reason(id: u64, err: Error) -> Value {
    debug!(promise = id, error = %err, "handler raised, rejecting downstream promise");
    stats::record(|s| s.total_handler_faults += 1);
    err.into_reason()
}

fn first_arg(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or_default()
}

/// One of the two settle invocables handed to an executor
#[derive(Clone)]
pub struct Resolver {
    promise: Rc<RefCell<PromiseInner>>,
    kind: OutcomeKind,
}

impl Resolver {
    /// Resolve or reject the promise, depending on [`kind`](Self::kind).
    /// Only the first settle call on a promise has any effect.
    pub fn settle(&self, value: impl Into<Value>) {
        settle(&self.promise, self.kind, value.into());
    }

    pub fn kind(&self) -> OutcomeKind {
        self.kind
    }

    /// Whether the promise this resolver settles has already settled
    pub fn is_settled(&self) -> bool {
        self.promise.borrow().is_settled()
    }

    /// Expose the resolver as a plain invocable taking the value as its first
    /// argument
    pub fn to_native_fn(&self) -> NativeFn {
        let resolver = self.clone();
        Rc::new(move |args: &[Value]| {
            resolver.settle(first_arg(args));
            Ok(Value::Undefined)
        })
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("promise", &self.promise.borrow().id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A pending promise together with its resolve and reject invocables
#[derive(Debug, Clone)]
pub struct PromiseWithResolvers {
    pub promise: Deferred,
    pub resolve: Resolver,
    pub reject: Resolver,
}

/// A synchronous promise
///
/// Cloning a `Deferred` yields another handle to the same promise.
///
/// Settling the head of a pending chain settles every link inside the same
/// call, so a very deep chain of pending promises uses stack proportional
/// to its depth.
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<RefCell<PromiseInner>>,
}

impl Deferred {
    /// Create a promise and run `executor` immediately.
    ///
    /// If the executor returns an error, the promise is rejected with
    /// [`Error::into_reason`] of that error instead of the error propagating.
    pub fn new<F>(executor: F) -> Self
    where
        F: FnOnce(Resolver, Resolver) -> Result<()>,
    {
        let promise = Self::pending();
        let resolve = promise.resolver(OutcomeKind::Fulfilled);
        let reject = promise.resolver(OutcomeKind::Rejected);

        if let Err(err) = executor(resolve, reject) {
            let id = promise.id();
            debug!(promise = id, error = %err, "executor raised, rejecting promise");
            stats::record(|s| s.total_handler_faults += 1);
            settle(&promise.inner, OutcomeKind::Rejected, err.into_reason());
        }

        promise
    }

    fn pending() -> Self {
        let id = PROMISE_ID.fetch_add(1, Ordering::SeqCst);
        stats::record(|s| s.total_created += 1);
        trace!(promise = id, "promise created");

        Self {
            inner: Rc::new(RefCell::new(PromiseInner {
                id,
                state: PromiseState::Pending,
                value: None,
                reason: None,
                on_fulfilled: CallbackFanout::new(),
                on_rejected: CallbackFanout::new(),
                on_finally: CallbackFanout::new(),
            })),
        }
    }

    fn resolver(&self, kind: OutcomeKind) -> Resolver {
        Resolver {
            promise: self.inner.clone(),
            kind,
        }
    }

    /// Create a promise that is already fulfilled with `value`
    pub fn resolve(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self::new(move |resolve, _| {
            resolve.settle(value);
            Ok(())
        })
    }

    /// Create a promise that is already rejected with `reason`
    pub fn reject(reason: impl Into<Value>) -> Self {
        let reason = reason.into();
        Self::new(move |_, reject| {
            reject.settle(reason);
            Ok(())
        })
    }

    /// Create a pending promise and hand back its settle invocables
    pub fn with_resolvers() -> PromiseWithResolvers {
        let promise = Self::pending();
        PromiseWithResolvers {
            resolve: promise.resolver(OutcomeKind::Fulfilled),
            reject: promise.resolver(OutcomeKind::Rejected),
            promise,
        }
    }

    /// Fulfill with every value in input order, or reject with the first
    /// rejection in settlement order
    pub fn all(promises: impl IntoIterator<Item = Deferred>) -> Self {
        PromiseCollection::new(promises).all()
    }

    /// Fulfill with every input's [`Outcome`](crate::Outcome) once all have
    /// settled. Never rejects.
    pub fn all_settled(promises: impl IntoIterator<Item = Deferred>) -> Self {
        PromiseCollection::new(promises).all_settled()
    }

    /// Settle like whichever input settles first. An empty input never
    /// settles.
    pub fn race(promises: impl IntoIterator<Item = Deferred>) -> Self {
        PromiseCollection::new(promises).race()
    }

    /// Attach fulfillment and rejection handlers.
    ///
    /// A rejected source always yields a rejected promise: `on_rejected`
    /// transforms the reason but never recovers from it. A handler fault
    /// rejects the returned promise with the raised value.
    ///
    /// On a settled source the handler's return value is used as-is. On a
    /// pending source, a handler returning undefined carries the original
    /// value or reason forward, and an absent handler registers nothing for
    /// its side, so the returned promise only ever settles through the other
    /// side.
    pub fn then(
        &self,
        on_fulfilled: impl Into<Handler>,
        on_rejected: impl Into<Handler>,
    ) -> Deferred {
        let on_fulfilled = on_fulfilled.into();
        let on_rejected = on_rejected.into();
        let (id, state, payload) = self.inner.borrow().snapshot();

        match state {
            PromiseState::Rejected => {
                let next = match on_rejected.apply(payload.clone()) {
                    Ok(returned) => returned,
                    Err(err) => fault_to_reason(id, err),
                };
                Deferred::reject(next)
            }
            PromiseState::Fulfilled => match on_fulfilled.apply(payload.clone()) {
                Ok(returned) => Deferred::resolve(returned),
                Err(err) => Deferred::reject(fault_to_reason(id, err)),
            },
            PromiseState::Pending => Deferred::new(|resolve, reject| {
                let mut inner = self.inner.borrow_mut();

                if on_fulfilled.is_present() {
                    let reject = reject.clone();
                    inner.on_fulfilled.add_fn(move |args| {
                        let value = first_arg(args);
                        match on_fulfilled.apply(value.clone()) {
                            Ok(returned) => resolve.settle(returned.or_original(value)),
                            Err(err) => reject.settle(fault_to_reason(id, err)),
                        }
                        Ok(Value::Undefined)
                    });
                }

                if on_rejected.is_present() {
                    inner.on_rejected.add_fn(move |args| {
                        let reason = first_arg(args);
                        let next = match on_rejected.apply(reason.clone()) {
                            Ok(returned) => returned.or_original(reason),
                            Err(err) => fault_to_reason(id, err),
                        };
                        reject.settle(next);
                        Ok(Value::Undefined)
                    });
                }

                Ok(())
            }),
        }
    }

    /// Shorthand for `then(Handler::Absent, on_rejected)`
    pub fn catch(&self, on_rejected: impl Into<Handler>) -> Deferred {
        self.then(Handler::Absent, on_rejected)
    }

    /// Run `callback` with no arguments once the promise settles, whatever
    /// the settle kind.
    ///
    /// The returned promise keeps the source's settle kind but carries the
    /// callback's return value. If the callback raises, it is rejected with
    /// the raised value instead.
    pub fn finally(&self, callback: impl Into<Handler>) -> Deferred {
        let callback = callback.into();
        let (id, state, _) = self.inner.borrow().snapshot();

        match state {
            PromiseState::Pending => {
                let source = Rc::downgrade(&self.inner);
                Deferred::new(move |resolve, reject| {
                    self.inner.borrow_mut().on_finally.add_fn(move |_| {
                        let rejected = match source.upgrade() {
                            Some(source) => {
                                let state = source.borrow().state;
                                state == PromiseState::Rejected
                            }
                            None => false,
                        };
                        match callback.call(&[]) {
                            Ok(returned) if rejected => reject.settle(returned),
                            Ok(returned) => resolve.settle(returned),
                            Err(err) => reject.settle(fault_to_reason(id, err)),
                        }
                        Ok(Value::Undefined)
                    });
                    Ok(())
                })
            }
            settled => match callback.call(&[]) {
                Ok(returned) if settled == PromiseState::Rejected => Deferred::reject(returned),
                Ok(returned) => Deferred::resolve(returned),
                Err(err) => Deferred::reject(fault_to_reason(id, err)),
            },
        }
    }

    pub fn is_settled(&self) -> bool {
        self.inner.borrow().is_settled()
    }

    pub fn is_rejected(&self) -> bool {
        self.inner.borrow().state == PromiseState::Rejected
    }

    pub fn state(&self) -> PromiseState {
        self.inner.borrow().state
    }

    /// The fulfilled value, once fulfilled
    pub fn value(&self) -> Option<Value> {
        self.inner.borrow().value.clone()
    }

    /// The rejection reason, once rejected
    pub fn reason(&self) -> Option<Value> {
        self.inner.borrow().reason.clone()
    }

    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Whether both handles refer to the same promise
    pub fn ptr_eq(&self, other: &Deferred) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Deferred")
            .field("id", &inner.id)
            .field("state", &inner.state)
            .field("value", &inner.value)
            .field("reason", &inner.reason)
            .finish()
    }
}
