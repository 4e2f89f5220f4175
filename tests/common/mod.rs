//! Shared test helpers for integration tests

#![allow(dead_code)]

use deferred::{Error, Handler, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

thread_local! {
    static CALL_SEQUENCE: Cell<u64> = const { Cell::new(0) };
}

fn next_sequence() -> u64 {
    CALL_SEQUENCE.with(|seq| {
        let next = seq.get() + 1;
        seq.set(next);
        next
    })
}

/// Install a tracing subscriber honouring RUST_LOG. Safe to call from every
/// test; only the first call per process takes effect.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct Record {
    last_args: Vec<Value>,
    last_return: Value,
    total_calls: usize,
    last_call: u64,
    throw: Option<Value>,
    /// `None` returns undefined, `Some(handler)` delegates to the handler
    returns: Option<Handler>,
}

/// A callback that remembers how it was called
///
/// Cloning shares the record, so a clone can be handed to a promise while
/// the original is inspected.
#[derive(Clone)]
pub struct InspectableCallback {
    record: Rc<RefCell<Record>>,
}

impl InspectableCallback {
    /// Returns whatever `returns` produces for the call arguments
    pub fn returning(returns: impl Into<Handler>) -> Self {
        let callback = Self {
            record: Rc::new(RefCell::new(Record::default())),
        };
        callback.record.borrow_mut().returns = Some(returns.into());
        callback
    }

    /// Returns its first argument
    pub fn identity() -> Self {
        Self::returning(Handler::Absent)
    }

    /// Returns undefined
    pub fn no_return() -> Self {
        Self {
            record: Rc::new(RefCell::new(Record::default())),
        }
    }

    /// Raise `value` on every subsequent call
    pub fn set_throw(&self, value: impl Into<Value>) {
        self.record.borrow_mut().throw = Some(value.into());
    }

    /// Forget all calls and stop raising. The return mode is kept.
    pub fn reset(&self) {
        let mut record = self.record.borrow_mut();
        record.last_args.clear();
        record.last_return = Value::Undefined;
        record.total_calls = 0;
        record.last_call = 0;
        record.throw = None;
    }

    pub fn total_calls(&self) -> usize {
        self.record.borrow().total_calls
    }

    pub fn last_args(&self) -> Vec<Value> {
        self.record.borrow().last_args.clone()
    }

    pub fn last_return(&self) -> Value {
        self.record.borrow().last_return.clone()
    }

    /// Sequence number of the last call; later calls get larger numbers
    pub fn last_call(&self) -> u64 {
        self.record.borrow().last_call
    }

    /// The callback as a promise handler
    pub fn handler(&self) -> Handler {
        let record = self.record.clone();
        Handler::callback(move |args| {
            let (throw, returns) = {
                let mut record = record.borrow_mut();
                record.last_args = args.to_vec();
                record.total_calls += 1;
                record.last_call = next_sequence();
                record.last_return = Value::Undefined;
                (record.throw.clone(), record.returns.clone())
            };

            if let Some(value) = throw {
                return Err(Error::Thrown(value));
            }

            let returned = match returns {
                Some(handler) => handler.call(args)?,
                None => Value::Undefined,
            };
            record.borrow_mut().last_return = returned.clone();
            Ok(returned)
        })
    }
}

impl From<&InspectableCallback> for Handler {
    fn from(callback: &InspectableCallback) -> Self {
        callback.handler()
    }
}
