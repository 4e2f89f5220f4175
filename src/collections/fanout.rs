//! Callback fan-out
//!
//! An ordered, append-only set of subscribers invoked together on one event.

use crate::error::Result;
use crate::runtime::{NativeFn, Value};
use std::fmt;
use std::rc::Rc;

/// Ordered subscribers for a single event
#[derive(Clone, Default)]
pub struct CallbackFanout {
    callables: Vec<NativeFn>,
}

impl CallbackFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a subscriber. Subscribers are never removed or reordered.
    pub fn add(&mut self, callable: NativeFn) {
        self.callables.push(callable);
    }

    /// Append a closure as a subscriber
    pub fn add_fn<F>(&mut self, f: F)
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        self.add(Rc::new(f));
    }

    /// Call every subscriber, in subscription order, with the same arguments.
    ///
    /// The result of each call is returned at its subscription position.
    pub fn call(&self, args: &[Value]) -> Vec<Result<Value>> {
        self.callables.iter().map(|f| f(args)).collect()
    }

    /// Alias of [`call`](Self::call)
    pub fn call_all(&self, args: &[Value]) -> Vec<Result<Value>> {
        self.call(args)
    }

    pub fn callables(&self) -> &[NativeFn] {
        &self.callables
    }

    pub fn len(&self) -> usize {
        self.callables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callables.is_empty()
    }
}

impl fmt::Debug for CallbackFanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackFanout")
            .field("len", &self.callables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;

    #[test]
    fn test_empty_fanout() {
        let fanout = CallbackFanout::new();
        assert!(fanout.is_empty());
        assert!(fanout.call(&[Value::from(1)]).is_empty());
    }

    #[test]
    fn test_calls_in_subscription_order_with_same_args() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut fanout = CallbackFanout::new();
        for slot in 0..3 {
            let seen = seen.clone();
            fanout.add_fn(move |args| {
                seen.borrow_mut().push((slot, args.to_vec()));
                Ok(Value::from(slot as i32 * 10))
            });
        }

        let results = fanout.call(&[Value::from("a"), Value::from("b")]);
        let results: Vec<Value> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(results, vec![Value::from(0), Value::from(10), Value::from(20)]);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        for (position, (slot, args)) in seen.iter().enumerate() {
            assert_eq!(*slot, position);
            assert_eq!(args, &vec![Value::from("a"), Value::from("b")]);
        }
    }

    #[test]
    fn test_faulting_slot_does_not_stop_others() {
        let mut fanout = CallbackFanout::new();
        fanout.add_fn(|_| Err(Error::thrown("first")));
        fanout.add_fn(|_| Ok(Value::from(2)));

        let results = fanout.call_all(&[]);
        assert!(results[0].is_err());
        assert_eq!(results[1].as_ref().unwrap(), &Value::from(2));
    }

    #[test]
    fn test_repeated_invocation_keeps_order() {
        let count = Rc::new(RefCell::new(0));
        let mut fanout = CallbackFanout::new();
        let counter = count.clone();
        fanout.add_fn(move |_| {
            *counter.borrow_mut() += 1;
            Ok(Value::Undefined)
        });

        fanout.call(&[]);
        fanout.call(&[]);
        assert_eq!(*count.borrow(), 2);
        assert_eq!(fanout.len(), 1);
    }
}
