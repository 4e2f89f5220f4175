//! Integration tests for then / catch / finally chains

mod common;
use common::{init_tracing, InspectableCallback};
use deferred::{Deferred, Handler, PromiseState, Value};
use pretty_assertions::assert_eq;

fn suffix(tail: &'static str) -> Handler {
    Handler::unary(move |v| Ok(Value::from(format!("{}{}", v, tail))))
}

mod return_values {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_return_value_flows_through_chain() {
        init_tracing();
        let then_cb = InspectableCallback::returning(suffix("t"));
        let catch_cb = InspectableCallback::returning(suffix("c"));
        let finally_cb = InspectableCallback::returning(Handler::constant("f"));

        let last = Deferred::resolve("a")
            .then(&then_cb, Handler::Absent)
            .catch(&catch_cb)
            .finally(&finally_cb);

        assert_eq!(then_cb.total_calls(), 1);
        assert_eq!(catch_cb.total_calls(), 0);
        assert_eq!(finally_cb.total_calls(), 1);

        assert_eq!(then_cb.last_args(), vec![Value::from("a")]);
        assert_eq!(then_cb.last_return(), Value::from("at"));
        assert!(finally_cb.last_args().is_empty());
        assert_eq!(finally_cb.last_return(), Value::from("f"));
        assert!(finally_cb.last_call() > then_cb.last_call());

        assert_eq!(last.value(), Some(Value::from("f")));
    }

    #[test]
    fn test_undefined_return_on_settled_source_is_used_verbatim() {
        let replaced = Deferred::resolve("a").then(&InspectableCallback::no_return(), Handler::Absent);
        assert_eq!(replaced.value(), Some(Value::Undefined));

        let replaced_reason = Deferred::reject("r").catch(&InspectableCallback::no_return());
        assert_eq!(replaced_reason.state(), PromiseState::Rejected);
        assert_eq!(replaced_reason.reason(), Some(Value::Undefined));
    }

    #[test]
    fn test_undefined_return_on_pending_source_keeps_value() {
        let pending = Deferred::with_resolvers();
        let kept_later = pending.promise.then(&InspectableCallback::no_return(), Handler::Absent);
        pending.resolve.settle("b");
        assert_eq!(kept_later.value(), Some(Value::from("b")));

        let pending = Deferred::with_resolvers();
        let kept_reason = pending.promise.catch(&InspectableCallback::no_return());
        pending.reject.settle("r");
        assert_eq!(kept_reason.reason(), Some(Value::from("r")));
    }

    #[test]
    fn test_transformed_reason_reaches_catch() {
        let on_value = InspectableCallback::no_return();
        let caught = InspectableCallback::no_return();
        let transformed = Deferred::reject("x").then(Handler::Absent, suffix("!"));
        transformed.then(&on_value, Handler::Absent);
        transformed.catch(&caught);

        assert_eq!(caught.last_args(), vec![Value::from("x!")]);
        assert_eq!(caught.total_calls(), 1);
        assert_eq!(on_value.total_calls(), 0);
    }

    #[test]
    fn test_transformed_reason_reaches_catch_after_delay() {
        let pending = Deferred::with_resolvers();
        let on_value = InspectableCallback::no_return();
        let caught = InspectableCallback::no_return();
        let transformed = pending.promise.then(Handler::Absent, suffix("!"));
        transformed.then(&on_value, Handler::Absent);
        transformed.catch(&caught);
        assert_eq!(caught.total_calls(), 0);

        pending.reject.settle("x");
        assert_eq!(caught.last_args(), vec![Value::from("x!")]);
        assert_eq!(caught.total_calls(), 1);
        assert_eq!(on_value.total_calls(), 0);
    }

    #[test]
    fn test_rejection_is_never_recovered() {
        let recovered = Deferred::reject("r")
            .catch(Handler::constant("recovered"))
            .then(suffix("!"), Handler::Absent);

        assert_eq!(recovered.state(), PromiseState::Rejected);
        assert_eq!(recovered.reason(), Some(Value::from("recovered")));
    }

    #[test]
    fn test_long_chain_on_pending_source() {
        let pending = Deferred::with_resolvers();
        let end = pending
            .promise
            .then(suffix("1"), Handler::Absent)
            .then(suffix("2"), Handler::Absent)
            .then(suffix("3"), Handler::Absent);
        assert_eq!(end.state(), PromiseState::Pending);

        pending.resolve.settle("x");
        assert_eq!(end.value(), Some(Value::from("x123")));
    }
}

mod depth {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deep_pending_chain_settles_inside_one_call() {
        let pending = Deferred::with_resolvers();
        let mut tail = pending.promise.clone();
        for _ in 0..200 {
            tail = tail.then(
                Handler::unary(|v| Ok(Value::from(v.as_number().unwrap_or(0.0) + 1.0))),
                Handler::Absent,
            );
        }
        assert_eq!(tail.state(), PromiseState::Pending);

        pending.resolve.settle(0);
        assert_eq!(tail.value(), Some(Value::from(200)));
    }
}

mod finally {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finally_keeps_settle_kind() {
        let fulfilled = Deferred::resolve(1).finally(Handler::constant(2));
        assert_eq!(fulfilled.value(), Some(Value::from(2)));

        let rejected = Deferred::reject(1).finally(Handler::constant(2));
        assert_eq!(rejected.reason(), Some(Value::from(2)));
    }

    #[test]
    fn test_finally_substitutes_undefined_verbatim() {
        let pending = Deferred::with_resolvers();
        let after = pending.promise.finally(&InspectableCallback::no_return());
        pending.reject.settle("reason");

        assert_eq!(after.state(), PromiseState::Rejected);
        assert_eq!(after.reason(), Some(Value::Undefined));
    }

    #[test]
    fn test_absent_finally_settles_with_undefined() {
        let after = Deferred::resolve("v").finally(Handler::Absent);
        assert_eq!(after.value(), Some(Value::Undefined));
    }
}
