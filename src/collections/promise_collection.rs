//! Promise combinators
//!
//! A [`PromiseCollection`] subscribes once to every input promise and keeps
//! one shared set of books: the outcome of each input (in input order), the
//! order in which inputs settled, and which input settled first and which
//! rejected first. `all`, `allSettled` and `race` are all derived from those
//! books, so combinators requested on the same collection agree with each
//! other.

use super::fanout::CallbackFanout;
use crate::outcome::{Outcome, OutcomeKind};
use crate::runtime::{Deferred, Handler, Resolver, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

struct CollectionState {
    /// Outcome per input, pre-sized to the input count
    outcomes: Vec<Option<Outcome>>,
    collected: usize,
    settlement_order: Vec<usize>,
    first_settled: Option<usize>,
    first_rejected: Option<usize>,
    on_first_settled: CallbackFanout,
    on_first_rejected: CallbackFanout,
}

impl CollectionState {
    fn new(len: usize) -> Self {
        Self {
            outcomes: vec![None; len],
            collected: 0,
            settlement_order: Vec::with_capacity(len),
            first_settled: None,
            first_rejected: None,
            on_first_settled: CallbackFanout::new(),
            on_first_rejected: CallbackFanout::new(),
        }
    }

    fn all_collected(&self) -> bool {
        self.collected == self.outcomes.len()
    }

    fn record(&mut self, index: usize, outcome: Outcome) {
        let slot = &mut self.outcomes[index];
        if slot.is_none() {
            *slot = Some(outcome);
            self.collected += 1;
            self.settlement_order.push(index);
        }
    }

    fn outcome(&self, index: Option<usize>) -> Option<Outcome> {
        index.and_then(|i| self.outcomes.get(i).cloned().flatten())
    }

    fn ordered_outcomes(&self) -> Vec<Outcome> {
        self.outcomes.iter().flatten().cloned().collect()
    }

    fn first_rejected_reason(&self) -> Option<Value> {
        self.outcome(self.first_rejected)
            .and_then(|outcome| outcome.reason().cloned())
    }

    fn values(&self) -> Vec<Value> {
        self.outcomes
            .iter()
            .flatten()
            .map(|outcome| outcome.value().cloned().unwrap_or_default())
            .collect()
    }
}

fn fire(listeners: &CallbackFanout, index: usize) {
    for err in listeners
        .call(&[Value::from(index)])
        .into_iter()
        .filter_map(|r| r.err())
    {
        debug!(index, error = %err, "collection listener raised");
    }
}

/// Shared bookkeeping over an ordered set of promises
#[derive(Clone)]
pub struct PromiseCollection {
    promises: Vec<Deferred>,
    state: Rc<RefCell<CollectionState>>,
    /// Fulfills with every outcome once all inputs have settled
    settled: Deferred,
}

impl PromiseCollection {
    /// Subscribe to every input. Inputs that have already settled are
    /// recorded immediately, in iteration order.
    pub fn new(promises: impl IntoIterator<Item = Deferred>) -> Self {
        let promises: Vec<Deferred> = promises.into_iter().collect();
        let state = Rc::new(RefCell::new(CollectionState::new(promises.len())));
        debug!(inputs = promises.len(), "creating promise collection");

        let settled = Deferred::new(|resolve, _| {
            for (index, promise) in promises.iter().enumerate() {
                promise
                    .then(
                        Self::recorder(&state, index, OutcomeKind::Fulfilled),
                        Self::recorder(&state, index, OutcomeKind::Rejected),
                    )
                    .finally(Self::settle_marker(&state, index, resolve.clone()));
            }
            Ok(())
        });

        Self {
            promises,
            state,
            settled,
        }
    }

    /// Records the outcome of input `index` and fires "first rejected"
    fn recorder(state: &Rc<RefCell<CollectionState>>, index: usize, kind: OutcomeKind) -> Handler {
        let state = state.clone();
        Handler::unary(move |payload| {
            let first_rejected = {
                let mut state = state.borrow_mut();
                state.record(index, Outcome::from_kind(kind, payload));
                if kind == OutcomeKind::Rejected && state.first_rejected.is_none() {
                    state.first_rejected = Some(index);
                    Some(std::mem::take(&mut state.on_first_rejected))
                } else {
                    None
                }
            };
            trace!(index, state = %kind, "collection input settled");

            if let Some(listeners) = first_rejected {
                debug!(index, listeners = listeners.len(), "first rejection in collection");
                fire(&listeners, index);
            }
            Ok(Value::Undefined)
        })
    }

    /// Fires "first settled" and resolves the all-settled promise once every
    /// outcome is in
    fn settle_marker(
        state: &Rc<RefCell<CollectionState>>,
        index: usize,
        resolve: Resolver,
    ) -> Handler {
        let state = state.clone();
        Handler::callback(move |_| {
            let (first_settled, outcomes) = {
                let mut state = state.borrow_mut();
                let first_settled = if state.first_settled.is_none() {
                    state.first_settled = Some(index);
                    Some(std::mem::take(&mut state.on_first_settled))
                } else {
                    None
                };
                let outcomes = state.all_collected().then(|| state.ordered_outcomes());
                (first_settled, outcomes)
            };

            if let Some(listeners) = first_settled {
                trace!(index, listeners = listeners.len(), "first settlement in collection");
                fire(&listeners, index);
            }
            if let Some(outcomes) = outcomes {
                debug!(inputs = outcomes.len(), "all collection outcomes collected");
                resolve.settle(Value::Outcomes(outcomes));
            }
            Ok(Value::Undefined)
        })
    }

    /// Fulfill with the values in input order once every input has
    /// fulfilled, or reject with the first rejection in settlement order.
    ///
    /// The first rejection short-circuits: inputs still pending are ignored
    /// by the returned promise but keep being recorded by the collection.
    pub fn all(&self) -> Deferred {
        if let Some(reason) = self.state.borrow().first_rejected_reason() {
            return Deferred::reject(reason);
        }
        if self.all_outcomes_collected() {
            return Deferred::resolve(Value::Array(self.values()));
        }

        Deferred::new(|resolve, reject| {
            for promise in &self.promises {
                let state = self.state.clone();
                let resolve = resolve.clone();
                let reject = reject.clone();
                promise.finally(Handler::callback(move |_| {
                    if resolve.is_settled() {
                        return Ok(Value::Undefined);
                    }
                    let (rejection, values) = {
                        let state = state.borrow();
                        let values = state.all_collected().then(|| state.values());
                        (state.first_rejected_reason(), values)
                    };
                    if let Some(reason) = rejection {
                        trace!("all rejected by first rejection");
                        reject.settle(reason);
                    } else if let Some(values) = values {
                        trace!(inputs = values.len(), "all fulfilled");
                        resolve.settle(Value::Array(values));
                    }
                    Ok(Value::Undefined)
                }));
            }
            Ok(())
        })
    }

    /// Fulfill with every outcome, in input order, once all inputs have
    /// settled. Never rejects.
    pub fn all_settled(&self) -> Deferred {
        if self.all_outcomes_collected() {
            return Deferred::resolve(Value::Outcomes(self.state.borrow().ordered_outcomes()));
        }

        let state = self.state.clone();
        self.settled.finally(Handler::callback(move |_| {
            Ok(Value::Outcomes(state.borrow().ordered_outcomes()))
        }))
    }

    /// Settle like the input that settled first. Over an empty collection
    /// the returned promise stays pending forever.
    pub fn race(&self) -> Deferred {
        match self.first_outcome() {
            Some(Outcome::Fulfilled { value }) => return Deferred::resolve(value),
            Some(Outcome::Rejected { reason }) => return Deferred::reject(reason),
            None => {}
        }

        let books: Weak<RefCell<CollectionState>> = Rc::downgrade(&self.state);
        Deferred::new(|resolve, reject| {
            self.state.borrow_mut().on_first_settled.add_fn(move |_| {
                let first = match books.upgrade() {
                    Some(state) => {
                        let state = state.borrow();
                        state.outcome(state.first_settled)
                    }
                    None => None,
                };
                match first {
                    Some(Outcome::Fulfilled { value }) => resolve.settle(value),
                    Some(Outcome::Rejected { reason }) => reject.settle(reason),
                    None => {}
                }
                Ok(Value::Undefined)
            });
            Ok(())
        })
    }

    /// Call `handler` with the index of the first input to settle. If that
    /// already happened, `handler` runs immediately.
    pub fn on_first_settled(&self, handler: impl Into<Handler>) {
        let handler = handler.into();
        let fired = self.state.borrow().first_settled;
        self.listen(handler, fired, |state| &mut state.on_first_settled);
    }

    /// Call `handler` with the index of the first input to reject. If that
    /// already happened, `handler` runs immediately.
    pub fn on_first_rejected(&self, handler: impl Into<Handler>) {
        let handler = handler.into();
        let fired = self.state.borrow().first_rejected;
        self.listen(handler, fired, |state| &mut state.on_first_rejected);
    }

    fn listen(
        &self,
        handler: Handler,
        fired: Option<usize>,
        fanout: impl FnOnce(&mut CollectionState) -> &mut CallbackFanout,
    ) {
        if !handler.is_present() {
            return;
        }
        match fired {
            Some(index) => {
                if let Err(err) = handler.call(&[Value::from(index)]) {
                    debug!(index, error = %err, "collection listener raised");
                }
            }
            None => {
                let mut state = self.state.borrow_mut();
                fanout(&mut *state).add_fn(move |args| handler.call(args));
            }
        }
    }

    pub fn promises(&self) -> &[Deferred] {
        &self.promises
    }

    pub fn len(&self) -> usize {
        self.promises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.promises.is_empty()
    }

    /// Whether every input has settled
    pub fn all_outcomes_collected(&self) -> bool {
        self.state.borrow().all_collected()
    }

    pub fn is_any_rejected(&self) -> bool {
        self.state.borrow().first_rejected.is_some()
    }

    /// Outcomes collected so far, keyed by input index
    pub fn outcomes(&self) -> BTreeMap<usize, Outcome> {
        self.state
            .borrow()
            .outcomes
            .iter()
            .enumerate()
            .filter_map(|(index, outcome)| outcome.clone().map(|o| (index, o)))
            .collect()
    }

    pub fn outcome(&self, index: usize) -> Option<Outcome> {
        self.state.borrow().outcome(Some(index))
    }

    /// Input indices in the order they settled
    pub fn settlement_order(&self) -> Vec<usize> {
        self.state.borrow().settlement_order.clone()
    }

    pub fn first_settled_index(&self) -> Option<usize> {
        self.state.borrow().first_settled
    }

    pub fn first_rejected_index(&self) -> Option<usize> {
        self.state.borrow().first_rejected
    }

    pub fn first_outcome(&self) -> Option<Outcome> {
        let state = self.state.borrow();
        state.outcome(state.first_settled)
    }

    pub fn first_rejected_outcome(&self) -> Option<Outcome> {
        let state = self.state.borrow();
        state.outcome(state.first_rejected)
    }

    /// Rejected outcomes collected so far, keyed by input index
    pub fn rejected_outcomes(&self) -> BTreeMap<usize, Outcome> {
        self.outcomes()
            .into_iter()
            .filter(|(_, outcome)| outcome.is_rejected())
            .collect()
    }

    /// Values of the collected outcomes in input order; a rejected outcome
    /// contributes undefined
    pub fn values(&self) -> Vec<Value> {
        self.state.borrow().values()
    }
}

impl fmt::Debug for PromiseCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("PromiseCollection")
            .field("inputs", &self.promises.len())
            .field("collected", &state.collected)
            .field("first_settled", &state.first_settled)
            .field("first_rejected", &state.first_rejected)
            .finish()
    }
}
