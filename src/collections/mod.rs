//! Callback and promise collections

mod fanout;
mod promise_collection;

pub use fanout::CallbackFanout;
pub use promise_collection::PromiseCollection;
