//! Per-thread promise statistics

use std::cell::Cell;

/// Promise counters for the current thread
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromiseStats {
    /// Total promises created
    pub total_created: u64,
    /// Total promises fulfilled
    pub total_fulfilled: u64,
    /// Total promises rejected
    pub total_rejected: u64,
    /// Handler or executor faults converted into rejections
    pub total_handler_faults: u64,
    /// Settle calls ignored because the promise had already settled
    pub total_ignored_settles: u64,
}

thread_local! {
    static STATS: Cell<PromiseStats> = Cell::new(PromiseStats::default());
}

pub(crate) fn record(update: impl FnOnce(&mut PromiseStats)) {
    STATS.with(|cell| {
        let mut stats = cell.take();
        update(&mut stats);
        cell.set(stats);
    });
}

/// Snapshot of the current thread's promise statistics
pub fn stats() -> PromiseStats {
    STATS.with(|cell| {
        let stats = cell.take();
        cell.set(stats.clone());
        stats
    })
}

/// Reset the current thread's promise statistics
pub fn reset_stats() {
    STATS.with(|cell| cell.set(PromiseStats::default()));
}
