//! Cooperative cancellation: a conflict/propagation budget plus an
//! asynchronous interrupt flag, checked periodically by the search loop.
//! Grounded directly on the teacher's `minisat::budget::Budget`.
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Budget {
    conflict_budget: i64,
    propagation_budget: i64,
    asynch_interrupt: AtomicBool,
}

impl Budget {
    pub fn new() -> Budget {
        Budget {
            conflict_budget: -1,
            propagation_budget: -1,
            asynch_interrupt: AtomicBool::new(false),
        }
    }

    pub fn set_conflict_budget(&mut self, n: Option<u64>) {
        self.conflict_budget = n.map_or(-1, |n| n as i64);
    }

    pub fn set_propagation_budget(&mut self, n: Option<u64>) {
        self.propagation_budget = n.map_or(-1, |n| n as i64);
    }

    pub fn off(&mut self) {
        self.conflict_budget = -1;
        self.propagation_budget = -1;
    }

    /// Sets or clears the interrupt flag; safe to call from another thread
    /// while `search` is running.
    pub fn interrupt(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    pub fn clear_interrupt(&self) {
        self.asynch_interrupt.store(false, Ordering::Relaxed);
    }

    pub fn is_interrupted(&self) -> bool {
        self.asynch_interrupt.load(Ordering::Relaxed)
    }

    /// `true` as long as neither budget has been exhausted and no interrupt
    /// has been requested.
    pub fn within(&self, conflicts: u64, propagations: u64) -> bool {
        !self.is_interrupted()
            && (self.conflict_budget < 0 || (conflicts as i64) < self.conflict_budget)
            && (self.propagation_budget < 0 || (propagations as i64) < self.propagation_budget)
    }
}
