//! Counter-based pseudo-Boolean propagation: every constraint tracks the sum
//! of coefficients of its currently-true literals (`counter`) and triggers
//! whenever enough remaining literals could still reach the threshold.
//!
//! Simpler and more memory-hungry than `pueblo`'s watched-literal scheme
//! (every constraint is woken on every relevant assignment, not just a
//! watched subset), selected via `PbHandlerKind::Counter` for small/dense
//! constraints where the watch bookkeeping isn't worth it.
use crate::formula::assignment::{Assignment, LitVal};
use crate::formula::Lit;

use super::PbConstraint;

/// Propagation state for one constraint under the counter scheme: current
/// sum of true terms and sum of unassigned terms, kept incrementally as the
/// trail grows/shrinks so `propagate` is O(1) amortized per touched literal.
pub struct CounterState {
    constraint: PbConstraint,
    true_sum: u64,
    unassigned_sum: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PbPropagateResult {
    /// Nothing new to report.
    Unchanged,
    /// These literals are now forced true by the constraint.
    Forced(Vec<Lit>),
    /// The constraint can no longer be satisfied.
    Conflict,
}

impl CounterState {
    pub fn new(constraint: PbConstraint) -> CounterState {
        let unassigned_sum = constraint.max_sum();
        CounterState {
            constraint,
            true_sum: 0,
            unassigned_sum,
        }
    }

    pub fn constraint(&self) -> &PbConstraint {
        &self.constraint
    }

    #[inline]
    fn coeff_of(&self, lit: Lit) -> Option<u64> {
        self.constraint
            .terms()
            .iter()
            .find(|&&(_, l)| l == lit)
            .map(|&(c, _)| c)
    }

    /// Call when `lit` (one of this constraint's literals) becomes true.
    pub fn on_assigned_true(&mut self, lit: Lit) {
        if let Some(c) = self.coeff_of(lit) {
            self.true_sum += c;
            self.unassigned_sum -= c;
        }
    }

    /// Call when `lit` (one of this constraint's literals) becomes false.
    pub fn on_assigned_false(&mut self, lit: Lit) {
        if let Some(c) = self.coeff_of(lit) {
            self.unassigned_sum -= c;
        }
    }

    /// Call when a previously assigned literal is unassigned by backtracking.
    pub fn on_unassigned(&mut self, lit: Lit, was_true: bool) {
        if let Some(c) = self.coeff_of(lit) {
            if was_true {
                self.true_sum -= c;
            }
            self.unassigned_sum += c;
        }
    }

    /// Re-derives `true_sum`/`unassigned_sum` from scratch against the
    /// current trail; used after backtracking to a level this state wasn't
    /// incrementally tracking through (e.g. right after construction from a
    /// non-ground assignment, or to defend against drift).
    pub fn resync(&mut self, assigns: &Assignment) {
        let mut true_sum = 0u64;
        let mut unassigned_sum = 0u64;
        for &(c, l) in self.constraint.terms() {
            match assigns.of_lit(l) {
                LitVal::True => true_sum += c,
                LitVal::Undef => unassigned_sum += c,
                LitVal::False => {}
            }
        }
        self.true_sum = true_sum;
        self.unassigned_sum = unassigned_sum;
    }

    /// The threshold minus what's already true: how much more the
    /// unassigned literals still need to contribute.
    #[inline]
    fn slack(&self) -> i128 {
        self.constraint.threshold() as i128 - self.true_sum as i128
    }

    /// Checks whether the constraint is already violated, already satisfied,
    /// or forces any of its unassigned literals.
    ///
    /// Resyncs `true_sum`/`unassigned_sum` from `assigns` first: the search
    /// loop calls this on every touch without separately threading
    /// `on_assigned_true`/`on_assigned_false`/`on_unassigned` through the
    /// trail push/pop paths, so the cached sums can't be trusted to already
    /// reflect the current assignment.
    pub fn propagate(&mut self, assigns: &Assignment) -> PbPropagateResult {
        self.resync(assigns);
        let need = self.slack();
        if need <= 0 {
            return PbPropagateResult::Unchanged;
        }
        if (self.unassigned_sum as i128) < need {
            return PbPropagateResult::Conflict;
        }

        let mut forced = Vec::new();
        for &(c, l) in self.constraint.terms() {
            if assigns.of_lit(l) == LitVal::Undef && (self.unassigned_sum as i128 - c as i128) < need {
                forced.push(l);
            }
        }
        if forced.is_empty() {
            PbPropagateResult::Unchanged
        } else {
            PbPropagateResult::Forced(forced)
        }
    }

    /// Builds the reason clause for `forced_lit` having been propagated by
    /// this constraint: `forced_lit OR (negation of every false literal
    /// whose absence would restore enough slack)`. This is the cutting-
    /// planes-derived clausal reason consumed by ordinary 1-UIP conflict
    /// analysis (spec.md's PB-to-clause reduction).
    pub fn reason_clause(&self, forced_lit: Lit, assigns: &Assignment) -> Vec<Lit> {
        let mut reason = vec![forced_lit];
        let mut sorted_false: Vec<(u64, Lit)> = self
            .constraint
            .terms()
            .iter()
            .copied()
            .filter(|&(_, l)| assigns.of_lit(l) == LitVal::False)
            .collect();
        sorted_false.sort_by(|a, b| b.0.cmp(&a.0));

        let need = self.slack();
        let mut covered: i128 = self.unassigned_sum as i128 - self.coeff_of(forced_lit).unwrap_or(0) as i128;
        for (c, l) in sorted_false {
            if covered >= need {
                break;
            }
            reason.push(!l);
            covered += c as i128;
        }
        reason
    }
}
