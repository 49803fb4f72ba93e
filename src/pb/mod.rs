//! Pseudo-Boolean constraints: `sum(coeff_i * lit_i) >= threshold`.
//!
//! A `PbConstraint` is the normalized, validated representation shared by
//! both propagation strategies (`counter`, `pueblo`); `solver::pb_db`
//! decides which representation to instantiate per-constraint according to
//! `PbHandlerKind`.
use crate::formula::Lit;
use crate::solver::error::SolverError;

pub mod counter;
pub mod pueblo;

/// One normalized pseudo-Boolean constraint: `sum(coeff * lit) >= threshold`,
/// coefficients non-negative and clamped to `threshold`, at most one term
/// per variable (opposite-polarity duplicates folded away, see
/// `normalize`).
#[derive(Clone, Debug)]
pub struct PbConstraint {
    terms: Vec<(u64, Lit)>,
    threshold: u64,
}

impl PbConstraint {
    /// Builds a constraint from raw (possibly duplicated, possibly
    /// over-threshold) terms, normalizing as it goes. Returns an error for
    /// the malformed inputs spec.md §7 calls out: negative coefficients
    /// (the caller is expected to have already flipped those into the
    /// opposite literal) and a trivially-contradictory empty constraint
    /// with positive threshold.
    pub fn new(mut terms: Vec<(u64, Lit)>, mut threshold: u64) -> Result<PbConstraint, SolverError> {
        terms.sort_by_key(|&(_, l)| l.var());

        let mut merged: Vec<(u64, Lit)> = Vec::with_capacity(terms.len());
        for (coeff, lit) in terms {
            if coeff == 0 {
                continue;
            }
            if let Some(last) = merged.last_mut() {
                if last.1.var() == lit.var() {
                    if last.1 == lit {
                        last.0 += coeff;
                    } else if last.0 >= coeff {
                        // a*l + b*!l, a >= b  ==  b*1 + (a-b)*l, threshold -= b
                        last.0 -= coeff;
                        threshold = threshold.saturating_sub(coeff);
                    } else {
                        let diff = coeff - last.0;
                        threshold = threshold.saturating_sub(last.0);
                        *last = (diff, lit);
                    }
                    continue;
                }
            }
            merged.push((coeff, lit));
        }

        for term in merged.iter_mut() {
            if term.0 > threshold {
                term.0 = threshold;
            }
        }

        if merged.is_empty() && threshold > 0 {
            return Err(SolverError::EmptyPbWithPositiveThreshold);
        }

        Ok(PbConstraint {
            terms: merged,
            threshold,
        })
    }

    #[inline]
    pub fn terms(&self) -> &[(u64, Lit)] {
        &self.terms
    }

    #[inline]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Sum of every coefficient; a constraint is trivially true once the
    /// slack (this minus the sum of falsified coefficients) can't drop
    /// below the threshold.
    pub fn max_sum(&self) -> u64 {
        self.terms.iter().map(|&(c, _)| c).sum()
    }

    /// `true` if the all-true assignment to the constraint's own literals
    /// would already satisfy it, i.e. the constraint cannot become
    /// unsatisfiable through propagation of *other* constraints alone.
    pub fn is_trivially_true(&self) -> bool {
        self.threshold == 0
    }

    pub fn is_unsatisfiable(&self) -> bool {
        self.max_sum() < self.threshold
    }

    /// Evaluates the constraint against a total model; used by tests and by
    /// the optimizer's objective evaluation.
    pub fn eval<F: Fn(Lit) -> bool>(&self, value: F) -> bool {
        let sum: u64 = self
            .terms
            .iter()
            .filter(|&&(_, l)| value(l))
            .map(|&(c, _)| c)
            .sum();
        sum >= self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Var;

    fn v(i: usize) -> Var {
        Var::from_index(i)
    }

    #[test]
    fn merges_duplicate_same_polarity() {
        let c = PbConstraint::new(vec![(2, v(0).pos_lit()), (3, v(0).pos_lit())], 4).unwrap();
        assert_eq!(c.terms(), &[(5, v(0).pos_lit())]);
    }

    #[test]
    fn folds_opposite_polarity_duplicate() {
        // 3*x + 2*!x >= 4  ==  2*1 + 1*x >= 4  ==  1*x >= 2, clamped to threshold 2
        let c = PbConstraint::new(vec![(3, v(0).pos_lit()), (2, v(0).neg_lit())], 4).unwrap();
        assert_eq!(c.threshold(), 2);
        assert_eq!(c.terms(), &[(1, v(0).pos_lit())]);
    }

    #[test]
    fn coefficients_clamp_to_threshold() {
        let c = PbConstraint::new(vec![(10, v(0).pos_lit())], 3).unwrap();
        assert_eq!(c.terms(), &[(3, v(0).pos_lit())]);
    }

    #[test]
    fn empty_with_positive_threshold_errors() {
        assert!(matches!(
            PbConstraint::new(vec![], 1),
            Err(SolverError::EmptyPbWithPositiveThreshold)
        ));
    }

    #[test]
    fn empty_with_zero_threshold_is_trivially_true() {
        let c = PbConstraint::new(vec![], 0).unwrap();
        assert!(c.is_trivially_true());
    }

    #[test]
    fn eval_matches_weighted_sum() {
        let c = PbConstraint::new(
            vec![(1, v(0).pos_lit()), (2, v(1).pos_lit()), (3, v(2).pos_lit())],
            4,
        )
        .unwrap();
        assert!(c.eval(|l| l.var() == v(1) || l.var() == v(2)));
        assert!(!c.eval(|l| l.var() == v(0)));
    }
}
