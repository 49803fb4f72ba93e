//! Small free functions over literal slices shared by clause learning,
//! subsumption and the DIMACS/model glue.
use super::assignment::{Assignment, LitVal};
use super::clause::calc_abstraction;
use super::Lit;

pub use super::clause::calc_abstraction as abstraction_of;

/// `true` if any literal in `lits` is currently true under `assigns`.
pub fn satisfied_with_assignment(lits: &[Lit], assigns: &Assignment) -> bool {
    lits.iter().any(|&l| assigns.of_lit(l) == LitVal::True)
}

/// `true` if any literal in `lits` is true in `model` (one bool per
/// variable, positive polarity means `true`).
pub fn satisfied_with_model(lits: &[Lit], model: &super::index_map::VarVec<bool>) -> bool {
    lits.iter().any(|&l| model[l.var()] != l.sign())
}

/// Resolves two clauses on `pivot`: merges `ps` and `qs` minus `pivot`/`!pivot`,
/// deduplicating. Returns `None` if the resolvent would be tautological (i.e.
/// some other variable appears with both polarities), mirroring the
/// teacher's `merge`.
pub fn merge(pivot: Lit, ps: &[Lit], qs: &[Lit]) -> Option<Vec<Lit>> {
    let mut result = Vec::with_capacity(ps.len() + qs.len());

    for &p in ps {
        if p.var() != pivot.var() {
            result.push(p);
        }
    }

    for &q in qs {
        if q.var() == pivot.var() {
            continue;
        }
        if result.contains(&!q) {
            return None;
        }
        if !result.contains(&q) {
            result.push(q);
        }
    }

    Some(result)
}

#[inline]
pub fn calc_abstraction_of(lits: &[Lit]) -> u32 {
    calc_abstraction(lits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Var;

    fn v(i: usize) -> Var {
        Var::from_index(i)
    }

    #[test]
    fn merge_drops_pivot_and_dedups() {
        let pivot = v(0).pos_lit();
        let ps = vec![pivot, v(1).pos_lit()];
        let qs = vec![!pivot, v(1).pos_lit(), v(2).neg_lit()];
        let resolvent = merge(pivot, &ps, &qs).unwrap();
        assert!(resolvent.contains(&v(1).pos_lit()));
        assert!(resolvent.contains(&v(2).neg_lit()));
        assert!(!resolvent.contains(&pivot));
        assert!(!resolvent.contains(&!pivot));
        assert_eq!(resolvent.len(), 2);
    }

    #[test]
    fn merge_detects_tautology() {
        let pivot = v(0).pos_lit();
        let ps = vec![pivot, v(1).pos_lit()];
        let qs = vec![!pivot, v(1).neg_lit()];
        assert_eq!(merge(pivot, &ps, &qs), None);
    }
}
