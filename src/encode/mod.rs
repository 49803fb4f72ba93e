//! Tseitin-style encoding: reifies a conjunction of literals, or a
//! pseudo-Boolean constraint, into a single fresh literal, caching results
//! by their canonical input so repeated encodings of the same condition
//! share one variable.
//!
//! Holds a non-owning `&mut Solver` rather than its own copy of the clause
//! database, grounded on the teacher's `dimacs::Subst<'s, S: Solver>`
//! pattern of wrapping a borrowed solver for the duration of a higher-level
//! operation.
use std::collections::HashMap;

use crate::formula::Lit;
use crate::solver::error::SolverError;
use crate::solver::Solver;

/// Canonical cache key for a set of literals: sorted and deduplicated, so
/// `encode_conj(&[a, b])` and `encode_conj(&[b, a])` hit the same entry.
fn canonical_key(lits: &[Lit]) -> Box<[Lit]> {
    let mut sorted = lits.to_vec();
    sorted.sort();
    sorted.dedup();
    sorted.into_boxed_slice()
}

pub struct Encoder<'s> {
    solver: &'s mut Solver,
    conj_cache: HashMap<Box<[Lit]>, Lit>,
    pb_cache: HashMap<(Box<[(u64, Lit)]>, u64), Lit>,
}

impl<'s> Encoder<'s> {
    pub fn new(solver: &'s mut Solver) -> Encoder<'s> {
        Encoder {
            solver,
            conj_cache: HashMap::new(),
            pb_cache: HashMap::new(),
        }
    }

    /// Returns a literal `r` such that `r <-> (lits[0] AND lits[1] AND ...)`
    /// is enforced by the clauses added: `r -> lits[i]` for every `i`, and
    /// `(!lits[0] OR !lits[1] OR ... OR r)`.
    ///
    /// An empty conjunction reifies to a literal that is always true.
    /// Encoding the same literal set twice (regardless of order) returns
    /// the same literal without adding clauses again.
    pub fn encode_conj(&mut self, lits: &[Lit]) -> Result<Lit, SolverError> {
        let key = canonical_key(lits);
        if let Some(&r) = self.conj_cache.get(&key) {
            return Ok(r);
        }

        if key.is_empty() {
            let r = self.solver.new_var().pos_lit();
            self.solver.add_clause(vec![r])?;
            self.conj_cache.insert(key, r);
            return Ok(r);
        }
        if key.len() == 1 {
            let r = key[0];
            self.conj_cache.insert(key, r);
            return Ok(r);
        }

        let r = self.solver.new_var().pos_lit();
        for &l in key.iter() {
            self.solver.add_clause(vec![!r, l])?;
        }
        let mut clause: Vec<Lit> = key.iter().map(|&l| !l).collect();
        clause.push(r);
        self.solver.add_clause(clause)?;

        self.conj_cache.insert(key, r);
        Ok(r)
    }

    /// Returns a literal `r` such that `r <-> (sum(coeff*lit) >= threshold)`.
    ///
    /// Encoded as two pseudo-Boolean constraints: `r -> constraint` via
    /// `sum(coeff*lit) + M*(!r) >= threshold` (with `M` the slack needed to
    /// make the implication vacuous when `r` is false) and `!r ->
    /// !constraint` via the complementary constraint on `sum < threshold`,
    /// i.e. `sum(coeff*!lit) + M*r >= (maxsum - threshold + 1)`.
    pub fn encode_pb(&mut self, terms: &[(u64, Lit)], threshold: u64) -> Result<Lit, SolverError> {
        let mut key_terms = terms.to_vec();
        key_terms.sort_by_key(|&(_, l)| l);
        let cache_key = (key_terms.into_boxed_slice(), threshold);
        if let Some(&r) = self.pb_cache.get(&cache_key) {
            return Ok(r);
        }

        let max_sum: u64 = terms.iter().map(|&(c, _)| c).sum();
        let r = self.solver.new_var().pos_lit();

        let mut fwd_terms: Vec<(i64, Lit)> = terms.iter().map(|&(c, l)| (c as i64, l)).collect();
        fwd_terms.push((max_sum as i64, r));
        self.solver.add_pb_at_least(fwd_terms, threshold as i64)?;

        if threshold > 0 {
            let deficiency = max_sum - threshold + 1;
            let mut bwd_terms: Vec<(i64, Lit)> = terms.iter().map(|&(c, l)| (c as i64, !l)).collect();
            bwd_terms.push((deficiency as i64, !r));
            self.solver.add_pb_at_least(bwd_terms, deficiency as i64)?;
        } else {
            // threshold == 0 is trivially true, so r must always be true.
            self.solver.add_clause(vec![r])?;
        }

        self.pb_cache.insert(cache_key, r);
        Ok(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Var;
    use crate::solver::{SolveResult, SolverConfig};

    fn v(i: usize) -> Var {
        Var::from_index(i)
    }

    #[test]
    fn encode_conj_caches_by_canonical_literal_set() {
        let mut solver = Solver::new(SolverConfig::default());
        let v0 = solver.new_var();
        let v1 = solver.new_var();
        let mut enc = Encoder::new(&mut solver);
        let r1 = enc.encode_conj(&[v0.pos_lit(), v1.pos_lit()]).unwrap();
        let r2 = enc.encode_conj(&[v1.pos_lit(), v0.pos_lit()]).unwrap();
        assert_eq!(r1, r2);
    }

    #[test]
    fn encode_conj_forces_reification_both_ways() {
        let mut solver = Solver::new(SolverConfig::default());
        let v0 = solver.new_var();
        let v1 = solver.new_var();
        let r = {
            let mut enc = Encoder::new(&mut solver);
            enc.encode_conj(&[v0.pos_lit(), v1.pos_lit()]).unwrap()
        };
        solver.add_clause(vec![v0.pos_lit()]).unwrap();
        solver.add_clause(vec![v1.pos_lit()]).unwrap();
        assert_eq!(solver.solve(), SolveResult::Sat);
        assert_eq!(solver.value(r), Some(true));
    }

    #[test]
    fn encode_conj_single_literal_is_identity() {
        let mut solver = Solver::new(SolverConfig::default());
        let v0 = solver.new_var();
        let mut enc = Encoder::new(&mut solver);
        let r = enc.encode_conj(&[v0.pos_lit()]).unwrap();
        assert_eq!(r, v0.pos_lit());
    }

    #[test]
    fn encode_pb_reifies_threshold_condition() {
        let mut solver = Solver::new(SolverConfig::default());
        let v0 = solver.new_var();
        let v1 = solver.new_var();
        let r = {
            let mut enc = Encoder::new(&mut solver);
            enc.encode_pb(&[(1, v0.pos_lit()), (1, v1.pos_lit())], 2).unwrap()
        };
        solver.add_clause(vec![v0.pos_lit()]).unwrap();
        solver.add_clause(vec![v1.pos_lit()]).unwrap();
        assert_eq!(solver.solve(), SolveResult::Sat);
        assert_eq!(solver.value(r), Some(true));
    }

    #[test]
    fn encode_pb_false_when_threshold_unmet() {
        let mut solver = Solver::new(SolverConfig::default());
        let v0 = solver.new_var();
        let v1 = solver.new_var();
        let r = {
            let mut enc = Encoder::new(&mut solver);
            enc.encode_pb(&[(1, v0.pos_lit()), (1, v1.pos_lit())], 2).unwrap()
        };
        solver.add_clause(vec![v0.pos_lit()]).unwrap();
        solver.add_clause(vec![v1.neg_lit()]).unwrap();
        assert_eq!(solver.solve(), SolveResult::Sat);
        assert_eq!(solver.value(r), Some(false));
        let _ = v(0);
    }
}
