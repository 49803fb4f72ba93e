//! The CDCL+PB solver core: variable/clause/PB-constraint storage,
//! propagation, conflict-driven learning, restarts and the public
//! `add_*`/`solve`/`solve_with` surface. Grounded on the teacher's
//! `minisat::CoreSolver` facade composed from its `search::*` pieces.
use log::{debug, info};

use crate::formula::assignment::{extract_model, progress_estimate, Assignment, GROUND_LEVEL, LitVal};
use crate::formula::clause::ClauseKind;
use crate::formula::index_map::{VarMap, VarVec};
use crate::formula::{Lit, Var};
use crate::pb::PbConstraint;

pub mod budget;
pub mod clause_db;
pub mod conflict;
pub mod decision_heuristic;
pub mod error;
pub mod pb_db;
pub mod random;
pub mod restart;
pub mod watches;

use budget::Budget;
use clause_db::{ClauseDb, ClauseDbSettings};
use conflict::{Conflict, Reason};
use decision_heuristic::{DecisionHeuristic, DecisionHeuristicSettings};
use error::SolverError;
use pb_db::{PbDb, PbHandlerKind, PbPropagateResult};
use restart::{LearningStrategy, LearntSizeSchedule, RestartState, RestartStrategy};
use watches::{PropagateResult, Watches};

#[derive(Copy, Clone, Debug, Default)]
pub struct SolverConfig {
    pub decision: DecisionHeuristicSettings,
    pub clause_db: ClauseDbSettings,
    pub restart: RestartStrategyConfig,
    pub learning: LearningStrategy,
    pub pb_handler: PbHandlerKind,
}

#[derive(Copy, Clone, Debug)]
pub struct RestartStrategyConfig(pub RestartStrategy);

impl Default for RestartStrategyConfig {
    fn default() -> Self {
        RestartStrategyConfig(RestartStrategy::default())
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct Stats {
    pub decisions: u64,
    pub conflicts: u64,
    pub propagations: u64,
    pub restarts: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SolveResult {
    Sat,
    Unsat,
    Unknown,
}

/// The full solver state. Holds every variable/clause/PB-constraint and the
/// per-variable reason-tracking map conflict analysis needs for PB
/// propagations (see `conflict::analyze`'s doc comment).
pub struct Solver {
    assigns: Assignment,
    watches: Watches,
    clause_db: ClauseDb,
    pb_db: PbDb,
    heuristic: DecisionHeuristic,
    restart: RestartState,
    learnt_schedule: Option<LearntSizeSchedule>,
    budget: Budget,
    config: SolverConfig,
    reason_of_pb: VarMap<Reason>,
    qhead: usize,
    model: Option<VarVec<bool>>,
    ok: bool,
    stats: Stats,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Solver {
        Solver {
            assigns: Assignment::new(),
            watches: Watches::new(),
            clause_db: ClauseDb::new(config.clause_db),
            pb_db: PbDb::new(),
            heuristic: DecisionHeuristic::new(config.decision),
            restart: RestartState::new(config.restart.0),
            learnt_schedule: None,
            budget: Budget::new(),
            config,
            reason_of_pb: VarMap::new(),
            qhead: 0,
            model: None,
            ok: true,
            stats: Stats::default(),
        }
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn n_vars(&self) -> usize {
        self.assigns.n_vars()
    }

    pub fn new_var(&mut self) -> Var {
        let v = self.assigns.new_var();
        self.watches.init_var(v.pos_lit());
        self.watches.init_var(v.neg_lit());
        self.pb_db.init_var(v.pos_lit());
        self.pb_db.init_var(v.neg_lit());
        self.heuristic.add_var(v);
        v
    }

    fn check_lits(&self, lits: &[Lit]) -> Result<(), SolverError> {
        if lits.iter().any(|l| l.var().index() >= self.assigns.n_vars()) {
            Err(SolverError::VarOutOfRange)
        } else {
            Ok(())
        }
    }

    /// Adds an originally asserted clause. Handles the degenerate cases
    /// spec.md calls out directly: an empty clause makes the solver
    /// permanently unsatisfiable, a unit clause is enqueued immediately
    /// (and may itself trigger a ground-level conflict), a tautological
    /// clause is silently dropped, duplicate literals are merged.
    pub fn add_clause(&mut self, lits: Vec<Lit>) -> Result<(), SolverError> {
        self.check_lits(&lits)?;
        if !self.ok {
            return Err(SolverError::AlreadyUnsat);
        }

        let mut lits = lits;
        lits.sort();
        lits.dedup();
        if lits.windows(2).any(|w| w[0] == !w[1]) {
            return Ok(()); // tautology
        }
        let lits: Vec<Lit> = {
            let mut deduped: Vec<Lit> = Vec::with_capacity(lits.len());
            for l in lits {
                if deduped.last() != Some(&l) {
                    deduped.push(l);
                }
            }
            deduped
        };

        if lits.is_empty() {
            self.ok = false;
            return Ok(());
        }
        if lits.len() == 1 {
            return self.enqueue_ground(lits[0]);
        }

        self.clause_db.add_clause(lits, &mut self.watches);
        Ok(())
    }

    fn enqueue_ground(&mut self, lit: Lit) -> Result<(), SolverError> {
        match self.assigns.of_lit(lit) {
            LitVal::True => Ok(()),
            LitVal::False => {
                self.ok = false;
                Ok(())
            }
            LitVal::Undef => {
                self.assigns.assign_lit(lit, None);
                Ok(())
            }
        }
    }

    /// Adds `sum(coeff_i * lit_i) >= threshold`. Negative coefficients are
    /// rejected (callers should flip the literal: `c*x == c + (-c)*!x`).
    pub fn add_pb_at_least(&mut self, terms: Vec<(i64, Lit)>, threshold: i64) -> Result<(), SolverError> {
        if terms.iter().any(|&(c, _)| c < 0) {
            return Err(SolverError::NegativeCoefficient);
        }
        self.check_lits(&terms.iter().map(|&(_, l)| l).collect::<Vec<_>>())?;
        if !self.ok {
            return Err(SolverError::AlreadyUnsat);
        }

        let threshold = threshold.max(0) as u64;
        let terms: Vec<(u64, Lit)> = terms.into_iter().map(|(c, l)| (c as u64, l)).collect();
        let constraint = PbConstraint::new(terms, threshold)?;

        if constraint.is_unsatisfiable() {
            self.ok = false;
            return Ok(());
        }
        if constraint.is_trivially_true() {
            return Ok(());
        }
        if constraint.terms().len() == 1 {
            let (_, l) = constraint.terms()[0];
            return self.enqueue_ground(l);
        }

        self.pb_db.add(constraint, self.config.pb_handler);
        Ok(())
    }

    /// `sum(coeff_i * lit_i) <= threshold`, implemented by negating every
    /// literal: `sum(c*!x) >= sum(c) - threshold`.
    pub fn add_pb_at_most(&mut self, terms: Vec<(i64, Lit)>, threshold: i64) -> Result<(), SolverError> {
        let sum: i64 = terms.iter().map(|&(c, _)| c).sum();
        let flipped: Vec<(i64, Lit)> = terms.into_iter().map(|(c, l)| (c, !l)).collect();
        self.add_pb_at_least(flipped, sum - threshold)
    }

    pub fn add_pb_exactly(&mut self, terms: Vec<(i64, Lit)>, value: i64) -> Result<(), SolverError> {
        self.add_pb_at_least(terms.clone(), value)?;
        self.add_pb_at_most(terms, value)
    }

    pub fn add_at_least(&mut self, lits: Vec<Lit>, k: i64) -> Result<(), SolverError> {
        self.add_pb_at_least(lits.into_iter().map(|l| (1, l)).collect(), k)
    }

    pub fn add_at_most(&mut self, lits: Vec<Lit>, k: i64) -> Result<(), SolverError> {
        self.add_pb_at_most(lits.into_iter().map(|l| (1, l)).collect(), k)
    }

    pub fn add_exactly(&mut self, lits: Vec<Lit>, k: i64) -> Result<(), SolverError> {
        self.add_pb_exactly(lits.into_iter().map(|l| (1, l)).collect(), k)
    }

    pub fn model(&self) -> Option<&VarVec<bool>> {
        self.model.as_ref()
    }

    pub fn value(&self, lit: Lit) -> Option<bool> {
        self.model.as_ref().map(|m| m[lit.var()] != lit.sign())
    }

    pub fn solve(&mut self) -> SolveResult {
        self.solve_with(&[])
    }

    /// Solves under the given assumptions, treating each as a forced unit
    /// at decision level 1 for the duration of this call; on `Unsat` the
    /// assumptions themselves (or a subset) are discoverable via
    /// conflict-driven analysis the same way the teacher's
    /// `analyze_final` derives an assumption-based core, but producing
    /// that core is left to the optimizer layer (spec.md scopes MUS
    /// extraction out of this component).
    pub fn solve_with(&mut self, assumptions: &[Lit]) -> SolveResult {
        if !self.ok {
            return SolveResult::Unsat;
        }
        if self.learnt_schedule.is_none() {
            self.learnt_schedule = Some(LearntSizeSchedule::new(self.config.learning, self.clause_db.stats().n_original.max(1)));
        }

        for &lit in assumptions {
            self.assigns.new_decision_level();
            if self.assigns.of_lit(lit) == LitVal::False {
                self.cancel_until(GROUND_LEVEL);
                return SolveResult::Unsat;
            }
            if self.assigns.is_undef(lit.var()) {
                self.assigns.assign_lit(lit, None);
            }
            match self.propagate() {
                Some(_) => {
                    self.cancel_until(GROUND_LEVEL);
                    return SolveResult::Unsat;
                }
                None => {}
            }
        }

        let mut conflict_bound = self.restart.next_bound();
        let mut conflicts_since_restart = 0u64;

        loop {
            if !self.budget.within(self.stats.conflicts, self.stats.propagations) {
                self.cancel_until(assumptions.len() as u32);
                return SolveResult::Unknown;
            }

            match self.propagate() {
                Some(confl) => {
                    self.stats.conflicts += 1;
                    conflicts_since_restart += 1;
                    if self.assigns.decision_level() == GROUND_LEVEL {
                        self.ok = false;
                        return SolveResult::Unsat;
                    }

                    self.heuristic.decay_activity();
                    self.clause_db.decay_activity();

                    match conflict::analyze(
                        confl,
                        &self.assigns,
                        &self.clause_db,
                        &self.pb_db,
                        &self.reason_of_pb,
                        &mut self.heuristic,
                    ) {
                        Conflict::Ground => {
                            self.ok = false;
                            return SolveResult::Unsat;
                        }
                        Conflict::Unit(lit) => {
                            self.cancel_until(GROUND_LEVEL);
                            if self.enqueue_ground(lit).is_err() || !self.ok {
                                return SolveResult::Unsat;
                            }
                        }
                        Conflict::Learned(level, lits) => {
                            let backtrack = level.max(assumptions.len() as u32);
                            self.cancel_until(backtrack);
                            let asserting = lits[0];
                            let cr = self.clause_db.learn_clause(lits, &mut self.watches);
                            self.assigns.assign_lit(asserting, Some(cr));
                        }
                    }
                }
                None => {
                    if self.assigns.n_assigns() == self.assigns.n_vars() {
                        let model = extract_model(&self.assigns);
                        info!(
                            "SAT after {} conflicts, {} decisions, progress {:.3}",
                            self.stats.conflicts,
                            self.stats.decisions,
                            progress_estimate(&self.assigns)
                        );
                        self.model = Some(model);
                        self.cancel_until(GROUND_LEVEL);
                        return SolveResult::Sat;
                    }

                    if conflicts_since_restart >= conflict_bound {
                        debug!("restart after {} conflicts since last restart", conflicts_since_restart);
                        self.stats.restarts += 1;
                        conflicts_since_restart = 0;
                        conflict_bound = self.restart.next_bound();
                        self.cancel_until(assumptions.len() as u32);
                        continue;
                    }

                    if let Some(schedule) = &mut self.learnt_schedule {
                        if self.clause_db.stats().n_learnt > schedule.max_learnts() {
                            schedule.grow();
                            self.clause_db.reduce(0.5, &self.assigns, &mut self.watches);
                        }
                    }

                    self.assigns.new_decision_level();
                    self.stats.decisions += 1;
                    match self.heuristic.pick_branch_lit(&self.assigns) {
                        Some(lit) => self.assigns.assign_lit(lit, None),
                        None => unreachable!("no decision available but not all variables assigned"),
                    }
                }
            }
        }
    }

    /// Runs unit propagation and PB-constraint propagation to a fixpoint,
    /// returning the conflicting reason if one arises.
    fn propagate(&mut self) -> Option<Reason> {
        loop {
            while self.qhead < self.assigns.trail().len() {
                let lit = self.assigns.trail()[self.qhead];
                self.qhead += 1;
                self.stats.propagations += 1;

                let assigns = &self.assigns;
                let mut forced: Option<(Lit, crate::formula::clause::ClauseRef)> = None;
                let mut conflict_cr = None;
                match self.watches.propagate(self.clause_db.allocator_mut(), assigns, lit, |l, cr| {
                    match assigns.of_lit(l) {
                        LitVal::True => true,
                        LitVal::False => false,
                        LitVal::Undef => {
                            forced = Some((l, cr));
                            true
                        }
                    }
                }) {
                    PropagateResult::Conflict(cr) => conflict_cr = Some(cr),
                    PropagateResult::Ok => {}
                }
                if let Some((l, cr)) = forced {
                    self.assigns.assign_lit(l, Some(cr));
                }
                if let Some(cr) = conflict_cr {
                    return Some(Reason::Clause(cr));
                }

                for &pr in self.pb_db.touched_by(lit).to_vec().iter() {
                    match self.pb_db.propagate(pr, &self.assigns) {
                        PbPropagateResult::Conflict => return Some(Reason::Pb(pr)),
                        PbPropagateResult::Forced(lits) => {
                            for forced_lit in lits {
                                if self.assigns.is_undef(forced_lit.var()) {
                                    self.assigns.assign_lit(forced_lit, None);
                                    self.reason_of_pb.insert(forced_lit.var(), Reason::Pb(pr));
                                } else if self.assigns.of_lit(forced_lit) == LitVal::False {
                                    return Some(Reason::Pb(pr));
                                }
                            }
                        }
                        PbPropagateResult::Unchanged => {}
                    }
                }
            }
            break;
        }
        None
    }

    fn cancel_until(&mut self, level: crate::formula::assignment::DecisionLevel) {
        let heuristic = &mut self.heuristic;
        self.assigns.rewind_until_level(level, |lit| {
            heuristic.on_unassigned(lit.var());
            heuristic.insert_var_order(lit.var());
        });
        self.qhead = self.assigns.trail().len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(v: Var, sign: bool) -> Lit {
        v.lit(sign)
    }

    #[test]
    fn unit_propagation_forces_chain() {
        let mut s = Solver::new(SolverConfig::default());
        let v0 = s.new_var();
        let v1 = s.new_var();
        s.add_clause(vec![v0.pos_lit()]).unwrap();
        s.add_clause(vec![v0.neg_lit(), v1.pos_lit()]).unwrap();
        assert_eq!(s.solve(), SolveResult::Sat);
        assert_eq!(s.value(v0.pos_lit()), Some(true));
        assert_eq!(s.value(v1.pos_lit()), Some(true));
    }

    #[test]
    fn empty_clause_is_unsat() {
        let mut s = Solver::new(SolverConfig::default());
        s.add_clause(vec![]).unwrap();
        assert_eq!(s.solve(), SolveResult::Unsat);
    }

    #[test]
    fn conflicting_units_are_unsat() {
        let mut s = Solver::new(SolverConfig::default());
        let v0 = s.new_var();
        s.add_clause(vec![v0.pos_lit()]).unwrap();
        s.add_clause(vec![v0.neg_lit()]).unwrap();
        assert_eq!(s.solve(), SolveResult::Unsat);
    }

    #[test]
    fn no_variables_is_trivially_sat() {
        let mut s = Solver::new(SolverConfig::default());
        assert_eq!(s.solve(), SolveResult::Sat);
    }

    #[test]
    fn pb_constraint_forces_majority() {
        let mut s = Solver::new(SolverConfig::default());
        let v0 = s.new_var();
        let v1 = s.new_var();
        let v2 = s.new_var();
        // at least 2 of 3 true
        s.add_pb_at_least(vec![(1, v0.pos_lit()), (1, v1.pos_lit()), (1, v2.pos_lit())], 2)
            .unwrap();
        s.add_clause(vec![v0.neg_lit()]).unwrap();
        assert_eq!(s.solve(), SolveResult::Sat);
        assert_eq!(s.value(v1.pos_lit()), Some(true));
        assert_eq!(s.value(v2.pos_lit()), Some(true));
        let _ = lit(v0, false);
    }

    #[test]
    fn unsatisfiable_pb_constraint_is_rejected_up_front() {
        let mut s = Solver::new(SolverConfig::default());
        let v0 = s.new_var();
        s.add_pb_at_least(vec![(1, v0.pos_lit())], 5).unwrap();
        assert_eq!(s.solve(), SolveResult::Unsat);
    }

    #[test]
    fn interrupt_before_first_decision_yields_unknown() {
        let mut s = Solver::new(SolverConfig::default());
        s.new_var();
        s.new_var();
        s.budget().interrupt();
        assert_eq!(s.solve(), SolveResult::Unknown);
    }

    #[test]
    fn assumptions_drive_solve_with() {
        let mut s = Solver::new(SolverConfig::default());
        let v0 = s.new_var();
        let v1 = s.new_var();
        s.add_clause(vec![v0.pos_lit(), v1.pos_lit()]).unwrap();
        let result = s.solve_with(&[v0.neg_lit()]);
        assert_eq!(result, SolveResult::Sat);
        assert_eq!(s.value(v1.pos_lit()), Some(true));
    }
}
