//! The trail: current variable values, decision levels and propagation
//! reasons, plus the chronological assignment order needed for backtracking
//! and conflict analysis.
use super::clause::ClauseRef;
use super::index_map::{VarMap, VarVec};
use super::{Lit, Var};

pub type DecisionLevel = u32;

pub const GROUND_LEVEL: DecisionLevel = 0;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LitVal {
    Undef,
    False,
    True,
}

impl LitVal {
    #[inline]
    pub fn is_undef(self) -> bool {
        self == LitVal::Undef
    }
}

#[derive(Copy, Clone)]
struct VarData {
    reason: Option<ClauseRef>,
    level: DecisionLevel,
}

/// One variable's assignment history: its current value (as a `Lit`'s
/// polarity, or `None` if unassigned), the decision level it was assigned
/// at, and the clause that forced it (`None` for decisions and top-level
/// units).
pub struct Assignment {
    assigns: VarMap<LitVal>,
    vardata: VarMap<VarData>,
    trail: Vec<Lit>,
    trail_lim: Vec<usize>,
    /// Saved polarity from the last time each variable was unassigned, used
    /// by phase saving.
    polarity: VarVec<bool>,
    n_vars: usize,
}

impl Assignment {
    pub fn new() -> Self {
        Assignment {
            assigns: VarMap::new(),
            vardata: VarMap::new(),
            trail: Vec::new(),
            trail_lim: Vec::new(),
            polarity: VarVec::new(),
            n_vars: 0,
        }
    }

    pub fn new_var(&mut self) -> Var {
        let v = Var::from_index(self.n_vars);
        self.n_vars += 1;
        self.assigns.insert(v, LitVal::Undef);
        self.polarity.init(v, false);
        v
    }

    #[inline]
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    #[inline]
    pub fn n_assigns(&self) -> usize {
        self.trail.len()
    }

    #[inline]
    pub fn decision_level(&self) -> DecisionLevel {
        self.trail_lim.len() as DecisionLevel
    }

    #[inline]
    pub fn is_ground_level(&self) -> bool {
        self.trail_lim.is_empty()
    }

    pub fn new_decision_level(&mut self) {
        self.trail_lim.push(self.trail.len());
    }

    #[inline]
    pub fn value(&self, v: Var) -> LitVal {
        self.assigns[v]
    }

    #[inline]
    pub fn of_lit(&self, lit: Lit) -> LitVal {
        match self.assigns[lit.var()] {
            LitVal::Undef => LitVal::Undef,
            LitVal::True => {
                if lit.sign() {
                    LitVal::False
                } else {
                    LitVal::True
                }
            }
            LitVal::False => {
                if lit.sign() {
                    LitVal::True
                } else {
                    LitVal::False
                }
            }
        }
    }

    #[inline]
    pub fn is_assigned_pos(&self, lit: Lit) -> bool {
        self.of_lit(lit) == LitVal::True
    }

    #[inline]
    pub fn is_assigned_neg(&self, lit: Lit) -> bool {
        self.of_lit(lit) == LitVal::False
    }

    #[inline]
    pub fn is_undef(&self, v: Var) -> bool {
        self.assigns[v] == LitVal::Undef
    }

    pub fn level(&self, v: Var) -> DecisionLevel {
        self.vardata[v].level
    }

    pub fn reason(&self, v: Var) -> Option<ClauseRef> {
        self.vardata[v].reason
    }

    #[inline]
    pub fn is_locked_by(&self, v: Var, cr: ClauseRef) -> bool {
        !self.is_undef(v) && self.reason(v) == Some(cr)
    }

    pub fn saved_polarity(&self, v: Var) -> bool {
        self.polarity[v]
    }

    /// Records `lit` as true, at the current decision level, with an
    /// optional propagating clause. Panics if the variable already has a
    /// value — callers must check `is_undef` first (as the teacher's
    /// `assign_lit` does, relying on `propagate`/`enqueue` to have filtered
    /// out already-assigned literals).
    pub fn assign_lit(&mut self, lit: Lit, reason: Option<ClauseRef>) {
        let v = lit.var();
        debug_assert!(self.is_undef(v));
        self.assigns[v] = if lit.sign() {
            LitVal::False
        } else {
            LitVal::True
        };
        self.vardata.insert(
            v,
            VarData {
                reason,
                level: self.decision_level(),
            },
        );
        self.trail.push(lit);
    }

    #[inline]
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    #[inline]
    pub fn trail_at(&self, level: DecisionLevel) -> usize {
        self.trail_lim[level as usize]
    }

    /// Undoes every assignment above `level`, calling `undo` for each so the
    /// caller (decision heuristic, phase saving) can react, then truncates
    /// the trail. Mirrors the teacher's `rewind_until_level`.
    pub fn rewind_until_level<U: FnMut(Lit)>(&mut self, level: DecisionLevel, mut undo: U) {
        if self.decision_level() <= level {
            return;
        }
        let bound = self.trail_lim[level as usize];
        for i in (bound..self.trail.len()).rev() {
            let lit = self.trail[i];
            let v = lit.var();
            self.polarity[v] = lit.sign();
            self.assigns[v] = LitVal::Undef;
            undo(lit);
        }
        self.trail.truncate(bound);
        self.trail_lim.truncate(level as usize);
    }

    /// Remaps every clause reference on the trail through `reloc`, called
    /// after a `ClauseAllocator::gc` pass.
    pub fn reloc_gc<R: Fn(ClauseRef) -> Option<ClauseRef>>(&mut self, reloc: R) {
        for (_, data) in self.vardata.iter_mut() {
            if let Some(cr) = data.reason {
                data.reason = reloc(cr);
            }
        }
    }
}

/// The fraction of variables currently assigned, used for progress-estimate
/// style logging.
pub fn progress_estimate(assigns: &Assignment) -> f64 {
    if assigns.n_vars() == 0 {
        1.0
    } else {
        assigns.n_assigns() as f64 / assigns.n_vars() as f64
    }
}

/// Extracts a total model (one bool per variable) from a fully assigned
/// `Assignment`. Unassigned variables (can happen with don't-care
/// variables introduced by preprocessing, not by this solver) default to
/// `false`.
pub fn extract_model(assigns: &Assignment) -> VarVec<bool> {
    let mut model = VarVec::new();
    for i in 0..assigns.n_vars() {
        let v = Var::from_index(i);
        model.init(v, assigns.of_lit(v.pos_lit()) == LitVal::True);
    }
    model
}
