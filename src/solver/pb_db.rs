//! Storage and propagation dispatch for pseudo-Boolean constraints, picking
//! between the `counter` and `pueblo` representations per `PbHandlerKind`.
use crate::formula::assignment::Assignment;
use crate::formula::index_map::LitMap;
use crate::formula::Lit;
use crate::pb::{counter, pueblo, PbConstraint};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PbHandlerKind {
    Counter,
    Pueblo,
}

impl Default for PbHandlerKind {
    fn default() -> Self {
        PbHandlerKind::Counter
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PbRef(usize);

enum Entry {
    Counter(counter::CounterState),
    Pueblo(pueblo::PuebloState),
}

pub enum PbPropagateResult {
    Unchanged,
    Forced(Vec<Lit>),
    Conflict,
}

/// Owns every PB constraint added to the solver and the reverse index from
/// literal to the constraints mentioning it, so the search loop only needs
/// to re-check constraints actually touched by the literal just assigned.
pub struct PbDb {
    entries: Vec<Entry>,
    by_lit: LitMap<Vec<PbRef>>,
}

impl PbDb {
    pub fn new() -> PbDb {
        PbDb {
            entries: Vec::new(),
            by_lit: LitMap::new(),
        }
    }

    pub fn init_var(&mut self, lit: Lit) {
        self.by_lit.insert(lit, Vec::new());
    }

    pub fn add(&mut self, constraint: PbConstraint, kind: PbHandlerKind) -> PbRef {
        let pr = PbRef(self.entries.len());
        for &(_, lit) in constraint.terms() {
            self.by_lit.entry_or_default(lit).push(pr);
            self.by_lit.entry_or_default(!lit).push(pr);
        }
        self.entries.push(match kind {
            PbHandlerKind::Counter => Entry::Counter(counter::CounterState::new(constraint)),
            PbHandlerKind::Pueblo => Entry::Pueblo(pueblo::PuebloState::new(constraint)),
        });
        pr
    }

    pub fn constraint(&self, pr: PbRef) -> &PbConstraint {
        match &self.entries[pr.0] {
            Entry::Counter(c) => c.constraint(),
            Entry::Pueblo(p) => p.constraint(),
        }
    }

    /// Constraints that mention `lit` (in either polarity), to be
    /// re-examined after `lit`'s variable changes value.
    pub fn touched_by(&self, lit: Lit) -> &[PbRef] {
        self.by_lit.get(lit).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn propagate(&mut self, pr: PbRef, assigns: &Assignment) -> PbPropagateResult {
        match &mut self.entries[pr.0] {
            Entry::Counter(c) => match c.propagate(assigns) {
                counter::PbPropagateResult::Unchanged => PbPropagateResult::Unchanged,
                counter::PbPropagateResult::Forced(f) => PbPropagateResult::Forced(f),
                counter::PbPropagateResult::Conflict => PbPropagateResult::Conflict,
            },
            Entry::Pueblo(p) => match p.propagate(assigns) {
                pueblo::PbPropagateResult::Unchanged => PbPropagateResult::Unchanged,
                pueblo::PbPropagateResult::Forced(f) => PbPropagateResult::Forced(f),
                pueblo::PbPropagateResult::Conflict => PbPropagateResult::Conflict,
            },
        }
    }

    pub fn reason_clause(&self, pr: PbRef, forced_lit: Lit, assigns: &Assignment) -> Vec<Lit> {
        match &self.entries[pr.0] {
            Entry::Counter(c) => c.reason_clause(forced_lit, assigns),
            Entry::Pueblo(p) => p.reason_clause(forced_lit, assigns),
        }
    }

    pub fn resync_all(&mut self, assigns: &Assignment) {
        for e in &mut self.entries {
            if let Entry::Counter(c) = e {
                c.resync(assigns);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
