//! Owns the clause arena plus the bookkeeping needed to add, learn and
//! periodically reduce clauses: activity bumping/decay and a `reduce`
//! pass that drops low-activity learnt clauses. Grounded on the teacher's
//! `search::clause_db::ClauseDB`, minus its `unsafe` retain helper.
use crate::formula::assignment::Assignment;
use crate::formula::clause::{calc_abstraction, Clause, ClauseAllocator, ClauseKind, ClauseRef};
use crate::formula::Lit;

use super::watches::Watches;

#[derive(Copy, Clone, Debug)]
pub struct ClauseDbSettings {
    pub clause_decay: f64,
}

impl Default for ClauseDbSettings {
    fn default() -> Self {
        ClauseDbSettings { clause_decay: 0.999 }
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct ClauseDbStats {
    pub n_original: usize,
    pub n_learnt: usize,
}

pub struct ClauseDb {
    settings: ClauseDbSettings,
    allocator: ClauseAllocator,
    activity_inc: f64,
    stats: ClauseDbStats,
}

impl ClauseDb {
    pub fn new(settings: ClauseDbSettings) -> ClauseDb {
        ClauseDb {
            settings,
            allocator: ClauseAllocator::new(),
            activity_inc: 1.0,
            stats: ClauseDbStats::default(),
        }
    }

    pub fn allocator(&self) -> &ClauseAllocator {
        &self.allocator
    }

    pub fn allocator_mut(&mut self) -> &mut ClauseAllocator {
        &mut self.allocator
    }

    pub fn view(&self, cr: ClauseRef) -> &Clause {
        self.allocator.view(cr)
    }

    pub fn stats(&self) -> ClauseDbStats {
        self.stats
    }

    /// Adds an originally asserted clause (of 2+ literals; unit/empty
    /// clauses are handled by the caller before reaching here) and starts
    /// watching it.
    pub fn add_clause(&mut self, lits: Vec<Lit>, watches: &mut Watches) -> ClauseRef {
        let abstraction = calc_abstraction(&lits);
        let cr = self.allocator.alloc(lits, ClauseKind::Original { abstraction });
        watches.watch_clause(&self.allocator, cr);
        self.stats.n_original += 1;
        cr
    }

    /// Adds a clause learnt from conflict analysis, watching its two
    /// highest-decision-level literals (the caller is expected to have
    /// already ordered `lits` so the asserting literal is first and the
    /// second-highest level literal is second, per 1-UIP backtracking).
    pub fn learn_clause(&mut self, lits: Vec<Lit>, watches: &mut Watches) -> ClauseRef {
        let cr = self.allocator.alloc(lits, ClauseKind::Learnt { activity: 0.0 });
        if self.allocator.view(cr).len() >= 2 {
            watches.watch_clause(&self.allocator, cr);
        }
        self.bump_activity(cr);
        self.stats.n_learnt += 1;
        cr
    }

    pub fn bump_activity(&mut self, cr: ClauseRef) {
        let inc = self.activity_inc;
        self.allocator.edit(cr).bump_activity(inc);
        if self.allocator.view(cr).activity() > 1e20 {
            self.rescale_activity();
        }
    }

    fn rescale_activity(&mut self) {
        let refs: Vec<ClauseRef> = self.allocator.iter_refs().collect();
        for cr in refs {
            if let ClauseKind::Learnt { .. } = self.allocator.view(cr).header() {
                let scaled = self.allocator.view(cr).activity() * 1e-20;
                self.allocator
                    .edit(cr)
                    .set_header(ClauseKind::Learnt { activity: scaled });
            }
        }
        self.activity_inc *= 1e-20;
    }

    pub fn decay_activity(&mut self) {
        self.activity_inc /= self.settings.clause_decay;
    }

    /// Deletes learnt clauses below the activity threshold implied by
    /// `keep_fraction` of the current learnt count, never touching clauses
    /// that are the reason for some assignment still on the trail (locked
    /// clauses) or original clauses.
    pub fn reduce(&mut self, keep_fraction: f64, assigns: &Assignment, watches: &mut Watches) {
        let mut learnt: Vec<ClauseRef> = self
            .allocator
            .iter_refs()
            .filter(|&cr| self.allocator.view(cr).is_learnt())
            .collect();
        learnt.sort_by(|&a, &b| {
            self.allocator.view(a).activity().partial_cmp(&self.allocator.view(b).activity()).unwrap()
        });

        let n_remove = ((learnt.len() as f64) * (1.0 - keep_fraction)) as usize;
        for &cr in learnt.iter().take(n_remove) {
            let clause = self.allocator.view(cr);
            if clause.len() >= 2 && !self.locked(cr, assigns) {
                watches.unwatch_clause(&self.allocator, cr);
                self.allocator.free(cr);
                self.stats.n_learnt -= 1;
            }
        }
    }

    fn locked(&self, cr: ClauseRef, assigns: &Assignment) -> bool {
        let clause = self.allocator.view(cr);
        if clause.len() == 0 {
            return false;
        }
        assigns.is_locked_by(clause[0].var(), cr)
    }

    /// Compacts the arena, dropping every freed/satisfied-at-ground-level
    /// clause, and remaps watch lists and the trail's stored reasons
    /// through the relocation, via `reloc_cb`.
    pub fn gc<R: FnMut(ClauseRef, ClauseRef)>(&mut self, mut reloc_cb: R) {
        self.allocator.gc(|_| true, |old, new| reloc_cb(old, new));
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
    fn add_clause_registers_watchers() {
        let mut db = ClauseDb::new(ClauseDbSettings::default());
        let mut w = Watches::new();
        let cr = db.add_clause(vec![v(0).pos_lit(), v(1).pos_lit()], &mut w);
        assert_eq!(db.stats().n_original, 1);
        assert!(db.view(cr).len() == 2);
    }

    #[test]
    fn decay_then_bump_grows_activity_increment() {
        let mut db = ClauseDb::new(ClauseDbSettings::default());
        let mut w = Watches::new();
        let cr = db.learn_clause(vec![v(0).pos_lit()], &mut w);
        let before = db.view(cr).activity();
        db.decay_activity();
        db.bump_activity(cr);
        assert!(db.view(cr).activity() > before);
    }
}
