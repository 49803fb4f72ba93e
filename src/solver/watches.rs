//! Two-literal watched propagation over the clause arena. Grounded on the
//! teacher's `formula::clause`-based watch lists, but deliberately avoids
//! the `unsafe` pointer juggling of the teacher's `search::watches`
//! variant: the watch list for a literal is swapped out of the map while
//! it's being processed and swapped back in, so the borrow checker sees a
//! plain `&mut Vec`.
use crate::formula::assignment::{Assignment, LitVal};
use crate::formula::clause::{ClauseAllocator, ClauseRef};
use crate::formula::index_map::LitMap;
use crate::formula::Lit;

#[derive(Copy, Clone)]
struct Watcher {
    clause: ClauseRef,
    /// A literal of the clause other than the two watched ones, cached so
    /// propagation can skip straight to "already satisfied" without
    /// touching the clause's storage.
    blocker: Lit,
}

pub struct Watches {
    watchers: LitMap<Vec<Watcher>>,
}

pub enum PropagateResult {
    Ok,
    Conflict(ClauseRef),
}

impl Watches {
    pub fn new() -> Watches {
        Watches {
            watchers: LitMap::new(),
        }
    }

    pub fn init_var(&mut self, lit: Lit) {
        self.watchers.insert(lit, Vec::new());
    }

    /// Registers a freshly allocated clause with at least two literals: it
    /// watches `lits[0]` and `lits[1]`.
    pub fn watch_clause(&mut self, db: &ClauseAllocator, cr: ClauseRef) {
        let clause = db.view(cr);
        debug_assert!(clause.len() >= 2);
        let l0 = clause[0];
        let l1 = clause[1];
        self.add_watcher(!l0, Watcher { clause: cr, blocker: l1 });
        self.add_watcher(!l1, Watcher { clause: cr, blocker: l0 });
    }

    fn add_watcher(&mut self, lit: Lit, w: Watcher) {
        self.watchers.entry_or_default(lit).push(w);
    }

    pub fn unwatch_clause(&mut self, db: &ClauseAllocator, cr: ClauseRef) {
        let clause = db.view(cr);
        let l0 = clause[0];
        let l1 = clause[1];
        self.remove_watcher(!l0, cr);
        self.remove_watcher(!l1, cr);
    }

    fn remove_watcher(&mut self, lit: Lit, cr: ClauseRef) {
        if let Some(v) = self.watchers.get_mut(lit) {
            v.retain(|w| w.clause != cr);
        }
    }

    /// Propagates the fact that `p` was just assigned true: clauses are
    /// filed under the negation of their watched literal (see
    /// `watch_clause`), so the list to walk is `watchers[p]`, each entry of
    /// which has its watched literal `!p` just falsified. Re-watches each
    /// clause on a non-false literal where possible, assigns a forced unit
    /// literal via `enqueue`, or reports the clause as a conflict.
    ///
    /// On conflict, every watcher not yet examined (including the
    /// conflicting one) is kept under `p` exactly as `minisat`'s own
    /// `propagate` leaves the remainder of the list untouched; the caller
    /// backtracks before propagation resumes, which re-establishes the
    /// loop invariant.
    pub fn propagate<E: FnMut(Lit, ClauseRef) -> bool>(
        &mut self,
        db: &mut ClauseAllocator,
        assigns: &Assignment,
        p: Lit,
        mut enqueue: E,
    ) -> PropagateResult {
        let false_lit = !p;
        let list = self.watchers.remove(p).unwrap_or_default();
        let mut kept: Vec<Watcher> = Vec::with_capacity(list.len());
        let mut conflict = None;

        let mut iter = list.into_iter();
        while let Some(w) = iter.next() {
            if conflict.is_some() {
                kept.push(w);
                continue;
            }

            if assigns.of_lit(w.blocker) == LitVal::True {
                kept.push(w);
                continue;
            }

            let clause = db.edit(w.clause);
            if clause[0] == false_lit {
                clause.lits_mut().swap(0, 1);
            }
            let new_blocker = clause[0];
            if new_blocker != w.blocker && assigns.of_lit(new_blocker) == LitVal::True {
                kept.push(Watcher {
                    clause: w.clause,
                    blocker: new_blocker,
                });
                continue;
            }

            let mut replaced = false;
            for k in 2..clause.len() {
                if assigns.of_lit(clause[k]) != LitVal::False {
                    clause.lits_mut().swap(1, k);
                    let new_watch = !clause[1];
                    self.add_watcher(
                        new_watch,
                        Watcher {
                            clause: w.clause,
                            blocker: new_blocker,
                        },
                    );
                    replaced = true;
                    break;
                }
            }
            if replaced {
                continue;
            }

            // No replacement watch: unit-propagate or conflict.
            let w = Watcher {
                clause: w.clause,
                blocker: new_blocker,
            };
            if assigns.of_lit(new_blocker) == LitVal::False {
                kept.push(w);
                conflict = Some(w.clause);
            } else if enqueue(new_blocker, w.clause) {
                kept.push(w);
            } else {
                kept.push(w);
                conflict = Some(w.clause);
            }
        }

        for w in kept {
            self.add_watcher(p, w);
        }

        match conflict {
            Some(cr) => PropagateResult::Conflict(cr),
            None => PropagateResult::Ok,
        }
    }

    pub fn clear(&mut self, lit: Lit) {
        if let Some(v) = self.watchers.get_mut(lit) {
            v.clear();
        }
    }
}
