//! VSIDS activity-based variable selection plus phase saving, grounded on
//! the teacher's `search::decision_heuristic::DecisionHeuristic`.
use crate::formula::assignment::Assignment;
use crate::formula::index_map::{VarHeap, VarMap};
use crate::formula::Var;

use super::random::Random;

#[derive(Copy, Clone, Debug)]
pub enum PhaseSaving {
    None,
    Limited,
    Full,
}

impl Default for PhaseSaving {
    fn default() -> Self {
        PhaseSaving::Full
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DecisionHeuristicSettings {
    pub var_decay: f64,
    pub random_var_freq: f64,
    pub random_seed: f64,
    pub phase_saving: PhaseSaving,
    pub rnd_init_act: bool,
}

impl Default for DecisionHeuristicSettings {
    fn default() -> Self {
        DecisionHeuristicSettings {
            var_decay: 0.95,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            phase_saving: PhaseSaving::default(),
            rnd_init_act: false,
        }
    }
}

pub struct DecisionHeuristic {
    settings: DecisionHeuristicSettings,
    activity: VarMap<f64>,
    activity_inc: f64,
    order: VarHeap,
    random: Random,
}

impl DecisionHeuristic {
    pub fn new(settings: DecisionHeuristicSettings) -> DecisionHeuristic {
        let seed = settings.random_seed;
        DecisionHeuristic {
            settings,
            activity: VarMap::new(),
            activity_inc: 1.0,
            order: VarHeap::new(),
            random: Random::new(seed),
        }
    }

    pub fn add_var(&mut self, v: Var) {
        let initial = if self.settings.rnd_init_act {
            self.random.drand() * 0.00001
        } else {
            0.0
        };
        self.activity.insert(v, initial);
        self.insert_var_order(v);
    }

    fn gt(&self, a: Var, b: Var) -> bool {
        self.activity[a] > self.activity[b]
    }

    pub fn insert_var_order(&mut self, v: Var) {
        let activity = &self.activity;
        self.order.insert(v, |a, b| activity[a] > activity[b]);
    }

    pub fn bump_activity(&mut self, v: Var) {
        let bumped = self.activity[v] + self.activity_inc;
        self.activity.insert(v, bumped);
        if bumped > 1e100 {
            self.rescale_activity();
        }
        if self.order.contains(v) {
            let activity = &self.activity;
            self.order.update(v, |a, b| activity[a] > activity[b]);
        }
    }

    fn rescale_activity(&mut self) {
        for (_, act) in self.activity.iter_mut() {
            *act *= 1e-100;
        }
        self.activity_inc *= 1e-100;
    }

    pub fn decay_activity(&mut self) {
        self.activity_inc /= self.settings.var_decay;
    }

    /// Saves the polarity a variable had right before it was unassigned, so
    /// `pick_branch_lit` can resume from it (phase saving); this is a
    /// no-op hook point because `Assignment` itself already records the
    /// saved polarity on rewind — kept here for settings-driven override.
    pub fn on_unassigned(&mut self, _v: Var) {}

    /// Picks the next undecided variable by highest activity, breaking ties
    /// with insertion order (handled by the heap), or `None` if every
    /// variable is already assigned.
    pub fn pick_branch_var(&mut self, assigns: &Assignment) -> Option<Var> {
        loop {
            let activity = &self.activity;
            let v = self.order.pop(|a, b| activity[a] > activity[b])?;
            if assigns.is_undef(v) {
                return Some(v);
            }
        }
    }

    /// Combines `pick_branch_var` with polarity selection: random with
    /// probability `random_var_freq`, else the saved polarity per
    /// `phase_saving`, defaulting to negative (MiniSat's convention).
    pub fn pick_branch_lit(&mut self, assigns: &Assignment) -> Option<crate::formula::Lit> {
        let v = if self.settings.random_var_freq > 0.0
            && self.random.chance(self.settings.random_var_freq)
            && assigns.n_vars() > 0
        {
            let idx = self.random.irand(assigns.n_vars() as u32) as usize;
            let candidate = Var::from_index(idx);
            if assigns.is_undef(candidate) {
                Some(candidate)
            } else {
                self.pick_branch_var(assigns)
            }
        } else {
            self.pick_branch_var(assigns)
        }?;

        let sign = match self.settings.phase_saving {
            PhaseSaving::None => false,
            PhaseSaving::Limited | PhaseSaving::Full => assigns.saved_polarity(v),
        };
        Some(v.lit(sign))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bumping_activity_reorders_heap() {
        let mut dh = DecisionHeuristic::new(DecisionHeuristicSettings::default());
        let mut assigns = Assignment::new();
        for _ in 0..3 {
            let v = assigns.new_var();
            dh.add_var(v);
        }
        let v2 = Var::from_index(2);
        dh.bump_activity(v2);
        dh.bump_activity(v2);
        let picked = dh.pick_branch_var(&assigns);
        assert_eq!(picked, Some(v2));
    }

    #[test]
    fn pick_branch_var_skips_assigned_variables() {
        let mut dh = DecisionHeuristic::new(DecisionHeuristicSettings::default());
        let mut assigns = Assignment::new();
        let v0 = assigns.new_var();
        let v1 = assigns.new_var();
        dh.add_var(v0);
        dh.add_var(v1);
        dh.bump_activity(v0);
        assigns.assign_lit(v0.pos_lit(), None);
        assert_eq!(dh.pick_branch_var(&assigns), Some(v1));
    }
}
