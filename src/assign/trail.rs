//! The assignment trail and the two-watched-literal unit propagator.
use crate::cdb::watch::{WatchEntry, WatchListIF};
use crate::cdb::{ClauseDb, CompactionMap};
use crate::types::{Antecedent, ClauseId, DecisionLevel, Lit, TruthValue, VarId};

use super::heap::VarActivityHeap;

/// Why propagation stopped: the two ways a literal assignment can
/// contradict another already on the trail.
#[derive(Clone, Copy, Debug)]
pub enum Conflict {
    Binary(Lit, Lit),
    Clause(ClauseId),
}

/// Assignment stack: a flat trail of literals in assignment order, a
/// per-level start-index table, and the BCP propagation pointer. Grounded
/// on the teacher's `AssignStack` (`trail`/`trail_lim`/`q_head`/
/// `cancel_until`), generalized to the four-valued `TruthValue` and the
/// tagged `Antecedent` this specification's data model requires.
pub struct Trail {
    values: Vec<TruthValue>,
    levels: Vec<DecisionLevel>,
    antecedents: Vec<Antecedent>,
    trail: Vec<Lit>,
    /// `level_index[d]` is the trail position where decision level `d` begins.
    level_index: Vec<usize>,
    q_head: usize,
    /// Dedicated mark bitset for conflict analysis; never packed into
    /// `Antecedent`.
    seen: Vec<bool>,
}

impl Trail {
    pub fn new(num_vars: usize) -> Trail {
        let mut t = Trail {
            values: vec![TruthValue::UndefTrue; num_vars + 1],
            levels: vec![0; num_vars + 1],
            antecedents: vec![Antecedent::Decision; num_vars + 1],
            trail: Vec::with_capacity(num_vars),
            level_index: vec![0],
            q_head: 0,
            seen: vec![false; num_vars + 1],
        };
        t.enqueue(Lit::new(0, false), Antecedent::Unit);
        t
    }

    pub fn ensure_vars(&mut self, num_vars: usize) {
        if self.values.len() <= num_vars {
            self.values.resize(num_vars + 1, TruthValue::UndefTrue);
            self.levels.resize(num_vars + 1, 0);
            self.antecedents.resize(num_vars + 1, Antecedent::Decision);
            self.seen.resize(num_vars + 1, false);
        }
    }

    #[inline]
    pub fn value(&self, v: VarId) -> TruthValue {
        self.values[v]
    }

    #[inline]
    pub fn is_assigned(&self, v: VarId) -> bool {
        self.values[v].is_assigned()
    }

    pub fn num_vars(&self) -> usize {
        self.values.len() - 1
    }

    /// Directly set a variable's value outside the normal trail sequence.
    /// Used only by model extension (SPEC_FULL.md §4.10) to recover the
    /// value of a variable tagged *pure*/*elim*/*subst*, which was never
    /// pushed onto the trail in the first place.
    pub fn set_extension_value(&mut self, v: VarId, value: bool) {
        self.values[v] = TruthValue::assign(value);
    }

    /// Tag a variable as removed from consideration by preprocessing
    /// (`Antecedent::Elim` or `Antecedent::Subst`). The variable is left
    /// unassigned — its value is synthesised later at model extension —
    /// so callers must also drop it from the decision heap themselves.
    pub fn mark_eliminated(&mut self, v: VarId, ante: Antecedent) {
        debug_assert!(matches!(ante, Antecedent::Elim | Antecedent::Subst(_)));
        self.antecedents[v] = ante;
    }

    #[inline]
    pub fn value_of(&self, l: Lit) -> Option<bool> {
        self.values[l.vi()].value_of(l)
    }

    #[inline]
    pub fn level(&self, v: VarId) -> DecisionLevel {
        self.levels[v]
    }

    #[inline]
    pub fn antecedent(&self, v: VarId) -> Antecedent {
        self.antecedents[v]
    }

    #[inline]
    pub fn decision_level(&self) -> DecisionLevel {
        (self.level_index.len() - 1) as DecisionLevel
    }

    #[inline]
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }

    #[inline]
    pub fn level_start(&self, level: DecisionLevel) -> usize {
        self.level_index[level as usize]
    }

    /// Position of the BCP propagation pointer, for callers that want to
    /// measure how many literals one `propagate` call actually dequeued.
    #[inline]
    pub fn head(&self) -> usize {
        self.q_head
    }

    pub fn new_decision_level(&mut self) {
        self.level_index.push(self.trail.len());
    }

    pub fn enqueue(&mut self, l: Lit, ante: Antecedent) {
        let v = l.vi();
        debug_assert!(!self.values[v].is_assigned());
        self.values[v] = TruthValue::assign(l.is_positive());
        self.levels[v] = self.decision_level();
        self.antecedents[v] = ante;
        self.trail.push(l);
    }

    /// Undo every assignment made above `level`, returning freed variables
    /// to the activity heap so they're eligible for the next decision.
    pub fn backtrack_to(&mut self, level: DecisionLevel, heap: &mut VarActivityHeap) {
        if self.decision_level() <= level {
            return;
        }
        let cut = self.level_index[level as usize + 1];
        for idx in (cut..self.trail.len()).rev() {
            let v = self.trail[idx].vi();
            self.values[v] = self.values[v].unassign();
            heap.insert(v);
        }
        self.trail.truncate(cut);
        self.level_index.truncate(level as usize + 1);
        self.q_head = self.trail.len();
    }

    /// Fix up every `Antecedent::Clause` on the trail after a `ClauseDb`
    /// compaction. Only currently-assigned variables are touched: an
    /// unassigned variable's `antecedents` slot is stale leftover from its
    /// last assignment (`backtrack_to` doesn't clear it) and may name a
    /// clause that was never locked and is long gone. Locked clauses are
    /// exactly the ones a compacting GC must never drop, so every remap
    /// entry a currently-assigned variable's antecedent needs is guaranteed
    /// to be `Some`.
    pub fn remap_clause_antecedents(&mut self, remap: &CompactionMap) {
        for v in 0..self.values.len() {
            if !self.values[v].is_assigned() {
                continue;
            }
            if let Antecedent::Clause(cid) = &mut self.antecedents[v] {
                *cid = remap[*cid].expect("locked clause must survive compaction");
            }
        }
    }

    pub fn is_marked(&self, v: VarId) -> bool {
        self.seen[v]
    }
    pub fn mark(&mut self, v: VarId) {
        self.seen[v] = true;
    }
    pub fn unmark(&mut self, v: VarId) {
        self.seen[v] = false;
    }

    /// Run unit propagation from the current queue head to the top of the
    /// trail. On conflict, the watch list under scan is left intact apart
    /// from entries already rewritten to point elsewhere.
    ///
    /// Registration/scan convention (matches the original source this
    /// specification is drawn from, not the teacher's own mirrored
    /// convention): a clause or binary pair is registered under the watch
    /// list of its own watched literal; on literal `l` becoming true,
    /// propagation scans the watch list of `¬l`.
    pub fn propagate(&mut self, cdb: &mut ClauseDb) -> Option<Conflict> {
        while self.q_head < self.trail.len() {
            let l = self.trail[self.q_head];
            self.q_head += 1;
            let falsum = !l;
            let mut list = cdb.take_watches(falsum);
            let mut i = 0;
            let mut conflict = None;
            while i < list.len() {
                match list[i] {
                    WatchEntry::Binary(other) => match self.value_of(other) {
                        Some(true) => i += 1,
                        Some(false) => {
                            conflict = Some(Conflict::Binary(falsum, other));
                            break;
                        }
                        None => {
                            self.enqueue(other, Antecedent::Binary(falsum));
                            i += 1;
                        }
                    },
                    WatchEntry::Clause { cid, blocker } => {
                        if self.value_of(blocker) == Some(true) {
                            i += 1;
                            continue;
                        }
                        {
                            let c = cdb.get_mut(cid);
                            if c.lits[0] == falsum {
                                c.lits.swap(0, 1);
                            }
                        }
                        let other = cdb.get(cid).lits[0];
                        if other != blocker && self.value_of(other) == Some(true) {
                            list[i] = WatchEntry::Clause { cid, blocker: other };
                            i += 1;
                            continue;
                        }
                        let mut replacement = None;
                        {
                            let c = cdb.get_mut(cid);
                            for k in 2..c.lits.len() {
                                if self.value_of(c.lits[k]) != Some(false) {
                                    replacement = Some(k);
                                    break;
                                }
                            }
                            if let Some(k) = replacement {
                                c.lits.swap(1, k);
                            }
                        }
                        if let Some(_) = replacement {
                            let new_watch_lit = cdb.get(cid).lits[1];
                            cdb.watches_mut(new_watch_lit).register_clause(cid, other);
                            list.swap_remove(i);
                        } else if self.value_of(other) == Some(false) {
                            conflict = Some(Conflict::Clause(cid));
                            break;
                        } else {
                            self.enqueue(other, Antecedent::Clause(cid));
                            i += 1;
                        }
                    }
                }
            }
            cdb.restore_watches(falsum, list);
            if conflict.is_some() {
                return conflict;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdb::ClauseDb;

    fn lit(i: i32) -> Lit {
        Lit::from(i)
    }

    #[test]
    fn var_zero_is_true_at_level_zero() {
        let t = Trail::new(4);
        assert_eq!(t.value(0), TruthValue::True);
        assert_eq!(t.level(0), 0);
    }

    #[test]
    fn enqueue_and_backtrack_round_trip() {
        let mut heap = VarActivityHeap::new(4, 0.95);
        let mut t = Trail::new(4);
        t.enqueue(lit(1), Antecedent::Decision);
        t.new_decision_level();
        t.enqueue(lit(2), Antecedent::Decision);
        assert_eq!(t.decision_level(), 1);
        assert_eq!(t.value_of(lit(2)), Some(true));
        t.backtrack_to(0, &mut heap);
        assert_eq!(t.decision_level(), 0);
        assert_eq!(t.value_of(lit(2)), None);
        assert_eq!(t.value_of(lit(1)), Some(true));
    }

    #[test]
    fn propagation_chain() {
        let mut cdb = ClauseDb::new(4);
        cdb.add_problem(vec![!lit(1), lit(2)]);
        cdb.add_problem(vec![!lit(2), lit(3)]);
        cdb.add_problem(vec![!lit(3), lit(4)]);
        let mut t = Trail::new(4);
        t.enqueue(lit(1), Antecedent::Decision);
        assert!(t.propagate(&mut cdb).is_none());
        assert_eq!(t.value_of(lit(2)), Some(true));
        assert_eq!(t.value_of(lit(3)), Some(true));
        assert_eq!(t.value_of(lit(4)), Some(true));
    }

    #[test]
    fn binary_conflict_detected() {
        let mut cdb = ClauseDb::new(2);
        cdb.add_problem(vec![!lit(1), lit(2)]);
        cdb.add_problem(vec![!lit(1), !lit(2)]);
        let mut t = Trail::new(2);
        t.enqueue(lit(2), Antecedent::Decision);
        t.enqueue(lit(1), Antecedent::Decision);
        assert!(matches!(t.propagate(&mut cdb), Some(Conflict::Binary(_, _))));
    }
}
