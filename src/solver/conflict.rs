//! 1-UIP conflict analysis (SPEC_FULL.md §4.6): derive a learned clause from
//! a propagation conflict, minimize it, and compute the level to backjump to
//! plus its LBD. Grounded on the teacher's `conflict_analyze`/`minimize_learnt`/
//! `Lit::is_redundant`, stripped of chronological backtracking, reward-side
//! activity bumping, and DRAT emission (none of which this specification
//! carries).
use std::collections::{HashMap, HashSet};

use crate::assign::{Conflict, Trail, VarActivityHeap};
use crate::cdb::watch::WatchEntry;
use crate::cdb::ClauseDb;
use crate::types::{Antecedent, ClauseId, DecisionLevel, Lit, VarId, NULL_LIT};

/// Ternary memo for recursive minimization, indexed by variable. Preserved
/// across literals of the same learned clause but reset (not reallocated)
/// once minimization of that clause finishes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum MinTag {
    NotSeen,
    Implied,
    NotImplied,
}

/// Scratch state reused across conflicts, per SPEC_FULL.md §9's rule against
/// reallocating per-operation buffers.
pub struct Analyzer {
    min_cache: Vec<MinTag>,
    min_to_clear: Vec<VarId>,
    marked: Vec<VarId>,
}

impl Analyzer {
    pub fn new(num_vars: usize) -> Analyzer {
        Analyzer {
            min_cache: vec![MinTag::NotSeen; num_vars + 1],
            min_to_clear: Vec::new(),
            marked: Vec::new(),
        }
    }

    pub fn ensure_vars(&mut self, num_vars: usize) {
        if self.min_cache.len() <= num_vars {
            self.min_cache.resize(num_vars + 1, MinTag::NotSeen);
        }
    }
}

/// Resolve `q` into the in-progress learned clause: first sighting of its
/// variable bumps activity and either counts toward the current level's
/// unresolved path, or is filed directly into the learned-clause buffer.
fn mark_literal(
    q: Lit,
    dl: DecisionLevel,
    trail: &mut Trail,
    heap: &mut VarActivityHeap,
    learnt: &mut Vec<Lit>,
    marked: &mut Vec<VarId>,
    path_cnt: &mut usize,
) {
    let v = q.vi();
    if v == 0 || trail.is_marked(v) {
        return;
    }
    let lvl = trail.level(v);
    if lvl == 0 {
        return;
    }
    trail.mark(v);
    marked.push(v);
    heap.bump(v);
    if lvl == dl {
        *path_cnt += 1;
    } else {
        learnt.push(q);
    }
}

/// Run 1-UIP analysis over a fresh conflict. Returns the minimized learned
/// clause and its LBD; the caller still owes it a backtrack level (see
/// `backtrack_level`) and installation (see `install`).
pub fn analyze_conflict(
    analyzer: &mut Analyzer,
    trail: &mut Trail,
    cdb: &mut ClauseDb,
    heap: &mut VarActivityHeap,
    conflict: Conflict,
) -> (Vec<Lit>, usize) {
    let dl = trail.decision_level();
    let mut learnt: Vec<Lit> = vec![NULL_LIT];
    let mut path_cnt = 0usize;
    analyzer.marked.clear();

    match conflict {
        Conflict::Binary(a, b) => {
            mark_literal(a, dl, trail, heap, &mut learnt, &mut analyzer.marked, &mut path_cnt);
            mark_literal(b, dl, trail, heap, &mut learnt, &mut analyzer.marked, &mut path_cnt);
        }
        Conflict::Clause(cid) => {
            if cdb.get(cid).is_learnt() {
                cdb.bump_learned_activity(cid);
            }
            let lits = cdb.get(cid).lits.clone();
            for &q in &lits {
                mark_literal(q, dl, trail, heap, &mut learnt, &mut analyzer.marked, &mut path_cnt);
            }
        }
    }

    let mut idx = trail.trail().len();
    let mut p = NULL_LIT;
    loop {
        loop {
            idx -= 1;
            if trail.is_marked(trail.trail()[idx].vi()) {
                break;
            }
        }
        p = trail.trail()[idx];
        path_cnt -= 1;
        if path_cnt == 0 {
            break;
        }
        match trail.antecedent(p.vi()) {
            Antecedent::Binary(other) => {
                mark_literal(other, dl, trail, heap, &mut learnt, &mut analyzer.marked, &mut path_cnt);
            }
            Antecedent::Clause(cid) => {
                if cdb.get(cid).is_learnt() {
                    cdb.bump_learned_activity(cid);
                }
                let lits = cdb.get(cid).lits.clone();
                for &q in &lits[1..] {
                    mark_literal(q, dl, trail, heap, &mut learnt, &mut analyzer.marked, &mut path_cnt);
                }
            }
            Antecedent::Stacked(_) => unreachable!("diving is not implemented; no antecedent is ever tagged Stacked"),
            other => unreachable!("unexpected antecedent above level 0 on the trail: {:?}", other),
        }
    }
    learnt[0] = !p;

    for &v in &analyzer.marked {
        trail.unmark(v);
    }

    minimize(&mut learnt, trail, cdb, &mut analyzer.min_cache, &mut analyzer.min_to_clear);
    for v in analyzer.min_to_clear.drain(..) {
        analyzer.min_cache[v] = MinTag::NotSeen;
    }
    minimize_binary(&mut learnt, cdb);

    let lbd = compute_lbd(&learnt, trail);
    (learnt, lbd)
}

/// Drop every non-UIP literal implied by other literals already in the
/// clause (SPEC_FULL.md §4.6, "Minimization").
fn minimize(learnt: &mut Vec<Lit>, trail: &Trail, cdb: &ClauseDb, cache: &mut Vec<MinTag>, to_clear: &mut Vec<VarId>) {
    let mut i = 1;
    while i < learnt.len() {
        if is_redundant(learnt[i], trail, cdb, cache, to_clear) {
            learnt.swap_remove(i);
        } else {
            i += 1;
        }
    }
}

/// Predecessors of `v` in the implication graph: the other literals of its
/// antecedent (empty for antecedents with none to chase).
fn predecessors(v: VarId, trail: &Trail, cdb: &ClauseDb) -> Vec<Lit> {
    match trail.antecedent(v) {
        Antecedent::Unit | Antecedent::Pure => Vec::new(),
        Antecedent::Binary(other) => vec![other],
        Antecedent::Clause(cid) => cdb.get(cid).lits[1..].to_vec(),
        other => unreachable!("unexpected antecedent above level 0 during minimization: {:?}", other),
    }
}

/// Is `seed` implied by literals already seen (directly or transitively,
/// through non-decision antecedents)? Explicit-stack post-order DFS per
/// SPEC_FULL.md §9's ban on recursion scaling with variable count; each
/// stack frame is a variable whose predecessors are being drained left to
/// right, so a failure found partway through poisons exactly its current
/// ancestor chain, not every variable visited so far.
fn is_redundant(seed: Lit, trail: &Trail, cdb: &ClauseDb, cache: &mut Vec<MinTag>, to_clear: &mut Vec<VarId>) -> bool {
    if trail.level(seed.vi()) == 0 || trail.is_marked(seed.vi()) {
        return true;
    }
    match cache[seed.vi()] {
        MinTag::Implied => return true,
        MinTag::NotImplied => return false,
        MinTag::NotSeen => {}
    }
    if matches!(trail.antecedent(seed.vi()), Antecedent::Decision) {
        cache[seed.vi()] = MinTag::NotImplied;
        to_clear.push(seed.vi());
        return false;
    }

    struct Frame {
        v: VarId,
        preds: Vec<Lit>,
        next: usize,
    }
    let mut stack = vec![Frame {
        v: seed.vi(),
        preds: predecessors(seed.vi(), trail, cdb),
        next: 0,
    }];

    'frames: while let Some(frame) = stack.last_mut() {
        while frame.next < frame.preds.len() {
            let q = frame.preds[frame.next];
            frame.next += 1;
            let qv = q.vi();
            if trail.level(qv) == 0 || trail.is_marked(qv) {
                continue;
            }
            match cache[qv] {
                MinTag::Implied => continue,
                MinTag::NotImplied => {
                    for f in stack.drain(..) {
                        cache[f.v] = MinTag::NotImplied;
                        to_clear.push(f.v);
                    }
                    return false;
                }
                MinTag::NotSeen => {
                    if matches!(trail.antecedent(qv), Antecedent::Decision) {
                        for f in stack.drain(..) {
                            cache[f.v] = MinTag::NotImplied;
                            to_clear.push(f.v);
                        }
                        cache[qv] = MinTag::NotImplied;
                        to_clear.push(qv);
                        return false;
                    }
                    stack.push(Frame {
                        v: qv,
                        preds: predecessors(qv, trail, cdb),
                        next: 0,
                    });
                    continue 'frames;
                }
            }
        }
        cache[frame.v] = MinTag::Implied;
        to_clear.push(frame.v);
        stack.pop();
    }
    true
}

/// Second minimization pass (SPEC_FULL.md §4.6, "Binary-clause
/// minimization"): a non-UIP literal `l` is redundant if the binary clause
/// `{l0, ¬l}` exists, since resolving it away with that clause leaves `l0`
/// (already present) in its place.
fn minimize_binary(learnt: &mut Vec<Lit>, cdb: &ClauseDb) {
    if learnt.len() <= 1 || learnt.len() >= 30 {
        return;
    }
    let l0 = learnt[0];
    let lit_for_var: HashMap<VarId, Lit> = learnt[1..].iter().map(|&l| (l.vi(), l)).collect();
    let mut drop: HashSet<VarId> = HashSet::new();
    for entry in cdb.watches(l0) {
        if let WatchEntry::Binary(other) = *entry {
            if let Some(&l) = lit_for_var.get(&other.vi()) {
                if l == !other {
                    drop.insert(l.vi());
                }
            }
        }
    }
    if !drop.is_empty() {
        learnt.retain(|&l| l == l0 || !drop.contains(&l.vi()));
    }
}

/// Number of distinct decision levels among the learned literals, via a
/// transient level-tagged map (SPEC_FULL.md §4.6, "LBD").
fn compute_lbd(learnt: &[Lit], trail: &Trail) -> usize {
    let dl = trail.decision_level() as usize;
    let mut seen_level = vec![false; dl + 1];
    let mut count = 0;
    for &l in learnt {
        let lv = trail.level(l.vi()) as usize;
        if !seen_level[lv] {
            seen_level[lv] = true;
            count += 1;
        }
    }
    count
}

/// Second-highest decision level among the learned literals (0 for a unit
/// clause), swapping that literal into position 1 so the clause's watches
/// are valid immediately after backjumping.
pub fn backtrack_level(learnt: &mut [Lit], trail: &Trail) -> DecisionLevel {
    if learnt.len() == 1 {
        return 0;
    }
    let mut max_i = 1;
    let mut max_level = trail.level(learnt[1].vi());
    for i in 2..learnt.len() {
        let lv = trail.level(learnt[i].vi());
        if lv > max_level {
            max_level = lv;
            max_i = i;
        }
    }
    learnt.swap(1, max_i);
    max_level
}

/// Backjump and install the learned clause (SPEC_FULL.md §4.6, "Install").
/// Returns the new clause's id, or `None` for unit/binary clauses which are
/// never given a distinct pool index of their own.
pub fn install(
    trail: &mut Trail,
    cdb: &mut ClauseDb,
    heap: &mut VarActivityHeap,
    learnt: Vec<Lit>,
    backtrack_to: DecisionLevel,
    lbd: usize,
) -> Option<ClauseId> {
    trail.backtrack_to(backtrack_to, heap);
    match learnt.len() {
        0 => unreachable!("empty learned clause must be handled as UNSAT before install"),
        1 => {
            trail.enqueue(learnt[0], Antecedent::Unit);
            None
        }
        2 => {
            cdb.watches_mut(learnt[0]).register_binary(learnt[1]);
            cdb.watches_mut(learnt[1]).register_binary(learnt[0]);
            trail.enqueue(learnt[0], Antecedent::Binary(learnt[1]));
            None
        }
        _ => {
            let cid = cdb.add_learned(learnt.clone(), lbd);
            cdb.bump_learned_activity(cid);
            trail.enqueue(learnt[0], Antecedent::Clause(cid));
            Some(cid)
        }
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
    fn unit_conflict_backjumps_to_level_zero() {
        let mut learnt = vec![lit(-1)];
        let trail = Trail::new(3);
        assert_eq!(backtrack_level(&mut learnt, &trail), 0);
    }

    #[test]
    fn learns_1uip_clause_from_a_chain() {
        // Decide 1 (level 1), propagate 2,3 via binaries, then hand analysis
        // an externally-detected binary conflict on variable 3: the 1-UIP
        // clause should collapse all the way back to {-1}.
        let mut cdb = ClauseDb::new(3);
        cdb.add_problem(vec![!lit(1), lit(2)]);
        cdb.add_problem(vec![!lit(2), lit(3)]);
        let mut trail = Trail::new(3);
        let mut heap = VarActivityHeap::new(3, 0.95);
        trail.new_decision_level();
        trail.enqueue(lit(1), Antecedent::Decision);
        assert!(trail.propagate(&mut cdb).is_none());
        let conflict = Conflict::Binary(lit(3), !lit(3));
        let mut analyzer = Analyzer::new(3);
        let (learnt, lbd) = analyze_conflict(&mut analyzer, &mut trail, &mut cdb, &mut heap, conflict);
        assert_eq!(learnt, vec![!lit(1)]);
        assert_eq!(lbd, 1);
    }

    #[test]
    fn install_unit_enqueues_at_level_zero() {
        let mut cdb = ClauseDb::new(2);
        let mut trail = Trail::new(2);
        let mut heap = VarActivityHeap::new(2, 0.95);
        trail.new_decision_level();
        trail.enqueue(lit(1), Antecedent::Decision);
        let cid = install(&mut trail, &mut cdb, &mut heap, vec![lit(-1)], 0, 1);
        assert!(cid.is_none());
        assert_eq!(trail.decision_level(), 0);
        assert_eq!(trail.value_of(lit(1)), Some(false));
    }
}
