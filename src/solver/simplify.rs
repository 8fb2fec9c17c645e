//! The top-level simplifier run during search (SPEC_FULL.md §2 component 10,
//! §4.7 "Simplify"): an equivalence-substitution round over the live binary
//! clauses, followed by scrubbing every clause of level-0 false literals,
//! dropping satisfied ones, and demoting any clause that shrinks to length
//! 2 or 1. Only ever run at decision level 0 -- the literals it treats as
//! permanent are exactly the ones that can never be undone.
use crate::assign::{Trail, VarActivityHeap};
use crate::cdb::ClauseDb;
use crate::processor::{rewrite_clause, scc, SavedClauses};
use crate::solver::reduce::is_locked;
use crate::state::{Stat, Stats};
use crate::types::{Antecedent, ClauseId, Lit};

/// Tracks the level-0 fact count and binary-clause count as of the last
/// simplify pass, so the next one only runs once there's new work for it
/// (SPEC_FULL.md §4.7: "when more level-0 literals or binary clauses exist
/// than at the last simplify").
pub struct SimplifyState {
    last_units: usize,
    last_binaries: usize,
}

impl SimplifyState {
    pub fn new() -> SimplifyState {
        SimplifyState {
            last_units: 0,
            last_binaries: 0,
        }
    }

    pub fn due(&self, trail: &Trail, cdb: &ClauseDb) -> bool {
        trail.trail().len() > self.last_units || count_binaries(cdb) > self.last_binaries
    }

    fn record(&mut self, trail: &Trail, cdb: &ClauseDb) {
        self.last_units = trail.trail().len();
        self.last_binaries = count_binaries(cdb);
    }
}

fn count_binaries(cdb: &ClauseDb) -> usize {
    cdb.iter().filter(|c| !c.is_dead() && c.lits.len() == 2).count()
}

/// Run one simplify pass. Returns `Err(())` on a discovered contradiction
/// (the instance is UNSAT).
pub fn run(
    cdb: &mut ClauseDb,
    trail: &mut Trail,
    heap: &VarActivityHeap,
    subst: &mut Vec<Option<Lit>>,
    saved: &mut SavedClauses,
    state: &mut SimplifyState,
    stats: &mut Stats,
) -> Result<(), ()> {
    debug_assert_eq!(trail.decision_level(), 0);

    if count_binaries(cdb) > state.last_binaries {
        apply_equivalences(cdb, trail, heap, subst, saved)?;
    }
    scrub_clauses(cdb, trail)?;

    stats.bump(Stat::Simplification);
    state.record(trail, cdb);
    Ok(())
}

/// Run SCC over the current binary-implication graph, using the
/// highest-activity literal of each component as representative (search-time
/// variant of SPEC_FULL.md §4.8; preprocessing instead prefers the smallest
/// literal), then fold every new substitution into every live clause.
fn apply_equivalences(
    cdb: &mut ClauseDb,
    trail: &mut Trail,
    heap: &VarActivityHeap,
    subst: &mut Vec<Option<Lit>>,
    saved: &mut SavedClauses,
) -> Result<(), ()> {
    let before: Vec<bool> = subst.iter().map(|s| s.is_some()).collect();
    let pick_rep = |comp: &[Lit]| -> Lit {
        *comp
            .iter()
            .max_by(|a, b| heap.activity(a.vi()).partial_cmp(&heap.activity(b.vi())).unwrap())
            .unwrap()
    };
    let substituted = match scc::run(cdb, subst, &pick_rep) {
        None => return Err(()),
        Some(n) => n,
    };
    if substituted == 0 {
        return Ok(());
    }

    for v in 1..subst.len() {
        if !before[v] {
            if let Some(rep) = subst[v] {
                saved.push_substitution(v, rep);
                trail.mark_eliminated(v, Antecedent::Subst(rep));
            }
        }
    }

    let ids: Vec<ClauseId> = cdb
        .iter_with_id()
        .filter(|(_, c)| !c.is_dead())
        .map(|(cid, _)| cid)
        .collect();
    for cid in ids {
        let old_lits = cdb.get(cid).lits.clone();
        if !old_lits.iter().any(|&l| subst[l.vi()].is_some()) {
            continue;
        }
        match rewrite_clause(&old_lits, subst) {
            None => cdb.delete(cid),
            Some(new_lits) => match new_lits.len() {
                0 => return Err(()),
                1 => {
                    let unit = new_lits[0];
                    cdb.delete(cid);
                    match trail.value_of(unit) {
                        Some(false) => return Err(()),
                        Some(true) => {}
                        None => trail.enqueue(unit, Antecedent::Unit),
                    }
                }
                _ => cdb.shrink(cid, new_lits),
            },
        }
    }
    Ok(())
}

/// Drop clauses satisfied at level 0, strip level-0-false literals from the
/// rest, and demote anything that collapses to binary or unit.
fn scrub_clauses(cdb: &mut ClauseDb, trail: &mut Trail) -> Result<(), ()> {
    let ids: Vec<ClauseId> = cdb.iter_with_id().filter(|(_, c)| !c.is_dead()).map(|(cid, _)| cid).collect();
    for cid in ids {
        if cdb.get(cid).is_dead() {
            continue;
        }
        let lits = cdb.get(cid).lits.clone();
        if !is_locked(cdb, trail, cid) && lits.iter().any(|&l| trail.value_of(l) == Some(true)) {
            cdb.delete(cid);
            continue;
        }
        let new_lits: Vec<Lit> = lits.iter().copied().filter(|&l| trail.value_of(l) != Some(false)).collect();
        if new_lits.len() == lits.len() {
            continue;
        }
        match new_lits.len() {
            0 => return Err(()),
            1 => {
                let unit = new_lits[0];
                cdb.delete(cid);
                match trail.value_of(unit) {
                    Some(false) => return Err(()),
                    Some(true) => {}
                    None => trail.enqueue(unit, Antecedent::Unit),
                }
            }
            _ => cdb.shrink(cid, new_lits),
        }
    }

    if cdb.num_garbage > 10_000 && cdb.num_garbage * 8 > cdb.num_problem_literals + cdb.num_learned_literals {
        let remap = cdb.compact();
        trail.remap_clause_antecedents(&remap);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdb::ClauseDb;
    use crate::processor::SavedClauses;
    use crate::types::Lit;

    fn lit(i: i32) -> Lit {
        Lit::from(i)
    }

    #[test]
    fn scrub_demotes_satisfied_and_false_literals() {
        let mut cdb = ClauseDb::new(4);
        cdb.add_problem(vec![lit(1), lit(2), lit(3)]);
        let mut trail = Trail::new(4);
        trail.enqueue(lit(-2), Antecedent::Unit);
        assert!(scrub_clauses(&mut cdb, &mut trail).is_ok());
        assert_eq!(cdb.get(0).lits, vec![lit(1), lit(3)]);
    }

    #[test]
    fn due_after_new_level0_fact() {
        let cdb = ClauseDb::new(2);
        let mut trail = Trail::new(2);
        let mut state = SimplifyState::new();
        state.record(&trail, &cdb);
        assert!(!state.due(&trail, &cdb));
        trail.enqueue(lit(1), Antecedent::Unit);
        assert!(state.due(&trail, &cdb));
    }

    #[test]
    fn equivalence_round_is_a_noop_with_no_binaries() {
        let mut cdb = ClauseDb::new(3);
        let mut trail = Trail::new(3);
        let heap = VarActivityHeap::new(3, 0.95);
        let mut subst: Vec<Option<Lit>> = vec![None; 4];
        let mut saved = SavedClauses::new();
        assert!(apply_equivalences(&mut cdb, &mut trail, &heap, &mut subst, &mut saved).is_ok());
        assert!(subst.iter().all(|s| s.is_none()));
    }
}
