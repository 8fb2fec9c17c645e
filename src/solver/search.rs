//! The decide/propagate/analyze/restart/reduce/simplify loop (SPEC_FULL.md
//! §4.7). New relative to the teacher: its own `Solver::search` interleaves
//! this with the now-defunct chronoBT/rephase/Luby machinery this
//! specification doesn't carry; here the loop is just the plain Glucose
//! gate named in SPEC_FULL.md, composing `conflict`, `reduce`, and
//! `simplify`.
use crate::assign::{Conflict, Trail, VarActivityHeap};
use crate::cdb::ClauseDb;
use crate::config::Config;
use crate::processor::{Eliminator, SavedClauses};
use crate::restart::RestartGate;
use crate::state::{Stat, Stats};
use crate::types::{Antecedent, DecisionLevel, Lit, Prng, VarId};

use super::conflict::{self, Analyzer};
use super::reduce::{self, ReduceState};
use super::simplify::{self, SimplifyState};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchResult {
    Sat,
    Unsat,
    Unknown,
}

/// Everything the search loop reuses across conflicts, kept on `Solver` and
/// borrowed in for the duration of one `run` call (SPEC_FULL.md §9: "reuse
/// buffers... as fields of the solver value").
pub struct SearchState {
    pub analyzer: Analyzer,
    pub restart_gate: RestartGate,
    pub reduce_state: ReduceState,
    pub simplify_state: SimplifyState,
    pub prng: Prng,
}

impl SearchState {
    pub fn new(config: &Config, num_vars: usize) -> SearchState {
        SearchState {
            analyzer: Analyzer::new(num_vars),
            restart_gate: RestartGate::new(config),
            reduce_state: ReduceState::new(config),
            simplify_state: SimplifyState::new(),
            prng: Prng::new(config.seed),
        }
    }
}

/// Pick the branching literal: usually the active variable of highest
/// activity, occasionally (probability `config.randomness`) a uniformly
/// random active variable (SPEC_FULL.md §4.4). Entries left in the heap by
/// a variable that got assigned through propagation rather than decision
/// are stale; discard them as they surface instead of branching on them.
fn decide(trail: &Trail, heap: &mut VarActivityHeap, prng: &mut Prng, config: &Config) -> Option<Lit> {
    loop {
        let v: VarId = if config.randomness > 0.0 && prng.next_f64() < config.randomness {
            match heap.random_active(prng) {
                Some(v) => {
                    if trail.is_assigned(v) {
                        heap.remove(v);
                        continue;
                    }
                    v
                }
                None => return None,
            }
        } else {
            match heap.pop() {
                Some(v) if trail.is_assigned(v) => continue,
                Some(v) => v,
                None => return None,
            }
        };
        let preferred = trail.value(v).preferred();
        return Some(Lit::new(v, !preferred));
    }
}

/// Glucose-style partial restart (SPEC_FULL.md §4.7): find the
/// highest-activity still-unassigned variable, then backjump only to the
/// shallowest level at which every assigned variable has strictly lower
/// activity than it -- instead of always dumping the whole trail.
fn do_restart(trail: &mut Trail, heap: &mut VarActivityHeap) {
    let target = match heap.peek() {
        Some(v) => heap.activity(v),
        None => {
            trail.backtrack_to(0, heap);
            return;
        }
    };
    let top = trail.decision_level();
    let mut level = 0;
    'levels: for lvl in 1..=top {
        let start = trail.level_start(lvl);
        let end = if lvl < top { trail.level_start(lvl + 1) } else { trail.trail().len() };
        for idx in start..end {
            let v = trail.trail()[idx].vi();
            if heap.activity(v) >= target {
                break 'levels;
            }
        }
        level = lvl;
    }
    trail.backtrack_to(level, heap);
}

/// Run the solver to a verdict, modulo the conflict budget in `config`
/// (`0` meaning unbounded). `eliminator` is threaded through so search-time
/// equivalence substitution (SPEC_FULL.md §4.7's "Simplify") keeps
/// contributing to the same substitution/model-extension log preprocessing
/// started.
#[allow(clippy::too_many_arguments)]
pub fn run(
    trail: &mut Trail,
    cdb: &mut ClauseDb,
    heap: &mut VarActivityHeap,
    state: &mut SearchState,
    config: &Config,
    stats: &mut Stats,
    eliminator: &mut Eliminator,
) -> SearchResult {
    loop {
        let head_before = trail.head();
        let outcome = trail.propagate(cdb);
        stats.propagations += trail.head() - head_before;
        match outcome {
            Some(conflict) => {
                stats.bump(Stat::Conflict);
                if trail.decision_level() == 0 {
                    return SearchResult::Unsat;
                }
                if config.conflict_budget != 0 && stats.conflicts >= config.conflict_budget {
                    return SearchResult::Unknown;
                }
                if let Some(result) = handle_conflict(trail, cdb, heap, state, stats, conflict) {
                    return result;
                }
            }
            None => {
                if state.restart_gate.should_restart(stats.conflicts, trail.decision_level()) {
                    do_restart(trail, heap);
                    state.restart_gate.advance(stats.conflicts);
                    stats.bump(Stat::Restart);
                    continue;
                }
                if state.reduce_state.due(stats.conflicts) {
                    reduce::run(cdb, trail, config, &mut state.reduce_state, stats);
                    continue;
                }
                if trail.decision_level() == 0 && state.simplify_state.due(trail, cdb) {
                    match simplify::run(
                        cdb,
                        trail,
                        heap,
                        &mut eliminator.subst,
                        &mut eliminator.saved,
                        &mut state.simplify_state,
                        stats,
                    ) {
                        Ok(()) => continue,
                        Err(()) => return SearchResult::Unsat,
                    }
                }
                match decide(trail, heap, &mut state.prng, config) {
                    Some(lit) => {
                        trail.new_decision_level();
                        trail.enqueue(lit, Antecedent::Decision);
                        stats.bump(Stat::Decision);
                    }
                    None => return SearchResult::Sat,
                }
            }
        }
    }
}

fn handle_conflict(
    trail: &mut Trail,
    cdb: &mut ClauseDb,
    heap: &mut VarActivityHeap,
    state: &mut SearchState,
    stats: &mut Stats,
    conflict: Conflict,
) -> Option<SearchResult> {
    let (mut learnt, lbd) = conflict::analyze_conflict(&mut state.analyzer, trail, cdb, heap, conflict);
    state.restart_gate.update_lbd(lbd);
    stats.record_learnt(lbd, learnt.len());
    let backtrack_to: DecisionLevel = conflict::backtrack_level(&mut learnt, trail);
    conflict::install(trail, cdb, heap, learnt, backtrack_to, lbd);
    heap.decay();
    cdb.decay_clause_activity();
    None
}

/// Recover the values of every variable preprocessing or search-time
/// simplify removed from the problem, once a model of the reduced problem
/// is in hand (SPEC_FULL.md §4.10).
pub fn extend_model(trail: &mut Trail, saved: &SavedClauses) {
    saved.extend(trail);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdb::ClauseDb;
    use crate::types::Lit;

    fn lit(i: i32) -> Lit {
        Lit::from(i)
    }

    #[test]
    fn trivially_sat_instance_finds_a_model() {
        let mut cdb = ClauseDb::new(2);
        cdb.add_problem(vec![lit(1), lit(2)]);
        let mut trail = Trail::new(2);
        let mut heap = VarActivityHeap::new(2, 0.95);
        let config = Config::default().with_preprocess(false);
        let mut state = SearchState::new(&config, 2);
        let mut stats = Stats::default();
        let mut eliminator = Eliminator {
            subst: vec![None; 3],
            saved: SavedClauses::new(),
        };
        let result = run(&mut trail, &mut cdb, &mut heap, &mut state, &config, &mut stats, &mut eliminator);
        assert_eq!(result, SearchResult::Sat);
        assert!(trail.value_of(lit(1)) == Some(true) || trail.value_of(lit(2)) == Some(true));
    }

    #[test]
    fn conflict_at_level_zero_is_unsat() {
        let mut cdb = ClauseDb::new(2);
        cdb.add_problem(vec![lit(-1), lit(2)]);
        cdb.add_problem(vec![lit(-1), lit(-2)]);
        let mut trail = Trail::new(2);
        trail.enqueue(lit(1), Antecedent::Unit);
        let mut heap = VarActivityHeap::new(2, 0.95);
        heap.retain_active(|v| !trail.is_assigned(v));
        let config = Config::default().with_preprocess(false);
        let mut state = SearchState::new(&config, 2);
        let mut stats = Stats::default();
        let mut eliminator = Eliminator {
            subst: vec![None; 3],
            saved: SavedClauses::new(),
        };
        let result = run(&mut trail, &mut cdb, &mut heap, &mut state, &config, &mut stats, &mut eliminator);
        assert_eq!(result, SearchResult::Unsat);
    }
}
