//! Preprocessing: unit/pure-literal propagation, equivalence substitution,
//! bounded variable elimination, and subsumption, iterated to a fixed point
//! before search begins (SPEC_FULL.md §4.9). Not present under this name in
//! the teacher — the teacher's own `eliminator.rs` targets a pre-0.6
//! clause-storage model this crate no longer has — but its field-naming
//! texture (`n_touched`, occurrence-queue draining, a dedicated elimination
//! heap) carries over to the extent it still fits.
pub mod elim_heap;
pub mod extend;
pub mod scc;
pub mod subsume;

use std::collections::VecDeque;

use crate::assign::Trail;
use crate::cdb::{Clause, ClauseDb};
use crate::config::Config;
use crate::types::{Antecedent, ClauseId, Lit, VarId};

pub use extend::SavedClauses;

use elim_heap::ElimHeap;

/// Safety valve on the outer fixed-point loop: a real instance converges
/// in a handful of rounds, but a mistake in the progress bookkeeping
/// should not hang the caller forever.
const MAX_ROUNDS: usize = 10_000;

/// The preprocessor's own occurrence lists: every live clause containing
/// each literal. Kept separate from `ClauseDb`'s watch lists (SPEC_FULL.md
/// §3, "a simpler flat-index form") because elimination and subsumption
/// need to enumerate *every* clause touching a literal, not just the two
/// that happen to be watched.
struct Occurrences {
    lists: Vec<Vec<ClauseId>>,
}

impl Occurrences {
    fn new(num_lits: usize) -> Occurrences {
        Occurrences {
            lists: vec![Vec::new(); num_lits],
        }
    }

    fn build(cdb: &ClauseDb, num_lits: usize) -> Occurrences {
        let mut occ = Occurrences::new(num_lits);
        for (cid, c) in cdb.iter_with_id() {
            if c.is_dead() {
                continue;
            }
            for &l in &c.lits {
                occ.lists[l.index()].push(cid);
            }
        }
        occ
    }

    fn remove(&mut self, lits: &[Lit], cid: ClauseId) {
        for &l in lits {
            if let Some(p) = self.lists[l.index()].iter().position(|&x| x == cid) {
                self.lists[l.index()].swap_remove(p);
            }
        }
    }

    fn add(&mut self, lits: &[Lit], cid: ClauseId) {
        for &l in lits {
            self.lists[l.index()].push(cid);
        }
    }

    fn count(&self, l: Lit) -> usize {
        self.lists[l.index()].len()
    }
}

/// The equivalence map and removal history handed back to the solver, so
/// `solve()` can restore every removed variable's value once search finds
/// a satisfying assignment of the reduced problem (SPEC_FULL.md §4.10).
pub struct Eliminator {
    pub subst: Vec<Option<Lit>>,
    pub saved: SavedClauses,
}

/// Run every preprocessing phase to a fixed point. Returns `None` if a
/// contradiction was found (the instance is UNSAT before search even
/// starts), `Some(_)` otherwise.
pub fn preprocess(cdb: &mut ClauseDb, trail: &mut Trail, config: &Config) -> Option<Eliminator> {
    let num_vars = trail.num_vars();
    let num_lits = 2 * (num_vars + 1);
    let mut occ = Occurrences::build(cdb, num_lits);
    let mut subst: Vec<Option<Lit>> = vec![None; num_vars + 1];
    let mut saved = SavedClauses::new();
    let mut literal_queue: VecDeque<Lit> = VecDeque::new();
    let mut subsume_queue: VecDeque<ClauseId> = VecDeque::new();

    for &l in trail.trail() {
        if l.vi() != 0 {
            literal_queue.push_back(l);
        }
    }
    for (cid, c) in cdb.iter_with_id() {
        if !c.is_dead() {
            subsume_queue.push_back(cid);
        }
    }

    let mut rounds = 0;
    loop {
        rounds += 1;
        if rounds > MAX_ROUNDS {
            log::warn!("preprocessing hit its round cap ({}); stopping early", MAX_ROUNDS);
            break;
        }
        let mut progress = false;

        if collect_pure_literals(&occ, &subst, trail, num_vars, &mut literal_queue) {
            progress = true;
        }

        if drain_literal_queue(cdb, &mut occ, trail, &mut literal_queue, &mut subsume_queue).is_err() {
            return None;
        }

        match equivalence_pass(cdb, &mut occ, trail, &mut subst, &mut saved, &mut subsume_queue) {
            Err(()) => return None,
            Ok(changed) => {
                if changed {
                    progress = true;
                    if drain_literal_queue(cdb, &mut occ, trail, &mut literal_queue, &mut subsume_queue).is_err() {
                        return None;
                    }
                }
            }
        }

        match eliminate_variables(cdb, &mut occ, trail, config, &mut subst, &mut saved, &mut literal_queue, &mut subsume_queue) {
            Err(()) => return None,
            Ok(changed) => progress |= changed,
        }

        if drain_literal_queue(cdb, &mut occ, trail, &mut literal_queue, &mut subsume_queue).is_err() {
            return None;
        }

        let (touched, collapsed) = subsume::run(cdb, &mut occ.lists, &mut subsume_queue, config.subsume_skip);
        if touched > 0 {
            progress = true;
        }
        for residue in collapsed {
            match residue.first() {
                None => return None,
                Some(&l) => match trail.value_of(l) {
                    Some(false) => return None,
                    Some(true) => {}
                    None => {
                        trail.enqueue(l, Antecedent::Unit);
                        literal_queue.push_back(l);
                    }
                },
            }
        }
        if !literal_queue.is_empty()
            && drain_literal_queue(cdb, &mut occ, trail, &mut literal_queue, &mut subsume_queue).is_err()
        {
            return None;
        }

        if maybe_gc(cdb, &mut occ, &mut subsume_queue) {
            progress = true;
        }

        if !progress {
            break;
        }
    }

    cdb.rebuild_watches();
    log::debug!(
        "preprocessing converged in {} round(s): substituted={} eliminated={}",
        rounds,
        subst.iter().filter(|s| s.is_some()).count(),
        saved.len(),
    );
    Some(Eliminator { subst, saved })
}

/// Phase 1: a literal `l` is pure if `occ[¬l] = 0`; a variable touching no
/// clause at all is forced to a canonical (positive) polarity.
fn collect_pure_literals(
    occ: &Occurrences,
    subst: &[Option<Lit>],
    trail: &mut Trail,
    num_vars: usize,
    literal_queue: &mut VecDeque<Lit>,
) -> bool {
    let mut changed = false;
    for v in 1..=num_vars {
        if trail.is_assigned(v) || subst[v].is_some() {
            continue;
        }
        let pos = Lit::new(v, false);
        let neg = !pos;
        let pos_occ = occ.count(pos);
        let neg_occ = occ.count(neg);
        let forced = match (pos_occ, neg_occ) {
            (0, 0) => Some(pos),
            (p, 0) if p > 0 => Some(pos),
            (0, n) if n > 0 => Some(neg),
            _ => None,
        };
        if let Some(l) = forced {
            trail.enqueue(l, Antecedent::Pure);
            literal_queue.push_back(l);
            changed = true;
        }
    }
    changed
}

/// Phase 2: drain the literal queue. Every clause containing an enqueued
/// literal is satisfied and dropped; every clause containing its negation
/// loses that literal, possibly collapsing to a new unit (re-enqueued) or
/// an empty clause (contradiction).
fn drain_literal_queue(
    cdb: &mut ClauseDb,
    occ: &mut Occurrences,
    trail: &mut Trail,
    literal_queue: &mut VecDeque<Lit>,
    subsume_queue: &mut VecDeque<ClauseId>,
) -> Result<(), ()> {
    while let Some(l) = literal_queue.pop_front() {
        let satisfied: Vec<ClauseId> = occ.lists[l.index()].clone();
        for cid in satisfied {
            if cdb.get(cid).is_dead() {
                continue;
            }
            let lits = cdb.get(cid).lits.clone();
            occ.remove(&lits, cid);
            cdb.delete(cid);
        }
        occ.lists[l.index()].clear();

        let affected: Vec<ClauseId> = occ.lists[(!l).index()].clone();
        for cid in affected {
            if cdb.get(cid).is_dead() {
                continue;
            }
            let old_lits = cdb.get(cid).lits.clone();
            let new_lits: Vec<Lit> = old_lits.iter().copied().filter(|&x| x != !l).collect();
            occ.remove(&old_lits, cid);
            match new_lits.len() {
                0 => return Err(()),
                1 => {
                    let unit = new_lits[0];
                    cdb.delete(cid);
                    match trail.value_of(unit) {
                        Some(false) => return Err(()),
                        Some(true) => {}
                        None => {
                            trail.enqueue(unit, Antecedent::Unit);
                            literal_queue.push_back(unit);
                        }
                    }
                }
                _ => {
                    cdb.shrink(cid, new_lits.clone());
                    occ.add(&new_lits, cid);
                    subsume_queue.push_back(cid);
                }
            }
        }
        occ.lists[(!l).index()].clear();
    }
    Ok(())
}

/// Follow a substitution chain to its final representative. Chains only
/// arise across separate preprocessing rounds (a representative chosen in
/// an earlier round can itself be substituted by a later one); bounded by
/// `num_vars` so a bookkeeping bug can't spin forever.
pub(crate) fn resolve_literal(subst: &[Option<Lit>], l: Lit) -> Lit {
    let mut cur = l;
    for _ in 0..subst.len() {
        match subst[cur.vi()] {
            Some(rep) => cur = if cur.is_positive() { rep } else { !rep },
            None => return cur,
        }
    }
    cur
}

/// Rewrite one clause under the current substitution map. `None` means the
/// clause became trivially true (a substitution introduced a complementary
/// pair) and should be dropped.
pub(crate) fn rewrite_clause(lits: &[Lit], subst: &[Option<Lit>]) -> Option<Vec<Lit>> {
    let mut out: Vec<(VarId, bool)> = Vec::with_capacity(lits.len());
    for &l in lits {
        let nl = resolve_literal(subst, l);
        if let Some(&(_, pol)) = out.iter().find(|&&(v, _)| v == nl.vi()) {
            if pol != nl.is_positive() {
                return None;
            }
            continue;
        }
        out.push((nl.vi(), nl.is_positive()));
    }
    Some(out.into_iter().map(|(v, pos)| Lit::new(v, !pos)).collect())
}

/// Phase 3: find equivalence classes via SCC and fold every newly
/// substituted variable's clauses down to its representative.
fn equivalence_pass(
    cdb: &mut ClauseDb,
    occ: &mut Occurrences,
    trail: &mut Trail,
    subst: &mut Vec<Option<Lit>>,
    saved: &mut SavedClauses,
    subsume_queue: &mut VecDeque<ClauseId>,
) -> Result<bool, ()> {
    let before: Vec<bool> = subst.iter().map(|s| s.is_some()).collect();
    let pick_rep = |comp: &[Lit]| *comp.iter().min().unwrap();
    let substituted = match scc::run(cdb, subst, &pick_rep) {
        None => return Err(()),
        Some(n) => n,
    };
    if substituted == 0 {
        return Ok(false);
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
        occ.remove(&old_lits, cid);
        match rewrite_clause(&old_lits, subst) {
            None => {
                cdb.delete(cid);
            }
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
                    occ.lists[unit.index()].clear();
                }
                _ => {
                    cdb.shrink(cid, new_lits.clone());
                    occ.add(&new_lits, cid);
                    subsume_queue.push_back(cid);
                }
            },
        }
    }
    Ok(true)
}

/// Build the resolvent of `c` and `d` over `pivot`: every literal of
/// either clause except `pivot`'s own two occurrences, deduplicated, with
/// a complementary pair on any other shared variable short-circuiting to
/// `None` (a tautological resolvent, simply dropped).
fn resolve(c: &Clause, d: &Clause, pivot: VarId) -> Option<Vec<Lit>> {
    let mut lits: Vec<Lit> = Vec::with_capacity(c.lits.len() + d.lits.len() - 2);
    for &l in c.lits.iter().chain(d.lits.iter()) {
        if l.vi() != pivot {
            lits.push(l);
        }
    }
    lits.sort_unstable();
    lits.dedup();
    for w in lits.windows(2) {
        if w[0].vi() == w[1].vi() {
            return None;
        }
    }
    Some(lits)
}

/// Phase 4: bounded variable elimination via resolution. Candidates are
/// variables with `min(pos_occ, neg_occ) < var_elim_skip`, ranked by the
/// elimination heap's two-tier ordering (SPEC_FULL.md §3).
fn eliminate_variables(
    cdb: &mut ClauseDb,
    occ: &mut Occurrences,
    trail: &mut Trail,
    config: &Config,
    subst: &mut [Option<Lit>],
    saved: &mut SavedClauses,
    literal_queue: &mut VecDeque<Lit>,
    subsume_queue: &mut VecDeque<ClauseId>,
) -> Result<bool, ()> {
    let num_vars = trail.num_vars();
    let mut heap = ElimHeap::new(num_vars);
    for v in 1..=num_vars {
        if trail.is_assigned(v) || subst[v].is_some() {
            continue;
        }
        let pos = occ.count(Lit::new(v, false));
        let neg = occ.count(Lit::new(v, true));
        let m = pos.min(neg);
        if m < config.var_elim_skip {
            let tier: u64 = if m <= 1 { 0 } else { 1 };
            let product = (pos as u64) * (neg as u64);
            heap.push_or_update(v, (tier << 48) | product.min((1u64 << 48) - 1));
        }
    }

    let mut changed = false;
    while let Some(v) = heap.pop() {
        if trail.is_assigned(v) || subst[v].is_some() {
            continue;
        }
        let pos_lit = Lit::new(v, false);
        let neg_lit = Lit::new(v, true);
        let pos_clauses: Vec<ClauseId> = occ.lists[pos_lit.index()].clone();
        let neg_clauses: Vec<ClauseId> = occ.lists[neg_lit.index()].clone();
        if pos_clauses.is_empty() || neg_clauses.is_empty() {
            continue;
        }

        let mut resolvents: Vec<Vec<Lit>> = Vec::new();
        let mut too_big = false;
        for &pc in &pos_clauses {
            for &nc in &neg_clauses {
                if let Some(res) = resolve(cdb.get(pc), cdb.get(nc), v) {
                    if res.len() > config.res_clause_limit {
                        too_big = true;
                        break;
                    }
                    resolvents.push(res);
                }
            }
            if too_big {
                break;
            }
        }
        if too_big || resolvents.len() > pos_clauses.len() + neg_clauses.len() {
            continue;
        }

        changed = true;
        let (save_lit, save_side, other_side) = if pos_clauses.len() <= neg_clauses.len() {
            (pos_lit, pos_clauses, neg_clauses)
        } else {
            (neg_lit, neg_clauses, pos_clauses)
        };
        let mut saved_clauses: Vec<Vec<Lit>> = Vec::with_capacity(save_side.len());
        for &cid in &save_side {
            let mut lits = cdb.get(cid).lits.clone();
            if let Some(p) = lits.iter().position(|&x| x == save_lit) {
                let last = lits.len() - 1;
                lits.swap(p, last);
            }
            saved_clauses.push(lits);
        }
        saved.push_elimination(v, saved_clauses);
        trail.mark_eliminated(v, Antecedent::Elim);
        heap.remove(v);

        for &cid in save_side.iter().chain(other_side.iter()) {
            let lits = cdb.get(cid).lits.clone();
            occ.remove(&lits, cid);
            cdb.delete(cid);
        }

        for res in resolvents {
            match res.len() {
                0 => return Err(()),
                1 => {
                    let unit = res[0];
                    match trail.value_of(unit) {
                        Some(false) => return Err(()),
                        Some(true) => {}
                        None => {
                            trail.enqueue(unit, Antecedent::Unit);
                            literal_queue.push_back(unit);
                        }
                    }
                }
                _ => {
                    let cid = cdb.add_problem(res.clone());
                    occ.add(&res, cid);
                    subsume_queue.push_back(cid);
                }
            }
        }
    }
    Ok(changed)
}

/// Phase 6: compact the pool once garbage passes both a word-count floor
/// and a relative-fraction threshold, fixing up every outstanding
/// `ClauseId` the preprocessor itself still holds.
fn maybe_gc(cdb: &mut ClauseDb, occ: &mut Occurrences, subsume_queue: &mut VecDeque<ClauseId>) -> bool {
    let total = cdb.num_problem_literals + cdb.num_learned_literals + cdb.num_garbage;
    if cdb.num_garbage < 256 || cdb.num_garbage * 3 < total {
        return false;
    }
    let remap = cdb.compact();
    for list in occ.lists.iter_mut() {
        list.retain_mut(|cid| match remap.get(*cid).copied().flatten() {
            Some(new_id) => {
                *cid = new_id;
                true
            }
            None => false,
        });
    }
    let old_queue: Vec<ClauseId> = subsume_queue.drain(..).collect();
    for cid in old_queue {
        if let Some(new_id) = remap.get(cid).copied().flatten() {
            subsume_queue.push_back(new_id);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::Trail;
    use crate::cdb::ClauseDb;

    fn lit(i: i32) -> Lit {
        Lit::from(i)
    }

    #[test]
    fn pure_literal_satisfies_and_removes_its_clauses() {
        let mut cdb = ClauseDb::new(2);
        cdb.add_problem(vec![lit(1), lit(2)]);
        cdb.add_problem(vec![lit(1), !lit(2)]);
        let mut trail = Trail::new(2);
        let config = Config::default().with_preprocess(true);
        let elim = preprocess(&mut cdb, &mut trail, &config).expect("satisfiable");
        // Variable 1 appears only positively: it's pure, forced true, and
        // both clauses it appeared in are gone.
        assert_eq!(trail.value_of(lit(1)), Some(true));
        assert!(elim.saved.is_empty());
        assert!(elim.subst.iter().all(|s| s.is_none()));
    }

    #[test]
    fn conflicting_units_are_rejected() {
        let mut cdb = ClauseDb::new(2);
        cdb.add_problem(vec![!lit(1), lit(2)]);
        cdb.add_problem(vec![!lit(1), !lit(2)]);
        let mut trail = Trail::new(2);
        trail.enqueue(lit(1), Antecedent::Unit);
        let config = Config::default();
        assert!(preprocess(&mut cdb, &mut trail, &config).is_none());
    }

    #[test]
    fn equivalent_variables_collapse_to_one_representative() {
        let mut cdb = ClauseDb::new(3);
        cdb.add_problem(vec![lit(1), !lit(2)]);
        cdb.add_problem(vec![!lit(1), lit(2)]);
        cdb.add_problem(vec![lit(2), lit(3)]);
        let mut trail = Trail::new(3);
        let config = Config::default();
        let elim = preprocess(&mut cdb, &mut trail, &config).expect("satisfiable");
        let substituted_count = elim.subst.iter().filter(|s| s.is_some()).count();
        assert_eq!(substituted_count, 1);
    }
}
