//! LBD-based learned-clause reduction (SPEC_FULL.md §4.7 "Reduce"): drop a
//! fraction of the worst learned clauses at a growing cadence, then
//! compact the pool. Grounded on the teacher's `ClauseDB::reduce`
//! (`reduce_watcher`'s sort-then-truncate shape), adapted to this crate's
//! `ClauseDb` arena and its own `locked`/`precious` definitions.
use crate::assign::Trail;
use crate::cdb::ClauseDb;
use crate::config::Config;
use crate::state::{Stat, Stats};
use crate::types::{Antecedent, ClauseId};

/// Tracks when the next reduction is due. `next` grows by `inc` each time;
/// `inc` itself grows by `inc2`, which decays toward zero -- the same
/// "growing cadence" the teacher's `AdaptStrategy` drives from `config.rs`
/// fields of the same names.
pub struct ReduceState {
    next: usize,
    inc: usize,
    inc2: usize,
}

impl ReduceState {
    pub fn new(config: &Config) -> ReduceState {
        ReduceState {
            next: config.reduce_init,
            inc: config.reduce_inc,
            inc2: config.reduce_inc2,
        }
    }

    pub fn due(&self, conflicts: usize) -> bool {
        conflicts >= self.next
    }

    fn advance(&mut self) {
        self.next += self.inc;
        self.inc += self.inc2;
        self.inc2 = self.inc2.saturating_sub(1);
    }
}

/// A clause is locked -- and so never eligible for deletion -- iff its
/// first literal is assigned and this clause is that literal's antecedent
/// (SPEC_FULL.md §3).
pub(crate) fn is_locked(cdb: &ClauseDb, trail: &Trail, cid: ClauseId) -> bool {
    let l0 = cdb.get(cid).lits[0];
    trail.is_assigned(l0.vi()) && matches!(trail.antecedent(l0.vi()), Antecedent::Clause(c) if c == cid)
}

/// A clause is precious -- kept regardless of activity -- if it's short or
/// has a low LBD; these are cheap to keep around and often still useful.
fn is_precious(cdb: &ClauseDb, cid: ClauseId, keep_lbd: usize) -> bool {
    let c = cdb.get(cid);
    c.lits.len() <= keep_lbd || c.rank <= keep_lbd
}

/// Run one reduction: collect eligible learned clauses, sort by
/// `(activity ascending, index ascending)`, delete a `reduce_fraction/32`
/// prefix, then compact the pool and fix up the trail's antecedents.
pub fn run(cdb: &mut ClauseDb, trail: &mut Trail, config: &Config, state: &mut ReduceState, stats: &mut Stats) {
    state.advance();
    stats.bump(Stat::Reduction);

    let boundary = cdb.first_learned();
    let mut candidates: Vec<ClauseId> = cdb
        .iter_with_id()
        .filter(|(cid, c)| *cid >= boundary && !c.is_dead())
        .map(|(cid, _)| cid)
        .filter(|&cid| !is_locked(cdb, trail, cid) && !is_precious(cdb, cid, config.keep_lbd))
        .collect();
    candidates.sort_by(|&a, &b| {
        cdb.get(a)
            .activity
            .partial_cmp(&cdb.get(b).activity)
            .unwrap()
            .then(a.cmp(&b))
    });

    let drop_n = candidates.len() * config.reduce_fraction / 32;
    for &cid in &candidates[..drop_n] {
        cdb.delete(cid);
    }

    let remap = cdb.compact();
    trail.remap_clause_antecedents(&remap);
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
    fn reduce_drops_low_activity_unlocked_clauses() {
        let mut cdb = ClauseDb::new(6);
        cdb.add_problem(vec![lit(1), lit(2)]);
        let mut trail = Trail::new(6);
        for _ in 0..40 {
            let cid = cdb.add_learned(vec![lit(3), lit(4), lit(5)], 5);
            cdb.bump_activity(cid, 0.0);
        }
        let config = Config::default().with_keep_lbd(0);
        let mut state = ReduceState::new(&config);
        let mut stats = Stats::default();
        let before = cdb.len();
        run(&mut cdb, &mut trail, &config, &mut state, &mut stats);
        assert!(cdb.len() <= before);
        assert_eq!(stats.reductions, 1);
    }
}
