//! Subsumption and self-subsuming resolution (SPEC_FULL.md §4.9 phase 5),
//! driven by the preprocessor's own occurrence lists rather than
//! `ClauseDb`'s search-time watch lists (the "simpler flat-index form" of
//! SPEC_FULL.md §3).
use crate::cdb::ClauseDb;
use crate::types::{ClauseId, Lit};

/// Outcome of comparing a candidate clause `c` against an occurrence-list
/// clause `d` that shares `c`'s signature bits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubsumeResult {
    /// `d` shares no useful relationship with `c`.
    None,
    /// Every literal of `c` appears in `d`: `d` is subsumed (delete it).
    Subsumed,
    /// Every literal of `c` appears in `d` except one complementary
    /// mismatch on `lit`: `d` can be strengthened by removing `!lit`.
    Strengthened(Lit),
}

/// Compare `c` against `d`: literal-by-literal check for "every literal of
/// `c` is in `d`, with at most one complementary mismatch". `c` is assumed
/// sorted; `d`'s literals are scanned linearly (preprocessing clauses are
/// short enough that this beats building a per-call hash set).
pub fn match_subset(c: &[Lit], d: &[Lit]) -> SubsumeResult {
    if c.len() > d.len() {
        return SubsumeResult::None;
    }
    let mut mismatch: Option<Lit> = None;
    for &lc in c {
        if d.contains(&lc) {
            continue;
        }
        if d.contains(&!lc) {
            if mismatch.is_some() {
                return SubsumeResult::None;
            }
            mismatch = Some(lc);
        } else {
            return SubsumeResult::None;
        }
    }
    match mismatch {
        None => SubsumeResult::Subsumed,
        Some(lc) => SubsumeResult::Strengthened(lc),
    }
}

/// Pick the literal of `c` whose occurrence list (counting both polarities
/// via `occ_count`) is shortest, to minimize the number of candidate `d`s
/// scanned.
pub fn cheapest_literal(c: &[Lit], occ_count: impl Fn(Lit) -> usize) -> Option<Lit> {
    c.iter().copied().min_by_key(|&l| occ_count(l))
}

/// One round of subsumption/self-subsumption over the clauses reachable
/// from `occ`. `occ` maps each literal to the ids of live clauses
/// containing it; `subsume_skip` bounds how large a key occurrence list is
/// worth scanning at all.
///
/// Clauses that strengthen down to length 0 or 1 are deleted from the pool
/// immediately rather than left to `ClauseDb::shrink` (which only knows how
/// to reattach watches for length >= 2); their residual literals are
/// returned for the caller to fold into the unit queue (length 1) or treat
/// as an immediate contradiction (length 0, an empty clause).
///
/// Returns `(clauses touched, collapsed unit/empty residues)`.
pub fn run(
    cdb: &mut ClauseDb,
    occ: &mut Vec<Vec<ClauseId>>,
    queue: &mut std::collections::VecDeque<ClauseId>,
    subsume_skip: usize,
) -> (usize, Vec<Vec<Lit>>) {
    let mut touched = 0;
    let mut collapsed = Vec::new();
    while let Some(cid) = queue.pop_front() {
        if cdb.get(cid).is_dead() {
            continue;
        }
        let c_lits = cdb.get(cid).lits.clone();
        let key = match cheapest_literal(&c_lits, |l| occ[l.index()].len() + occ[(!l).index()].len())
        {
            Some(l) => l,
            None => continue,
        };
        if occ[key.index()].len() + occ[(!key).index()].len() > subsume_skip {
            continue;
        }
        let mut candidates = occ[key.index()].clone();
        candidates.extend(occ[(!key).index()].iter().copied());
        for dcid in candidates {
            if dcid == cid || cdb.get(dcid).is_dead() {
                continue;
            }
            let d_sig = cdb.get(dcid).signature;
            let c_sig = cdb.get(cid).signature;
            if c_sig & !d_sig != 0 {
                continue;
            }
            let d_lits = cdb.get(dcid).lits.clone();
            match match_subset(&c_lits, &d_lits) {
                SubsumeResult::None => {}
                SubsumeResult::Subsumed => {
                    remove_from_occ(occ, &d_lits, dcid);
                    cdb.delete(dcid);
                    touched += 1;
                }
                SubsumeResult::Strengthened(lit) => {
                    let new_lits: Vec<Lit> = d_lits.iter().copied().filter(|&x| x != !lit).collect();
                    remove_from_occ(occ, &d_lits, dcid);
                    if new_lits.len() <= 1 {
                        cdb.delete(dcid);
                        collapsed.push(new_lits);
                    } else {
                        cdb.shrink(dcid, new_lits.clone());
                        for &l in &new_lits {
                            occ[l.index()].push(dcid);
                        }
                        queue.push_back(dcid);
                    }
                    touched += 1;
                }
            }
        }
    }
    (touched, collapsed)
}

fn remove_from_occ(occ: &mut Vec<Vec<ClauseId>>, lits: &[Lit], cid: ClauseId) {
    for &l in lits {
        if let Some(pos) = occ[l.index()].iter().position(|&x| x == cid) {
            occ[l.index()].swap_remove(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: i32) -> Lit {
        Lit::from(i)
    }

    #[test]
    fn identical_clause_is_subsumed() {
        let c = vec![lit(1), lit(2)];
        let d = vec![lit(1), lit(2), lit(3)];
        assert_eq!(match_subset(&c, &d), SubsumeResult::Subsumed);
    }

    #[test]
    fn single_mismatch_strengthens() {
        let c = vec![lit(1), lit(2)];
        let d = vec![lit(1), !lit(2), lit(3)];
        assert_eq!(match_subset(&c, &d), SubsumeResult::Strengthened(lit(2)));
    }

    #[test]
    fn unrelated_clause_matches_neither() {
        let c = vec![lit(1), lit(2)];
        let d = vec![lit(4), lit(5)];
        assert_eq!(match_subset(&c, &d), SubsumeResult::None);
    }

    #[test]
    fn run_deletes_subsumed_clause() {
        let mut cdb = ClauseDb::new(3);
        let small = cdb.add_problem(vec![lit(1), lit(2)]);
        let big = cdb.add_problem(vec![lit(1), lit(2), lit(3)]);
        let mut occ: Vec<Vec<ClauseId>> = vec![Vec::new(); 8];
        occ[lit(1).index()] = vec![small, big];
        occ[lit(2).index()] = vec![small, big];
        occ[lit(3).index()] = vec![big];
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(small);
        let (touched, collapsed) = run(&mut cdb, &mut occ, &mut queue, 1000);
        assert_eq!(touched, 1);
        assert!(collapsed.is_empty());
        assert!(cdb.get(big).is_dead());
    }
}
