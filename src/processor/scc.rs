//! Equivalence substitution via Tarjan SCC over the binary-implication
//! graph (SPEC_FULL.md §4.8). Binary clause `{a,b}` induces the two edges
//! `¬a -> b` and `¬b -> a`; literals in the same strongly connected
//! component are logically equivalent. Runs iteratively (an explicit work
//! stack keyed by `(node, next child index)`, per SPEC_FULL.md §9's ban on
//! recursion scaling with variable count) rather than with native recursion.
use crate::cdb::ClauseDb;
use crate::types::Lit;

/// Build the implication graph's adjacency lists directly from the live
/// binary clauses currently in the pool (ground truth, whether called from
/// preprocessing or from the search-time simplify pass — no separate
/// occurrence-list view is needed here).
fn build_adjacency(cdb: &ClauseDb, num_lits: usize) -> Vec<Vec<Lit>> {
    let mut adj = vec![Vec::new(); num_lits];
    for (_, c) in cdb.iter_with_id() {
        if c.is_dead() || c.lits.len() != 2 {
            continue;
        }
        let (a, b) = (c.lits[0], c.lits[1]);
        adj[(!a).index()].push(b);
        adj[(!b).index()].push(a);
    }
    adj
}

/// Run Tarjan's algorithm over the current binary-implication graph and
/// fold every equivalence class found into `subst` (indexed by variable,
/// always recording what that variable's *positive* literal is equivalent
/// to — SPEC_FULL.md §9's polarity-normalized canonical form). Components
/// whose dual was already folded in are skipped: a component and its dual
/// share the same variable set, so "does any variable in this component
/// already have a `subst` entry" is a sufficient detector, with no need for
/// a separate explored-set.
///
/// `pick_rep` chooses the representative literal of a component: smallest
/// literal during preprocessing, highest-activity variable during
/// search-time simplification (SPEC_FULL.md §4.8).
///
/// Returns `Ok(n)` with the number of variables newly substituted, or
/// `Ok(usize::MAX)`'s sibling `Err` is never used here — contradiction
/// (`l` and `¬l` in the same component) is reported as `Ok(None)`.
pub fn run(
    cdb: &ClauseDb,
    subst: &mut Vec<Option<Lit>>,
    pick_rep: &dyn Fn(&[Lit]) -> Lit,
) -> Option<usize> {
    let num_vars = subst.len() - 1;
    let num_lits = 2 * (num_vars + 1);
    let adj = build_adjacency(cdb, num_lits);

    let mut index_of: Vec<i64> = vec![-1; num_lits];
    let mut lowlink: Vec<i64> = vec![-1; num_lits];
    let mut on_stack: Vec<bool> = vec![false; num_lits];
    let mut vstack: Vec<usize> = Vec::new();
    let mut counter: i64 = 0;
    let mut substituted = 0usize;

    // Literal indices 0 and 1 belong to the reserved always-true variable 0
    // and never appear in any real clause.
    for start in 2..num_lits {
        if index_of[start] != -1 {
            continue;
        }
        let mut work: Vec<(usize, usize)> = vec![(start, 0)];
        while let Some(&mut (node, ref mut ci)) = work.last_mut() {
            if *ci == 0 {
                index_of[node] = counter;
                lowlink[node] = counter;
                counter += 1;
                vstack.push(node);
                on_stack[node] = true;
            }
            if *ci < adj[node].len() {
                let child = adj[node][*ci].index();
                *ci += 1;
                if index_of[child] == -1 {
                    work.push((child, 0));
                } else if on_stack[child] {
                    lowlink[node] = lowlink[node].min(index_of[child]);
                }
            } else {
                work.pop();
                if let Some(&mut (parent, _)) = work.last_mut() {
                    lowlink[parent] = lowlink[parent].min(lowlink[node]);
                }
                if lowlink[node] == index_of[node] {
                    let mut comp = Vec::new();
                    loop {
                        let w = vstack.pop().unwrap();
                        on_stack[w] = false;
                        comp.push(Lit::from_index(w));
                        if w == node {
                            break;
                        }
                    }
                    if !fold_component(&comp, subst, pick_rep, &mut substituted) {
                        return None;
                    }
                }
            }
        }
    }
    Some(substituted)
}

/// Fold one completed SCC into `subst`. Returns `false` on contradiction.
fn fold_component(
    comp: &[Lit],
    subst: &mut Vec<Option<Lit>>,
    pick_rep: &dyn Fn(&[Lit]) -> Lit,
    substituted: &mut usize,
) -> bool {
    if comp.len() == 1 {
        return true;
    }
    if comp.iter().any(|&l| subst[l.vi()].is_some()) {
        return true;
    }
    for &l in comp {
        if comp.contains(&!l) {
            return false;
        }
    }
    let rep = pick_rep(comp);
    for &l in comp {
        if l == rep {
            continue;
        }
        let canonical = if l.is_positive() { rep } else { !rep };
        subst[l.vi()] = Some(canonical);
        *substituted += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VarId;

    fn lit(i: i32) -> Lit {
        Lit::from(i)
    }

    fn smallest(comp: &[Lit]) -> Lit {
        *comp.iter().min().unwrap()
    }

    #[test]
    fn detects_simple_equivalence() {
        // a <-> b via {a,-b} and {-a,b}: a≡b.
        let mut cdb = ClauseDb::new(2);
        cdb.add_problem(vec![lit(1), !lit(2)]);
        cdb.add_problem(vec![!lit(1), lit(2)]);
        let mut subst: Vec<Option<Lit>> = vec![None; 3];
        let n = run(&cdb, &mut subst, &smallest).unwrap();
        assert_eq!(n, 1);
        // one of the two variables now points at the other.
        let pointed: Vec<VarId> = (1..=2).filter(|&v| subst[v].is_some()).collect();
        assert_eq!(pointed.len(), 1);
    }

    #[test]
    fn contradictory_equivalence_is_unsat() {
        // Forces a ≡ ¬a: {a,a} style cycle via {-a,-a}-equivalent clauses.
        let mut cdb = ClauseDb::new(2);
        cdb.add_problem(vec![lit(1), lit(2)]);
        cdb.add_problem(vec![!lit(1), !lit(2)]);
        cdb.add_problem(vec![lit(1), !lit(2)]);
        cdb.add_problem(vec![!lit(1), lit(2)]);
        let mut subst: Vec<Option<Lit>> = vec![None; 3];
        assert!(run(&cdb, &mut subst, &smallest).is_none());
    }

    #[test]
    fn no_binaries_is_a_noop() {
        let cdb = ClauseDb::new(3);
        let mut subst: Vec<Option<Lit>> = vec![None; 4];
        assert_eq!(run(&cdb, &mut subst, &smallest), Some(0));
    }
}
