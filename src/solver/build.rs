//! Clause assertion (SPEC_FULL.md §6, `assert_clause`): normalize a raw
//! signed-literal slice and dispatch it into the trail or the clause pool.
//! Grounded on the teacher's `solver_add_unchecked_clause`, generalized from
//! its packed `Vec<Lit>`-only input to the bounds-checked `i32` surface this
//! specification's external interface exposes.
use crate::assign::Trail;
use crate::cdb::ClauseDb;
use crate::error::SolverError;
use crate::types::{Antecedent, Lit, VarId};

/// What became of one `assert_clause` call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClauseOutcome {
    /// Recorded in the trail or the pool.
    Added,
    /// A tautology (complementary pair) or already satisfied; nothing changed.
    TriviallyTrue,
    /// The clause reduced to empty: the instance is now known UNSAT.
    Contradiction,
}

/// Normalize `raw` (sort, dedupe, drop a tautological complementary pair,
/// drop literals already false at level 0) and add the result.
pub fn assert_clause(trail: &mut Trail, cdb: &mut ClauseDb, raw: &[i32]) -> Result<ClauseOutcome, SolverError> {
    let num_vars = trail.num_vars();
    let mut lits: Vec<Lit> = Vec::with_capacity(raw.len());
    for &x in raw {
        if x == 0 {
            return Err(SolverError::Internal("0 is not a valid signed literal"));
        }
        let v = x.unsigned_abs() as VarId;
        if v == 0 || v > num_vars {
            return Err(SolverError::OutOfRange(v));
        }
        lits.push(Lit::from(x));
    }

    lits.sort_unstable();
    lits.dedup();
    // `Lit`'s encoding packs a variable's positive literal immediately before
    // its negative one, so a complementary pair is always adjacent here.
    if lits.windows(2).any(|w| w[0].vi() == w[1].vi()) {
        return Ok(ClauseOutcome::TriviallyTrue);
    }

    let mut out: Vec<Lit> = Vec::with_capacity(lits.len());
    for &l in &lits {
        match trail.value_of(l) {
            Some(true) => return Ok(ClauseOutcome::TriviallyTrue),
            Some(false) => continue,
            None => out.push(l),
        }
    }

    match out.len() {
        0 => Ok(ClauseOutcome::Contradiction),
        1 => {
            trail.enqueue(out[0], Antecedent::Unit);
            Ok(ClauseOutcome::Added)
        }
        _ => {
            cdb.add_problem(out);
            Ok(ClauseOutcome::Added)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tautology_is_a_no_op() {
        let mut trail = Trail::new(3);
        let mut cdb = ClauseDb::new(3);
        let outcome = assert_clause(&mut trail, &mut cdb, &[1, -1, 2]).unwrap();
        assert_eq!(outcome, ClauseOutcome::TriviallyTrue);
        assert!(cdb.is_empty());
    }

    #[test]
    fn unit_clause_enqueues_immediately() {
        let mut trail = Trail::new(3);
        let mut cdb = ClauseDb::new(3);
        assert_eq!(assert_clause(&mut trail, &mut cdb, &[2]).unwrap(), ClauseOutcome::Added);
        assert_eq!(trail.value_of(Lit::from(2)), Some(true));
    }

    #[test]
    fn conflicting_unit_is_a_contradiction() {
        let mut trail = Trail::new(3);
        let mut cdb = ClauseDb::new(3);
        trail.enqueue(Lit::from(-2), Antecedent::Unit);
        assert_eq!(assert_clause(&mut trail, &mut cdb, &[2]).unwrap(), ClauseOutcome::Contradiction);
    }

    #[test]
    fn out_of_range_variable_is_rejected() {
        let mut trail = Trail::new(2);
        let mut cdb = ClauseDb::new(2);
        assert!(matches!(
            assert_clause(&mut trail, &mut cdb, &[5]),
            Err(SolverError::OutOfRange(5))
        ));
    }

    #[test]
    fn large_clause_goes_into_the_pool() {
        let mut trail = Trail::new(4);
        let mut cdb = ClauseDb::new(4);
        assert_eq!(assert_clause(&mut trail, &mut cdb, &[1, 2, 3]).unwrap(), ClauseOutcome::Added);
        assert_eq!(cdb.len(), 1);
    }
}
