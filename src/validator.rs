//! Model-satisfaction auditing (SPEC_FULL.md §8's testable property:
//! "preprocessing followed by search must produce a model that, after model
//! extension, satisfies every original clause"). Grounded on the teacher's
//! `ValidatorIF` (`inject_assigmnent`/`validate`), adapted to check against
//! the clauses `Solver` recorded as asserted rather than the clause pool,
//! which preprocessing and simplification rewrite in place.
use crate::solver::Solver;

/// Validation support layered onto `Solver`.
pub trait ValidatorIF {
    /// Load an externally supplied candidate model (one signed literal per
    /// variable to force true) instead of whatever `solve` last produced.
    fn inject_assignment(&mut self, lits: &[i32]);

    /// `None` if the current model satisfies every clause that was
    /// asserted; otherwise the first clause it violates.
    fn validate(&self) -> Option<Vec<i32>>;
}

impl ValidatorIF for Solver {
    fn inject_assignment(&mut self, lits: &[i32]) {
        for &l in lits {
            self.set_literal_true(l);
        }
    }

    fn validate(&self) -> Option<Vec<i32>> {
        self.original_clauses()
            .iter()
            .find(|clause| !clause.iter().any(|&l| self.literal_is_true(l)))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolveStatus;

    #[test]
    fn model_from_a_sat_instance_validates() {
        let mut s = Solver::new(3, false);
        s.assert_clause(&[1, 2]).unwrap();
        s.assert_clause(&[-2, 3]).unwrap();
        assert_eq!(s.solve(), SolveStatus::Sat);
        assert_eq!(s.validate(), None);
    }

    #[test]
    fn an_unsatisfying_assignment_flags_its_clause() {
        let mut s = Solver::new(2, false);
        s.assert_clause(&[1, 2]).unwrap();
        s.inject_assignment(&[-1, -2]);
        assert_eq!(s.validate(), Some(vec![1, 2]));
    }

    #[test]
    fn validation_survives_preprocessing_eliminated_variables() {
        let mut s = Solver::new(4, true);
        s.assert_clause(&[4, 1]).unwrap();
        s.assert_clause(&[4, 2]).unwrap();
        s.assert_clause(&[-4, 3]).unwrap();
        s.assert_clause(&[-4, -3]).unwrap();
        assert_eq!(s.solve(), SolveStatus::Sat);
        assert_eq!(s.validate(), None);
    }
}
