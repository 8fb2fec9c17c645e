/*!
# A CDCL SAT Solver

This crate is a library implementation of a conflict-driven clause-learning
SAT solver: two-watched-literal Boolean constraint propagation, first-UIP
conflict analysis with recursive minimization, LBD-tracked clause-database
reduction, Glucose-style dual-EMA restarts, and a bounded-elimination /
equivalence-substitution preprocessor, behind a small procedural API.

## Usage

```
use cdcl_core::solver::Solver;
use cdcl_core::error::SolveStatus;

let mut solver = Solver::new(3, true);
solver.assert_clause(&[1, 2]).unwrap();
solver.assert_clause(&[-2, 3]).unwrap();
solver.assert_clause(&[-1, -3]).unwrap();
match solver.solve() {
    SolveStatus::Sat => {
        let mut model = Vec::new();
        solver.get_true_literals(&mut model);
    }
    SolveStatus::Unsat => {}
    SolveStatus::Unknown => {}
}
```

This crate has no file-parsing, CLI, or certification surface; it is driven
entirely through `Solver`'s methods, one clause and one query at a time.
*/
/// Crate `assign` provides the assignment trail, its unit propagator, and
/// the variable-activity decision heap.
pub mod assign;
/// Crate `cdb` provides the clause pool and its watch lists.
pub mod cdb;
/// Crate `config` provides the solver's tunable parameters.
pub mod config;
/// Crate `error` provides the solver's typed error and result-status enums.
pub mod error;
/// Crate `processor` implements preprocessing: pure/unit propagation,
/// equivalence substitution, bounded variable elimination, and subsumption.
pub mod processor;
/// Crate `restart` provides the EMA-based restart gate.
pub mod restart;
/// Crate `solver` provides the top-level API as a SAT solver.
pub mod solver;
/// Crate `state` is a collection of internal counters and their reporting.
pub mod state;
/// Crate `types` provides variables, literals, truth values, and other
/// common building blocks.
pub mod types;
/// Crate `validator` implements a model checker.
pub mod validator;

pub use error::{SolveStatus, SolverError};
pub use solver::Solver;

#[macro_use]
extern crate bitflags;
