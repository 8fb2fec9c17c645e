//! End-to-end exercise of the public API against the concrete scenarios and
//! boundary behaviors of SPEC_FULL.md §8, built purely through
//! `Solver::assert_clause` (no DIMACS parser is in scope).
use cdcl_core::error::SolveStatus;
use cdcl_core::solver::Solver;
use cdcl_core::types::TruthValue;

#[test]
fn s1_trivial_sat() {
    let mut s = Solver::new(2, false);
    s.assert_clause(&[1, 2]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Sat);
    assert!(s.value(1).bool() == Some(true) || s.value(2).bool() == Some(true));
}

#[test]
fn s2_pigeonhole_unsat_trivial() {
    let mut s = Solver::new(1, false);
    s.assert_clause(&[1]).unwrap();
    s.assert_clause(&[-1]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Unsat);
}

#[test]
fn s3_propagation_chain() {
    let mut s = Solver::new(4, false);
    s.assert_clause(&[1]).unwrap();
    s.assert_clause(&[-1, 2]).unwrap();
    s.assert_clause(&[-2, 3]).unwrap();
    s.assert_clause(&[-3, 4]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Sat);
    for v in 1..=4 {
        assert_eq!(s.value(v).bool(), Some(true));
    }
}

#[test]
fn s4_1uip_learning_then_unsat() {
    let mut s = Solver::new(5, false);
    s.assert_clause(&[1, 2]).unwrap();
    s.assert_clause(&[-1, 3]).unwrap();
    s.assert_clause(&[-2, 3]).unwrap();
    s.assert_clause(&[-3, 4, 5]).unwrap();
    s.assert_clause(&[-4]).unwrap();
    s.assert_clause(&[-5]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Unsat);
}

#[test]
fn s5_equivalence_scc_with_preprocessing() {
    let mut s = Solver::new(4, true);
    s.assert_clause(&[-1, 2]).unwrap();
    s.assert_clause(&[-2, 1]).unwrap();
    s.assert_clause(&[-2, 3]).unwrap();
    s.assert_clause(&[-3, 2]).unwrap();
    s.assert_clause(&[1]).unwrap();
    s.assert_clause(&[-3]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Unsat);
}

#[test]
fn s5_equivalence_scc_sat_case() {
    let mut s = Solver::new(3, true);
    s.assert_clause(&[-1, 2]).unwrap();
    s.assert_clause(&[-2, 1]).unwrap();
    s.assert_clause(&[-2, 3]).unwrap();
    s.assert_clause(&[-3, 2]).unwrap();
    s.assert_clause(&[1]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Sat);
    assert_eq!(s.value(1).bool(), Some(true));
    assert_eq!(s.value(2).bool(), Some(true));
    assert_eq!(s.value(3).bool(), Some(true));
}

#[test]
fn s6_bounded_variable_elimination_recovers_value() {
    let mut s = Solver::new(4, true);
    s.assert_clause(&[4, 1]).unwrap();
    s.assert_clause(&[4, 2]).unwrap();
    s.assert_clause(&[-4, 3]).unwrap();
    s.assert_clause(&[-4, -3]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Sat);
    assert_eq!(s.value(4).bool(), Some(false));
    assert_eq!(s.value(1).bool(), Some(true));
    assert_eq!(s.value(2).bool(), Some(true));
}

#[test]
fn variable_zero_is_always_true() {
    let s = Solver::new(3, false);
    assert_eq!(s.value(0), TruthValue::True);
}

#[test]
fn asserting_the_empty_clause_is_terminal_unsat() {
    let mut s = Solver::new(2, false);
    s.assert_clause(&[1]).unwrap();
    s.assert_clause(&[-1]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Unsat);
    // A second solve on an already-terminal-UNSAT solver is a no-op and
    // stays UNSAT without re-running search.
    assert_eq!(s.solve(), SolveStatus::Unsat);
}

#[test]
fn tautological_clause_is_a_no_op() {
    let mut s = Solver::new(2, false);
    s.assert_clause(&[1, -1, 2]).unwrap();
    s.assert_clause(&[-2]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Sat);
}

#[test]
fn reset_then_reassert_reproduces_the_verdict() {
    let mut s = Solver::new(3, true);
    s.assert_clause(&[1, 2, 3]).unwrap();
    s.assert_clause(&[-1, -2]).unwrap();
    let first = s.solve();
    s.reset();
    s.assert_clause(&[1, 2, 3]).unwrap();
    s.assert_clause(&[-1, -2]).unwrap();
    let second = s.solve();
    assert_eq!(first, second);
}

#[test]
fn three_pigeons_two_holes_is_unsat_under_a_generous_budget() {
    // p_ij: pigeon i in hole j. Vars 1=p11, 2=p12, 3=p21, 4=p22, 5=p31, 6=p32.
    let mut s = Solver::new(6, false);
    s.set_conflict_budget(1_000_000);
    s.assert_clause(&[1, 2]).unwrap();
    s.assert_clause(&[3, 4]).unwrap();
    s.assert_clause(&[5, 6]).unwrap();
    s.assert_clause(&[-1, -3]).unwrap();
    s.assert_clause(&[-1, -5]).unwrap();
    s.assert_clause(&[-3, -5]).unwrap();
    s.assert_clause(&[-2, -4]).unwrap();
    s.assert_clause(&[-2, -6]).unwrap();
    s.assert_clause(&[-4, -6]).unwrap();
    assert_eq!(s.solve(), SolveStatus::Unsat);
}
