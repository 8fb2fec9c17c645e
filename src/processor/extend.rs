//! Model extension (SPEC_FULL.md §4.10): recovering the values of variables
//! removed from the problem by preprocessing once a satisfying assignment
//! of the reduced problem is in hand.
use crate::assign::Trail;
use crate::types::{Lit, VarId};

/// One unit of preprocessing history to replay at model-extension time.
/// A block carries everything needed to recover the eliminated variable's
/// value without consulting the (long gone) original clauses.
#[derive(Clone, Debug)]
pub enum SavedBlock {
    /// Variable `l`'s positive literal was found equivalent to `replacement`;
    /// copy the replacement's value directly.
    Substituted { l: VarId, replacement: Lit },
    /// Variable `l` was removed by bounded resolution. `clauses` holds every
    /// clause (each as its own `Vec<Lit>`, with `l`'s own literal always the
    /// last entry) that contained `l` on the side chosen as smaller during
    /// elimination — these are exactly the clauses that must all be
    /// satisfied under the extended assignment.
    Eliminated { l: VarId, clauses: Vec<Vec<Lit>> },
}

/// History of every preprocessing removal, in the order it happened.
/// Replayed back to front: resolution-based elimination only ever reasons
/// about variables eliminated strictly later (or never eliminated), so a
/// variable's saved clauses never mention a not-yet-recovered variable when
/// walked in reverse.
#[derive(Clone, Debug, Default)]
pub struct SavedClauses(Vec<SavedBlock>);

impl SavedClauses {
    pub fn new() -> SavedClauses {
        SavedClauses(Vec::new())
    }

    pub fn push_substitution(&mut self, l: VarId, replacement: Lit) {
        self.0.push(SavedBlock::Substituted { l, replacement });
    }

    pub fn push_elimination(&mut self, l: VarId, clauses: Vec<Vec<Lit>>) {
        self.0.push(SavedBlock::Eliminated { l, clauses });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// How many variables were removed by bounded resolution (for
    /// `Stats::eliminated_vars`).
    pub fn eliminated_count(&self) -> usize {
        self.0.iter().filter(|b| matches!(b, SavedBlock::Eliminated { .. })).count()
    }

    /// Recover every removed variable's value on `trail`, in reverse order.
    pub fn extend(&self, trail: &mut Trail) {
        for block in self.0.iter().rev() {
            match block {
                SavedBlock::Substituted { l, replacement } => {
                    let value = trail
                        .value_of(*replacement)
                        .expect("replacement must already be valued when its substitute is recovered");
                    trail.set_extension_value(*l, value);
                }
                SavedBlock::Eliminated { l, clauses } => {
                    // Every clause in one block saved `l`'s variable with the
                    // same polarity (the smaller-occurrence side chosen
                    // during elimination): the last literal of each clause.
                    let mut distinguished_true = false;
                    for clause in clauses {
                        if clause[..clause.len() - 1]
                            .iter()
                            .all(|&other| trail.value_of(other) == Some(false))
                        {
                            distinguished_true = true;
                            break;
                        }
                    }
                    let value = match clauses.first().and_then(|c| c.last()) {
                        Some(dlit) => dlit.is_positive() == distinguished_true,
                        None => false,
                    };
                    trail.set_extension_value(*l, value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::Trail;
    use crate::types::Antecedent;

    fn lit(i: i32) -> Lit {
        Lit::from(i)
    }

    #[test]
    fn substitution_copies_replacement_value() {
        let mut trail = Trail::new(3);
        trail.enqueue(lit(2), Antecedent::Decision);
        let mut saved = SavedClauses::new();
        saved.push_substitution(1, lit(2));
        saved.extend(&mut trail);
        assert_eq!(trail.value_of(lit(1)), Some(true));
    }

    #[test]
    fn elimination_defaults_to_false_unless_forced() {
        let mut trail = Trail::new(3);
        trail.enqueue(lit(2), Antecedent::Decision);
        trail.enqueue(lit(3), Antecedent::Decision);
        let mut saved = SavedClauses::new();
        // Saved clause (-2 v -3 v 1): forces var 1 true since 2 and 3 are both true
        // (their negations are both false), unless 1 itself satisfies it.
        saved.push_elimination(1, vec![vec![!lit(2), !lit(3), lit(1)]]);
        saved.extend(&mut trail);
        assert_eq!(trail.value_of(lit(1)), Some(true));
    }

    #[test]
    fn elimination_stays_false_when_unforced() {
        let mut trail = Trail::new(3);
        trail.enqueue(!lit(2), Antecedent::Decision);
        let mut saved = SavedClauses::new();
        saved.push_elimination(1, vec![vec![!lit(2), lit(1)]]);
        saved.extend(&mut trail);
        assert_eq!(trail.value_of(lit(1)), Some(false));
    }
}
