//! The solver's local, typed error channel.
use crate::types::VarId;
use thiserror::Error;

/// Failures reported to the caller without aborting the process. Every
/// variant carries enough context (a code via the variant itself, plus the
/// offending value) for a caller to match on programmatically.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum SolverError {
    #[error("variable {0} is out of range")]
    OutOfRange(VarId),
    #[error("bit-shift amount {0} is out of range")]
    InvalidShift(u32),
    #[error("incompatible bit widths: {0} vs {1}")]
    IncompatibleWidth(u32, u32),
    #[error("too many variables requested: {0}")]
    TooManyVariables(usize),
    #[error("clause has too many literals: {0}")]
    TooManyLiterals(usize),
    #[error("empty clause asserted")]
    EmptyClause,
    #[error("allocation failure")]
    OutOfMemory,
    #[error("internal invariant violated: {0}")]
    Internal(&'static str),
}

/// Marker for operations whose only failure mode is an input-domain error.
pub type MaybeInconsistent = Result<(), SolverError>;

/// Outcome of a `solve()` call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolveStatus {
    Sat,
    Unsat,
    /// The conflict budget was exhausted before a verdict was reached.
    Unknown,
}
