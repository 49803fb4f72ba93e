//! Precondition errors returned by the `add_*` family. Conflicts discovered
//! during search are never surfaced this way — they become part of the
//! solver's internal UNSAT state instead (see spec.md §7).
use std::{error, fmt};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SolverError {
    /// A pseudo-Boolean constraint normalized down to no terms but kept a
    /// positive threshold, i.e. `0 >= k` for `k > 0`.
    EmptyPbWithPositiveThreshold,
    /// A coefficient was negative; callers must flip the literal instead
    /// (`c * x == c + (-c) * !x`, so negative coefficients are never valid
    /// input to `PbConstraint::new`).
    NegativeCoefficient,
    /// A `Var`/`Lit` referenced a variable index never returned by
    /// `new_var`.
    VarOutOfRange,
    /// A constraint was added after the solver already proved UNSAT at the
    /// ground decision level; the solver stays in that state permanently.
    AlreadyUnsat,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SolverError::EmptyPbWithPositiveThreshold => {
                write!(f, "pseudo-boolean constraint is unsatisfiable by construction (0 >= k, k > 0)")
            }
            SolverError::NegativeCoefficient => write!(f, "pseudo-boolean coefficient must be non-negative"),
            SolverError::VarOutOfRange => write!(f, "literal refers to an unknown variable"),
            SolverError::AlreadyUnsat => write!(f, "solver is already unsatisfiable at the ground level"),
        }
    }
}

impl error::Error for SolverError {}
