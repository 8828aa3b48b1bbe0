//! Errors raised during translation, encoding and solving.

use std::io;

use thiserror::Error;

use crate::transys::{MustPolicy, Player};

/// Errors of the translation and decoding pipeline.
///
/// All variants are propagated to the caller; nothing is retried locally.
/// An unrealizable specification is *not* an error, see
/// [`SolverOutcome`](crate::solver::SolverOutcome).
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// A variable name is already taken in either declaration map.
    #[error("variable '{0}' is already declared")]
    VariableConflict(String),
    /// An empty value set was handed to the variable encoder.
    #[error("cannot encode the empty domain of '{0}'")]
    EmptyDomain(String),
    /// The transition system declares no initial states, which would render
    /// the owning player's part of the specification trivially false.
    #[error(
        "transition system has no initial states; encoding this would make \
         the guarantee unsatisfiable for a system-owned transition system, \
         or the assumption vacuous for an environment-owned one"
    )]
    NoInitialStates,
    /// The requested encoding cannot express the declared must-policy.
    #[error("must-policy '{policy}' of action type '{action_type}' cannot be combined with an integer encoding")]
    PolicyConflict {
        action_type: String,
        policy: MustPolicy,
    },
    /// A translation entry point received a transition system owned by the
    /// other player.
    #[error("expected a transition system owned by '{expected}', got one owned by '{found}'")]
    OwnershipMismatch { expected: Player, found: Player },
    /// An unrecognized solver-selection token.
    #[error("unknown solver '{0}', available solvers: \"gr1c\" and \"slugs\"")]
    UnsupportedSolver(String),
    /// An edge or initial-state marker references a state that was never added.
    #[error("unknown state '{0}'")]
    UnknownState(String),
    /// An edge label carries an action type that was never declared.
    #[error("undeclared action type '{0}' on an edge label")]
    UndeclaredActionType(String),
    /// A state label carries an atomic proposition that was never declared.
    #[error("undeclared atomic proposition '{0}' on a state label")]
    UndeclaredProposition(String),
    /// An edge label asserts a value outside the action type's codomain.
    #[error("value '{value}' is not in the codomain of action type '{action_type}'")]
    ValueOutsideCodomain { action_type: String, value: String },
    /// A formula was evaluated against a valuation that does not bind one of
    /// its variables, or binds a symbol outside the variable's domain.
    #[error("formula references '{0}' which is not bound by the valuation")]
    UnboundVariable(String),
    /// The selected solver executable could not be located.
    #[error("solver executable '{0}' not found in PATH")]
    SolverNotFound(String),
    /// The solver process failed without producing a strategy.
    #[error("solver backend failed: {0}")]
    SolverFailure(String),
    /// The strategy listing returned by the solver could not be parsed.
    #[error("malformed strategy listing: {0}")]
    StrategyFormat(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}
