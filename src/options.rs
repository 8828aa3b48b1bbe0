//! Options for the synthesis procedure.

use crate::solver::SolverKind;

/// Options controlling translation, solving and decoding.
///
/// The defaults match the common case: initial conditions are kept, states
/// and actions are encoded as integer variables where possible, and dead
/// ends are removed from the decoded controller.
#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    /// The external solver backend to run.
    pub solver: SolverKind,
    /// Drop the initial condition of the environment transition system.
    pub ignore_env_init: bool,
    /// Drop the initial condition of the system transition system.
    pub ignore_sys_init: bool,
    /// Encode states with one Boolean variable per state instead of a
    /// single integer variable.
    pub bool_states: bool,
    /// Encode action types with one Boolean variable per value instead of
    /// a single integer variable.
    pub bool_actions: bool,
    /// Remove states with no outgoing transitions from the controller.
    pub remove_deadends: bool,
    /// Name of the variable holding the system transition system state.
    pub sys_state_var: String,
    /// Name of the variable holding the environment transition system state.
    pub env_state_var: String,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            solver: SolverKind::default(),
            ignore_env_init: false,
            ignore_sys_init: false,
            bool_states: false,
            bool_actions: false,
            remove_deadends: true,
            sys_state_var: "loc".to_string(),
            env_state_var: "eloc".to_string(),
        }
    }
}
