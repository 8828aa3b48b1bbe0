//! GR(1) synthesis from finite transition systems.
//!
//! The crate translates labeled finite transition systems into GR(1)
//! specifications, hands them to an external realizability solver and
//! decodes the returned strategy into a Mealy machine controller. The
//! game solving itself is delegated through the [`StrategySolver`] trait;
//! [`ProcessSolver`](solver::ProcessSolver) runs the supported backends as
//! external processes.

mod error;
pub mod formula;
pub mod machine;
pub mod options;
pub mod solver;
pub mod spec;
pub mod translate;
pub mod transys;

use std::fmt::{self, Display};

use log::{debug, info};

use machine::MealyMachine;
use options::SynthesisOptions;
use solver::{ProcessSolver, SolverOutcome, StrategySolver};
use spec::GrSpec;
use transys::TransitionSystem;

pub use error::SynthesisError;
pub use translate::{env_to_spec, sys_to_spec};

/// The realizability status of a specification.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Status {
    Realizable,
    Unrealizable,
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Status::Realizable => "REALIZABLE",
                Status::Unrealizable => "UNREALIZABLE",
            }
        )
    }
}

/// The result of a synthesis run: the status and, if realizable, the
/// decoded controller.
#[derive(Debug)]
pub struct SynthesisResult {
    status: Status,
    controller: Option<MealyMachine>,
}

impl SynthesisResult {
    pub fn status(&self) -> Status {
        self.status
    }

    pub fn controller(&self) -> Option<&MealyMachine> {
        self.controller.as_ref()
    }

    pub fn into_controller(self) -> Option<MealyMachine> {
        self.controller
    }
}

/// Build the specification to solve: the given base specification conjoined
/// with the GR(1) representation of the optional environment and system
/// transition systems.
pub fn spec_plus_sys(
    spec: GrSpec,
    env_ts: Option<&TransitionSystem>,
    sys_ts: Option<&TransitionSystem>,
    options: &SynthesisOptions,
) -> Result<GrSpec, SynthesisError> {
    let mut combined = spec;
    if let Some(ts) = env_ts {
        info!("Translating environment transition system");
        let part = env_to_spec(
            ts,
            options.ignore_env_init,
            &options.env_state_var,
            options.bool_states,
            options.bool_actions,
        )?;
        combined = combined.merge(part)?;
    }
    if let Some(ts) = sys_ts {
        info!("Translating system transition system");
        let part = sys_to_spec(
            ts,
            options.ignore_sys_init,
            &options.sys_state_var,
            options.bool_states,
            options.bool_actions,
        )?;
        combined = combined.merge(part)?;
    }
    debug!("Combined specification:\n{}", combined);
    Ok(combined)
}

/// Synthesize a controller with the given solver backend.
pub fn synthesize<S: StrategySolver>(
    solver: &S,
    spec: GrSpec,
    env_ts: Option<&TransitionSystem>,
    sys_ts: Option<&TransitionSystem>,
    options: &SynthesisOptions,
) -> Result<SynthesisResult, SynthesisError> {
    let combined = spec_plus_sys(spec, env_ts, sys_ts, options)?;
    info!("Solving specification");
    match solver.solve(&combined)? {
        SolverOutcome::Unrealizable => {
            info!("Specification is unrealizable");
            Ok(SynthesisResult {
                status: Status::Unrealizable,
                controller: None,
            })
        }
        SolverOutcome::Realizable(strategy) => {
            info!("Specification is realizable, decoding strategy");
            let mut controller = machine::strategy_to_mealy(&strategy, &combined)?;
            if options.remove_deadends {
                controller.remove_deadends();
            }
            Ok(SynthesisResult {
                status: Status::Realizable,
                controller: Some(controller),
            })
        }
    }
}

/// Test realizability only, discarding any strategy.
pub fn is_realizable<S: StrategySolver>(
    solver: &S,
    spec: GrSpec,
    env_ts: Option<&TransitionSystem>,
    sys_ts: Option<&TransitionSystem>,
    options: &SynthesisOptions,
) -> Result<bool, SynthesisError> {
    let combined = spec_plus_sys(spec, env_ts, sys_ts, options)?;
    match solver.solve(&combined)? {
        SolverOutcome::Unrealizable => Ok(false),
        SolverOutcome::Realizable(_) => Ok(true),
    }
}

/// Synthesize with the backend selected in the options, located in the
/// search path.
pub fn synthesize_with(
    spec: GrSpec,
    env_ts: Option<&TransitionSystem>,
    sys_ts: Option<&TransitionSystem>,
    options: &SynthesisOptions,
) -> Result<SynthesisResult, SynthesisError> {
    let solver = ProcessSolver::new(options.solver)?;
    synthesize(&solver, spec, env_ts, sys_ts, options)
}
