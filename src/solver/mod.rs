//! The boundary to external GR(1) game solvers.
//!
//! The solver is a black box: it accepts a specification and returns either
//! "unrealizable" or a deterministic strategy graph with fully valuated
//! nodes. Determinism of the returned graph is the solver's contract and is
//! not re-verified here.

mod process;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SynthesisError;
use crate::spec::GrSpec;

pub use process::ProcessSolver;

/// The supported external solver backends.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SolverKind {
    Gr1c,
    Slugs,
}

impl SolverKind {
    /// Name of the backend executable.
    pub fn executable(self) -> &'static str {
        match self {
            SolverKind::Gr1c => "gr1c",
            SolverKind::Slugs => "slugs",
        }
    }
}

impl Default for SolverKind {
    fn default() -> Self {
        SolverKind::Gr1c
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.executable())
    }
}

impl FromStr for SolverKind {
    type Err = SynthesisError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "gr1c" => Ok(SolverKind::Gr1c),
            "slugs" => Ok(SolverKind::Slugs),
            other => Err(SynthesisError::UnsupportedSolver(other.to_string())),
        }
    }
}

/// One node of a strategy graph: the valuation of every declared variable
/// (an integer, for both Boolean and integer-encoded variables) and the
/// indices of the successor nodes.
#[derive(Debug, Clone, Default)]
pub struct StrategyNode {
    pub valuation: BTreeMap<String, i64>,
    pub successors: Vec<usize>,
}

/// The deterministic game graph returned by a realizability solver.
#[derive(Debug, Clone, Default)]
pub struct StrategyGraph {
    nodes: Vec<StrategyNode>,
}

impl StrategyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, valuation: BTreeMap<String, i64>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(StrategyNode {
            valuation,
            successors: Vec::new(),
        });
        index
    }

    pub fn add_edge(&mut self, from: usize, to: usize) {
        self.nodes[from].successors.push(to);
    }

    pub fn nodes(&self) -> &[StrategyNode] {
        &self.nodes
    }
}

/// The defined outcomes of a solver run. Unrealizability is not an error.
#[derive(Debug, Clone)]
pub enum SolverOutcome {
    Unrealizable,
    Realizable(StrategyGraph),
}

/// The contract of an external GR(1) solver backend.
pub trait StrategySolver {
    fn solve(&self, spec: &GrSpec) -> Result<SolverOutcome, SynthesisError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_tokens() {
        assert_eq!("gr1c".parse::<SolverKind>().unwrap(), SolverKind::Gr1c);
        assert_eq!("slugs".parse::<SolverKind>().unwrap(), SolverKind::Slugs);
        let err = "jtlv".parse::<SolverKind>().unwrap_err();
        assert!(matches!(err, SynthesisError::UnsupportedSolver(_)));
    }
}
