//! Solver backends invoked as external processes.
//!
//! Each backend writes the specification to a file in its input dialect,
//! runs the executable, and reads the strategy listing back from standard
//! output. The listing format is shared by both backends: a `REALIZABLE` or
//! `UNREALIZABLE` status line, followed by one line per strategy node of the
//! form `<id> : var=val ... -> <succ> <succ> ...`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

use fs_err as fs;
use log::{debug, info};
use which::which;

use crate::error::SynthesisError;
use crate::formula::{Formula, Value};
use crate::spec::{Domain, GrSpec};

use super::{SolverKind, SolverOutcome, StrategyGraph, StrategySolver};

/// A solver backend run as an external process.
pub struct ProcessSolver {
    kind: SolverKind,
    executable: PathBuf,
}

impl ProcessSolver {
    /// Locate the backend executable for `kind` in the search path.
    pub fn new(kind: SolverKind) -> Result<Self, SynthesisError> {
        let executable = which(kind.executable())
            .map_err(|_| SynthesisError::SolverNotFound(kind.executable().to_string()))?;
        Ok(Self { kind, executable })
    }

    /// Use an explicit executable instead of searching the path.
    pub fn with_executable<P: Into<PathBuf>>(kind: SolverKind, executable: P) -> Self {
        Self {
            kind,
            executable: executable.into(),
        }
    }
}

impl StrategySolver for ProcessSolver {
    fn solve(&self, spec: &GrSpec) -> Result<SolverOutcome, SynthesisError> {
        let input = match self.kind {
            SolverKind::Gr1c => render_gr1c(spec)?,
            SolverKind::Slugs => render_slugs(spec)?,
        };
        debug!("solver input:\n{}", input);

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("spec.txt");
        fs::write(&path, &input)?;

        info!("Running {} on {}", self.kind, path.display());
        let mut command = Command::new(&self.executable);
        match self.kind {
            SolverKind::Gr1c => {
                command.arg("-t").arg("aut");
            }
            SolverKind::Slugs => {
                command.arg("--explicitStrategy");
            }
        }
        let output = command.arg(&path).output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_strategy(&stdout) {
            Ok(outcome) => Ok(outcome),
            Err(parse_error) => {
                if output.status.success() {
                    Err(parse_error)
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(SynthesisError::SolverFailure(stderr.trim().to_string()))
                }
            }
        }
    }
}

/// Render a formula in the shared expression syntax of the backend input
/// dialects, replacing symbolic values by their integer encoding.
fn render_formula(formula: &Formula, spec: &GrSpec) -> Result<String, SynthesisError> {
    let rendered = match formula {
        Formula::Eq(name, Value::Sym(symbol)) => {
            let index = spec
                .domain_of(name)
                .and_then(Domain::symbols)
                .and_then(|symbols| symbols.iter().position(|s| s == symbol))
                .ok_or_else(|| SynthesisError::UnboundVariable(name.clone()))?;
            format!("{} = {}", name, index)
        }
        Formula::Not(inner) => format!("!({})", render_formula(inner, spec)?),
        Formula::And(parts) => {
            let parts: Result<Vec<_>, SynthesisError> = parts
                .iter()
                .map(|p| Ok(format!("({})", render_formula(p, spec)?)))
                .collect();
            parts?.join(" && ")
        }
        Formula::Or(parts) => {
            let parts: Result<Vec<_>, SynthesisError> = parts
                .iter()
                .map(|p| Ok(format!("({})", render_formula(p, spec)?)))
                .collect();
            parts?.join(" || ")
        }
        Formula::Next(inner) => format!("X({})", render_formula(inner, spec)?),
        Formula::Implies(lhs, rhs) => format!(
            "({}) -> ({})",
            render_formula(lhs, spec)?,
            render_formula(rhs, spec)?
        ),
        other => other.to_string(),
    };
    Ok(rendered)
}

fn render_declaration(name: &str, domain: &Domain) -> String {
    match domain {
        Domain::Boolean => name.to_string(),
        Domain::Range(low, high) => format!("{} [{}, {}]", name, low, high),
        // symbolic domains are integerized by position
        Domain::Finite(symbols) => format!("{} [0, {}]", name, symbols.len() - 1),
    }
}

/// Render the specification in the gr1c input dialect.
pub(crate) fn render_gr1c(spec: &GrSpec) -> Result<String, SynthesisError> {
    let mut out = String::new();
    for (section, vars) in [("ENV", &spec.env_vars), ("SYS", &spec.sys_vars)].iter() {
        out.push_str(section);
        out.push(':');
        for (name, domain) in vars.iter() {
            out.push(' ');
            out.push_str(&render_declaration(name, domain));
        }
        out.push_str(";\n");
    }
    for (section, formulas) in [
        ("ENVINIT", &spec.env_init),
        ("ENVTRANS", &spec.env_safety),
        ("SYSINIT", &spec.sys_init),
        ("SYSTRANS", &spec.sys_safety),
    ]
    .iter()
    {
        out.push_str(section);
        out.push_str(":\n");
        for (i, formula) in formulas.iter().enumerate() {
            if i > 0 {
                out.push_str("  & ");
            } else {
                out.push_str("    ");
            }
            out.push_str(&render_formula(formula, spec)?);
            out.push('\n');
        }
        out.push_str(";\n");
    }
    Ok(out)
}

/// Render the specification in the slugs structured dialect.
pub(crate) fn render_slugs(spec: &GrSpec) -> Result<String, SynthesisError> {
    let mut out = String::new();
    for (section, vars) in [("[INPUT]", &spec.env_vars), ("[OUTPUT]", &spec.sys_vars)].iter() {
        out.push_str(section);
        out.push('\n');
        for (name, domain) in vars.iter() {
            match domain {
                Domain::Boolean => out.push_str(name),
                Domain::Range(low, high) => {
                    out.push_str(&format!("{}: {}...{}", name, low, high))
                }
                Domain::Finite(symbols) => {
                    out.push_str(&format!("{}: 0...{}", name, symbols.len() - 1))
                }
            }
            out.push('\n');
        }
        out.push('\n');
    }
    for (section, formulas) in [
        ("[ENV_INIT]", &spec.env_init),
        ("[SYS_INIT]", &spec.sys_init),
        ("[ENV_TRANS]", &spec.env_safety),
        ("[SYS_TRANS]", &spec.sys_safety),
    ]
    .iter()
    {
        out.push_str(section);
        out.push('\n');
        for formula in formulas.iter() {
            out.push_str(&render_formula(formula, spec)?);
            out.push('\n');
        }
        out.push('\n');
    }
    Ok(out)
}

/// Parse the strategy listing emitted by a backend.
pub(crate) fn parse_strategy(listing: &str) -> Result<SolverOutcome, SynthesisError> {
    let mut lines = listing.lines().map(str::trim).filter(|l| !l.is_empty());
    let status = lines
        .next()
        .ok_or_else(|| SynthesisError::StrategyFormat("empty solver output".to_string()))?;
    match status {
        "UNREALIZABLE" => return Ok(SolverOutcome::Unrealizable),
        "REALIZABLE" => (),
        other => {
            return Err(SynthesisError::StrategyFormat(format!(
                "expected a status line, got '{}'",
                other
            )))
        }
    }

    // two passes: collect the nodes first, edges may reference forward
    let mut ids = BTreeMap::new();
    let mut parsed = Vec::new();
    for line in lines {
        let (id, valuation, successors) = parse_node_line(line)?;
        if ids.insert(id, parsed.len()).is_some() {
            return Err(SynthesisError::StrategyFormat(format!(
                "duplicate node id {}",
                id
            )));
        }
        parsed.push((valuation, successors));
    }

    let mut graph = StrategyGraph::new();
    for (valuation, _) in &parsed {
        graph.add_node(valuation.clone());
    }
    for (index, (_, successors)) in parsed.iter().enumerate() {
        for successor in successors {
            let target = *ids.get(successor).ok_or_else(|| {
                SynthesisError::StrategyFormat(format!("unknown successor id {}", successor))
            })?;
            graph.add_edge(index, target);
        }
    }
    Ok(SolverOutcome::Realizable(graph))
}

fn parse_node_line(
    line: &str,
) -> Result<(usize, BTreeMap<String, i64>, Vec<usize>), SynthesisError> {
    let malformed = || SynthesisError::StrategyFormat(format!("malformed node line '{}'", line));

    let mut head_tail = line.splitn(2, ':');
    let id = head_tail
        .next()
        .and_then(|h| h.trim().parse::<usize>().ok())
        .ok_or_else(malformed)?;
    let tail = head_tail.next().ok_or_else(malformed)?;

    let mut state_succ = tail.splitn(2, "->");
    let state = state_succ.next().ok_or_else(malformed)?;
    let successors = state_succ.next().unwrap_or("");

    let mut valuation = BTreeMap::new();
    for assignment in state.split_whitespace() {
        let mut parts = assignment.splitn(2, '=');
        let var = parts.next().ok_or_else(malformed)?;
        let value = parts
            .next()
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(malformed)?;
        valuation.insert(var.to_string(), value);
    }

    let successors: Result<Vec<usize>, _> = successors
        .split_whitespace()
        .map(|s| s.parse::<usize>().map_err(|_| malformed()))
        .collect();
    Ok((id, valuation, successors?))
}
