//! Decoding of solver strategies into Mealy machines.
//!
//! The strategy graph is the deterministic game graph returned by the
//! external solver; every node carries the valuation of every declared
//! variable. Decoding adds a synthetic initial pseudo-state `Sinit` whose
//! outgoing edges are exactly the nodes that satisfy both players'
//! initial-condition formulas.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::SynthesisError;
use crate::formula::{Formula, Valuation};
use crate::spec::{Domain, GrSpec};
use crate::solver::StrategyGraph;

use super::{MealyMachine, MealyTransition, Port, PortValue, StateIndex};

/// A strategy-graph node valuation viewed through the specification's
/// domains, for evaluating initial-condition formulas.
struct NodeValuation<'a> {
    spec: &'a GrSpec,
    values: &'a BTreeMap<String, i64>,
}

impl<'a> Valuation for NodeValuation<'a> {
    fn value(&self, var: &str) -> Option<i64> {
        self.values.get(var).copied()
    }

    fn symbol_index(&self, var: &str, symbol: &str) -> Option<i64> {
        let symbols = self.spec.domain_of(var)?.symbols()?;
        symbols.iter().position(|s| s == symbol).map(|i| i as i64)
    }
}

/// Convert a deterministic strategy graph into a Mealy machine.
///
/// Environment variables become input ports and system variables output
/// ports. A strategy graph with zero nodes yields a machine consisting only
/// of `Sinit` with no outgoing edges; callers must treat that as a contract
/// violation of the solver boundary, not as a valid controller.
pub fn strategy_to_mealy(
    strategy: &StrategyGraph,
    spec: &GrSpec,
) -> Result<MealyMachine, SynthesisError> {
    let inputs = ports(&spec.env_vars);
    let outputs = ports(&spec.sys_vars);
    let mut machine = MealyMachine::new(inputs, outputs);

    for (index, _) in strategy.nodes().iter().enumerate() {
        machine.add_state(format!("n{}", index));
    }
    for (index, node) in strategy.nodes().iter().enumerate() {
        for &successor in &node.successors {
            let target = strategy.nodes().get(successor).ok_or_else(|| {
                SynthesisError::StrategyFormat(format!(
                    "edge from node {} references unknown node {}",
                    index, successor
                ))
            })?;
            let label = port_label(spec, &target.valuation)?;
            machine.add_transition(
                StateIndex(index),
                MealyTransition::new(StateIndex(successor), label),
            );
        }
    }

    let initial = machine.add_state("Sinit".to_string());
    machine.set_initial(initial);

    // Sinit's outgoing edges are the legal first reactions to a legal
    // initial environment input
    for (index, node) in strategy.nodes().iter().enumerate() {
        let valuation = NodeValuation {
            spec,
            values: &node.valuation,
        };
        if satisfies_all(&spec.env_init, &valuation)? && satisfies_all(&spec.sys_init, &valuation)? {
            debug!("node {} satisfies both initial conditions", index);
            let label = port_label(spec, &node.valuation)?;
            machine.add_transition(initial, MealyTransition::new(StateIndex(index), label));
        }
    }

    if strategy.nodes().is_empty() {
        warn!(
            "strategy graph has no nodes; the resulting machine has only the \
             initial pseudo-state"
        );
    }
    Ok(machine)
}

fn ports(vars: &BTreeMap<String, Domain>) -> Vec<Port> {
    vars.iter()
        .map(|(name, domain)| Port {
            name: name.clone(),
            domain: domain.clone(),
        })
        .collect()
}

fn satisfies_all<V: Valuation>(formulas: &[Formula], valuation: &V) -> Result<bool, SynthesisError> {
    for formula in formulas {
        if !formula.evaluate(valuation)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Reconstruct the full port valuation of one strategy node, mapping values
/// of arbitrary finite domains back from their integer encoding to the
/// original symbol.
fn port_label(
    spec: &GrSpec,
    values: &BTreeMap<String, i64>,
) -> Result<BTreeMap<String, PortValue>, SynthesisError> {
    let mut label = BTreeMap::new();
    for (name, domain) in spec.env_vars.iter().chain(spec.sys_vars.iter()) {
        let raw = *values.get(name).ok_or_else(|| {
            SynthesisError::StrategyFormat(format!("node valuation missing variable '{}'", name))
        })?;
        let value = match domain {
            Domain::Finite(symbols) => {
                let symbol = symbols.get(raw as usize).ok_or_else(|| {
                    SynthesisError::StrategyFormat(format!(
                        "value {} out of range for the domain of '{}'",
                        raw, name
                    ))
                })?;
                PortValue::Sym(symbol.clone())
            }
            _ => PortValue::Int(raw),
        };
        label.insert(name.clone(), value);
    }
    Ok(label)
}
