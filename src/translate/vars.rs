//! Boolean and integer encodings of state sets and action codomains.
//!
//! An encoding table maps each discrete source value to the solver-level
//! expression asserting that this value is selected: the value's own name
//! under the Boolean encoding, or an equality against a single integer
//! variable under the integer encoding.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::SynthesisError;
use crate::formula::{self, Formula};
use crate::spec::{Domain, GrSpec};
use crate::transys::{ActionType, MustPolicy, Player, TransitionSystem};

/// Source value (state name or action value) to selection expression.
pub(crate) type EncodingTable = BTreeMap<String, Formula>;

/// Action-type name to the encoding table of its codomain.
pub(crate) type ActionTables = BTreeMap<String, EncodingTable>;

/// The action encoding tables of one transition system, split by owner.
#[derive(Debug, Default)]
pub(crate) struct PartitionedActions {
    pub sys: ActionTables,
    pub env: ActionTables,
}

/// Encode every action type of the transition system, accumulating variable
/// declarations and mutex/exactly-one constraints into `spec` and returning
/// the tables partitioned by the declared owner of each type.
pub(crate) fn encode_actions(
    spec: &mut GrSpec,
    ts: &TransitionSystem,
    bool_actions: bool,
) -> Result<PartitionedActions, SynthesisError> {
    let mut parts = PartitionedActions::default();
    for action_type in ts.action_types() {
        debug!(
            "action type '{}' owned by {} with codomain {:?} (must: {})",
            action_type.name, action_type.owner, action_type.codomain, action_type.must
        );
        let table = encode_action_type(spec, action_type, bool_actions)?;
        let tables = match action_type.owner {
            Player::Env => &mut parts.env,
            Player::Sys => &mut parts.sys,
        };
        tables.insert(action_type.name.clone(), table);
    }
    Ok(parts)
}

/// Encode the codomain of one action type.
///
/// The mutex/exactly-one constraint, when applicable, is wrapped with the
/// next-time operator in the owner's safety collection and mirrored into the
/// owner's initial collection so it also holds at the first step.
pub(crate) fn encode_action_type(
    spec: &mut GrSpec,
    action_type: &ActionType,
    bool_actions: bool,
) -> Result<EncodingTable, SynthesisError> {
    if action_type.codomain.is_empty() {
        return Err(SynthesisError::EmptyDomain(action_type.name.clone()));
    }
    let use_mutex = action_type.must != MustPolicy::None;
    let min_one = action_type.must == MustPolicy::Xor;

    if !bool_actions && min_one {
        // "exactly one of N+1 values" cannot express both "none" and
        // "exactly one" without contradiction
        return Err(SynthesisError::PolicyConflict {
            action_type: action_type.name.clone(),
            policy: action_type.must,
        });
    }
    if !bool_actions && !use_mutex {
        // without mutual exclusion only Booleans can model the values
        debug!(
            "action type '{}' has no mutex policy, modeling values as Booleans",
            action_type.name
        );
    }

    if bool_actions || !use_mutex {
        let mut table = EncodingTable::new();
        let mut literals = Vec::with_capacity(action_type.codomain.len());
        for value in &action_type.codomain {
            spec.declare(action_type.owner, value, Domain::Boolean)?;
            let literal = Formula::var(value);
            table.insert(value.clone(), literal.clone());
            literals.push(literal);
        }
        if use_mutex && literals.len() > 1 {
            let constraint = if min_one {
                formula::exactly_one(&literals)
            } else {
                formula::mutex(&literals)
            };
            if let Some(constraint) = constraint {
                spec.safety_mut(action_type.owner)
                    .push(constraint.clone().next());
                spec.init_mut(action_type.owner).push(constraint);
            }
        }
        Ok(table)
    } else {
        let (table, domain) = actions_to_ints(&action_type.codomain, &action_type.name);
        spec.declare(action_type.owner, &action_type.name, domain.clone())?;
        debug!(
            "created solver variable '{}' with domain {}",
            action_type.name, domain
        );
        Ok(table)
    }
}

/// Integer encoding of an action codomain.
///
/// One extra domain value models "no action of this type asserted"; it is
/// always included here since the exactly-one policy never reaches the
/// integer encoding.
fn actions_to_ints(codomain: &[String], action_var: &str) -> (EncodingTable, Domain) {
    let numeric: Option<Vec<i64>> = codomain.iter().map(|v| v.parse::<i64>().ok()).collect();
    let mut table = EncodingTable::new();
    let domain = match numeric {
        Some(numbers) => {
            debug!("action type '{}' modeled as an integer variable", action_var);
            for (value, number) in codomain.iter().zip(numbers) {
                table.insert(value.clone(), Formula::eq_num(action_var, number));
            }
            Domain::Range(0, codomain.len() as i64)
        }
        None => {
            debug!(
                "action type '{}' modeled as an arbitrary finite domain",
                action_var
            );
            for value in codomain {
                table.insert(value.clone(), Formula::eq_sym(action_var, value));
            }
            let mut symbols = codomain.to_vec();
            symbols.push(format!("{}none", action_var));
            Domain::Finite(symbols)
        }
    };
    (table, domain)
}

/// Encode the state set of a transition system.
///
/// Boolean encoding declares one Boolean variable per state and constrains
/// exactly one of them to be active at every step. Integer encoding uses a
/// single variable named `state_var`, compact numeric if the state names
/// allow it and an arbitrary finite symbolic domain otherwise.
pub(crate) fn encode_states(
    spec: &mut GrSpec,
    owner: Player,
    states: &[String],
    state_var: &str,
    bool_states: bool,
) -> Result<EncodingTable, SynthesisError> {
    if states.is_empty() {
        return Err(SynthesisError::EmptyDomain(state_var.to_string()));
    }
    if bool_states {
        debug!("states modeled as Boolean variables");
        let mut table = EncodingTable::new();
        let mut literals = Vec::with_capacity(states.len());
        for state in states {
            spec.declare(owner, state, Domain::Boolean)?;
            let literal = Formula::var(state);
            table.insert(state.clone(), literal.clone());
            literals.push(literal);
        }
        if literals.len() > 1 {
            if let Some(constraint) = formula::exactly_one(&literals) {
                spec.safety_mut(owner).push(constraint.clone().next());
                spec.init_mut(owner).push(constraint);
            }
        }
        Ok(table)
    } else {
        let (table, domain) = states_to_ints(states, state_var);
        spec.declare(owner, state_var, domain)?;
        Ok(table)
    }
}

/// Integer encoding of a state set.
///
/// If every state name is one leading character followed by digits covering
/// the contiguous range `0..N-1`, the digits become the values of a compact
/// numeric domain (this lets the modeling layer control the numbering).
/// Otherwise the states form an arbitrary finite symbolic domain.
fn states_to_ints(states: &[String], state_var: &str) -> (EncodingTable, Domain) {
    let suffixes: Option<Vec<i64>> = states
        .iter()
        .map(|s| s.get(1..).and_then(|t| t.parse::<i64>().ok()))
        .collect();

    let compact = match suffixes {
        Some(numbers) => {
            let mut sorted = numbers.clone();
            sorted.sort_unstable();
            if sorted == (0..states.len() as i64).collect::<Vec<_>>() {
                Some(numbers)
            } else {
                warn!(
                    "state suffixes of '{}' do not cover 0..{}; falling back to a symbolic domain",
                    state_var,
                    states.len() - 1
                );
                None
            }
        }
        None => {
            debug!(
                "states of '{}' are not of the form letter+number; using a symbolic domain",
                state_var
            );
            None
        }
    };

    let mut table = EncodingTable::new();
    match compact {
        Some(numbers) => {
            for (state, number) in states.iter().zip(numbers) {
                table.insert(state.clone(), Formula::eq_num(state_var, number));
            }
            (table, Domain::Range(0, states.len() as i64 - 1))
        }
        None => {
            for state in states {
                table.insert(state.clone(), Formula::eq_sym(state_var, state));
            }
            (table, Domain::Finite(states.to_vec()))
        }
    }
}
