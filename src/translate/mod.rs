//! Translation of finite transition systems into GR(1) form.
//!
//! A system-owned transition system contributes its current state, its
//! atomic propositions and its system actions as system variables, and its
//! environment actions as environment variables; an environment-owned
//! transition system is the mirror image. The two resulting specifications
//! are designed to be merged before solving.

mod vars;

use std::collections::BTreeSet;

use log::{debug, warn};

use crate::error::SynthesisError;
use crate::formula::{self, Formula};
use crate::spec::{Domain, GrSpec};
use crate::transys::{EdgeLabel, Player, TransitionSystem};

use vars::{ActionTables, EncodingTable, PartitionedActions};

/// Convert a system-owned transition system to its GR(1) representation.
///
/// The current state, the atomic propositions and the system actions become
/// system variables; the environment actions become environment variables.
pub fn sys_to_spec(
    ts: &TransitionSystem,
    ignore_initial: bool,
    state_var: &str,
    bool_states: bool,
    bool_actions: bool,
) -> Result<GrSpec, SynthesisError> {
    if ts.owner() != Player::Sys {
        return Err(SynthesisError::OwnershipMismatch {
            expected: Player::Sys,
            found: ts.owner(),
        });
    }
    let mut spec = GrSpec::default();
    for ap in ts.aps() {
        spec.declare(Player::Sys, ap, Domain::Boolean)?;
    }
    let actions = vars::encode_actions(&mut spec, ts, bool_actions)?;
    let state_ids = vars::encode_states(&mut spec, Player::Sys, ts.states(), state_var, bool_states)?;

    let init = initial_condition(ts, &state_ids, ignore_initial)?;
    spec.sys_init.extend(init);

    let safety = sys_safety_from_ts(ts, &state_ids, &actions)?;
    spec.sys_safety.extend(safety);

    let (ap_init, ap_safety) = ap_consistency(ts, &state_ids);
    spec.sys_init.extend(ap_init);
    spec.sys_safety.extend(ap_safety);

    let admissible = env_safety_from_sys_ts(ts, &state_ids, &actions.env)?;
    spec.env_safety.extend(admissible);

    Ok(spec)
}

/// Convert an environment-owned transition system to its GR(1)
/// representation; the mirror of [`sys_to_spec`] with player roles swapped.
pub fn env_to_spec(
    ts: &TransitionSystem,
    ignore_initial: bool,
    state_var: &str,
    bool_states: bool,
    bool_actions: bool,
) -> Result<GrSpec, SynthesisError> {
    if ts.owner() != Player::Env {
        return Err(SynthesisError::OwnershipMismatch {
            expected: Player::Env,
            found: ts.owner(),
        });
    }
    let mut spec = GrSpec::default();
    // propositions are tied to environment states, so they are env variables
    for ap in ts.aps() {
        spec.declare(Player::Env, ap, Domain::Boolean)?;
    }
    let actions = vars::encode_actions(&mut spec, ts, bool_actions)?;
    let state_ids = vars::encode_states(&mut spec, Player::Env, ts.states(), state_var, bool_states)?;

    let init = initial_condition(ts, &state_ids, ignore_initial)?;
    spec.env_init.extend(init);

    let safety = env_safety_from_env_ts(ts, &state_ids, &actions)?;
    spec.env_safety.extend(safety);

    let (ap_init, ap_safety) = ap_consistency(ts, &state_ids);
    spec.env_init.extend(ap_init);
    spec.env_safety.extend(ap_safety);

    Ok(spec)
}

/// The initial-condition disjunction over the encoded initial states.
///
/// An empty initial set is a configuration error, never silently weakened
/// to `False`: it would make a guarantee unsatisfiable or an assumption
/// vacuous, masking bugs.
fn initial_condition(
    ts: &TransitionSystem,
    state_ids: &EncodingTable,
    ignore_initial: bool,
) -> Result<Vec<Formula>, SynthesisError> {
    if ignore_initial {
        return Ok(Vec::new());
    }
    if ts.initial().is_empty() {
        return Err(SynthesisError::NoInitialStates);
    }
    let disjuncts = ts
        .states()
        .iter()
        .filter(|s| ts.initial().contains(*s))
        .map(|s| state_ids[s].clone())
        .collect();
    Ok(vec![formula::disjunction(disjuncts)])
}

/// Conjunction of the encoded values of the label's actions that are present
/// in `tables`, restricted to the previous or non-previous subset.
///
/// Action types marked `previous` on the label are asserted at the current
/// step, the rest at the step selected by `nxt`; this lets one edge mix
/// current and next actions.
fn grouped_actions(
    label: &EdgeLabel,
    tables: &ActionTables,
    take_previous: bool,
    nxt: bool,
) -> Result<Option<Formula>, SynthesisError> {
    let mut exprs = Vec::new();
    for (type_name, value) in &label.actions {
        let table = match tables.get(type_name) {
            Some(table) => table,
            None => continue,
        };
        if label.previous.contains(type_name) != take_previous {
            continue;
        }
        let expr = table
            .get(value)
            .ok_or_else(|| SynthesisError::ValueOutsideCodomain {
                action_type: type_name.clone(),
                value: value.clone(),
            })?;
        exprs.push(expr.clone());
    }
    if exprs.is_empty() {
        return Ok(None);
    }
    let conjunct = formula::conjunction(exprs);
    Ok(Some(if nxt { conjunct.next() } else { conjunct }))
}

/// Convert the transition relation of a system-owned transition system to
/// system safety formulas.
///
/// Every state yields one formula `precondition -> (disjunction of edges)`;
/// a state with no outgoing edges yields the explicit dead-end
/// `precondition -> X(False)`.
fn sys_safety_from_ts(
    ts: &TransitionSystem,
    state_ids: &EncodingTable,
    actions: &PartitionedActions,
) -> Result<Vec<Formula>, SynthesisError> {
    let mut safety = Vec::new();
    for state in ts.states() {
        let precondition = state_ids[state].clone();
        let edges: Vec<_> = ts.edges_from(state).collect();
        if edges.is_empty() {
            debug!("state '{}' is a dead end", state);
            safety.push(precondition.implies(Formula::False.next()));
            continue;
        }
        let mut branches = Vec::with_capacity(edges.len());
        for edge in edges {
            let mut postcondition = vec![state_ids[&edge.to].clone().next()];
            // the system moves now, so all actions default to next-time
            for (tables, take_previous, nxt) in [
                (&actions.env, true, false),
                (&actions.env, false, true),
                (&actions.sys, true, false),
                (&actions.sys, false, true),
            ]
            .iter()
            {
                if let Some(group) = grouped_actions(&edge.label, tables, *take_previous, *nxt)? {
                    postcondition.push(group);
                }
            }
            branches.push(formula::conjunction(postcondition));
        }
        safety.push(precondition.implies(formula::disjunction(branches)));
    }
    Ok(safety)
}

/// Convert the transition relation of an environment-owned transition system
/// to environment safety formulas.
///
/// The next environment state is constrained by the current environment
/// state and the current system output: environment actions default to
/// next-time, system actions are asserted at the current step.
fn env_safety_from_env_ts(
    ts: &TransitionSystem,
    state_ids: &EncodingTable,
    actions: &PartitionedActions,
) -> Result<Vec<Formula>, SynthesisError> {
    let mut safety = Vec::new();
    for state in ts.states() {
        let precondition = state_ids[state].clone();
        let edges: Vec<_> = ts.edges_from(state).collect();
        if edges.is_empty() {
            warn!(
                "environment dead-end at state '{}': if the system can force it, \
                 the assumption becomes false and the specification trivially true",
                state
            );
            safety.push(precondition.implies(Formula::False.next()));
            continue;
        }
        let mut branches = Vec::with_capacity(edges.len());
        // is any outgoing edge unconditioned on a system action?
        let mut found_free = false;
        for edge in &edges {
            let mut postcondition = vec![state_ids[&edge.to].clone().next()];
            for (tables, take_previous, nxt) in [
                (&actions.env, true, false),
                (&actions.env, false, true),
                (&actions.sys, true, false),
                (&actions.sys, false, false),
            ]
            .iter()
            {
                if let Some(group) = grouped_actions(&edge.label, tables, *take_previous, *nxt)? {
                    postcondition.push(group);
                }
            }
            if !edge
                .label
                .actions
                .keys()
                .any(|k| actions.sys.contains_key(k))
            {
                found_free = true;
            }
            branches.push(formula::conjunction(postcondition));
        }
        if !found_free && !actions.sys.is_empty() {
            // otherwise the system could falsify the assumption by asserting
            // an action combination no edge is conditioned on
            debug!(
                "no free outgoing transition from '{}'; \
                 adding disjuncts with negated system actions",
                state
            );
            for table in actions.sys.values() {
                branches.push(formula::negated_conjunction(table.values()));
            }
        }
        safety.push(precondition.implies(formula::disjunction(branches)));
    }
    Ok(safety)
}

/// Restrict the environment's next action to combinations for which the
/// system-owned transition relation has a defined move.
///
/// Without this, the environment could dead-end the system and vacuously
/// satisfy the guarantee, trivializing synthesis.
fn env_safety_from_sys_ts(
    ts: &TransitionSystem,
    state_ids: &EncodingTable,
    env_tables: &ActionTables,
) -> Result<Vec<Formula>, SynthesisError> {
    let mut safety = Vec::new();
    if env_tables.is_empty() {
        return Ok(safety);
    }
    for state in ts.states() {
        let precondition = state_ids[state].clone();
        let edges: Vec<_> = ts.edges_from(state).collect();
        // a dead end is already handled by the system's X(False)
        if edges.is_empty() {
            continue;
        }
        let mut combinations = Vec::new();
        let mut seen = BTreeSet::new();
        for edge in edges {
            let mut exprs = Vec::new();
            for (type_name, value) in &edge.label.actions {
                if let Some(table) = env_tables.get(type_name) {
                    let expr =
                        table
                            .get(value)
                            .ok_or_else(|| SynthesisError::ValueOutsideCodomain {
                                action_type: type_name.clone(),
                                value: value.clone(),
                            })?;
                    exprs.push(expr.clone());
                }
            }
            if exprs.is_empty() {
                continue;
            }
            let combination = formula::conjunction(exprs);
            if seen.insert(combination.to_string()) {
                combinations.push(combination);
            }
        }
        if combinations.is_empty() {
            continue;
        }
        safety.push(precondition.implies(formula::disjunction(combinations).next()));
    }
    Ok(safety)
}

/// Require the atomic propositions to follow the state labeling.
///
/// For every state with at least one proposition declared true, an initial
/// formula forbids the state unless exactly that valuation holds, and a
/// safety formula forces the valuation at every next step.
fn ap_consistency(ts: &TransitionSystem, state_ids: &EncodingTable) -> (Vec<Formula>, Vec<Formula>) {
    let mut init = Vec::new();
    let mut safety = Vec::new();
    if ts.aps().is_empty() {
        return (init, safety);
    }
    for state in ts.states() {
        let label: BTreeSet<&String> = ts.ap_label(state).collect();
        if label.is_empty() {
            continue;
        }
        let valuation = formula::conjunction(
            ts.aps()
                .iter()
                .map(|ap| {
                    if label.contains(ap) {
                        Formula::var(ap)
                    } else {
                        Formula::var(ap).not()
                    }
                })
                .collect(),
        );
        let state_id = state_ids[state].clone();
        init.push(formula::disjunction(vec![
            state_id.clone().not(),
            valuation.clone(),
        ]));
        safety.push(state_id.implies(valuation).next());
    }
    (init, safety)
}
