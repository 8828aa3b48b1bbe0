//! Finite transition systems with action-typed edge labels.
//!
//! A transition system is owned by one player: its state changes represent
//! that player's moves. Edges carry a label mapping declared action types to
//! asserted values; states carry a set of atomic propositions.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::SynthesisError;

/// The two players of the GR(1) game.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Player {
    Env,
    Sys,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Player::Env => "env",
                Player::Sys => "sys",
            }
        )
    }
}

/// Declared constraint on how many values of an action type may be asserted
/// at the same step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MustPolicy {
    /// Unconstrained.
    None,
    /// At most one value asserted.
    Mutex,
    /// Exactly one value asserted.
    Xor,
}

impl fmt::Display for MustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MustPolicy::None => "none",
                MustPolicy::Mutex => "mutex",
                MustPolicy::Xor => "xor",
            }
        )
    }
}

/// A named category of edge label with a finite codomain, owned by one player.
///
/// Ownership is an explicit field of the declaration; it is never inferred
/// from the type name.
#[derive(Debug, Clone)]
pub struct ActionType {
    pub name: String,
    pub owner: Player,
    pub codomain: Vec<String>,
    pub must: MustPolicy,
}

impl ActionType {
    pub fn new<S: Into<String>>(
        name: S,
        owner: Player,
        codomain: Vec<String>,
        must: MustPolicy,
    ) -> Self {
        Self {
            name: name.into(),
            owner,
            codomain,
            must,
        }
    }
}

/// The label of one edge: asserted action values, and the subset of action
/// types asserted at the current step instead of the next step.
#[derive(Debug, Clone, Default)]
pub struct EdgeLabel {
    pub actions: BTreeMap<String, String>,
    pub previous: BTreeSet<String>,
}

impl EdgeLabel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_action<S: Into<String>, T: Into<String>>(mut self, action_type: S, value: T) -> Self {
        self.actions.insert(action_type.into(), value.into());
        self
    }

    /// Mark an action type as asserted at the current step.
    pub fn with_previous<S: Into<String>>(mut self, action_type: S) -> Self {
        self.previous.insert(action_type.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: EdgeLabel,
}

/// A finite transition system, fully built by the modeling layer before
/// translation.
#[derive(Debug, Clone)]
pub struct TransitionSystem {
    owner: Player,
    states: Vec<String>,
    initial: BTreeSet<String>,
    aps: Vec<String>,
    state_aps: BTreeMap<String, BTreeSet<String>>,
    action_types: Vec<ActionType>,
    edges: Vec<Edge>,
}

impl TransitionSystem {
    pub fn new(owner: Player) -> Self {
        Self {
            owner,
            states: Vec::new(),
            initial: BTreeSet::new(),
            aps: Vec::new(),
            state_aps: BTreeMap::new(),
            action_types: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn owner(&self) -> Player {
        self.owner
    }

    /// Add a state; adding the same state twice is a no-op.
    pub fn add_state<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        if !self.states.contains(&name) {
            self.state_aps.insert(name.clone(), BTreeSet::new());
            self.states.push(name);
        }
    }

    pub fn add_states<S: Into<String>, I: IntoIterator<Item = S>>(&mut self, names: I) {
        for name in names {
            self.add_state(name);
        }
    }

    pub fn mark_initial(&mut self, state: &str) -> Result<(), SynthesisError> {
        if !self.states.iter().any(|s| s == state) {
            return Err(SynthesisError::UnknownState(state.to_string()));
        }
        self.initial.insert(state.to_string());
        Ok(())
    }

    /// Declare an atomic proposition; declaring it twice is a no-op.
    pub fn declare_ap<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        if !self.aps.contains(&name) {
            self.aps.push(name);
        }
    }

    /// Mark a declared atomic proposition as holding in a state.
    pub fn label_state(&mut self, state: &str, ap: &str) -> Result<(), SynthesisError> {
        if !self.aps.iter().any(|a| a == ap) {
            return Err(SynthesisError::UndeclaredProposition(ap.to_string()));
        }
        let label = self
            .state_aps
            .get_mut(state)
            .ok_or_else(|| SynthesisError::UnknownState(state.to_string()))?;
        label.insert(ap.to_string());
        Ok(())
    }

    pub fn declare_action_type(&mut self, action_type: ActionType) -> Result<(), SynthesisError> {
        if self.action_types.iter().any(|a| a.name == action_type.name) {
            return Err(SynthesisError::VariableConflict(action_type.name));
        }
        self.action_types.push(action_type);
        Ok(())
    }

    /// Add an edge. Both states must exist, every action type on the label
    /// must be declared, and every asserted value must be in its codomain.
    pub fn add_edge<S: Into<String>, T: Into<String>>(
        &mut self,
        from: S,
        to: T,
        label: EdgeLabel,
    ) -> Result<(), SynthesisError> {
        let from = from.into();
        let to = to.into();
        for state in [&from, &to].iter() {
            if !self.states.iter().any(|s| s == *state) {
                return Err(SynthesisError::UnknownState(state.to_string()));
            }
        }
        for (type_name, value) in &label.actions {
            let action_type = self
                .action_type(type_name)
                .ok_or_else(|| SynthesisError::UndeclaredActionType(type_name.clone()))?;
            if !action_type.codomain.contains(value) {
                return Err(SynthesisError::ValueOutsideCodomain {
                    action_type: type_name.clone(),
                    value: value.clone(),
                });
            }
        }
        self.edges.push(Edge { from, to, label });
        Ok(())
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn initial(&self) -> &BTreeSet<String> {
        &self.initial
    }

    pub fn aps(&self) -> &[String] {
        &self.aps
    }

    /// The atomic propositions holding in `state`.
    pub fn ap_label<'a>(&'a self, state: &str) -> impl Iterator<Item = &'a String> {
        self.state_aps.get(state).into_iter().flatten()
    }

    pub fn action_types(&self) -> &[ActionType] {
        &self.action_types
    }

    pub fn action_type(&self, name: &str) -> Option<&ActionType> {
        self.action_types.iter().find(|a| a.name == name)
    }

    pub fn edges_from<'a>(&'a self, state: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.from == state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_validation() {
        let mut ts = TransitionSystem::new(Player::Sys);
        ts.add_states(vec!["s0", "s1"]);
        ts.declare_action_type(ActionType::new(
            "act",
            Player::Sys,
            vec!["go".to_string()],
            MustPolicy::Mutex,
        ))
        .unwrap();

        let err = ts.add_edge("s0", "missing", EdgeLabel::new()).unwrap_err();
        assert!(matches!(err, SynthesisError::UnknownState(_)));

        let err = ts
            .add_edge("s0", "s1", EdgeLabel::new().with_action("other", "go"))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::UndeclaredActionType(_)));

        let err = ts
            .add_edge("s0", "s1", EdgeLabel::new().with_action("act", "stop"))
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ValueOutsideCodomain { .. }));

        ts.add_edge("s0", "s1", EdgeLabel::new().with_action("act", "go"))
            .unwrap();
        assert_eq!(ts.edges_from("s0").count(), 1);
    }

    #[test]
    fn initial_states_must_exist() {
        let mut ts = TransitionSystem::new(Player::Env);
        ts.add_state("e0");
        assert!(ts.mark_initial("e0").is_ok());
        assert!(ts.mark_initial("e1").is_err());
    }
}
