//! Mealy machine controllers.

mod decode;

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use log::{info, warn};

use crate::spec::Domain;

pub use decode::strategy_to_mealy;

/// Index of a state in a [`MealyMachine`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StateIndex(pub(crate) usize);

/// The value carried by one port on one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortValue {
    /// A Boolean (0/1) or integer-range value.
    Int(i64),
    /// A value of an arbitrary finite symbolic domain, mapped back from its
    /// integer encoding.
    Sym(String),
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Int(value) => write!(f, "{}", value),
            PortValue::Sym(symbol) => write!(f, "{}", symbol),
        }
    }
}

/// A declared input or output port with its domain.
#[derive(Debug, Clone)]
pub struct Port {
    pub name: String,
    pub domain: Domain,
}

/// One reactive step: the successor state and the full valuation of all
/// input and output ports.
#[derive(Debug, Clone)]
pub struct MealyTransition {
    target: StateIndex,
    label: BTreeMap<String, PortValue>,
}

impl MealyTransition {
    pub(crate) fn new(target: StateIndex, label: BTreeMap<String, PortValue>) -> Self {
        Self { target, label }
    }

    pub fn target(&self) -> StateIndex {
        self.target
    }

    pub fn label(&self) -> &BTreeMap<String, PortValue> {
        &self.label
    }
}

#[derive(Debug, Clone)]
pub struct MealyState {
    name: String,
    transitions: Vec<MealyTransition>,
}

impl MealyState {
    fn new(name: String) -> Self {
        Self {
            name,
            transitions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transitions(&self) -> &[MealyTransition] {
        &self.transitions
    }
}

/// A deterministic finite-state transducer produced by the strategy decoder.
///
/// Constructed once from an immutable strategy graph and specification and
/// not mutated afterward, except by [`remove_deadends`].
///
/// [`remove_deadends`]: MealyMachine::remove_deadends
#[derive(Debug, Clone)]
pub struct MealyMachine {
    states: Vec<MealyState>,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    initial: StateIndex,
}

impl MealyMachine {
    pub(crate) fn new(inputs: Vec<Port>, outputs: Vec<Port>) -> Self {
        Self {
            states: Vec::new(),
            inputs,
            outputs,
            initial: StateIndex(0),
        }
    }

    pub(crate) fn add_state(&mut self, name: String) -> StateIndex {
        let index = StateIndex(self.states.len());
        self.states.push(MealyState::new(name));
        index
    }

    pub(crate) fn add_transition(&mut self, from: StateIndex, transition: MealyTransition) {
        self.states[from.0].transitions.push(transition);
    }

    pub(crate) fn set_initial(&mut self, state: StateIndex) {
        self.initial = state;
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn initial_state(&self) -> StateIndex {
        self.initial
    }

    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    pub fn states(&self) -> impl Iterator<Item = &MealyState> {
        self.states.iter()
    }

    fn states_with_index(&self) -> impl Iterator<Item = (StateIndex, &MealyState)> {
        self.states.iter().enumerate().map(|(i, s)| (StateIndex(i), s))
    }

    /// Remove states with no outgoing transitions, repeatedly, so that the
    /// returned controller never runs into a step with no defined reaction.
    ///
    /// The initial pseudo-state is always kept; if it ends up with no
    /// outgoing transitions the controller is unusable and a warning is
    /// logged.
    pub fn remove_deadends(&mut self) {
        info!("Removing dead ends from machine with {} states", self.num_states());
        loop {
            let mut keep = vec![true; self.num_states()];
            let mut changed = false;
            for (index, state) in self.states_with_index() {
                if state.transitions.is_empty() && index != self.initial {
                    keep[index.0] = false;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            self.remove_states(&keep);
        }
        if self.states[self.initial.0].transitions.is_empty() {
            warn!("initial state has no outgoing transitions after dead-end removal");
        }
        info!("Machine has {} states after dead-end removal", self.num_states());
    }

    /// Rebuild the machine keeping only the flagged states, dropping
    /// transitions into removed states.
    fn remove_states(&mut self, keep: &[bool]) {
        let mut state_mapping = Vec::with_capacity(self.num_states());
        let mut new_states = Vec::new();
        for (index, state) in self.states_with_index() {
            if keep[index.0] {
                state_mapping.push(new_states.len());
                new_states.push(MealyState::new(state.name.clone()));
            } else {
                state_mapping.push(0);
            }
        }
        for (index, state) in self.states_with_index() {
            if !keep[index.0] {
                continue;
            }
            let new_index = state_mapping[index.0];
            for transition in &state.transitions {
                if keep[transition.target.0] {
                    let target = StateIndex(state_mapping[transition.target.0]);
                    new_states[new_index]
                        .transitions
                        .push(MealyTransition::new(target, transition.label.clone()));
                }
            }
        }
        self.initial = StateIndex(state_mapping[self.initial.0]);
        self.states = new_states;
    }
}

impl Index<StateIndex> for MealyMachine {
    type Output = MealyState;

    fn index(&self, index: StateIndex) -> &Self::Output {
        &self.states[index.0]
    }
}

impl fmt::Display for MealyMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "States: {}", self.num_states())?;
        writeln!(f, "Start: {}", self.states[self.initial.0].name)?;
        write!(f, "Inputs:")?;
        for port in &self.inputs {
            write!(f, " {} : {}", port.name, port.domain)?;
        }
        writeln!(f)?;
        write!(f, "Outputs:")?;
        for port in &self.outputs {
            write!(f, " {} : {}", port.name, port.domain)?;
        }
        writeln!(f)?;
        for state in &self.states {
            writeln!(f, "State: {}", state.name)?;
            for transition in &state.transitions {
                write!(f, "  -> {} [", self.states[transition.target.0].name)?;
                for (i, (port, value)) in transition.label.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", port, value)?;
                }
                writeln!(f, "]")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_with_chain() -> MealyMachine {
        // init -> a -> b, where b is a dead end
        let mut machine = MealyMachine::new(Vec::new(), Vec::new());
        let init = machine.add_state("init".to_string());
        let a = machine.add_state("a".to_string());
        let b = machine.add_state("b".to_string());
        machine.set_initial(init);
        machine.add_transition(init, MealyTransition::new(a, BTreeMap::new()));
        machine.add_transition(a, MealyTransition::new(a, BTreeMap::new()));
        machine.add_transition(a, MealyTransition::new(b, BTreeMap::new()));
        machine
    }

    #[test]
    fn dead_ends_are_removed_transitively() {
        let mut machine = machine_with_chain();
        machine.remove_deadends();
        assert_eq!(machine.num_states(), 2);
        let names: Vec<_> = machine.states().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["init", "a"]);
        // the transition into the removed dead end is gone
        assert_eq!(machine[StateIndex(1)].transitions().len(), 1);
    }

    #[test]
    fn initial_state_survives_removal() {
        let mut machine = MealyMachine::new(Vec::new(), Vec::new());
        let init = machine.add_state("init".to_string());
        machine.set_initial(init);
        machine.remove_deadends();
        assert_eq!(machine.num_states(), 1);
    }
}
