//! Integration tests driving the full pipeline from transition system
//! modeling through translation and strategy decoding, with the external
//! solver replaced by a canned strategy graph.

use std::collections::BTreeMap;

use otus::formula::Formula;
use otus::machine::PortValue;
use otus::options::SynthesisOptions;
use otus::solver::{SolverOutcome, StrategyGraph, StrategySolver};
use otus::spec::{Domain, GrSpec};
use otus::transys::{ActionType, EdgeLabel, MustPolicy, Player, TransitionSystem};
use otus::{sys_to_spec, synthesize, Status, SynthesisError};

/// A solver backend that always returns the same outcome.
struct FixedStrategy(SolverOutcome);

impl StrategySolver for FixedStrategy {
    fn solve(&self, _spec: &GrSpec) -> Result<SolverOutcome, SynthesisError> {
        Ok(self.0.clone())
    }
}

/// A system transition system with two states, an environment action type
/// with a symbolic codomain, and a cycle between the states.
fn parking_ts() -> TransitionSystem {
    let mut ts = TransitionSystem::new(Player::Sys);
    ts.add_states(vec!["x0", "x1"]);
    ts.mark_initial("x0").unwrap();
    ts.declare_action_type(ActionType::new(
        "park",
        Player::Env,
        vec!["yes".to_string(), "no".to_string()],
        MustPolicy::Mutex,
    ))
    .unwrap();
    ts.add_edge("x0", "x1", EdgeLabel::new().with_action("park", "yes"))
        .unwrap();
    ts.add_edge("x1", "x0", EdgeLabel::new().with_action("park", "no"))
        .unwrap();
    ts
}

fn node(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn sys_states_get_compact_integer_encoding() {
    let ts = parking_ts();
    let spec = sys_to_spec(&ts, false, "loc", false, false).unwrap();
    assert_eq!(spec.sys_vars.get("loc"), Some(&Domain::Range(0, 1)));
    // the environment action type becomes an env variable with a "none" value
    assert_eq!(
        spec.env_vars.get("park"),
        Some(&Domain::Finite(vec![
            "yes".to_string(),
            "no".to_string(),
            "parknone".to_string()
        ]))
    );
    assert_eq!(spec.sys_init.len(), 1);
    assert_eq!(spec.sys_init[0].to_string(), "loc = 0");
}

#[test]
fn arbitrary_state_names_use_symbolic_domain() {
    let mut ts = TransitionSystem::new(Player::Sys);
    ts.add_states(vec!["lot", "road", "home"]);
    ts.mark_initial("lot").unwrap();
    ts.add_edge("lot", "road", EdgeLabel::new()).unwrap();
    ts.add_edge("road", "home", EdgeLabel::new()).unwrap();
    ts.add_edge("home", "home", EdgeLabel::new()).unwrap();
    let spec = sys_to_spec(&ts, false, "loc", false, false).unwrap();
    match spec.sys_vars.get("loc") {
        Some(Domain::Finite(symbols)) => assert_eq!(symbols.len(), 3),
        other => panic!("expected a symbolic domain, got {:?}", other),
    }
}

#[test]
fn missing_initial_states_are_an_error() {
    let mut ts = TransitionSystem::new(Player::Sys);
    ts.add_state("x0");
    ts.add_edge("x0", "x0", EdgeLabel::new()).unwrap();
    let err = sys_to_spec(&ts, false, "loc", false, false).unwrap_err();
    assert!(matches!(err, SynthesisError::NoInitialStates));
}

#[test]
fn ignoring_initial_states_drops_the_condition() {
    let mut ts = TransitionSystem::new(Player::Sys);
    ts.add_state("x0");
    ts.add_edge("x0", "x0", EdgeLabel::new()).unwrap();
    let spec = sys_to_spec(&ts, true, "loc", false, false).unwrap();
    assert!(spec.sys_init.is_empty());
}

#[test]
fn dead_end_states_forbid_a_next_step() {
    let mut ts = TransitionSystem::new(Player::Sys);
    ts.add_states(vec!["x0", "x1"]);
    ts.mark_initial("x0").unwrap();
    ts.add_edge("x0", "x1", EdgeLabel::new()).unwrap();
    let spec = sys_to_spec(&ts, false, "loc", false, false).unwrap();
    let rendered: Vec<String> = spec.sys_safety.iter().map(|f| f.to_string()).collect();
    assert!(rendered.contains(&"(loc = 1) -> (X(False))".to_string()));
}

#[test]
fn ap_name_clashing_with_state_variable_is_rejected() {
    let mut ts = TransitionSystem::new(Player::Sys);
    ts.add_state("x0");
    ts.mark_initial("x0").unwrap();
    ts.declare_ap("loc");
    ts.label_state("x0", "loc").unwrap();
    ts.add_edge("x0", "x0", EdgeLabel::new()).unwrap();
    let err = sys_to_spec(&ts, false, "loc", false, false).unwrap_err();
    assert!(matches!(err, SynthesisError::VariableConflict(_)));
}

#[test]
fn unrealizable_outcome_has_no_controller() {
    let solver = FixedStrategy(SolverOutcome::Unrealizable);
    let result = synthesize(
        &solver,
        GrSpec::default(),
        None,
        Some(&parking_ts()),
        &SynthesisOptions::default(),
    )
    .unwrap();
    assert_eq!(result.status(), Status::Unrealizable);
    assert!(result.controller().is_none());
}

#[test]
fn strategy_decodes_to_a_controller_with_initial_pseudo_state() {
    // yes = 0, no = 1 in the integerized "park" domain
    let mut strategy = StrategyGraph::new();
    let n0 = strategy.add_node(node(&[("loc", 0), ("park", 0)]));
    let n1 = strategy.add_node(node(&[("loc", 1), ("park", 1)]));
    strategy.add_edge(n0, n1);
    strategy.add_edge(n1, n0);

    let solver = FixedStrategy(SolverOutcome::Realizable(strategy));
    let result = synthesize(
        &solver,
        GrSpec::default(),
        None,
        Some(&parking_ts()),
        &SynthesisOptions::default(),
    )
    .unwrap();
    assert_eq!(result.status(), Status::Realizable);

    let controller = result.into_controller().unwrap();
    assert_eq!(controller.num_states(), 3);
    assert_eq!(controller[controller.initial_state()].name(), "Sinit");

    // only n0 satisfies the initial condition loc = 0
    let initial = &controller[controller.initial_state()];
    assert_eq!(initial.transitions().len(), 1);
    let first = &initial.transitions()[0];
    assert_eq!(controller[first.target()].name(), "n0");
    assert_eq!(first.label()["loc"], PortValue::Int(0));
    // symbolic values are mapped back from their integer encoding
    assert_eq!(first.label()["park"], PortValue::Sym("yes".to_string()));

    let step = &controller[first.target()].transitions()[0];
    assert_eq!(controller[step.target()].name(), "n1");
    assert_eq!(step.label()["park"], PortValue::Sym("no".to_string()));
}

#[test]
fn dead_end_strategy_nodes_are_pruned_from_the_controller() {
    let mut strategy = StrategyGraph::new();
    let n0 = strategy.add_node(node(&[("loc", 0), ("park", 0)]));
    let n1 = strategy.add_node(node(&[("loc", 1), ("park", 1)]));
    let n2 = strategy.add_node(node(&[("loc", 1), ("park", 2)]));
    strategy.add_edge(n0, n1);
    strategy.add_edge(n0, n2);
    strategy.add_edge(n1, n0);

    let solver = FixedStrategy(SolverOutcome::Realizable(strategy));
    let result = synthesize(
        &solver,
        GrSpec::default(),
        None,
        Some(&parking_ts()),
        &SynthesisOptions::default(),
    )
    .unwrap();

    let controller = result.into_controller().unwrap();
    let names: Vec<_> = controller.states().map(|s| s.name().to_string()).collect();
    assert!(!names.contains(&"n2".to_string()));
    assert_eq!(controller.num_states(), 3);
}

#[test]
fn deadend_removal_can_be_disabled() {
    let mut strategy = StrategyGraph::new();
    let n0 = strategy.add_node(node(&[("loc", 0), ("park", 0)]));
    let n1 = strategy.add_node(node(&[("loc", 1), ("park", 1)]));
    strategy.add_edge(n0, n1);

    let solver = FixedStrategy(SolverOutcome::Realizable(strategy));
    let options = SynthesisOptions {
        remove_deadends: false,
        ..SynthesisOptions::default()
    };
    let result = synthesize(
        &solver,
        GrSpec::default(),
        None,
        Some(&parking_ts()),
        &options,
    )
    .unwrap();

    let controller = result.into_controller().unwrap();
    assert_eq!(controller.num_states(), 3);
    let names: Vec<_> = controller.states().map(|s| s.name().to_string()).collect();
    assert!(names.contains(&"n1".to_string()));
}

#[test]
fn base_specification_formulas_survive_the_merge() {
    let mut base = GrSpec::default();
    base.declare(Player::Env, "request", Domain::Boolean).unwrap();
    base.env_init.push(Formula::var("request").not());

    let solver = FixedStrategy(SolverOutcome::Unrealizable);
    let options = SynthesisOptions::default();
    let combined =
        otus::spec_plus_sys(base, None, Some(&parking_ts()), &options).unwrap();
    assert!(combined.env_vars.contains_key("request"));
    assert!(combined.env_vars.contains_key("park"));
    assert!(combined.sys_vars.contains_key("loc"));
    assert_eq!(combined.env_init.len(), 1);

    // and the merged specification still solves
    let result = synthesize(&solver, combined, None, None, &options).unwrap();
    assert_eq!(result.status(), Status::Unrealizable);
}
