/*
 * Protocol Definition
 *
 * Finite-state machine over method calls on a tracked object.
 *
 * # Example: FileMustBeClosed
 * ```
 * States: {INIT, OPENED, CLOSED}, initial INIT, error {OPENED}
 * Transitions:
 *   INIT   --open()-->  OPENED
 *   OPENED --close()--> CLOSED
 *   CLOSED --open()-->  OPENED
 * Seeds: every `new File()`
 * ```
 *
 * Transitions fire when a matching call returns. A state without a
 * transition for an action stays where it is.
 *
 * # Time Complexity
 * - add_transition: O(1)
 * - next_state: O(1) (hash lookup)
 * - transition_function: O(transitions)
 */

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::value::TransitionFunction;
use crate::features::program::simple_name;

/// State in typestate protocol
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct State {
    pub name: String,
}

impl State {
    /// Create new state
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Action that triggers a state transition
///
/// Matches any callee whose simple name (after the last `.`) equals
/// `method_name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action {
    pub method_name: String,
}

impl Action {
    /// Create new action
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method_name: method.into(),
        }
    }

    /// Whether a call to `callee` performs this action
    pub fn matches(&self, callee: &str) -> bool {
        simple_name(callee) == self.method_name
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}()", self.method_name)
    }
}

/// Where tracked objects come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedRule {
    /// `var = new class()` seeds `var`
    Allocation { class: String },

    /// `r.m()` seeds `r` when `m` performs one of `actions`
    ReceiverOfCall { actions: BTreeSet<Action> },
}

/// Typestate protocol definition
///
/// # Example
/// ```ignore
/// let mut protocol = Protocol::new("File");
///
/// let init = State::new("INIT");
/// let opened = State::new("OPENED");
///
/// protocol.set_initial_state(init.clone());
/// protocol.add_error_state(opened.clone());
/// protocol.add_transition(init, Action::new("open"), opened);
/// ```
#[derive(Debug, Clone)]
pub struct Protocol {
    /// Protocol name (e.g., "FileMustBeClosed")
    pub name: String,

    /// All possible states
    pub states: BTreeSet<State>,

    /// State of a freshly seeded object
    pub initial_state: State,

    /// States that signal a violation
    pub error_states: BTreeSet<State>,

    /// Valid states at the end of an object's lifetime
    pub final_states: BTreeSet<State>,

    /// State transitions: (from_state, action) → to_state
    pub transitions: FxHashMap<(State, Action), State>,

    pub seed: SeedRule,
}

impl Protocol {
    /// Create new protocol
    ///
    /// Seeds default to allocations of a class named like the protocol.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            seed: SeedRule::Allocation {
                class: name.clone(),
            },
            name,
            states: BTreeSet::new(),
            initial_state: State::new("Initial"),
            error_states: BTreeSet::new(),
            final_states: BTreeSet::new(),
            transitions: FxHashMap::default(),
        }
    }

    /// Add state to protocol
    pub fn add_state(&mut self, state: State) {
        self.states.insert(state);
    }

    /// Add state transition
    ///
    /// # Time Complexity
    /// O(1) - Hash map insertion
    pub fn add_transition(&mut self, from: State, action: Action, to: State) {
        self.transitions.insert((from.clone(), action), to.clone());
        self.states.insert(from);
        self.states.insert(to);
    }

    /// Add the same transition for several actions
    pub fn add_transitions(&mut self, from: &State, actions: &[&str], to: &State) {
        for action in actions {
            self.add_transition(from.clone(), Action::new(*action), to.clone());
        }
    }

    pub fn can_transition(&self, from: &State, action: &Action, to: &State) -> bool {
        self.transitions.get(&(from.clone(), action.clone())) == Some(to)
    }

    /// Get next state after action (if a transition exists)
    pub fn next_state(&self, from: &State, action: &Action) -> Option<State> {
        self.transitions
            .get(&(from.clone(), action.clone()))
            .cloned()
    }

    pub fn is_error_state(&self, state: &State) -> bool {
        self.error_states.contains(state)
    }

    /// Accepting = not an error state
    pub fn is_accepting_state(&self, state: &State) -> bool {
        !self.is_error_state(state)
    }

    pub fn is_final_state(&self, state: &State) -> bool {
        self.final_states.contains(state)
    }

    /// Get initial state
    pub fn initial_state(&self) -> State {
        self.initial_state.clone()
    }

    pub fn set_initial_state(&mut self, state: State) {
        self.states.insert(state.clone());
        self.initial_state = state;
    }

    pub fn add_error_state(&mut self, state: State) {
        self.states.insert(state.clone());
        self.error_states.insert(state);
    }

    pub fn add_final_state(&mut self, state: State) {
        self.states.insert(state.clone());
        self.final_states.insert(state);
    }

    pub fn set_seed_rule(&mut self, seed: SeedRule) {
        self.seed = seed;
    }

    /// Actions that appear in at least one transition
    pub fn actions(&self) -> BTreeSet<Action> {
        self.transitions.keys().map(|(_, a)| a.clone()).collect()
    }

    /// Action performed by a call to `callee`, if any
    pub fn action_for(&self, callee: &str) -> Option<Action> {
        let action = Action::new(simple_name(callee));
        self.transitions
            .keys()
            .any(|(_, a)| *a == action)
            .then_some(action)
    }

    /// All possible actions from a state
    ///
    /// # Time Complexity
    /// O(transitions) - Linear scan of transitions
    pub fn available_actions(&self, from: &State) -> Vec<Action> {
        let mut actions: Vec<Action> = self
            .transitions
            .keys()
            .filter(|(state, _)| state == from)
            .map(|(_, action)| action.clone())
            .collect();
        actions.sort();
        actions
    }

    /// Edge-function payload for `action`: every transition labelled with it,
    /// identity on the remaining states
    pub fn transition_function(&self, action: &Action) -> TransitionFunction {
        TransitionFunction::from_transitions(
            self.transitions
                .iter()
                .filter(|((_, a), _)| a == action)
                .map(|((from, _), to)| (from.clone(), to.clone())),
        )
    }

    /// Validate protocol definition
    ///
    /// Checks:
    /// - Initial state exists in states
    /// - Error and final states exist in states
    /// - All transitions reference valid states
    /// - The initial state is not an error state
    pub fn validate(&self) -> Result<(), String> {
        if !self.states.contains(&self.initial_state) {
            return Err(format!(
                "Initial state '{}' not in states",
                self.initial_state
            ));
        }
        if self.is_error_state(&self.initial_state) {
            return Err(format!(
                "Initial state '{}' is an error state",
                self.initial_state
            ));
        }

        for state in self.error_states.iter().chain(&self.final_states) {
            if !self.states.contains(state) {
                return Err(format!("State '{}' not in states", state));
            }
        }

        for ((from, _action), to) in &self.transitions {
            if !self.states.contains(from) {
                return Err(format!("Transition from state '{}' not in states", from));
            }
            if !self.states.contains(to) {
                return Err(format!("Transition to state '{}' not in states", to));
            }
        }

        if let SeedRule::ReceiverOfCall { actions } = &self.seed {
            if actions.is_empty() {
                return Err("Seed rule names no actions".to_string());
            }
        }

        Ok(())
    }
}
