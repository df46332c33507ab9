/*
 * Protocol Definition Language Parser
 *
 * Parse protocol definitions from YAML/JSON for custom resource types.
 *
 * # Schema
 * ```yaml
 * protocol: SocketMustBeClosed
 * initial_state: Fresh
 * error_states: [Connected]
 * final_states: [Fresh, Closed]
 * seed:
 *   allocation: Socket
 * transitions:
 *   - from: Fresh
 *     action: connect
 *     to: Connected
 *   - from: Connected
 *     action: close
 *     to: Closed
 * ```
 *
 * `seed` is either `allocation: <class>` or `receiver_of: [<action>, ...]`
 * and defaults to allocations of a class named like the protocol.
 *
 * # Validation
 * - Initial, error and final states must appear in transitions
 * - Error states must be reachable from the initial state
 * - Seed actions must appear in transitions
 */

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::typestate::domain::{Action, Protocol, SeedRule, State};

/// Protocol configuration (YAML/JSON schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProtocolConfig {
    /// Protocol name
    pub protocol: String,

    /// Initial state
    pub initial_state: String,

    #[serde(default)]
    pub error_states: Vec<String>,

    /// Final states (valid at the end of an object's lifetime)
    #[serde(default)]
    pub final_states: Vec<String>,

    #[serde(default)]
    pub seed: Option<SeedConfig>,

    /// State transitions
    pub transitions: Vec<TransitionConfig>,
}

/// Transition configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Source state
    pub from: String,

    /// Action (method name)
    pub action: String,

    /// Target state
    pub to: String,
}

/// Seed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedConfig {
    Allocation(String),
    ReceiverOf(Vec<String>),
}

/// Protocol parser
pub struct ProtocolParser;

/// Parse error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// YAML/JSON syntax error
    #[error("Syntax error: {0}")]
    SyntaxError(String),

    /// Schema validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Semantic error (unknown or unreachable states, etc.)
    #[error("Semantic error: {0}")]
    SemanticError(String),
}

impl ProtocolParser {
    /// Parse protocol from YAML
    ///
    /// # Example
    /// ```rust,ignore
    /// let yaml = r#"
    /// protocol: File
    /// initial_state: INIT
    /// error_states: [OPENED]
    /// transitions:
    ///   - from: INIT
    ///     action: open
    ///     to: OPENED
    /// "#;
    ///
    /// let protocol = ProtocolParser::from_yaml(yaml)?;
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Protocol, ParseError> {
        let config: ProtocolConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ParseError::SyntaxError(format!("YAML parse error: {}", e)))?;

        Self::build_protocol(config)
    }

    /// Parse protocol from JSON
    pub fn from_json(json: &str) -> Result<Protocol, ParseError> {
        let config: ProtocolConfig = serde_json::from_str(json)
            .map_err(|e| ParseError::SyntaxError(format!("JSON parse error: {}", e)))?;

        Self::build_protocol(config)
    }

    /// Build protocol from configuration
    fn build_protocol(config: ProtocolConfig) -> Result<Protocol, ParseError> {
        Self::validate_semantics(&config)?;

        let mut protocol = Protocol::new(&config.protocol);
        protocol.set_initial_state(State::new(&config.initial_state));

        for state in &config.error_states {
            protocol.add_error_state(State::new(state));
        }
        for state in &config.final_states {
            protocol.add_final_state(State::new(state));
        }
        for transition in &config.transitions {
            protocol.add_transition(
                State::new(&transition.from),
                Action::new(&transition.action),
                State::new(&transition.to),
            );
        }

        match &config.seed {
            Some(SeedConfig::Allocation(class)) => protocol.set_seed_rule(SeedRule::Allocation {
                class: class.clone(),
            }),
            Some(SeedConfig::ReceiverOf(actions)) => {
                protocol.set_seed_rule(SeedRule::ReceiverOfCall {
                    actions: actions.iter().map(Action::new).collect::<BTreeSet<_>>(),
                })
            }
            None => {}
        }

        protocol.validate().map_err(ParseError::ValidationError)?;
        Ok(protocol)
    }

    /// Validate semantic correctness
    fn validate_semantics(config: &ProtocolConfig) -> Result<(), ParseError> {
        let mut all_states: HashSet<&str> = HashSet::new();
        let mut all_actions: HashSet<&str> = HashSet::new();
        for t in &config.transitions {
            all_states.insert(&t.from);
            all_states.insert(&t.to);
            all_actions.insert(&t.action);
        }

        if !all_states.contains(config.initial_state.as_str()) {
            return Err(ParseError::SemanticError(format!(
                "Initial state '{}' not found in transitions",
                config.initial_state
            )));
        }

        for state in config.error_states.iter().chain(&config.final_states) {
            if !all_states.contains(state.as_str()) {
                return Err(ParseError::SemanticError(format!(
                    "State '{}' not found in transitions",
                    state
                )));
            }
        }

        let mut reachable: HashSet<&str> = HashSet::from([config.initial_state.as_str()]);
        loop {
            let before = reachable.len();
            for t in &config.transitions {
                if reachable.contains(t.from.as_str()) {
                    reachable.insert(&t.to);
                }
            }
            if reachable.len() == before {
                break;
            }
        }
        for state in &config.error_states {
            if !reachable.contains(state.as_str()) {
                return Err(ParseError::SemanticError(format!(
                    "Error state '{}' is unreachable from initial state '{}'",
                    state, config.initial_state
                )));
            }
        }

        if let Some(SeedConfig::ReceiverOf(actions)) = &config.seed {
            for action in actions {
                if !all_actions.contains(action.as_str()) {
                    return Err(ParseError::SemanticError(format!(
                        "Seed action '{}' not found in transitions",
                        action
                    )));
                }
            }
        }

        Ok(())
    }
}
