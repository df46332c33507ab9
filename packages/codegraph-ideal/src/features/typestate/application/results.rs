/*
 * Typestate Results
 *
 * Result sink for typestate runs. Values of all seeds are merged per
 * (node, access path) with the lattice meet (union), so a query answers
 * for every object the path may denote.
 *
 * Violations are objects that may still be in an error state at the exit
 * of an application method. Facts rooted at a parameter, at `this` or at
 * the returned local are excluded: they outlive the method and are
 * reported by their caller.
 */

use std::collections::BTreeMap;

use tracing::debug;

use crate::features::ideal::domain::{IdeValue, SeedResult};
use crate::features::ideal::ports::ResultSink;
use crate::features::program::{AccessPath, ProgramGraph, StmtKind};
use crate::features::typestate::domain::{
    Protocol, ProtocolViolation, StateSet, TypestateDomain, ViolationKind,
};

pub struct TypestateResults<'p> {
    program: &'p ProgramGraph,
    protocol: Protocol,
    states: BTreeMap<(String, AccessPath), StateSet>,
    seeds: usize,
    timed_out: usize,
}

impl<'p> TypestateResults<'p> {
    pub fn new(program: &'p ProgramGraph, protocol: Protocol) -> Self {
        Self {
            program,
            protocol,
            states: BTreeMap::new(),
            seeds: 0,
            timed_out: 0,
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Seeds reported so far
    pub fn seed_count(&self) -> usize {
        self.seeds
    }

    pub fn timed_out_count(&self) -> usize {
        self.timed_out
    }

    /// States `fact` may be in before `node` executes
    pub fn states_at(&self, node: &str, fact: &AccessPath) -> Option<&StateSet> {
        self.states.get(&(node.to_string(), fact.clone()))
    }

    fn local_states(&self, node: &str, var: &str) -> Option<&StateSet> {
        self.states_at(node, &AccessPath::local(var))
            .filter(|states| !states.is_empty())
    }

    pub fn may_be_in_error_state(&self, node: &str, var: &str) -> bool {
        self.local_states(node, var)
            .is_some_and(|states| states.iter().any(|s| self.protocol.is_error_state(s)))
    }

    pub fn must_be_in_error_state(&self, node: &str, var: &str) -> bool {
        self.local_states(node, var)
            .is_some_and(|states| states.iter().all(|s| self.protocol.is_error_state(s)))
    }

    pub fn may_be_in_accepting_state(&self, node: &str, var: &str) -> bool {
        self.local_states(node, var)
            .is_some_and(|states| states.iter().any(|s| self.protocol.is_accepting_state(s)))
    }

    pub fn must_be_in_accepting_state(&self, node: &str, var: &str) -> bool {
        self.local_states(node, var)
            .is_some_and(|states| states.iter().all(|s| self.protocol.is_accepting_state(s)))
    }

    /// Error states at application-method exits, ordered by node and path
    pub fn violations(&self) -> Vec<ProtocolViolation> {
        let mut violations = Vec::new();
        for ((node, fact), states) in &self.states {
            if !self.is_owned_at_exit(node, fact) {
                continue;
            }
            let errors = states
                .iter()
                .filter(|s| self.protocol.is_error_state(s))
                .count();
            if errors == 0 {
                continue;
            }
            let kind = if errors == states.len() {
                ViolationKind::MustBeInError
            } else {
                ViolationKind::MayBeInError
            };
            violations.push(ProtocolViolation::new(
                self.protocol.name.as_str(),
                node.as_str(),
                fact.to_string(),
                kind,
                states.iter().cloned().collect(),
            ));
        }
        violations
    }

    /// `fact` names an object that dies with the method exiting at `node`
    fn is_owned_at_exit(&self, node: &str, fact: &AccessPath) -> bool {
        let Some((method, _)) = self.program.location(node) else {
            return false;
        };
        let Some(decl) = self.program.method(method) else {
            return false;
        };
        let Some(StmtKind::Return { value }) = self.program.statement(node) else {
            return false;
        };
        if !decl.application {
            return false;
        }
        let Some(local) = fact.local_name() else {
            // static fields outlive every method
            return false;
        };
        local != "this"
            && value.as_deref() != Some(local)
            && !decl.params.iter().any(|p| p == local)
    }
}

impl ResultSink<TypestateDomain> for TypestateResults<'_> {
    fn on_seed_finished(&mut self, result: SeedResult<TypestateDomain>) {
        self.seeds += 1;
        if result.is_timed_out() {
            self.timed_out += 1;
            debug!(seed = %result.seed, "typestate seed timed out, no values");
            return;
        }
        for (key, value) in result.values {
            self.states
                .entry(key)
                .and_modify(|states| *states = states.meet(&value))
                .or_insert(value);
        }
    }
}
