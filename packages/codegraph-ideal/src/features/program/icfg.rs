//! `InterproceduralCfg` over a [`ProgramGraph`]
//!
//! Implemented for every domain whose nodes and methods are strings and
//! whose facts are access paths.

use crate::features::ideal::domain::AnalysisDomain;
use crate::features::ideal::ports::InterproceduralCfg;

use super::access_path::AccessPath;
use super::graph::{node_id, ProgramGraph, StmtKind};

impl<D> InterproceduralCfg<D> for ProgramGraph
where
    D: AnalysisDomain<Node = String, Method = String, Fact = AccessPath>,
{
    fn successors_of(&self, node: &String) -> Vec<String> {
        self.successors(node).to_vec()
    }

    fn predecessors_of(&self, node: &String) -> Vec<String> {
        self.predecessors(node).to_vec()
    }

    fn is_call(&self, node: &String) -> bool {
        self.statement(node).is_some_and(StmtKind::is_invoke)
    }

    fn is_exit(&self, node: &String) -> bool {
        self.statement(node).is_some_and(StmtKind::is_return)
    }

    fn is_start_point(&self, node: &String) -> bool {
        self.location(node).is_some_and(|(_, index)| index == 0)
    }

    fn callees_of_call_at(&self, call_site: &String) -> Vec<String> {
        match self.statement(call_site) {
            Some(StmtKind::Invoke { callees, .. }) => callees.clone(),
            _ => Vec::new(),
        }
    }

    fn return_sites_of_call_at(&self, call_site: &String) -> Vec<String> {
        self.successors(call_site).to_vec()
    }

    fn start_points_of(&self, method: &String) -> Vec<String> {
        match self.method(method).and_then(|m| m.body.as_ref()) {
            Some(body) if !body.is_empty() => vec![node_id(method, 0)],
            _ => Vec::new(),
        }
    }

    fn end_points_of(&self, method: &String) -> Vec<String> {
        let Some(body) = self.method(method).and_then(|m| m.body.as_ref()) else {
            return Vec::new();
        };
        body.iter()
            .enumerate()
            .filter(|(_, stmt)| stmt.is_return())
            .map(|(index, _)| node_id(method, index))
            .collect()
    }

    fn method_of(&self, node: &String) -> String {
        self.location(node)
            .map(|(method, _)| method.to_string())
            .unwrap_or_default()
    }

    fn callers_of(&self, method: &String) -> Vec<String> {
        self.call_sites_of(method).to_vec()
    }

    fn call_sites_within(&self, method: &String) -> Vec<String> {
        let Some(body) = self.method(method).and_then(|m| m.body.as_ref()) else {
            return Vec::new();
        };
        body.iter()
            .enumerate()
            .filter(|(_, stmt)| stmt.is_invoke())
            .map(|(index, _)| node_id(method, index))
            .collect()
    }

    fn reachable_methods(&self) -> Vec<String> {
        self.reachable().to_vec()
    }

    fn statements_of(&self, method: &String) -> Option<Vec<String>> {
        self.nodes_of(method)
    }

    fn is_application_method(&self, method: &String) -> bool {
        self.method(method).is_some_and(|m| m.application)
    }

    /// The jump of `if (var == null)` cannot be taken while `var` itself is
    /// the tracked (allocated) object.
    fn is_nullness_branch(&self, curr: &String, succ: &String, fact: &AccessPath) -> bool {
        let Some((method, index)) = self.location(curr) else {
            return false;
        };
        match self.statement(curr) {
            Some(StmtKind::IfNull { var, target }) if *target != index + 1 => {
                *succ == node_id(method, *target) && fact.is_local(var)
            }
            _ => false,
        }
    }
}
