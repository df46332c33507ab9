//! Per-seed results

use rustc_hash::FxHashMap;

use super::fact::AnalysisDomain;
use super::path_edge::PathEdge;

/// How a seed's analysis ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedOutcome {
    /// Both phases reached their fixpoint
    Completed,

    /// The seed budget ran out; values are absent and reachability is partial
    TimedOut,
}

/// Result handed to the result sink once per seed
#[derive(Debug, Clone)]
pub struct SeedResult<D: AnalysisDomain> {
    pub seed: PathEdge<D::Node, D::Fact>,
    pub outcome: SeedOutcome,

    /// Meet-over-all-paths value per `(node, fact)`; empty on timeout
    pub values: FxHashMap<(D::Node, D::Fact), D::Value>,

    /// `(node, fact)` pairs the solver had tabulated when the seed finished
    pub reachable: Vec<(D::Node, D::Fact)>,
}

impl<D: AnalysisDomain> SeedResult<D> {
    pub fn is_timed_out(&self) -> bool {
        self.outcome == SeedOutcome::TimedOut
    }

    pub fn value_at(&self, node: &D::Node, fact: &D::Fact) -> Option<&D::Value> {
        self.values.get(&(node.clone(), fact.clone()))
    }

    /// Facts holding at `node`
    pub fn facts_at<'r>(&'r self, node: &'r D::Node) -> impl Iterator<Item = &'r D::Fact> + 'r {
        self.reachable
            .iter()
            .filter(move |(n, _)| n == node)
            .map(|(_, f)| f)
    }

    pub fn is_reachable(&self, node: &D::Node, fact: &D::Fact) -> bool {
        self.reachable.iter().any(|(n, f)| n == node && f == fact)
    }
}
