//! Result collection

use crate::features::ideal::domain::{AnalysisDomain, PathEdge, SeedResult};
use crate::features::ideal::ports::ResultSink;

/// Sink that keeps every seed result in arrival order
#[derive(Debug)]
pub struct CollectingSink<D: AnalysisDomain> {
    results: Vec<SeedResult<D>>,
}

impl<D: AnalysisDomain> Default for CollectingSink<D> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
        }
    }
}

impl<D: AnalysisDomain> CollectingSink<D> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[SeedResult<D>] {
        &self.results
    }

    pub fn into_results(self) -> Vec<SeedResult<D>> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn result_for(&self, seed: &PathEdge<D::Node, D::Fact>) -> Option<&SeedResult<D>> {
        self.results.iter().find(|r| &r.seed == seed)
    }

    pub fn completed(&self) -> impl Iterator<Item = &SeedResult<D>> {
        self.results.iter().filter(|r| !r.is_timed_out())
    }

    pub fn timed_out(&self) -> impl Iterator<Item = &SeedResult<D>> {
        self.results.iter().filter(|r| r.is_timed_out())
    }
}

impl<D: AnalysisDomain> ResultSink<D> for CollectingSink<D> {
    fn on_seed_finished(&mut self, result: SeedResult<D>) {
        self.results.push(result);
    }
}
