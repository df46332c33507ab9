//! Common test utilities for codegraph-ideal
//!
//! Shared program fixtures, observers and scripted collaborators for the
//! integration tests, plus helpers that run the typestate client end to end.

#![allow(dead_code)]

mod fixtures;
mod scripted;

pub use fixtures::*;
pub use scripted::*;

use codegraph_ideal::features::typestate::State;
use codegraph_ideal::{
    AliasOracle, Analysis, AnalysisConfig, AnalysisObserver, AnalysisSummary, CollectingSink,
    LocalAliasOracle, NoopObserver, ProgramGraph, Protocol, SeedGenerator, StateSet,
    TypestateDomain, TypestateProblem, TypestateResults,
};

/// Run `protocol` over `program` with the default configuration
pub fn analyze(program: &ProgramGraph, protocol: Protocol) -> (TypestateResults<'_>, AnalysisSummary) {
    let oracle = LocalAliasOracle::new(program);
    analyze_with(program, protocol, AnalysisConfig::default(), &oracle, &NoopObserver)
}

pub fn analyze_with<'p>(
    program: &'p ProgramGraph,
    protocol: Protocol,
    config: AnalysisConfig,
    oracle: &dyn AliasOracle<TypestateDomain>,
    observer: &dyn AnalysisObserver<TypestateDomain>,
) -> (TypestateResults<'p>, AnalysisSummary) {
    let problem = TypestateProblem::new(program, protocol.clone());
    let analysis = Analysis::<TypestateDomain>::new(program, &problem, &problem, &problem, oracle, config)
        .expect("valid configuration")
        .with_observer(observer);

    let mut results = TypestateResults::new(program, protocol);
    let summary = analysis.run(&mut results).expect("analysis runs");
    (results, summary)
}

/// Run and keep every per-seed result
pub fn collect(program: &ProgramGraph, protocol: Protocol) -> CollectingSink<TypestateDomain> {
    let oracle = LocalAliasOracle::new(program);
    let problem = TypestateProblem::new(program, protocol);
    let analysis = Analysis::<TypestateDomain>::new(
        program,
        &problem,
        &problem,
        &problem,
        &oracle,
        AnalysisConfig::default(),
    )
    .expect("valid configuration");

    let mut sink = CollectingSink::new();
    analysis.run(&mut sink).expect("analysis runs");
    sink
}

/// Run with a custom seed generator and keep every per-seed result
pub fn collect_with(
    program: &ProgramGraph,
    protocol: Protocol,
    seeds: &dyn SeedGenerator<TypestateDomain>,
    config: AnalysisConfig,
    oracle: &dyn AliasOracle<TypestateDomain>,
    observer: &dyn AnalysisObserver<TypestateDomain>,
) -> (CollectingSink<TypestateDomain>, AnalysisSummary) {
    let problem = TypestateProblem::new(program, protocol);
    let analysis = Analysis::<TypestateDomain>::new(program, &problem, &problem, seeds, oracle, config)
        .expect("valid configuration")
        .with_observer(observer);

    let mut sink = CollectingSink::new();
    let summary = analysis.run(&mut sink).expect("analysis runs");
    (sink, summary)
}

pub fn states(names: &[&str]) -> StateSet {
    names.iter().map(|n| State::new(*n)).collect()
}
