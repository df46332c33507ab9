// IDEal: demand-driven IFDS/IDE analysis
//
// Hexagonal Architecture:
// - domain: Facts, path edges, edge-function algebra, points of alias, results
// - ports: Collaborator traits (ICFG, alias oracle, flow/edge providers, seeds, sink, observer)
// - infrastructure: Per-seed context, deadline, tabulation solver, seed discovery
// - application: Per-seed orchestration (phase 1, phase 2) and result collection

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// Re-export application layer (primary interface)
pub use application::{Analysis, AnalysisSummary, CollectingSink, SeedState};

// Re-export domain types
pub use domain::{
    AnalysisDomain, DataflowFact, EdgeFunction, IdeValue, PathEdge, PointOfAlias, SeedOutcome,
    SeedResult, ValueTransformer,
};

pub use infrastructure::{
    AnalysisContext, AnalysisSolver, BackwardCfg, Deadline, ForwardEdgeFunctions, SeedDiscovery,
    SolverStatistics,
};
pub use ports::{
    AliasOracle, AliasQuery, AliasSet, AnalysisObserver, EdgeFunctionProvider,
    FlowFunctionProvider, InterproceduralCfg, NoopObserver, ResultSink, SeedGenerator,
};
