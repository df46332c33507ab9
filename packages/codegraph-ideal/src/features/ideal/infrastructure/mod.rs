//! IDEal infrastructure: per-seed session state and the tabulation solver

pub mod backward_cfg;
pub mod context;
pub mod deadline;
pub mod edge_functions;
pub mod seeds;
pub mod solver;

pub use backward_cfg::BackwardCfg;
pub use context::{AliasStatistics, AnalysisContext};
pub use deadline::Deadline;
pub use edge_functions::ForwardEdgeFunctions;
pub use seeds::SeedDiscovery;
pub use solver::{AnalysisSolver, SolverStatistics};
