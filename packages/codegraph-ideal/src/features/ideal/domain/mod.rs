//! IDEal domain: facts, path edges, edge functions, points of alias, results

pub mod edge_function;
pub mod fact;
pub mod path_edge;
pub mod point_of_alias;
pub mod result;

pub use edge_function::EdgeFunction;
pub use fact::{AnalysisDomain, DataflowFact, IdeValue, ValueTransformer};
pub use path_edge::PathEdge;
pub use point_of_alias::PointOfAlias;
pub use result::{SeedOutcome, SeedResult};
