//! Reference program model
//!
//! A small statement language with an interprocedural CFG and a local
//! must-alias oracle. Used by the typestate client and the tests to drive
//! the engine end to end.

pub mod access_path;
pub mod alias;
pub mod error;
pub mod graph;
pub mod icfg;

pub use access_path::{AccessPath, PathBase, MAX_FIELD_DEPTH};
pub use alias::LocalAliasOracle;
pub use error::ProgramError;
pub use graph::{node_id, simple_name, MethodBuilder, MethodDecl, ProgramBuilder, ProgramGraph, StmtKind};
