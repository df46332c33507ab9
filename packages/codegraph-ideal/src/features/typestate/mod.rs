/*
 * Typestate Protocol Analysis
 *
 * Client of the IDEal engine that detects objects left in an error state
 * of a protocol (a file that is never closed, a stream used after close).
 *
 * Architecture:
 * - Domain: Protocol, State, Action, StateSet values, transition functions
 * - Application: TypestateResults (merged states, violations)
 * - Infrastructure: Built-in protocols, YAML/JSON parser, TypestateProblem
 * - Ports: ProtocolDefinition trait
 *
 * Algorithm:
 * - Seeds at allocations (or receivers of a protocol call)
 * - Phase 1 finds every access path aliasing the tracked object
 * - Phase 2 composes transition functions along those paths
 * - Merge states at join points (may-analysis)
 *
 * References:
 * - Strom & Yellin (1986) "Typestate"
 * - Späth et al. (2017) "IDEal: Efficient and Precise Alias-Aware Dataflow Analysis"
 */

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

// Re-export main types
pub use domain::{
    Action, Protocol, ProtocolViolation, SeedRule, State, StateSet, TransitionFunction,
    TypestateDomain, ViolationKind,
};

pub use application::TypestateResults;

pub use infrastructure::{
    FileMustBeClosedProtocol, ParseError, PrintStreamProtocol, ProtocolParser, TypestateProblem,
};

pub use ports::ProtocolDefinition;
