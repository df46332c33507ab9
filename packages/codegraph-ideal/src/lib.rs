/*
 * Codegraph IDEal - Demand-driven IFDS/IDE engine
 *
 * Feature-First Hexagonal Architecture:
 * - config/              : Analysis configuration (presets, YAML, validation)
 * - errors               : Crate error types
 * - features/ideal/      : Two-phase seed-driven solver (ports, domain, solver, orchestration)
 * - features/program/    : In-memory program graph + local alias oracle
 * - features/typestate/  : Typestate client (state machines over method calls)
 *
 * Per seed:
 * - Phase 1: identity propagation, points of alias resolved on demand
 * - Phase 2: exact edge functions, meet-over-all-paths values (rayon pool)
 * - Seed and alias-query budgets bound both phases
 */

// Crate-level lint configuration
#![allow(clippy::too_many_arguments)] // Flow and edge factories mirror the IDE signatures
#![allow(clippy::type_complexity)] // Solver tables are nested maps
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::should_implement_trait)] // from_str naming intentional
#![allow(clippy::module_inception)] // Module naming intentional

pub mod config;
pub mod errors;
pub mod features;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{AnalysisConfig, ConfigError, Preset};
pub use errors::{AnalysisTimeout, IdealError, Result};
pub use features::ideal::{
    AliasOracle, AliasQuery, AliasSet, Analysis, AnalysisContext, AnalysisDomain,
    AnalysisObserver, AnalysisSummary, CollectingSink, DataflowFact, Deadline, EdgeFunction,
    EdgeFunctionProvider, FlowFunctionProvider, IdeValue, InterproceduralCfg, NoopObserver,
    PathEdge, PointOfAlias, ResultSink, SeedGenerator, SeedOutcome, SeedResult, SeedState,
    ValueTransformer,
};
pub use features::program::{
    AccessPath, LocalAliasOracle, ProgramBuilder, ProgramError, ProgramGraph, StmtKind,
};
pub use features::typestate::{
    FileMustBeClosedProtocol, PrintStreamProtocol, Protocol, ProtocolDefinition, ProtocolParser,
    ProtocolViolation, StateSet, TypestateDomain, TypestateProblem, TypestateResults,
};
