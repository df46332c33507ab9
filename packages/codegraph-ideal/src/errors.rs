//! Error types for codegraph-ideal
//!
//! Only [`AnalysisTimeout`] is allowed to unwind out of the phase loops.
//! Everything else a seed can run into (empty alias sets, exhausted alias
//! budgets, infeasible branches) is represented as data.

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::program::ProgramError;

/// Raised the moment a seed's elapsed time exceeds its budget.
///
/// Propagated with `?` out of whichever worklist loop is active and caught by
/// the per-seed orchestration, which marks the seed as timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("analysis budget of {budget_ms}ms exceeded after {elapsed_ms}ms")]
pub struct AnalysisTimeout {
    pub elapsed_ms: u64,
    pub budget_ms: u64,
}

/// Main error type for codegraph-ideal operations
#[derive(Debug, Error)]
pub enum IdealError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reference program construction error
    #[error("Program error: {0}")]
    Program(#[from] ProgramError),

    /// Phase-2 worker pool could not be created
    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    /// Seed budget exhausted
    #[error("Timeout: {0}")]
    Timeout(#[from] AnalysisTimeout),
}

impl IdealError {
    /// Create a worker pool error
    pub fn worker_pool(msg: impl Into<String>) -> Self {
        IdealError::WorkerPool(msg.into())
    }

    /// Whether this error only concerns a single seed
    pub fn is_timeout(&self) -> bool {
        matches!(self, IdealError::Timeout(_))
    }
}

/// Result type alias for codegraph-ideal operations
pub type Result<T> = std::result::Result<T, IdealError>;
