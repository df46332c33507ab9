//! Timeout guard
//!
//! A deadline is a plain value (start instant + budget) created when a seed
//! enters phase 1 and passed to every loop that has to check it. There is no
//! global stopwatch; each seed and each alias query gets its own.

use std::time::{Duration, Instant};

use crate::errors::AnalysisTimeout;

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start the clock now
    pub fn start(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed() > self.budget
    }

    /// `Err` once the elapsed time exceeds the budget
    pub fn check(&self) -> Result<(), AnalysisTimeout> {
        let elapsed = self.elapsed();
        if elapsed > self.budget {
            return Err(AnalysisTimeout {
                elapsed_ms: elapsed.as_millis() as u64,
                budget_ms: self.budget.as_millis() as u64,
            });
        }
        Ok(())
    }
}
