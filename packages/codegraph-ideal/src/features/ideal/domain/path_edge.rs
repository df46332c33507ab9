//! Path edges
//!
//! The unit of worklist membership and deduplication. The source location
//! is implicit: every path edge of a seed starts at that seed's method.

use std::fmt;

/// `(source_fact) -> (target, target_fact)`
///
/// Two path edges are equal iff all three components are equal, so
/// identical edges found along different paths collapse to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathEdge<N, F> {
    /// Fact at the (implicit) source location
    pub source_fact: F,

    /// Target location
    pub target: N,

    /// Fact at the target location
    pub target_fact: F,
}

impl<N, F> PathEdge<N, F> {
    pub fn new(source_fact: F, target: N, target_fact: F) -> Self {
        Self {
            source_fact,
            target,
            target_fact,
        }
    }

    /// Same facts, different target
    pub fn retarget(&self, target: N) -> Self
    where
        F: Clone,
    {
        Self::new(self.source_fact.clone(), target, self.target_fact.clone())
    }
}

impl<N: fmt::Debug, F: fmt::Debug> fmt::Display for PathEdge<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{:?}> -> <{:?}, {:?}>",
            self.source_fact, self.target, self.target_fact
        )
    }
}
