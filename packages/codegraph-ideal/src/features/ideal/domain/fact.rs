/*
 * Abstract domain contracts
 *
 * The engine never looks inside facts, locations or values. Everything it
 * needs is captured by four traits:
 * - DataflowFact: equality, hashing, the ZERO fact, static-field detection
 * - IdeValue: lattice values with a meet
 * - ValueTransformer: client edge functions (identity, apply, compose, meet)
 * - AnalysisDomain: bundles the concrete types one analysis runs over
 *
 * Algebraic laws (associativity of composition, idempotent meet, composition
 * distributing over meet) are preconditions. They are not checked at runtime;
 * violating them yields unspecified results.
 */

use std::fmt::Debug;
use std::hash::Hash;

/// Dataflow fact (abstract domain element)
///
/// Example:
///   - Typestate: access path `a.f` rooted at the tracked object
///   - Taint: tainted local `x`
pub trait DataflowFact: Clone + Eq + Hash + Debug + Send + Sync {
    /// Create the ZERO fact ("no fact", source of every seed)
    fn zero() -> Self;

    /// Check if this is the special ZERO fact
    fn is_zero(&self) -> bool;

    /// Whether the fact reaches through a static field
    fn contains_static_field(&self) -> bool {
        false
    }
}

/// Value in the IDE lattice
pub trait IdeValue: Clone + Eq + Hash + Debug + Send + Sync {
    /// Meet operator: combine values arriving over different paths
    fn meet(&self, other: &Self) -> Self;
}

/// Client-defined edge function payload
///
/// Wrapped by [`EdgeFunction::Transformer`](super::EdgeFunction). The
/// built-in constants (identity, all-top, all-bottom) are handled by the
/// wrapper and never reach the client except through
/// [`ValueTransformer::identity`] when an identity is met with a transformer.
pub trait ValueTransformer<V>: Clone + Eq + Hash + Debug + Send + Sync {
    /// Transformer that maps every value to itself
    fn identity() -> Self;

    /// Apply to a value
    fn compute_target(&self, source: &V) -> V;

    /// First `self`, then `second`
    fn compose_with(&self, second: &Self) -> Self;

    /// Pointwise meet
    fn meet_with(&self, other: &Self) -> Self;
}

/// Type bundle for one analysis
///
/// Ports, the solver and the orchestration are all generic over a single
/// domain so that the node, method, fact, value and transformer types are
/// fixed together.
pub trait AnalysisDomain: Clone + Debug + Eq + Hash + Send + Sync + 'static {
    /// Program location (statement)
    type Node: Clone + Eq + Hash + Debug + Send + Sync;

    /// Method
    type Method: Clone + Eq + Hash + Debug + Send + Sync;

    /// Tracked fact
    type Fact: DataflowFact;

    /// Lattice value
    type Value: IdeValue;

    /// Client edge function payload
    type Transformer: ValueTransformer<Self::Value>;
}
