/*
 * Edge Function Algebra
 *
 * Built-in constants plus a client payload:
 * - Identity:    f(v) = v
 * - AllTop:      f(v) = top   (kill: infeasible or strongly updated flow)
 * - AllBottom:   f(v) = top   (placeholder while values are not meaningful yet)
 * - Transformer: client-defined
 *
 * Composition (`f.compose_with(g)` = first f, then g):
 *   Identity ∘ g  = g              f ∘ Identity = f
 *   AllTop ∘ g    = AllTop         f ∘ AllTop   = AllTop
 *   AllBottom ∘ g = g              T ∘ AllBottom = T
 *
 * Meet:
 *   AllTop ⊓ g    = g
 *   AllBottom ⊓ g = AllBottom
 *   Identity ⊓ T  = T ⊓ T::identity()
 *   T1 ⊓ T2       = client meet
 *
 * AllTop and AllBottom both carry the client's top value; they are built
 * once per analysis and cloned from there.
 */

use super::fact::{IdeValue, ValueTransformer};

/// Transfer function over lattice values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeFunction<V, T> {
    /// f(v) = v
    Identity,

    /// Kill: maps everything to the carried top value
    AllTop(V),

    /// Phase-1 placeholder: maps everything to the carried value
    AllBottom(V),

    /// Client function
    Transformer(T),
}

impl<V: IdeValue, T: ValueTransformer<V>> EdgeFunction<V, T> {
    /// Apply to a value
    pub fn compute_target(&self, source: &V) -> V {
        match self {
            Self::Identity => source.clone(),
            Self::AllTop(top) => top.clone(),
            Self::AllBottom(value) => value.clone(),
            Self::Transformer(t) => t.compute_target(source),
        }
    }

    /// First `self`, then `second`
    pub fn compose_with(&self, second: &Self) -> Self {
        match (self, second) {
            (Self::Identity, g) => g.clone(),
            (f, Self::Identity) => f.clone(),
            (Self::AllTop(top), _) => Self::AllTop(top.clone()),
            (_, Self::AllTop(top)) => Self::AllTop(top.clone()),
            (Self::AllBottom(_), g) => g.clone(),
            (Self::Transformer(t), Self::AllBottom(_)) => Self::Transformer(t.clone()),
            (Self::Transformer(a), Self::Transformer(b)) => Self::Transformer(a.compose_with(b)),
        }
    }

    /// Join at a merge point
    pub fn meet_with(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::AllTop(_), g) | (g, Self::AllTop(_)) => g.clone(),
            (Self::AllBottom(v), _) | (_, Self::AllBottom(v)) => Self::AllBottom(v.clone()),
            (Self::Identity, Self::Identity) => Self::Identity,
            (Self::Identity, Self::Transformer(t)) | (Self::Transformer(t), Self::Identity) => {
                Self::Transformer(t.meet_with(&T::identity()))
            }
            (Self::Transformer(a), Self::Transformer(b)) => Self::Transformer(a.meet_with(b)),
        }
    }

    pub fn is_all_top(&self) -> bool {
        matches!(self, Self::AllTop(_))
    }

    pub fn is_all_bottom(&self) -> bool {
        matches!(self, Self::AllBottom(_))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}
