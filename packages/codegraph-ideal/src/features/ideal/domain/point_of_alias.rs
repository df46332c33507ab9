//! Points of alias
//!
//! A point of alias (POA) is a deferred alias query discovered by a flow
//! function. Resolving it asks the alias oracle for every fact that must be
//! tracked alongside `fact` at the query location and turns each answer into
//! a path edge. POAs are deduplicated per seed, so the variants derive
//! `Eq + Hash` over all of their payload.

use tracing::debug;

use super::edge_function::EdgeFunction;
use super::fact::AnalysisDomain;
use super::path_edge::PathEdge;
use crate::features::ideal::infrastructure::AnalysisContext;

/// Alias query kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PointOfAlias<D: AnalysisDomain> {
    /// Tracked fact passed into a callee that may change its state.
    ///
    /// Aliases of `fact` before the call are strongly updated by the call.
    CallSite {
        call_site: D::Node,
        return_site: D::Node,
        source_fact: D::Fact,
        fact: D::Fact,
    },

    /// Tracked fact returned from a callee.
    ///
    /// Every produced edge carries `edge_function` instead of identity.
    ReturnEvent {
        call_site: D::Node,
        return_site: D::Node,
        source_fact: D::Fact,
        fact: D::Fact,
        edge_function: EdgeFunction<D::Value, D::Transformer>,
    },

    /// Tracked fact written through a heap reference (`base.f = x`).
    Indirection {
        statement: D::Node,
        successor: D::Node,
        source_fact: D::Fact,
        fact: D::Fact,
    },
}

impl<D: AnalysisDomain> PointOfAlias<D> {
    /// Location the alias oracle is queried at
    pub fn query_location(&self) -> &D::Node {
        match self {
            Self::CallSite { call_site, .. } | Self::ReturnEvent { call_site, .. } => call_site,
            Self::Indirection { statement, .. } => statement,
        }
    }

    /// Location the produced edges point to
    pub fn target(&self) -> &D::Node {
        match self {
            Self::CallSite { return_site, .. } | Self::ReturnEvent { return_site, .. } => {
                return_site
            }
            Self::Indirection { successor, .. } => successor,
        }
    }

    /// Fact whose aliases are requested
    pub fn query_fact(&self) -> &D::Fact {
        match self {
            Self::CallSite { fact, .. }
            | Self::ReturnEvent { fact, .. }
            | Self::Indirection { fact, .. } => fact,
        }
    }

    pub fn source_fact(&self) -> &D::Fact {
        match self {
            Self::CallSite { source_fact, .. }
            | Self::ReturnEvent { source_fact, .. }
            | Self::Indirection { source_fact, .. } => source_fact,
        }
    }

    /// Edge function attached to every produced edge (return events only)
    pub fn edge_function(&self) -> Option<&EdgeFunction<D::Value, D::Transformer>> {
        match self {
            Self::ReturnEvent { edge_function, .. } => Some(edge_function),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::CallSite { .. } => "call-site",
            Self::ReturnEvent { .. } => "return-event",
            Self::Indirection { .. } => "indirection",
        }
    }

    /// Resolve this POA into path edges.
    ///
    /// An alias query that ran out of budget produces no edges and no strong
    /// updates; the seed continues with less aliasing.
    pub fn path_edges(
        &self,
        ctx: &mut AnalysisContext<'_, D>,
    ) -> Vec<PathEdge<D::Node, D::Fact>> {
        let answer = ctx.aliases_for(self.query_fact(), self.query_location());

        if answer.timed_out {
            debug!(
                kind = self.kind(),
                location = ?self.query_location(),
                fact = ?self.query_fact(),
                "alias query exceeded its budget, no edges produced"
            );
            ctx.record_resolved_flow(self.clone(), Vec::new());
            return Vec::new();
        }

        let aliases: Vec<D::Fact> = answer.aliases.into_iter().collect();

        if let Self::CallSite { call_site, .. } = self {
            ctx.store_strong_updates(call_site, aliases.iter().cloned());
        }

        let edges = aliases
            .iter()
            .map(|alias| PathEdge::new(self.source_fact().clone(), self.target().clone(), alias.clone()))
            .collect();

        debug!(
            kind = self.kind(),
            location = ?self.query_location(),
            aliases = aliases.len(),
            "resolved point of alias"
        );
        ctx.record_resolved_flow(self.clone(), aliases);
        edges
    }
}
