/*
 * Per-seed Analysis Context
 *
 * Session value owned by the orchestrator for the lifetime of one seed and
 * borrowed mutably by the solver, the flow functions and POA resolution.
 * Survives the phase-1 -> phase-2 switch; dropped with the seed.
 *
 * State (only reachable through the accessors below):
 * - IDE-phase flag
 * - pending POAs (registered by flow functions, drained by phase 1)
 * - resolved POAs (at most one resolution per POA and seed)
 * - edge-function cache (PathEdge -> EdgeFunction, last write wins)
 * - strong updates (call site -> facts overwritten by the call)
 * - resolved flows (POA -> alias facts, replayed in phase 2)
 */

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::AnalysisConfig;
use crate::features::ideal::domain::{AnalysisDomain, DataflowFact, EdgeFunction, PathEdge, PointOfAlias};
use crate::features::ideal::ports::{AliasOracle, AliasQuery, AliasSet, AnalysisObserver, InterproceduralCfg};

use super::backward_cfg::BackwardCfg;
use super::deadline::Deadline;

/// Alias query counters for one seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AliasStatistics {
    pub queries: usize,
    pub skipped: usize,
    pub timeouts: usize,
}

pub struct AnalysisContext<'a, D: AnalysisDomain> {
    icfg: &'a dyn InterproceduralCfg<D>,
    backward: BackwardCfg<'a, D>,
    oracle: &'a dyn AliasOracle<D>,
    observer: &'a dyn AnalysisObserver<D>,
    config: &'a AnalysisConfig,

    ide_phase: bool,
    pending: FxHashSet<PointOfAlias<D>>,
    resolved: FxHashSet<PointOfAlias<D>>,
    edge_functions: FxHashMap<PathEdge<D::Node, D::Fact>, EdgeFunction<D::Value, D::Transformer>>,
    strong_updates: FxHashMap<D::Node, FxHashSet<D::Fact>>,
    resolved_flows: FxHashMap<PointOfAlias<D>, Vec<D::Fact>>,
    alias_stats: AliasStatistics,
}

impl<'a, D: AnalysisDomain> AnalysisContext<'a, D> {
    pub fn new(
        icfg: &'a dyn InterproceduralCfg<D>,
        oracle: &'a dyn AliasOracle<D>,
        observer: &'a dyn AnalysisObserver<D>,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            icfg,
            backward: BackwardCfg::new(icfg),
            oracle,
            observer,
            config,
            ide_phase: false,
            pending: FxHashSet::default(),
            resolved: FxHashSet::default(),
            edge_functions: FxHashMap::default(),
            strong_updates: FxHashMap::default(),
            resolved_flows: FxHashMap::default(),
            alias_stats: AliasStatistics::default(),
        }
    }

    pub fn icfg(&self) -> &'a dyn InterproceduralCfg<D> {
        self.icfg
    }

    pub fn backward_cfg(&self) -> &BackwardCfg<'a, D> {
        &self.backward
    }

    pub fn observer(&self) -> &'a dyn AnalysisObserver<D> {
        self.observer
    }

    pub fn config(&self) -> &'a AnalysisConfig {
        self.config
    }

    // ------------------------------------------------------------------
    // Phase flag
    // ------------------------------------------------------------------

    /// Switch edge functions from phase-1 placeholders to exact functions
    pub fn enable_ide_phase(&mut self) {
        self.ide_phase = true;
    }

    pub fn is_in_ide_phase(&self) -> bool {
        self.ide_phase
    }

    // ------------------------------------------------------------------
    // Points of alias
    // ------------------------------------------------------------------

    /// Register or replay a point of alias.
    ///
    /// Before the IDE phase the POA is queued and nothing is returned: its
    /// edges reach the solver through the phase-1 worklist. Once the IDE
    /// phase is active the aliases recorded when it was resolved are
    /// returned so the flow function can emit them directly.
    pub fn point_of_alias(&mut self, poa: PointOfAlias<D>) -> Vec<D::Fact> {
        if self.ide_phase {
            return self.resolved_flows.get(&poa).cloned().unwrap_or_default();
        }
        if !self.resolved.contains(&poa) {
            self.pending.insert(poa);
        }
        Vec::new()
    }

    /// Get-and-clear the pending POAs
    pub fn take_pending_poas(&mut self) -> FxHashSet<PointOfAlias<D>> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending_poas(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Mark `poa` resolved. Returns `false` if it already was.
    pub fn mark_resolved(&mut self, poa: &PointOfAlias<D>) -> bool {
        if self.resolved.contains(poa) {
            return false;
        }
        self.resolved.insert(poa.clone())
    }

    pub fn is_resolved(&self, poa: &PointOfAlias<D>) -> bool {
        self.resolved.contains(poa)
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    pub(crate) fn record_resolved_flow(&mut self, poa: PointOfAlias<D>, aliases: Vec<D::Fact>) {
        self.resolved_flows.insert(poa, aliases);
    }

    /// Aliases recorded when `poa` was resolved, without querying again
    pub fn resolved_flow(&self, poa: &PointOfAlias<D>) -> Option<&[D::Fact]> {
        self.resolved_flows.get(poa).map(Vec::as_slice)
    }

    /// Resolve a pending POA: returns its path edges, each cached with the
    /// POA's edge function when it carries one. `None` if `poa` was already
    /// resolved for this seed.
    pub fn resolve(&mut self, poa: &PointOfAlias<D>) -> Option<Vec<PathEdge<D::Node, D::Fact>>> {
        if !self.mark_resolved(poa) {
            return None;
        }
        self.observer.solve_poa(poa);

        let edges = poa.path_edges(self);
        if let Some(f) = poa.edge_function() {
            for edge in &edges {
                self.record_edge_function(edge.clone(), f.clone());
            }
        }
        Some(edges)
    }

    // ------------------------------------------------------------------
    // Edge-function cache
    // ------------------------------------------------------------------

    /// Lookup-or-identity
    pub fn edge_function_for(
        &self,
        edge: &PathEdge<D::Node, D::Fact>,
    ) -> EdgeFunction<D::Value, D::Transformer> {
        self.edge_functions
            .get(edge)
            .cloned()
            .unwrap_or(EdgeFunction::Identity)
    }

    /// Last write wins
    pub fn record_edge_function(
        &mut self,
        edge: PathEdge<D::Node, D::Fact>,
        function: EdgeFunction<D::Value, D::Transformer>,
    ) {
        self.edge_functions.insert(edge, function);
    }

    pub fn recorded_edge_function(
        &self,
        edge: &PathEdge<D::Node, D::Fact>,
    ) -> Option<&EdgeFunction<D::Value, D::Transformer>> {
        self.edge_functions.get(edge)
    }

    // ------------------------------------------------------------------
    // Strong updates
    // ------------------------------------------------------------------

    pub fn store_strong_updates(
        &mut self,
        call_site: &D::Node,
        facts: impl IntoIterator<Item = D::Fact>,
    ) {
        self.strong_updates
            .entry(call_site.clone())
            .or_default()
            .extend(facts);
    }

    /// `fact` is overwritten by the call at `call_site`
    pub fn is_strong_update(&self, call_site: &D::Node, fact: &D::Fact) -> bool {
        self.strong_updates
            .get(call_site)
            .is_some_and(|facts| facts.contains(fact))
    }

    // ------------------------------------------------------------------
    // Alias queries
    // ------------------------------------------------------------------

    /// Ask the alias oracle, honouring the aliasing switches and the alias
    /// budget. Skipped queries answer with an empty, completed set.
    pub fn aliases_for(&mut self, fact: &D::Fact, location: &D::Node) -> AliasSet<D::Fact> {
        if !self.config.aliasing
            || (fact.contains_static_field() && !self.config.aliasing_for_static_fields)
        {
            self.alias_stats.skipped += 1;
            return AliasSet::empty();
        }

        self.alias_stats.queries += 1;
        let answer = self.oracle.aliases_for(AliasQuery {
            fact,
            location,
            backward_cfg: &self.backward,
            deadline: Deadline::start(self.config.alias_budget()),
        });
        if answer.timed_out {
            self.alias_stats.timeouts += 1;
        }
        answer
    }

    pub fn alias_statistics(&self) -> AliasStatistics {
        self.alias_stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ideal::ports::NoopObserver;
    use crate::features::program::{AccessPath, LocalAliasOracle, ProgramBuilder, ProgramGraph, StmtKind};
    use crate::features::typestate::{State, TransitionFunction, TypestateDomain};

    type Domain = TypestateDomain;

    fn program() -> ProgramGraph {
        let mut builder = ProgramBuilder::new();
        builder
            .method("main")
            .stmt(StmtKind::new_object("a", "File"))
            .stmt(StmtKind::assign("b", "a"))
            .stmt(StmtKind::call_method("b", "File.close"))
            .stmt(StmtKind::ret(None));
        builder.library_method("File.close");
        builder.entry("main");
        builder.build().unwrap()
    }

    fn call_site_poa(fact: &str) -> PointOfAlias<Domain> {
        PointOfAlias::CallSite {
            call_site: "main:2".to_string(),
            return_site: "main:3".to_string(),
            source_fact: AccessPath::zero(),
            fact: AccessPath::local(fact),
        }
    }

    #[test]
    fn test_point_of_alias_registers_in_phase_one() {
        let program = program();
        let config = AnalysisConfig::default();
        let oracle = LocalAliasOracle::new(&program);
        let mut ctx = AnalysisContext::<Domain>::new(&program, &oracle, &NoopObserver, &config);

        assert!(ctx.point_of_alias(call_site_poa("a")).is_empty());
        assert!(ctx.point_of_alias(call_site_poa("a")).is_empty());
        let pending = ctx.take_pending_poas();
        assert_eq!(pending.len(), 1);
        assert!(!ctx.has_pending_poas());
    }

    #[test]
    fn test_mark_resolved_is_once_only() {
        let program = program();
        let config = AnalysisConfig::default();
        let oracle = LocalAliasOracle::new(&program);
        let mut ctx = AnalysisContext::<Domain>::new(&program, &oracle, &NoopObserver, &config);

        let poa = call_site_poa("a");
        assert!(ctx.mark_resolved(&poa));
        assert!(!ctx.mark_resolved(&poa));
        assert_eq!(ctx.resolved_count(), 1);

        // resolved POAs are not queued again
        ctx.point_of_alias(poa);
        assert!(!ctx.has_pending_poas());
    }

    #[test]
    fn test_edge_function_cache_defaults_to_identity() {
        let program = program();
        let config = AnalysisConfig::default();
        let oracle = LocalAliasOracle::new(&program);
        let mut ctx = AnalysisContext::<Domain>::new(&program, &oracle, &NoopObserver, &config);

        let edge = PathEdge::new(AccessPath::zero(), "main:3".to_string(), AccessPath::local("b"));
        assert!(ctx.edge_function_for(&edge).is_identity());

        ctx.record_edge_function(edge.clone(), EdgeFunction::AllTop(Default::default()));
        ctx.record_edge_function(edge.clone(), EdgeFunction::AllBottom(Default::default()));
        assert!(ctx.edge_function_for(&edge).is_all_bottom());
    }

    #[test]
    fn test_call_site_resolution_stores_strong_updates_and_replays() {
        let program = program();
        let config = AnalysisConfig::default();
        let oracle = LocalAliasOracle::new(&program);
        let mut ctx = AnalysisContext::<Domain>::new(&program, &oracle, &NoopObserver, &config);

        let poa = call_site_poa("b");
        let edges = poa.path_edges(&mut ctx);
        let targets: FxHashSet<_> = edges.iter().map(|e| e.target_fact.clone()).collect();
        assert!(targets.contains(&AccessPath::local("a")));
        assert!(targets.contains(&AccessPath::local("b")));
        assert!(edges.iter().all(|e| e.target == "main:3"));

        assert!(ctx.is_strong_update(&"main:2".to_string(), &AccessPath::local("a")));
        assert!(!ctx.is_strong_update(&"main:1".to_string(), &AccessPath::local("a")));

        ctx.enable_ide_phase();
        let replayed: FxHashSet<_> = ctx.point_of_alias(poa).into_iter().collect();
        assert_eq!(replayed, targets);
    }

    /// Answers every query with `a` and `b`
    struct BothLocals;

    impl AliasOracle<Domain> for BothLocals {
        fn aliases_for(&self, _query: AliasQuery<'_, Domain>) -> AliasSet<AccessPath> {
            AliasSet {
                aliases: [AccessPath::local("a"), AccessPath::local("b")].into_iter().collect(),
                timed_out: false,
            }
        }
    }

    #[test]
    fn test_resolved_return_event_caches_its_function_on_every_edge() {
        let program = program();
        let config = AnalysisConfig::default();
        let mut ctx = AnalysisContext::<Domain>::new(&program, &BothLocals, &NoopObserver, &config);

        let close = EdgeFunction::Transformer(TransitionFunction::from_transitions([(
            State::new("OPENED"),
            State::new("CLOSED"),
        )]));
        let poa = PointOfAlias::ReturnEvent {
            call_site: "main:2".to_string(),
            return_site: "main:3".to_string(),
            source_fact: AccessPath::zero(),
            fact: AccessPath::local("b"),
            edge_function: close.clone(),
        };

        let edges = ctx.resolve(&poa).unwrap();
        assert_eq!(edges.len(), 2);
        let e1 = PathEdge::new(AccessPath::zero(), "main:3".to_string(), AccessPath::local("a"));
        let e2 = PathEdge::new(AccessPath::zero(), "main:3".to_string(), AccessPath::local("b"));
        assert!(edges.contains(&e1) && edges.contains(&e2));

        assert_eq!(ctx.recorded_edge_function(&e1), Some(&close));
        assert_eq!(ctx.recorded_edge_function(&e2), Some(&close));
        assert_eq!(ctx.edge_function_for(&e1), close);
        assert!(!ctx.edge_function_for(&e2).is_identity());

        assert_eq!(ctx.resolved_flow(&poa).map(<[_]>::len), Some(2));
        assert!(ctx.resolve(&poa).is_none());
        assert_eq!(ctx.alias_statistics().queries, 1);
    }

    #[test]
    fn test_call_site_edges_keep_identity() {
        let program = program();
        let config = AnalysisConfig::default();
        let mut ctx = AnalysisContext::<Domain>::new(&program, &BothLocals, &NoopObserver, &config);

        let edges = ctx.resolve(&call_site_poa("b")).unwrap();
        assert_eq!(edges.len(), 2);
        for edge in &edges {
            assert!(ctx.recorded_edge_function(edge).is_none());
            assert!(ctx.edge_function_for(edge).is_identity());
        }
    }

    #[test]
    fn test_aliasing_disabled_skips_oracle() {
        let program = program();
        let config = AnalysisConfig::default().aliasing(false);
        let oracle = LocalAliasOracle::new(&program);
        let mut ctx = AnalysisContext::<Domain>::new(&program, &oracle, &NoopObserver, &config);

        let answer = ctx.aliases_for(&AccessPath::local("b"), &"main:2".to_string());
        assert!(answer.aliases.is_empty());
        assert!(!answer.timed_out);
        assert_eq!(ctx.alias_statistics().skipped, 1);
        assert_eq!(ctx.alias_statistics().queries, 0);
    }

    #[test]
    fn test_static_fields_not_aliased_by_default() {
        let program = program();
        let config = AnalysisConfig::default();
        let oracle = LocalAliasOracle::new(&program);
        let mut ctx = AnalysisContext::<Domain>::new(&program, &oracle, &NoopObserver, &config);

        let answer = ctx.aliases_for(&AccessPath::static_field("Holder", "f"), &"main:2".to_string());
        assert!(answer.aliases.is_empty());
        assert_eq!(ctx.alias_statistics().skipped, 1);
    }
}
