/*
 * IDEal Analysis (per-seed orchestration)
 *
 * For each seed:
 *
 *   INIT --> PHASE1 --> PHASE2 --> DONE
 *              |          |
 *              +----+-----+
 *                   v
 *                TIMEOUT
 *
 * INIT -> PHASE1: fresh context and solver, seed deadline starts
 * PHASE1 -> PHASE2: only at the phase-1 fixpoint; the solver is replaced,
 *                   the context (aliases, strong updates) is kept
 * * -> TIMEOUT: the deadline check fails; remaining phases are skipped and
 *               a timed-out result is still reported
 * PHASE2 -> DONE: values computed at the seed method's start points
 *
 * Exactly one result per seed reaches the sink. Context and solver never
 * outlive their seed. Seeds are analysed one at a time.
 */

use rayon::ThreadPool;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AnalysisConfig;
use crate::errors::{AnalysisTimeout, IdealError, Result};
use crate::features::ideal::domain::{AnalysisDomain, PathEdge, SeedOutcome, SeedResult};
use crate::features::ideal::infrastructure::{
    AnalysisContext, AnalysisSolver, Deadline, ForwardEdgeFunctions, SeedDiscovery,
};
use crate::features::ideal::ports::{
    AliasOracle, AnalysisObserver, EdgeFunctionProvider, FlowFunctionProvider,
    InterproceduralCfg, NoopObserver, ResultSink, SeedGenerator,
};

static NOOP_OBSERVER: NoopObserver = NoopObserver;

/// Per-seed analysis state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedState {
    Init,
    Phase1,
    Phase2,
    Done,
    TimedOut,
}

/// Totals for one `run`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub seeds: usize,
    pub completed: usize,
    pub timed_out: usize,
}

type Values<D> = FxHashMap<(<D as AnalysisDomain>::Node, <D as AnalysisDomain>::Fact), <D as AnalysisDomain>::Value>;

/// Two-phase seed-driven analysis
///
/// # Example
///
/// ```rust,ignore
/// let analysis = Analysis::new(&program, &problem, &problem, &problem, &oracle, config)?
///     .with_observer(&observer);
/// let mut sink = CollectingSink::new();
/// let summary = analysis.run(&mut sink)?;
/// ```
pub struct Analysis<'a, D: AnalysisDomain> {
    icfg: &'a dyn InterproceduralCfg<D>,
    flows: &'a dyn FlowFunctionProvider<D>,
    edge_functions: ForwardEdgeFunctions<'a, D>,
    seeds: &'a dyn SeedGenerator<D>,
    oracle: &'a dyn AliasOracle<D>,
    observer: &'a dyn AnalysisObserver<D>,
    config: AnalysisConfig,
}

impl<'a, D: AnalysisDomain> Analysis<'a, D> {
    /// Create an analysis; fails if `config` does not validate
    pub fn new(
        icfg: &'a dyn InterproceduralCfg<D>,
        flows: &'a dyn FlowFunctionProvider<D>,
        edge_functions: &'a dyn EdgeFunctionProvider<D>,
        seeds: &'a dyn SeedGenerator<D>,
        oracle: &'a dyn AliasOracle<D>,
        config: AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            icfg,
            flows,
            edge_functions: ForwardEdgeFunctions::new(edge_functions),
            seeds,
            oracle,
            observer: &NOOP_OBSERVER,
            config,
        })
    }

    pub fn with_observer(mut self, observer: &'a dyn AnalysisObserver<D>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Discover seeds and analyse each of them
    pub fn run(&self, sink: &mut dyn ResultSink<D>) -> Result<AnalysisSummary> {
        if !self.config.enable_strong_updates {
            warn!("strong updates are disabled");
        }

        let pool = self.build_pool()?;
        let seeds = self.compute_seeds();
        if !seeds.is_empty() {
            info!(seeds = seeds.len(), "analysing seeds");
        }

        self.observer.before_analysis(seeds.len());
        let mut summary = AnalysisSummary {
            seeds: seeds.len(),
            ..Default::default()
        };
        for seed in &seeds {
            match self.analysis_for_seed(seed, pool.as_ref(), sink) {
                SeedOutcome::Completed => summary.completed += 1,
                SeedOutcome::TimedOut => summary.timed_out += 1,
            }
        }
        self.observer.after_analysis();

        info!(
            seeds = summary.seeds,
            completed = summary.completed,
            timed_out = summary.timed_out,
            "analysis finished"
        );
        Ok(summary)
    }

    pub fn compute_seeds(&self) -> FxHashSet<PathEdge<D::Node, D::Fact>> {
        SeedDiscovery::new(self.icfg, self.seeds, &self.config).compute_seeds()
    }

    /// Analyse a single seed and report it to `sink`
    pub fn analysis_for_seed(
        &self,
        seed: &PathEdge<D::Node, D::Fact>,
        pool: Option<&ThreadPool>,
        sink: &mut dyn ResultSink<D>,
    ) -> SeedOutcome {
        self.observer.start_with_seed(seed);
        self.enter_state(seed, SeedState::Init);

        let mut ctx = AnalysisContext::new(self.icfg, self.oracle, self.observer, &self.config);
        let deadline = Deadline::start(self.config.seed_budget());
        let mut solver = AnalysisSolver::new(self.icfg, self.flows, &self.edge_functions, deadline);
        self.enter_state(seed, SeedState::Phase1);

        let values = match self.phase1(seed, &mut ctx, &mut solver, &deadline) {
            Ok(()) => {
                solver = AnalysisSolver::new(self.icfg, self.flows, &self.edge_functions, deadline);
                self.enter_state(seed, SeedState::Phase2);
                self.phase2(seed, &mut ctx, &mut solver, &deadline, pool)
            }
            Err(timeout) => Err(timeout),
        };

        let (outcome, values) = match values {
            Ok(values) => {
                self.enter_state(seed, SeedState::Done);
                (SeedOutcome::Completed, values)
            }
            Err(timeout) => {
                warn!(seed = %seed, error = %timeout, "seed analysis timed out");
                self.observer.on_timeout(seed);
                self.enter_state(seed, SeedState::TimedOut);
                (SeedOutcome::TimedOut, FxHashMap::default())
            }
        };

        let alias_stats = ctx.alias_statistics();
        debug!(
            seed = %seed,
            alias_queries = alias_stats.queries,
            alias_timeouts = alias_stats.timeouts,
            resolved_poas = ctx.resolved_count(),
            "seed finished"
        );

        sink.on_seed_finished(SeedResult {
            seed: seed.clone(),
            outcome,
            values,
            reachable: solver.reachable(),
        });
        drop(solver);
        drop(ctx);
        outcome
    }

    /// Seed normalization shared by both phases: a seed at a call or exit is
    /// used as is, any other seed is moved to its successors.
    pub fn normalize_seed(
        &self,
        seed: &PathEdge<D::Node, D::Fact>,
    ) -> Vec<PathEdge<D::Node, D::Fact>> {
        if self.icfg.is_exit(&seed.target) || self.icfg.is_call(&seed.target) {
            return vec![seed.clone()];
        }
        self.icfg
            .successors_of(&seed.target)
            .into_iter()
            .map(|u| seed.retarget(u))
            .collect()
    }

    /// Forward exploration with demand-driven aliasing
    fn phase1(
        &self,
        seed: &PathEdge<D::Node, D::Fact>,
        ctx: &mut AnalysisContext<'_, D>,
        solver: &mut AnalysisSolver<'_, D>,
        deadline: &Deadline,
    ) -> std::result::Result<(), AnalysisTimeout> {
        info!(seed = %seed, "starting phase 1");

        let mut worklist: FxHashSet<PathEdge<D::Node, D::Fact>> =
            self.normalize_seed(seed).into_iter().collect();

        while !worklist.is_empty() {
            let pass: Vec<_> = worklist.drain().collect();
            self.observer.start_forward_pass(&pass);

            for edge in pass {
                let f = ctx.edge_function_for(&edge);
                solver.inject_phase1_seed(ctx, edge.source_fact, edge.target, edge.target_fact, f)?;
            }

            let pending: Vec<_> = ctx.take_pending_poas().into_iter().collect();
            self.observer.start_alias_phase(&pending);

            for poa in pending {
                let Some(edges) = ctx.resolve(&poa) else {
                    continue;
                };
                worklist.extend(edges);

                deadline.check()?;
            }
        }

        debug!(
            seed = %seed,
            jump_functions = solver.jump_function_count(),
            resolved_poas = ctx.resolved_count(),
            "phase 1 reached fixpoint"
        );
        Ok(())
    }

    /// Value computation with exact edge functions
    fn phase2(
        &self,
        seed: &PathEdge<D::Node, D::Fact>,
        ctx: &mut AnalysisContext<'_, D>,
        solver: &mut AnalysisSolver<'_, D>,
        deadline: &Deadline,
        pool: Option<&ThreadPool>,
    ) -> std::result::Result<Values<D>, AnalysisTimeout> {
        info!(seed = %seed, "starting phase 2");
        ctx.enable_ide_phase();

        for edge in self.normalize_seed(seed) {
            solver.inject_phase2_seed(edge.source_fact, edge.target, edge.target_fact);
        }
        solver.run_to_completion(ctx)?;
        deadline.check()?;

        let mut start_values: FxHashMap<D::Node, FxHashSet<D::Fact>> = FxHashMap::default();
        let seed_method = self.icfg.method_of(&seed.target);
        for sp in self.icfg.start_points_of(&seed_method) {
            start_values
                .entry(sp)
                .or_default()
                .insert(seed.source_fact.clone());
        }
        for caller in solver.unbalanced_callers() {
            for sp in self.icfg.start_points_of(caller) {
                start_values
                    .entry(sp)
                    .or_default()
                    .insert(seed.source_fact.clone());
            }
        }

        let values = solver.compute_values(&start_values, pool);
        let stats = solver.statistics();
        debug!(
            seed = %seed,
            propagations = stats.propagations,
            processed_edges = stats.processed_edges,
            unbalanced_returns = stats.unbalanced_returns,
            values = stats.values,
            "phase 2 finished"
        );
        Ok(values)
    }

    fn enter_state(&self, seed: &PathEdge<D::Node, D::Fact>, state: SeedState) {
        debug!(seed = %seed, ?state, "seed state");
        self.observer.seed_state_changed(seed, state);
    }

    #[cfg(feature = "parallel")]
    fn build_pool(&self) -> Result<Option<ThreadPool>> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.value_workers)
            .thread_name(|i| format!("ideal-values-{}", i))
            .build()
            .map(Some)
            .map_err(|e| IdealError::worker_pool(e.to_string()))
    }

    #[cfg(not(feature = "parallel"))]
    fn build_pool(&self) -> Result<Option<ThreadPool>> {
        Ok(None)
    }
}
