/*
 * IDE Tabulation Solver
 *
 * Jump-function tabulation in the style of heros' IDESolver:
 * - jump functions (forward, reverse, by target) keyed by the path edge
 * - incoming call edges per callee start point
 * - end summaries per callee start point
 * - recorded call edges (call site fact -> callee start fact) for values
 *
 * Processing order for a popped path edge <d1> -> <n, d2>:
 *   call(n)           -> process_call
 *   otherwise exit(n) -> process_exit, then normal flow if n has successors
 *
 * Returns past seeds: a zero-sourced edge reaching an exit with no recorded
 * incoming call edge is returned to every caller of the method, and the
 * caller method is remembered so that value computation starts there too.
 *
 * Value computation:
 *   IIa (sequential) - start points -> call sites (forward lookup),
 *                      call sites -> callee start points (call edges)
 *   IIb (parallel)   - every other tabulated node, values merged into a
 *                      DashMap on a rayon pool
 *
 * The seed deadline is checked for every processed path edge.
 */

use std::collections::VecDeque;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

use crate::errors::AnalysisTimeout;
use crate::features::ideal::domain::{AnalysisDomain, DataflowFact, EdgeFunction, IdeValue, PathEdge};
use crate::features::ideal::ports::{FlowFunctionProvider, InterproceduralCfg};

use super::context::AnalysisContext;
use super::deadline::Deadline;
use super::edge_functions::ForwardEdgeFunctions;

type Ef<D> = EdgeFunction<<D as AnalysisDomain>::Value, <D as AnalysisDomain>::Transformer>;
type NodeFact<D> = (<D as AnalysisDomain>::Node, <D as AnalysisDomain>::Fact);

/// Solver statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStatistics {
    /// Jump functions created or changed
    pub propagations: usize,

    /// Path edges popped from the worklist
    pub processed_edges: usize,

    /// Returns followed past the seed's method
    pub unbalanced_returns: usize,

    /// Values computed in phase II
    pub values: usize,
}

// ============================================================================
// Jump functions
// ============================================================================

/// Jump function table with the three lookups the solver needs
struct JumpFunctions<D: AnalysisDomain> {
    /// d1 -> n -> d2 -> f
    forward: FxHashMap<D::Fact, FxHashMap<D::Node, FxHashMap<D::Fact, Ef<D>>>>,

    /// n -> d2 -> d1 -> f
    reverse: FxHashMap<D::Node, FxHashMap<D::Fact, FxHashMap<D::Fact, Ef<D>>>>,

    /// n -> (d1, d2) -> f
    by_target: FxHashMap<D::Node, FxHashMap<(D::Fact, D::Fact), Ef<D>>>,
}

impl<D: AnalysisDomain> JumpFunctions<D> {
    fn new() -> Self {
        Self {
            forward: FxHashMap::default(),
            reverse: FxHashMap::default(),
            by_target: FxHashMap::default(),
        }
    }

    fn get(&self, d1: &D::Fact, n: &D::Node, d2: &D::Fact) -> Option<&Ef<D>> {
        self.forward.get(d1)?.get(n)?.get(d2)
    }

    fn insert(&mut self, d1: D::Fact, n: D::Node, d2: D::Fact, f: Ef<D>) {
        self.forward
            .entry(d1.clone())
            .or_default()
            .entry(n.clone())
            .or_default()
            .insert(d2.clone(), f.clone());
        self.reverse
            .entry(n.clone())
            .or_default()
            .entry(d2.clone())
            .or_default()
            .insert(d1.clone(), f.clone());
        self.by_target.entry(n).or_default().insert((d1, d2), f);
    }

    /// d2 -> f for every jump function <d1> -> <n, _>
    fn forward_lookup(&self, d1: &D::Fact, n: &D::Node) -> Option<&FxHashMap<D::Fact, Ef<D>>> {
        self.forward.get(d1)?.get(n)
    }

    /// d1 -> f for every jump function <_> -> <n, d2>
    fn reverse_lookup(&self, n: &D::Node, d2: &D::Fact) -> Option<&FxHashMap<D::Fact, Ef<D>>> {
        self.reverse.get(n)?.get(d2)
    }

    fn lookup_by_target(&self, n: &D::Node) -> Option<&FxHashMap<(D::Fact, D::Fact), Ef<D>>> {
        self.by_target.get(n)
    }

    fn targets(&self) -> impl Iterator<Item = &D::Node> {
        self.by_target.keys()
    }

    fn len(&self) -> usize {
        self.by_target.values().map(|m| m.len()).sum()
    }
}

// ============================================================================
// Solver
// ============================================================================

pub struct AnalysisSolver<'a, D: AnalysisDomain> {
    icfg: &'a dyn InterproceduralCfg<D>,
    flows: &'a dyn FlowFunctionProvider<D>,
    edges: &'a ForwardEdgeFunctions<'a, D>,
    deadline: Deadline,

    jump_fn: JumpFunctions<D>,

    /// (callee start point, d3) -> call site -> caller facts at the call
    incoming: FxHashMap<NodeFact<D>, FxHashMap<D::Node, FxHashSet<D::Fact>>>,

    /// (start point, d1) -> (exit, d2) -> f
    end_summaries: FxHashMap<NodeFact<D>, FxHashMap<NodeFact<D>, Ef<D>>>,

    /// (call site, d2) -> (callee start point, d3) -> call edge function
    call_edges: FxHashMap<NodeFact<D>, FxHashMap<NodeFact<D>, Ef<D>>>,

    /// Methods entered through unbalanced returns
    unbalanced_callers: FxHashSet<D::Method>,

    worklist: VecDeque<PathEdge<D::Node, D::Fact>>,
    stats: SolverStatistics,
}

impl<'a, D: AnalysisDomain> AnalysisSolver<'a, D> {
    pub fn new(
        icfg: &'a dyn InterproceduralCfg<D>,
        flows: &'a dyn FlowFunctionProvider<D>,
        edges: &'a ForwardEdgeFunctions<'a, D>,
        deadline: Deadline,
    ) -> Self {
        Self {
            icfg,
            flows,
            edges,
            deadline,
            jump_fn: JumpFunctions::new(),
            incoming: FxHashMap::default(),
            end_summaries: FxHashMap::default(),
            call_edges: FxHashMap::default(),
            unbalanced_callers: FxHashSet::default(),
            worklist: VecDeque::new(),
            stats: SolverStatistics::default(),
        }
    }

    /// Propagate `<d1> -> <n, d2>` with `f` and run to fixpoint
    pub fn inject_phase1_seed(
        &mut self,
        ctx: &mut AnalysisContext<'_, D>,
        d1: D::Fact,
        n: D::Node,
        d2: D::Fact,
        f: Ef<D>,
    ) -> Result<(), AnalysisTimeout> {
        self.propagate(d1, n, d2, f);
        self.run_to_completion(ctx)
    }

    /// Propagate `<d1> -> <n, d2>` with identity; call
    /// [`run_to_completion`](Self::run_to_completion) afterwards
    pub fn inject_phase2_seed(&mut self, d1: D::Fact, n: D::Node, d2: D::Fact) {
        self.propagate(d1, n, d2, EdgeFunction::Identity);
    }

    /// Drain the worklist
    pub fn run_to_completion(
        &mut self,
        ctx: &mut AnalysisContext<'_, D>,
    ) -> Result<(), AnalysisTimeout> {
        while let Some(edge) = self.worklist.pop_front() {
            self.deadline.check()?;
            self.stats.processed_edges += 1;

            let f = match self
                .jump_fn
                .get(&edge.source_fact, &edge.target, &edge.target_fact)
            {
                Some(f) => f.clone(),
                None => continue,
            };

            if self.icfg.is_call(&edge.target) {
                self.process_call(ctx, &edge, &f);
            } else {
                if self.icfg.is_exit(&edge.target) {
                    self.process_exit(ctx, &edge, &f);
                }
                let successors = self.icfg.successors_of(&edge.target);
                if !successors.is_empty() {
                    self.process_normal(ctx, &edge, &f, &successors);
                }
            }
        }
        Ok(())
    }

    /// Meet `f` into the jump function of `<d1> -> <n, d2>`; enqueue on change
    fn propagate(&mut self, d1: D::Fact, n: D::Node, d2: D::Fact, f: Ef<D>) {
        let existing = self
            .jump_fn
            .get(&d1, &n, &d2)
            .cloned()
            .unwrap_or_else(|| self.edges.all_top().clone());
        let merged = f.meet_with(&existing);
        if merged == existing {
            return;
        }

        trace!(source = ?d1, target = ?n, fact = ?d2, function = ?merged, "propagate");
        self.stats.propagations += 1;
        self.jump_fn.insert(d1.clone(), n.clone(), d2.clone(), merged);
        self.worklist.push_back(PathEdge::new(d1, n, d2));
    }

    fn process_normal(
        &mut self,
        ctx: &mut AnalysisContext<'_, D>,
        edge: &PathEdge<D::Node, D::Fact>,
        f: &Ef<D>,
        successors: &[D::Node],
    ) {
        let (flows, edges) = (self.flows, self.edges);
        let (d1, n, d2) = (&edge.source_fact, &edge.target, &edge.target_fact);

        for m in successors {
            for d3 in flows.normal_flow(ctx, d1, n, d2, m) {
                let f_normal = edges.normal_edge(ctx, d1, n, d2, m, &d3);
                self.propagate(d1.clone(), m.clone(), d3, f.compose_with(&f_normal));
            }
        }
    }

    fn process_call(
        &mut self,
        ctx: &mut AnalysisContext<'_, D>,
        edge: &PathEdge<D::Node, D::Fact>,
        f: &Ef<D>,
    ) {
        let (icfg, flows, edges) = (self.icfg, self.flows, self.edges);
        let (d1, n, d2) = (&edge.source_fact, &edge.target, &edge.target_fact);
        let return_sites = icfg.return_sites_of_call_at(n);

        for callee in icfg.callees_of_call_at(n) {
            let targets = flows.call_flow(ctx, d1, n, d2, &callee);
            if targets.is_empty() {
                continue;
            }

            for sp in icfg.start_points_of(&callee) {
                for d3 in &targets {
                    let f_call = edges.call_edge(ctx, d1, n, d2, &callee, d3);
                    self.record_call_edge(n, d2, &sp, d3, &f_call);

                    self.propagate(d3.clone(), sp.clone(), d3.clone(), EdgeFunction::Identity);

                    self.incoming
                        .entry((sp.clone(), d3.clone()))
                        .or_default()
                        .entry(n.clone())
                        .or_default()
                        .insert(d2.clone());

                    let summaries: Vec<(NodeFact<D>, Ef<D>)> = self
                        .end_summaries
                        .get(&(sp.clone(), d3.clone()))
                        .map(|s| s.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                        .unwrap_or_default();

                    for ((exit, d4), f_callee) in summaries {
                        for ret_site in &return_sites {
                            let returned = flows.return_flow(
                                ctx,
                                n,
                                &callee,
                                &exit,
                                &d4,
                                ret_site,
                                d1,
                                Some(d2),
                            );
                            for d5 in returned {
                                let f_ret = edges
                                    .return_edge(ctx, d1, n, &callee, &exit, &d4, ret_site, &d5);
                                let f_prime = f_call.compose_with(&f_callee).compose_with(&f_ret);
                                self.propagate(
                                    d1.clone(),
                                    ret_site.clone(),
                                    d5,
                                    f.compose_with(&f_prime),
                                );
                            }
                        }
                    }
                }
            }
        }

        for ret_site in &return_sites {
            for d3 in flows.call_to_return_flow(ctx, d1, n, d2, ret_site) {
                let f_c2r = edges.call_to_return_edge(ctx, d1, n, d2, ret_site, &d3);
                self.propagate(d1.clone(), ret_site.clone(), d3, f.compose_with(&f_c2r));
            }
        }
    }

    fn process_exit(
        &mut self,
        ctx: &mut AnalysisContext<'_, D>,
        edge: &PathEdge<D::Node, D::Fact>,
        f: &Ef<D>,
    ) {
        let (icfg, flows, edges) = (self.icfg, self.flows, self.edges);
        let (d1, n, d2) = (&edge.source_fact, &edge.target, &edge.target_fact);
        let method = icfg.method_of(n);
        let mut has_incoming = false;

        for sp in icfg.start_points_of(&method) {
            self.end_summaries
                .entry((sp.clone(), d1.clone()))
                .or_default()
                .insert((n.clone(), d2.clone()), f.clone());

            let incoming: Vec<(D::Node, Vec<D::Fact>)> = self
                .incoming
                .get(&(sp.clone(), d1.clone()))
                .map(|inc| {
                    inc.iter()
                        .map(|(c, d4s)| (c.clone(), d4s.iter().cloned().collect()))
                        .collect()
                })
                .unwrap_or_default();
            has_incoming |= !incoming.is_empty();

            for (c, d4s) in incoming {
                for ret_site in icfg.return_sites_of_call_at(&c) {
                    for d4 in &d4s {
                        let callers: Vec<(D::Fact, Ef<D>)> = self
                            .jump_fn
                            .reverse_lookup(&c, d4)
                            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                            .unwrap_or_default();

                        for (d3, f3) in callers {
                            if f3.is_all_top() {
                                continue;
                            }
                            let f_call = edges.call_edge(ctx, &d3, &c, d4, &method, d1);
                            let returned = flows.return_flow(
                                ctx,
                                &c,
                                &method,
                                n,
                                d2,
                                &ret_site,
                                &d3,
                                Some(d4),
                            );
                            for d5 in returned {
                                let f_ret = edges
                                    .return_edge(ctx, &d3, &c, &method, n, d2, &ret_site, &d5);
                                let f_prime = f_call.compose_with(f).compose_with(&f_ret);
                                self.propagate(
                                    d3.clone(),
                                    ret_site.clone(),
                                    d5,
                                    f3.compose_with(&f_prime),
                                );
                            }
                        }
                    }
                }
            }
        }

        if d1.is_zero() && !has_incoming {
            self.follow_return_past_seed(ctx, &method, n, d2, f);
        }
    }

    /// Unbalanced return: leave `method` towards every caller
    fn follow_return_past_seed(
        &mut self,
        ctx: &mut AnalysisContext<'_, D>,
        method: &D::Method,
        exit: &D::Node,
        d2: &D::Fact,
        f: &Ef<D>,
    ) {
        let (icfg, flows, edges) = (self.icfg, self.flows, self.edges);
        let zero = D::Fact::zero();

        for c in icfg.callers_of(method) {
            for ret_site in icfg.return_sites_of_call_at(&c) {
                let returned =
                    flows.return_flow(ctx, &c, method, exit, d2, &ret_site, &zero, None);
                for d5 in returned {
                    let f_ret = edges.return_edge(ctx, &zero, &c, method, exit, d2, &ret_site, &d5);
                    self.stats.unbalanced_returns += 1;
                    self.propagate(zero.clone(), ret_site.clone(), d5, f.compose_with(&f_ret));
                }
            }
            self.unbalanced_callers.insert(icfg.method_of(&c));
        }
    }

    fn record_call_edge(
        &mut self,
        call_site: &D::Node,
        d2: &D::Fact,
        sp: &D::Node,
        d3: &D::Fact,
        f_call: &Ef<D>,
    ) {
        let slot = self
            .call_edges
            .entry((call_site.clone(), d2.clone()))
            .or_default()
            .entry((sp.clone(), d3.clone()))
            .or_insert_with(|| f_call.clone());
        *slot = slot.meet_with(f_call);
    }

    // ------------------------------------------------------------------
    // Value computation
    // ------------------------------------------------------------------

    /// Meet-over-all-paths values for every tabulated `(node, fact)`.
    ///
    /// `seeds` maps start points to the source facts that get the client's
    /// bottom value. Phase IIb runs on `pool` when one is given.
    pub fn compute_values(
        &mut self,
        seeds: &FxHashMap<D::Node, FxHashSet<D::Fact>>,
        pool: Option<&rayon::ThreadPool>,
    ) -> FxHashMap<NodeFact<D>, D::Value> {
        let top = self.edges.top();
        let bottom = self.edges.bottom();

        // Phase IIa: start points and call sites
        let mut values: FxHashMap<NodeFact<D>, D::Value> = FxHashMap::default();
        let mut worklist: VecDeque<NodeFact<D>> = VecDeque::new();
        for (sp, facts) in seeds {
            for d in facts {
                values.insert((sp.clone(), d.clone()), bottom.clone());
                worklist.push_back((sp.clone(), d.clone()));
            }
        }

        while let Some((n, d)) = worklist.pop_front() {
            let current = values.get(&(n.clone(), d.clone())).cloned().unwrap_or_else(|| top.clone());

            if self.icfg.is_start_point(&n) || seeds.contains_key(&n) {
                let method = self.icfg.method_of(&n);
                for c in self.icfg.call_sites_within(&method) {
                    if let Some(targets) = self.jump_fn.forward_lookup(&d, &c) {
                        for (d_prime, f_prime) in targets {
                            let v = f_prime.compute_target(&current);
                            Self::propagate_value(&mut values, &mut worklist, &top, c.clone(), d_prime.clone(), v);
                        }
                    }
                }
            }

            if self.icfg.is_call(&n) {
                if let Some(callees) = self.call_edges.get(&(n.clone(), d.clone())) {
                    for ((sp, d3), f_call) in callees {
                        let v = f_call.compute_target(&current);
                        Self::propagate_value(&mut values, &mut worklist, &top, sp.clone(), d3.clone(), v);
                    }
                }
            }
        }

        // Phase IIb: every other node
        let nodes: Vec<D::Node> = self
            .jump_fn
            .targets()
            .filter(|n| !self.icfg.is_call(n) && !self.icfg.is_start_point(n))
            .cloned()
            .collect();

        let merged: DashMap<NodeFact<D>, D::Value> = DashMap::new();
        let work = |n: &D::Node| {
            for (key, v) in self.value_contributions(n, &values, &top) {
                match merged.entry(key) {
                    Entry::Occupied(mut slot) => {
                        let joined = slot.get().meet(&v);
                        *slot.get_mut() = joined;
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(v);
                    }
                }
            }
        };

        match pool {
            #[cfg(feature = "parallel")]
            Some(pool) => {
                use rayon::prelude::*;
                pool.install(|| nodes.par_iter().for_each(work));
            }
            _ => nodes.iter().for_each(work),
        }

        values.extend(merged);
        self.stats.values = values.len();
        debug!(
            values = self.stats.values,
            jump_functions = self.jump_fn.len(),
            "value computation finished"
        );
        values
    }

    fn propagate_value(
        values: &mut FxHashMap<NodeFact<D>, D::Value>,
        worklist: &mut VecDeque<NodeFact<D>>,
        top: &D::Value,
        n: D::Node,
        d: D::Fact,
        v: D::Value,
    ) {
        let key = (n, d);
        let current = values.get(&key).unwrap_or(top);
        let joined = current.meet(&v);
        if &joined != current {
            values.insert(key.clone(), joined);
            worklist.push_back(key);
        }
    }

    /// Values reaching `n` from the start points of its method
    fn value_contributions(
        &self,
        n: &D::Node,
        values: &FxHashMap<NodeFact<D>, D::Value>,
        top: &D::Value,
    ) -> Vec<(NodeFact<D>, D::Value)> {
        let Some(table) = self.jump_fn.lookup_by_target(n) else {
            return Vec::new();
        };
        let method = self.icfg.method_of(n);
        let mut out = Vec::new();
        for sp in self.icfg.start_points_of(&method) {
            for ((d_source, d), f) in table {
                let source_value = values
                    .get(&(sp.clone(), d_source.clone()))
                    .unwrap_or(top);
                out.push(((n.clone(), d.clone()), f.compute_target(source_value)));
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Every `(node, fact)` with a jump function
    pub fn reachable(&self) -> Vec<NodeFact<D>> {
        let mut seen: FxHashSet<NodeFact<D>> = FxHashSet::default();
        for (n, table) in &self.jump_fn.by_target {
            for (_, d2) in table.keys() {
                seen.insert((n.clone(), d2.clone()));
            }
        }
        seen.into_iter().collect()
    }

    /// Jump function of `<d1> -> <n, d2>`, if tabulated
    pub fn jump_function(
        &self,
        d1: &D::Fact,
        n: &D::Node,
        d2: &D::Fact,
    ) -> Option<&Ef<D>> {
        self.jump_fn.get(d1, n, d2)
    }

    /// Methods entered through unbalanced returns
    pub fn unbalanced_callers(&self) -> &FxHashSet<D::Method> {
        &self.unbalanced_callers
    }

    pub fn statistics(&self) -> SolverStatistics {
        self.stats
    }

    pub fn jump_function_count(&self) -> usize {
        self.jump_fn.len()
    }
}
