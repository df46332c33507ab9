/*
 * IDEal Ports (Hexagonal Architecture)
 *
 * The engine is a core surrounded by narrow capability traits:
 *
 * ```
 *      +-------------------+     +------------------+
 *      | InterproceduralCfg|     |   AliasOracle    |
 *      +---------+---------+     +--------+---------+
 *                |                        |
 *      +---------v------------------------v---------+
 *      |      Analysis (phase 1 / phase 2)          |
 *      +---------^------------------------^---------+
 *                |                        |
 *      +---------+---------+     +--------+---------+
 *      | Flow/Edge/Seeds   |     | Sink / Observer  |
 *      | (client problem)  |     | (reporting)      |
 *      +-------------------+     +------------------+
 * ```
 *
 * Every port is generic over one AnalysisDomain. All ports except the
 * result sink are shared by reference and must be Send + Sync.
 */

use rustc_hash::FxHashSet;

use super::domain::{AnalysisDomain, EdgeFunction, PathEdge, PointOfAlias, SeedResult};
use super::infrastructure::{AnalysisContext, BackwardCfg, Deadline};
use super::application::SeedState;

// ============================================================================
// Program collaborator
// ============================================================================

/// Interprocedural control-flow graph
pub trait InterproceduralCfg<D: AnalysisDomain>: Send + Sync {
    fn successors_of(&self, node: &D::Node) -> Vec<D::Node>;

    fn predecessors_of(&self, node: &D::Node) -> Vec<D::Node>;

    fn is_call(&self, node: &D::Node) -> bool;

    /// Method exit (return) statement
    fn is_exit(&self, node: &D::Node) -> bool;

    fn is_start_point(&self, node: &D::Node) -> bool;

    /// Resolved call targets, including methods without a body
    fn callees_of_call_at(&self, call_site: &D::Node) -> Vec<D::Method>;

    fn return_sites_of_call_at(&self, call_site: &D::Node) -> Vec<D::Node>;

    fn start_points_of(&self, method: &D::Method) -> Vec<D::Node>;

    fn end_points_of(&self, method: &D::Method) -> Vec<D::Node>;

    fn method_of(&self, node: &D::Node) -> D::Method;

    /// Call sites that may invoke `method`
    fn callers_of(&self, method: &D::Method) -> Vec<D::Node>;

    fn call_sites_within(&self, method: &D::Method) -> Vec<D::Node>;

    /// Whole-program reachable methods
    fn reachable_methods(&self) -> Vec<D::Method>;

    /// Statements of a method body, `None` when the method has no body
    fn statements_of(&self, method: &D::Method) -> Option<Vec<D::Node>>;

    /// Application (non-library) code
    fn is_application_method(&self, _method: &D::Method) -> bool {
        true
    }

    /// `curr -> succ` is infeasible for `fact` because it is the branch
    /// taken when the tracked object is null.
    fn is_nullness_branch(&self, _curr: &D::Node, _succ: &D::Node, _fact: &D::Fact) -> bool {
        false
    }
}

// ============================================================================
// Alias-query collaborator
// ============================================================================

/// One alias query
pub struct AliasQuery<'q, D: AnalysisDomain> {
    pub fact: &'q D::Fact,
    pub location: &'q D::Node,

    /// Reverse view of the ICFG for walking back from `location`
    pub backward_cfg: &'q BackwardCfg<'q, D>,

    /// Query budget, separate from (and shorter than) the seed budget
    pub deadline: Deadline,
}

/// Answer to an alias query
#[derive(Debug, Clone)]
pub struct AliasSet<F> {
    pub aliases: FxHashSet<F>,

    /// The query stopped at its deadline; `aliases` is incomplete
    pub timed_out: bool,
}

impl<F> AliasSet<F> {
    pub fn empty() -> Self {
        Self {
            aliases: FxHashSet::default(),
            timed_out: false,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            aliases: FxHashSet::default(),
            timed_out: true,
        }
    }
}

/// Alias oracle
///
/// Must tolerate being asked about equivalent but distinct queries.
pub trait AliasOracle<D: AnalysisDomain>: Send + Sync {
    fn aliases_for(&self, query: AliasQuery<'_, D>) -> AliasSet<D::Fact>;
}

// ============================================================================
// Client analysis problem
// ============================================================================

/// Flow functions (IFDS part of the client problem)
///
/// Flow functions may register points of alias through
/// [`AnalysisContext::point_of_alias`], which returns the aliases recorded for
/// that POA once the value phase is active.
pub trait FlowFunctionProvider<D: AnalysisDomain>: Send + Sync {
    fn normal_flow(
        &self,
        ctx: &mut AnalysisContext<'_, D>,
        d1: &D::Fact,
        curr: &D::Node,
        fact: &D::Fact,
        succ: &D::Node,
    ) -> Vec<D::Fact>;

    /// Caller fact at `call_site` to facts at the callee's start points
    fn call_flow(
        &self,
        ctx: &mut AnalysisContext<'_, D>,
        d1: &D::Fact,
        call_site: &D::Node,
        fact: &D::Fact,
        callee: &D::Method,
    ) -> Vec<D::Fact>;

    /// Exit fact back to the caller.
    ///
    /// `caller_source` is the caller's path-edge source fact. `caller_fact`
    /// is the fact the callee was entered with, `None` when the return leaves
    /// the seed's method without a matching call (unbalanced return).
    fn return_flow(
        &self,
        ctx: &mut AnalysisContext<'_, D>,
        call_site: &D::Node,
        callee: &D::Method,
        exit: &D::Node,
        exit_fact: &D::Fact,
        return_site: &D::Node,
        caller_source: &D::Fact,
        caller_fact: Option<&D::Fact>,
    ) -> Vec<D::Fact>;

    fn call_to_return_flow(
        &self,
        ctx: &mut AnalysisContext<'_, D>,
        d1: &D::Fact,
        call_site: &D::Node,
        fact: &D::Fact,
        return_site: &D::Node,
    ) -> Vec<D::Fact>;
}

/// Edge functions (IDE part of the client problem)
pub trait EdgeFunctionProvider<D: AnalysisDomain>: Send + Sync {
    /// Most conservative value, neutral element of the meet
    fn top(&self) -> D::Value;

    /// Value assigned to the seed's source fact at method start points
    fn bottom(&self) -> D::Value;

    fn normal_edge(
        &self,
        d1: &D::Fact,
        curr: &D::Node,
        curr_fact: &D::Fact,
        succ: &D::Node,
        succ_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer>;

    fn call_edge(
        &self,
        caller_d1: &D::Fact,
        call_site: &D::Node,
        src_fact: &D::Fact,
        callee: &D::Method,
        dest_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer>;

    fn return_edge(
        &self,
        caller_d1: &D::Fact,
        call_site: &D::Node,
        callee: &D::Method,
        exit: &D::Node,
        exit_fact: &D::Fact,
        return_site: &D::Node,
        ret_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer>;

    fn call_to_return_edge(
        &self,
        d1: &D::Fact,
        call_site: &D::Node,
        call_fact: &D::Fact,
        return_site: &D::Node,
        ret_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer>;
}

/// Seed generation rule
pub trait SeedGenerator<D: AnalysisDomain>: Send + Sync {
    /// Facts to track starting at `location` of `method`.
    /// `callees` is empty unless `location` is a call.
    fn generate(
        &self,
        method: &D::Method,
        location: &D::Node,
        callees: &[D::Method],
    ) -> Vec<D::Fact>;

    /// Restrict seeding to application methods
    fn seed_in_application_class(&self) -> bool {
        false
    }
}

// ============================================================================
// Reporting
// ============================================================================

/// Receives exactly one result per seed
pub trait ResultSink<D: AnalysisDomain> {
    fn on_seed_finished(&mut self, result: SeedResult<D>);
}

/// Hooks at phase boundaries; every method defaults to a no-op
#[allow(unused_variables)]
pub trait AnalysisObserver<D: AnalysisDomain>: Send + Sync {
    fn before_analysis(&self, seeds: usize) {}

    fn start_with_seed(&self, seed: &PathEdge<D::Node, D::Fact>) {}

    fn seed_state_changed(&self, seed: &PathEdge<D::Node, D::Fact>, state: SeedState) {}

    /// One pass of the phase-1 loop begins with `worklist`
    fn start_forward_pass(&self, worklist: &[PathEdge<D::Node, D::Fact>]) {}

    fn start_alias_phase(&self, pending: &[PointOfAlias<D>]) {}

    fn solve_poa(&self, poa: &PointOfAlias<D>) {}

    fn kill_as_of_strong_update(
        &self,
        d1: &D::Fact,
        call_site: &D::Node,
        call_fact: &D::Fact,
        return_site: &D::Node,
        ret_fact: &D::Fact,
    ) {
    }

    fn on_timeout(&self, seed: &PathEdge<D::Node, D::Fact>) {}

    fn after_analysis(&self) {}
}

/// Observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<D: AnalysisDomain> AnalysisObserver<D> for NoopObserver {}
