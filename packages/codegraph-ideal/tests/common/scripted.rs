//! Scripted collaborators: recording observer, counting edge functions,
//! alias oracles that run slow or out of budget, and seed generators pinned
//! to one location

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use codegraph_ideal::{
    AccessPath, AliasOracle, AliasQuery, AliasSet, AnalysisObserver, EdgeFunction,
    EdgeFunctionProvider, LocalAliasOracle, PathEdge, PointOfAlias, SeedGenerator, SeedState,
    StateSet, TypestateDomain, TypestateProblem,
};
use codegraph_ideal::features::typestate::TransitionFunction;

pub type Edge = PathEdge<String, AccessPath>;
pub type Ef = EdgeFunction<StateSet, TransitionFunction>;

/// Observer callback, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    BeforeAnalysis(usize),
    StartWithSeed(Edge),
    SeedState(Edge, SeedState),
    ForwardPass(Vec<Edge>),
    AliasPhase(usize),
    SolvePoa(PointOfAlias<TypestateDomain>),
    StrongUpdateKill { call_site: String, ret_fact: AccessPath },
    Timeout(Edge),
    AfterAnalysis,
}

/// Records every observer callback
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn solved_poas(&self) -> Vec<PointOfAlias<TypestateDomain>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::SolvePoa(poa) => Some(poa),
                _ => None,
            })
            .collect()
    }

    pub fn forward_passes(&self) -> Vec<Vec<Edge>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::ForwardPass(pass) => Some(pass),
                _ => None,
            })
            .collect()
    }

    pub fn strong_update_kills(&self) -> Vec<(String, AccessPath)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::StrongUpdateKill { call_site, ret_fact } => Some((call_site, ret_fact)),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl AnalysisObserver<TypestateDomain> for RecordingObserver {
    fn before_analysis(&self, seeds: usize) {
        self.push(Event::BeforeAnalysis(seeds));
    }

    fn start_with_seed(&self, seed: &Edge) {
        self.push(Event::StartWithSeed(seed.clone()));
    }

    fn seed_state_changed(&self, seed: &Edge, state: SeedState) {
        self.push(Event::SeedState(seed.clone(), state));
    }

    fn start_forward_pass(&self, worklist: &[Edge]) {
        self.push(Event::ForwardPass(worklist.to_vec()));
    }

    fn start_alias_phase(&self, pending: &[PointOfAlias<TypestateDomain>]) {
        self.push(Event::AliasPhase(pending.len()));
    }

    fn solve_poa(&self, poa: &PointOfAlias<TypestateDomain>) {
        self.push(Event::SolvePoa(poa.clone()));
    }

    fn kill_as_of_strong_update(
        &self,
        _d1: &AccessPath,
        call_site: &String,
        _call_fact: &AccessPath,
        _return_site: &String,
        ret_fact: &AccessPath,
    ) {
        self.push(Event::StrongUpdateKill {
            call_site: call_site.clone(),
            ret_fact: ret_fact.clone(),
        });
    }

    fn on_timeout(&self, seed: &Edge) {
        self.push(Event::Timeout(seed.clone()));
    }

    fn after_analysis(&self) {
        self.push(Event::AfterAnalysis);
    }
}

/// Forwards to the typestate problem and counts every edge-function request
pub struct CountingEdges<'a> {
    inner: &'a TypestateProblem<'a>,
    calls: Arc<AtomicUsize>,
}

impl<'a> CountingEdges<'a> {
    pub fn new(inner: &'a TypestateProblem<'a>, calls: Arc<AtomicUsize>) -> Self {
        Self { inner, calls }
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl EdgeFunctionProvider<TypestateDomain> for CountingEdges<'_> {
    fn top(&self) -> StateSet {
        self.inner.top()
    }

    fn bottom(&self) -> StateSet {
        self.inner.bottom()
    }

    fn normal_edge(
        &self,
        d1: &AccessPath,
        curr: &String,
        curr_fact: &AccessPath,
        succ: &String,
        succ_fact: &AccessPath,
    ) -> Ef {
        self.count();
        self.inner.normal_edge(d1, curr, curr_fact, succ, succ_fact)
    }

    fn call_edge(
        &self,
        caller_d1: &AccessPath,
        call_site: &String,
        src_fact: &AccessPath,
        callee: &String,
        dest_fact: &AccessPath,
    ) -> Ef {
        self.count();
        self.inner
            .call_edge(caller_d1, call_site, src_fact, callee, dest_fact)
    }

    fn return_edge(
        &self,
        caller_d1: &AccessPath,
        call_site: &String,
        callee: &String,
        exit: &String,
        exit_fact: &AccessPath,
        return_site: &String,
        ret_fact: &AccessPath,
    ) -> Ef {
        self.count();
        self.inner.return_edge(
            caller_d1,
            call_site,
            callee,
            exit,
            exit_fact,
            return_site,
            ret_fact,
        )
    }

    fn call_to_return_edge(
        &self,
        d1: &AccessPath,
        call_site: &String,
        call_fact: &AccessPath,
        return_site: &String,
        ret_fact: &AccessPath,
    ) -> Ef {
        self.count();
        self.inner
            .call_to_return_edge(d1, call_site, call_fact, return_site, ret_fact)
    }
}

/// Oracle whose every query exceeds its budget
#[derive(Debug, Default)]
pub struct TimedOutOracle {
    queries: AtomicUsize,
}

impl TimedOutOracle {
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl AliasOracle<TypestateDomain> for TimedOutOracle {
    fn aliases_for(&self, _query: AliasQuery<'_, TypestateDomain>) -> AliasSet<AccessPath> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        AliasSet::timed_out()
    }
}

/// Sleeps before answering any query about `slow_fact`
pub struct SlowOracle<'p> {
    inner: LocalAliasOracle<'p>,
    slow_fact: AccessPath,
    delay: Duration,
}

impl<'p> SlowOracle<'p> {
    pub fn new(inner: LocalAliasOracle<'p>, slow_fact: AccessPath, delay: Duration) -> Self {
        Self {
            inner,
            slow_fact,
            delay,
        }
    }
}

impl AliasOracle<TypestateDomain> for SlowOracle<'_> {
    fn aliases_for(&self, query: AliasQuery<'_, TypestateDomain>) -> AliasSet<AccessPath> {
        if query.fact == &self.slow_fact {
            thread::sleep(self.delay);
        }
        AliasOracle::<TypestateDomain>::aliases_for(&self.inner, query)
    }
}

/// Answers normally until the value phase of a seed starts, then reports
/// every query as over budget. Doubles as the observer that sees the switch.
pub struct ExhaustedInValuePhase<'p> {
    inner: LocalAliasOracle<'p>,
    exhausted: AtomicBool,
    late_queries: AtomicUsize,
}

impl<'p> ExhaustedInValuePhase<'p> {
    pub fn new(inner: LocalAliasOracle<'p>) -> Self {
        Self {
            inner,
            exhausted: AtomicBool::new(false),
            late_queries: AtomicUsize::new(0),
        }
    }

    pub fn late_queries(&self) -> usize {
        self.late_queries.load(Ordering::SeqCst)
    }
}

impl AliasOracle<TypestateDomain> for ExhaustedInValuePhase<'_> {
    fn aliases_for(&self, query: AliasQuery<'_, TypestateDomain>) -> AliasSet<AccessPath> {
        if self.exhausted.load(Ordering::SeqCst) {
            self.late_queries.fetch_add(1, Ordering::SeqCst);
            return AliasSet::timed_out();
        }
        AliasOracle::<TypestateDomain>::aliases_for(&self.inner, query)
    }
}

impl AnalysisObserver<TypestateDomain> for ExhaustedInValuePhase<'_> {
    fn seed_state_changed(&self, _seed: &Edge, state: SeedState) {
        self.exhausted
            .store(state == SeedState::Phase2, Ordering::SeqCst);
    }
}

/// Keeps only the seeds `inner` generates at `location`
pub struct SeedsOnlyAt<'g> {
    inner: &'g dyn SeedGenerator<TypestateDomain>,
    location: String,
}

impl<'g> SeedsOnlyAt<'g> {
    pub fn new(inner: &'g dyn SeedGenerator<TypestateDomain>, location: &str) -> Self {
        Self {
            inner,
            location: location.to_string(),
        }
    }
}

impl SeedGenerator<TypestateDomain> for SeedsOnlyAt<'_> {
    fn generate(&self, method: &String, location: &String, callees: &[String]) -> Vec<AccessPath> {
        if *location != self.location {
            return Vec::new();
        }
        self.inner.generate(method, location, callees)
    }
}

/// Seeds `fact` at `location` whatever the statement there is
pub struct SeedAt {
    location: String,
    fact: AccessPath,
}

impl SeedAt {
    pub fn new(location: &str, fact: AccessPath) -> Self {
        Self {
            location: location.to_string(),
            fact,
        }
    }
}

impl SeedGenerator<TypestateDomain> for SeedAt {
    fn generate(&self, _method: &String, location: &String, _callees: &[String]) -> Vec<AccessPath> {
        if *location == self.location {
            vec![self.fact.clone()]
        } else {
            Vec::new()
        }
    }
}
