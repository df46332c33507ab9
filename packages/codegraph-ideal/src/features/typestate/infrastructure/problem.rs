/*
 * Typestate Analysis Problem
 *
 * Client of the IDEal engine over the reference program model.
 *
 * Flow functions (facts are access paths):
 * - `x = new C()`   kills paths rooted at `x`
 * - `x = y`         kills `x...`, copies `y...` to `x...`
 * - `x = b.f`       kills `x...`, copies `b.f.rest` to `x.rest`
 * - `b.f = y`       kills `b.f...`, copies `y.rest` to `b.f.rest` and asks
 *                   for the aliases of `b.f` (indirection POA)
 * - calls           receiver to `this`, arguments to parameters, and back
 *                   on return; the receiver's aliases at the call site are
 *                   strongly updated (call-site POA) and re-seeded with the
 *                   returned state (return-event POA)
 *
 * Edge functions:
 * - returning `this` from a callee whose name is a protocol action applies
 *   that action's transition function
 * - for library callees (no body) the transition sits on the
 *   call-to-return edge of the receiver; the receiver's must-aliases are
 *   dropped there and re-created by its return event
 * - everything else is identity
 */

use crate::features::ideal::domain::{DataflowFact, EdgeFunction, PointOfAlias, ValueTransformer};
use crate::features::ideal::infrastructure::AnalysisContext;
use crate::features::ideal::ports::{EdgeFunctionProvider, FlowFunctionProvider, SeedGenerator};
use crate::features::program::{AccessPath, MethodDecl, ProgramGraph, StmtKind};
use crate::features::typestate::domain::{
    Protocol, SeedRule, StateSet, TransitionFunction, TypestateDomain,
};

type Ef = EdgeFunction<StateSet, TransitionFunction>;
type Ctx<'a> = AnalysisContext<'a, TypestateDomain>;

const THIS: &str = "this";

/// Call statement parts
struct Call<'s> {
    receiver: Option<&'s str>,
    args: &'s [String],
    result: Option<&'s str>,
}

pub struct TypestateProblem<'p> {
    program: &'p ProgramGraph,
    protocol: Protocol,
}

impl<'p> TypestateProblem<'p> {
    pub fn new(program: &'p ProgramGraph, protocol: Protocol) -> Self {
        Self { program, protocol }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn program(&self) -> &'p ProgramGraph {
        self.program
    }

    fn call_at(&self, call_site: &str) -> Option<Call<'p>> {
        match self.program.statement(call_site)? {
            StmtKind::Invoke {
                receiver,
                args,
                result,
                ..
            } => Some(Call {
                receiver: receiver.as_deref(),
                args,
                result: result.as_deref(),
            }),
            _ => None,
        }
    }

    /// Fact is handed to the callee as receiver or argument
    fn is_passed(call: &Call<'_>, fact: &AccessPath) -> bool {
        call.receiver.is_some_and(|r| fact.is_rooted_at(r))
            || call.args.iter().any(|a| fact.is_rooted_at(a))
    }

    /// Every callee has a body, so the call's effect is computed through it
    fn all_callees_have_bodies(&self, call_site: &str) -> bool {
        let decls = self.program.callee_decls(call_site);
        !decls.is_empty() && decls.iter().all(|d| d.has_body())
    }

    /// Transition for `callee` when it acts on its receiver
    fn action_function(&self, callee: &str) -> Option<TransitionFunction> {
        let action = self.protocol.action_for(callee)?;
        Some(self.protocol.transition_function(&action))
    }

    /// Call-to-return effect of the body-less callees at `call_site`
    ///
    /// Callees without a matching action contribute identity; the results of
    /// all targets are met.
    fn library_transition(&self, call_site: &str) -> Option<TransitionFunction> {
        let library: Vec<&MethodDecl> = self
            .program
            .callee_decls(call_site)
            .into_iter()
            .filter(|d| !d.has_body())
            .collect();
        let functions: Vec<Option<TransitionFunction>> = library
            .iter()
            .map(|d| self.action_function(&d.name))
            .collect();
        if functions.iter().all(Option::is_none) {
            return None;
        }
        functions
            .into_iter()
            .map(Option::unwrap_or_default)
            .reduce(|a, b| a.meet_with(&b))
    }

    /// Edge function for leaving `callee` with `exit_fact`
    fn return_function(&self, callee: &str, exit_fact: &AccessPath) -> Ef {
        let is_receiver = self
            .program
            .method(callee)
            .is_some_and(|d| d.is_instance)
            && exit_fact.is_local(THIS);
        if !is_receiver {
            return EdgeFunction::Identity;
        }
        match self.action_function(callee) {
            Some(f) => EdgeFunction::Transformer(f),
            None => EdgeFunction::Identity,
        }
    }

    /// `fact` is a local other than the receiver that the receiver's return
    /// event re-creates at `return_site` with the library transition applied.
    ///
    /// Replays the aliases recorded when that return event was resolved.
    /// Phase 1 never drops.
    fn is_receiver_alias(
        &self,
        ctx: &Ctx<'_>,
        call: &Call<'_>,
        d1: &AccessPath,
        call_site: &String,
        fact: &AccessPath,
        return_site: &String,
    ) -> bool {
        if !ctx.is_in_ide_phase() {
            return false;
        }
        let Some(receiver) = call.receiver else {
            return false;
        };
        if fact.is_local(receiver) || !fact.fields().is_empty() || fact.local_name().is_none() {
            return false;
        }
        let Some(transition) = self.library_transition(call_site) else {
            return false;
        };
        let event = PointOfAlias::ReturnEvent {
            call_site: call_site.clone(),
            return_site: return_site.clone(),
            source_fact: d1.clone(),
            fact: AccessPath::local(receiver),
            edge_function: EdgeFunction::Transformer(transition),
        };
        ctx.resolved_flow(&event)
            .is_some_and(|aliases| aliases.contains(fact))
    }

    /// Whether `callee` overwrites `local` anywhere in its body
    fn reassigns(decl: &MethodDecl, local: &str) -> bool {
        decl.body
            .iter()
            .flatten()
            .any(|stmt| stmt.defined_local() == Some(local))
    }
}

// ============================================================================
// Seeds
// ============================================================================

impl SeedGenerator<TypestateDomain> for TypestateProblem<'_> {
    fn generate(&self, _method: &String, location: &String, callees: &[String]) -> Vec<AccessPath> {
        match (&self.protocol.seed, self.program.statement(location)) {
            (SeedRule::Allocation { class }, Some(StmtKind::New { var, class: allocated }))
                if allocated == class =>
            {
                vec![AccessPath::local(var.as_str())]
            }
            (
                SeedRule::ReceiverOfCall { actions },
                Some(StmtKind::Invoke {
                    receiver: Some(receiver),
                    ..
                }),
            ) if callees
                .iter()
                .any(|c| actions.iter().any(|a| a.matches(c))) =>
            {
                vec![AccessPath::local(receiver.as_str())]
            }
            _ => Vec::new(),
        }
    }
}

// ============================================================================
// Flow functions
// ============================================================================

impl FlowFunctionProvider<TypestateDomain> for TypestateProblem<'_> {
    fn normal_flow(
        &self,
        ctx: &mut Ctx<'_>,
        d1: &AccessPath,
        curr: &String,
        fact: &AccessPath,
        succ: &String,
    ) -> Vec<AccessPath> {
        let Some(stmt) = self.program.statement(curr) else {
            return vec![fact.clone()];
        };

        match stmt {
            StmtKind::New { var, .. } => {
                if fact.is_rooted_at(var) {
                    Vec::new()
                } else {
                    vec![fact.clone()]
                }
            }
            StmtKind::Assign { to, from } => {
                if to == from {
                    return vec![fact.clone()];
                }
                let mut out = Vec::new();
                if !fact.is_rooted_at(to) {
                    out.push(fact.clone());
                }
                if fact.is_rooted_at(from) {
                    out.push(fact.with_base(to.as_str()));
                }
                out
            }
            StmtKind::Load { to, base, field } => {
                let mut out = Vec::new();
                if !fact.is_rooted_at(to) {
                    out.push(fact.clone());
                }
                if fact.starts_with_field(base, field) {
                    out.push(fact.strip_first_field(to.as_str()));
                }
                out
            }
            StmtKind::Store { base, field, from } => {
                let mut out = Vec::new();
                if !fact.starts_with_field(base, field) {
                    out.push(fact.clone());
                }
                if fact.is_rooted_at(from) {
                    let stored = fact.prepend_field(base.as_str(), field.as_str());
                    out.push(stored.clone());
                    out.extend(ctx.point_of_alias(PointOfAlias::Indirection {
                        statement: curr.clone(),
                        successor: succ.clone(),
                        source_fact: d1.clone(),
                        fact: stored,
                    }));
                }
                out
            }
            _ => vec![fact.clone()],
        }
    }

    fn call_flow(
        &self,
        _ctx: &mut Ctx<'_>,
        _d1: &AccessPath,
        call_site: &String,
        fact: &AccessPath,
        callee: &String,
    ) -> Vec<AccessPath> {
        let (Some(call), Some(decl)) = (self.call_at(call_site), self.program.method(callee)) else {
            return Vec::new();
        };
        if !decl.has_body() {
            return Vec::new();
        }

        let mut out = Vec::new();
        if fact.contains_static_field() {
            out.push(fact.clone());
        }
        if let Some(receiver) = call.receiver {
            if decl.is_instance && fact.is_rooted_at(receiver) {
                out.push(fact.with_base(THIS));
            }
        }
        for (arg, param) in call.args.iter().zip(&decl.params) {
            if fact.is_rooted_at(arg) {
                out.push(fact.with_base(param.as_str()));
            }
        }
        out
    }

    fn return_flow(
        &self,
        ctx: &mut Ctx<'_>,
        call_site: &String,
        callee: &String,
        exit: &String,
        exit_fact: &AccessPath,
        return_site: &String,
        caller_source: &AccessPath,
        _caller_fact: Option<&AccessPath>,
    ) -> Vec<AccessPath> {
        let (Some(call), Some(decl)) = (self.call_at(call_site), self.program.method(callee)) else {
            return Vec::new();
        };
        if exit_fact.contains_static_field() {
            return vec![exit_fact.clone()];
        }

        let mut mapped = Vec::new();
        if let Some(receiver) = call.receiver {
            if decl.is_instance && exit_fact.is_rooted_at(THIS) {
                mapped.push(exit_fact.with_base(receiver));
            }
        }
        for (param, arg) in decl.params.iter().zip(call.args) {
            if exit_fact.is_rooted_at(param) && !Self::reassigns(decl, param) {
                mapped.push(exit_fact.with_base(arg.as_str()));
            }
        }
        if let (Some(StmtKind::Return { value: Some(value) }), Some(result)) =
            (self.program.statement(exit), call.result)
        {
            if exit_fact.is_rooted_at(value) {
                mapped.push(exit_fact.with_base(result));
            }
        }

        let edge_function = self.return_function(callee, exit_fact);
        let mut out = mapped.clone();
        for fact in mapped {
            out.extend(ctx.point_of_alias(PointOfAlias::ReturnEvent {
                call_site: call_site.clone(),
                return_site: return_site.clone(),
                source_fact: caller_source.clone(),
                fact,
                edge_function: edge_function.clone(),
            }));
        }
        out
    }

    fn call_to_return_flow(
        &self,
        ctx: &mut Ctx<'_>,
        d1: &AccessPath,
        call_site: &String,
        fact: &AccessPath,
        return_site: &String,
    ) -> Vec<AccessPath> {
        let Some(call) = self.call_at(call_site) else {
            return vec![fact.clone()];
        };
        if call.result.is_some_and(|r| fact.is_rooted_at(r)) {
            return Vec::new();
        }

        let through_bodies = self.all_callees_have_bodies(call_site);
        if fact.contains_static_field() {
            return if through_bodies { Vec::new() } else { vec![fact.clone()] };
        }
        if !through_bodies && self.is_receiver_alias(ctx, &call, d1, call_site, fact, return_site) {
            return Vec::new();
        }
        if !Self::is_passed(&call, fact) {
            return vec![fact.clone()];
        }

        let mut out = vec![fact.clone()];
        if through_bodies {
            out.extend(ctx.point_of_alias(PointOfAlias::CallSite {
                call_site: call_site.clone(),
                return_site: return_site.clone(),
                source_fact: d1.clone(),
                fact: fact.clone(),
            }));
        } else if call.receiver.is_some_and(|r| fact.is_local(r)) {
            if let Some(transition) = self.library_transition(call_site) {
                out.extend(ctx.point_of_alias(PointOfAlias::ReturnEvent {
                    call_site: call_site.clone(),
                    return_site: return_site.clone(),
                    source_fact: d1.clone(),
                    fact: fact.clone(),
                    edge_function: EdgeFunction::Transformer(transition),
                }));
            }
        }
        out
    }
}

// ============================================================================
// Edge functions
// ============================================================================

impl EdgeFunctionProvider<TypestateDomain> for TypestateProblem<'_> {
    fn top(&self) -> StateSet {
        StateSet::empty()
    }

    fn bottom(&self) -> StateSet {
        StateSet::singleton(self.protocol.initial_state())
    }

    fn normal_edge(
        &self,
        _d1: &AccessPath,
        _curr: &String,
        _curr_fact: &AccessPath,
        _succ: &String,
        _succ_fact: &AccessPath,
    ) -> Ef {
        EdgeFunction::Identity
    }

    fn call_edge(
        &self,
        _caller_d1: &AccessPath,
        _call_site: &String,
        _src_fact: &AccessPath,
        _callee: &String,
        _dest_fact: &AccessPath,
    ) -> Ef {
        EdgeFunction::Identity
    }

    fn return_edge(
        &self,
        _caller_d1: &AccessPath,
        _call_site: &String,
        callee: &String,
        _exit: &String,
        exit_fact: &AccessPath,
        _return_site: &String,
        _ret_fact: &AccessPath,
    ) -> Ef {
        self.return_function(callee, exit_fact)
    }

    fn call_to_return_edge(
        &self,
        _d1: &AccessPath,
        call_site: &String,
        call_fact: &AccessPath,
        _return_site: &String,
        _ret_fact: &AccessPath,
    ) -> Ef {
        let Some(call) = self.call_at(call_site) else {
            return EdgeFunction::Identity;
        };
        let on_receiver = call.receiver.is_some_and(|r| call_fact.is_local(r));
        if !on_receiver || self.all_callees_have_bodies(call_site) {
            return EdgeFunction::Identity;
        }
        match self.library_transition(call_site) {
            Some(f) => EdgeFunction::Transformer(f),
            None => EdgeFunction::Identity,
        }
    }
}
