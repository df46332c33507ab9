/*
 * Forward edge functions
 *
 * Wraps the client's EdgeFunctionProvider with the engine's policy:
 * - before the IDE phase every request answers ALL_BOTTOM and the client is
 *   never consulted
 * - normal flow along a nullness-infeasible branch answers ALL_TOP
 * - call-to-return flow of a strongly updated fact answers ALL_TOP when
 *   strong updates are enabled
 * - everything else is the client's function
 *
 * ALL_TOP and ALL_BOTTOM are built once from the client's top value.
 */

use crate::features::ideal::domain::{AnalysisDomain, EdgeFunction};
use crate::features::ideal::ports::EdgeFunctionProvider;

use super::context::AnalysisContext;

pub struct ForwardEdgeFunctions<'a, D: AnalysisDomain> {
    client: &'a dyn EdgeFunctionProvider<D>,
    all_top: EdgeFunction<D::Value, D::Transformer>,
    all_bottom: EdgeFunction<D::Value, D::Transformer>,
}

impl<'a, D: AnalysisDomain> ForwardEdgeFunctions<'a, D> {
    pub fn new(client: &'a dyn EdgeFunctionProvider<D>) -> Self {
        let top = client.top();
        Self {
            client,
            all_top: EdgeFunction::AllTop(top.clone()),
            all_bottom: EdgeFunction::AllBottom(top),
        }
    }

    pub fn all_top(&self) -> &EdgeFunction<D::Value, D::Transformer> {
        &self.all_top
    }

    pub fn all_bottom(&self) -> &EdgeFunction<D::Value, D::Transformer> {
        &self.all_bottom
    }

    pub fn top(&self) -> D::Value {
        self.client.top()
    }

    pub fn bottom(&self) -> D::Value {
        self.client.bottom()
    }

    pub fn normal_edge(
        &self,
        ctx: &AnalysisContext<'_, D>,
        d1: &D::Fact,
        curr: &D::Node,
        curr_fact: &D::Fact,
        succ: &D::Node,
        succ_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer> {
        if !ctx.is_in_ide_phase() {
            return self.all_bottom.clone();
        }
        if ctx.icfg().is_nullness_branch(curr, succ, curr_fact) {
            return self.all_top.clone();
        }
        self.client.normal_edge(d1, curr, curr_fact, succ, succ_fact)
    }

    pub fn call_edge(
        &self,
        ctx: &AnalysisContext<'_, D>,
        caller_d1: &D::Fact,
        call_site: &D::Node,
        src_fact: &D::Fact,
        callee: &D::Method,
        dest_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer> {
        if !ctx.is_in_ide_phase() {
            return self.all_bottom.clone();
        }
        self.client
            .call_edge(caller_d1, call_site, src_fact, callee, dest_fact)
    }

    pub fn return_edge(
        &self,
        ctx: &AnalysisContext<'_, D>,
        caller_d1: &D::Fact,
        call_site: &D::Node,
        callee: &D::Method,
        exit: &D::Node,
        exit_fact: &D::Fact,
        return_site: &D::Node,
        ret_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer> {
        if !ctx.is_in_ide_phase() {
            return self.all_bottom.clone();
        }
        self.client.return_edge(
            caller_d1,
            call_site,
            callee,
            exit,
            exit_fact,
            return_site,
            ret_fact,
        )
    }

    pub fn call_to_return_edge(
        &self,
        ctx: &AnalysisContext<'_, D>,
        d1: &D::Fact,
        call_site: &D::Node,
        call_fact: &D::Fact,
        return_site: &D::Node,
        ret_fact: &D::Fact,
    ) -> EdgeFunction<D::Value, D::Transformer> {
        if !ctx.is_in_ide_phase() {
            return self.all_bottom.clone();
        }
        if ctx.config().enable_strong_updates && ctx.is_strong_update(call_site, ret_fact) {
            ctx.observer()
                .kill_as_of_strong_update(d1, call_site, call_fact, return_site, ret_fact);
            return self.all_top.clone();
        }
        self.client
            .call_to_return_edge(d1, call_site, call_fact, return_site, ret_fact)
    }
}
