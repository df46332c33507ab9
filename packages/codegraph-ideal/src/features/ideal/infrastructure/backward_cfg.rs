//! Backward view of an ICFG
//!
//! Swaps successors with predecessors and start points with end points.
//! Handed to the alias oracle, which walks back from a query location.

use crate::features::ideal::domain::AnalysisDomain;
use crate::features::ideal::ports::InterproceduralCfg;

pub struct BackwardCfg<'a, D: AnalysisDomain> {
    forward: &'a dyn InterproceduralCfg<D>,
}

impl<'a, D: AnalysisDomain> BackwardCfg<'a, D> {
    pub fn new(forward: &'a dyn InterproceduralCfg<D>) -> Self {
        Self { forward }
    }

    /// The forward graph this view reverses
    pub fn forward(&self) -> &'a dyn InterproceduralCfg<D> {
        self.forward
    }

    pub fn successors_of(&self, node: &D::Node) -> Vec<D::Node> {
        self.forward.predecessors_of(node)
    }

    pub fn predecessors_of(&self, node: &D::Node) -> Vec<D::Node> {
        self.forward.successors_of(node)
    }

    /// Forward exits
    pub fn start_points_of(&self, method: &D::Method) -> Vec<D::Node> {
        self.forward.end_points_of(method)
    }

    /// Forward start points
    pub fn end_points_of(&self, method: &D::Method) -> Vec<D::Node> {
        self.forward.start_points_of(method)
    }

    pub fn is_start_point(&self, node: &D::Node) -> bool {
        self.forward.is_exit(node)
    }

    pub fn is_exit(&self, node: &D::Node) -> bool {
        self.forward.is_start_point(node)
    }

    pub fn is_call(&self, node: &D::Node) -> bool {
        self.forward.is_call(node)
    }

    pub fn callees_of_call_at(&self, call_site: &D::Node) -> Vec<D::Method> {
        self.forward.callees_of_call_at(call_site)
    }

    /// Statements reached backwards after leaving the call
    pub fn return_sites_of_call_at(&self, call_site: &D::Node) -> Vec<D::Node> {
        self.forward.predecessors_of(call_site)
    }

    pub fn method_of(&self, node: &D::Node) -> D::Method {
        self.forward.method_of(node)
    }
}

impl<D: AnalysisDomain> Clone for BackwardCfg<'_, D> {
    fn clone(&self) -> Self {
        Self {
            forward: self.forward,
        }
    }
}
