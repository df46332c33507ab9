//! Seed discovery
//!
//! Walks every reachable method with a body and asks the seed generator
//! which facts to track at each statement. One zero-sourced path edge per
//! `(statement, fact)`; duplicates collapse.

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::features::ideal::domain::{AnalysisDomain, DataflowFact, PathEdge};
use crate::features::ideal::ports::{InterproceduralCfg, SeedGenerator};

pub struct SeedDiscovery<'a, D: AnalysisDomain> {
    icfg: &'a dyn InterproceduralCfg<D>,
    generator: &'a dyn SeedGenerator<D>,
    config: &'a AnalysisConfig,
}

impl<'a, D: AnalysisDomain> SeedDiscovery<'a, D> {
    pub fn new(
        icfg: &'a dyn InterproceduralCfg<D>,
        generator: &'a dyn SeedGenerator<D>,
        config: &'a AnalysisConfig,
    ) -> Self {
        Self {
            icfg,
            generator,
            config,
        }
    }

    pub fn compute_seeds(&self) -> FxHashSet<PathEdge<D::Node, D::Fact>> {
        let application_only =
            self.config.seed_in_application_class_methods || self.generator.seed_in_application_class();

        let mut seeds = FxHashSet::default();
        for method in self.icfg.reachable_methods() {
            if application_only && !self.icfg.is_application_method(&method) {
                continue;
            }
            seeds.extend(self.seeds_in(&method));
        }

        if seeds.is_empty() {
            info!("no seeds found");
        } else {
            debug!(seeds = seeds.len(), "seed discovery finished");
        }
        seeds
    }

    fn seeds_in(&self, method: &D::Method) -> Vec<PathEdge<D::Node, D::Fact>> {
        let Some(statements) = self.icfg.statements_of(method) else {
            return Vec::new();
        };

        let mut seeds = Vec::new();
        for u in statements {
            let callees = if self.icfg.is_call(&u) {
                self.icfg.callees_of_call_at(&u)
            } else {
                Vec::new()
            };

            for fact in self.generator.generate(method, &u, &callees) {
                if !self.config.enable_static_fields && fact.contains_static_field() {
                    continue;
                }
                seeds.push(PathEdge::new(D::Fact::zero(), u.clone(), fact));
            }
        }
        seeds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::program::{AccessPath, ProgramBuilder, ProgramGraph, StmtKind};
    use crate::features::typestate::ports::ProtocolDefinition;
    use crate::features::typestate::{FileMustBeClosedProtocol, TypestateDomain, TypestateProblem};

    /// Seeds a static field at every return
    struct StaticSeeds;

    impl SeedGenerator<TypestateDomain> for StaticSeeds {
        fn generate(&self, _method: &String, location: &String, _callees: &[String]) -> Vec<AccessPath> {
            if location.ends_with(":2") {
                vec![AccessPath::static_field("Registry", "file")]
            } else {
                Vec::new()
            }
        }
    }

    fn program() -> ProgramGraph {
        let mut builder = ProgramBuilder::new();
        builder
            .method("main")
            .stmt(StmtKind::new_object("a", "File"))
            .stmt(StmtKind::call_static("helper", &[]))
            .stmt(StmtKind::ret(None));
        builder
            .method("helper")
            .library()
            .stmt(StmtKind::new_object("x", "File"))
            .stmt(StmtKind::ret(None));
        builder
            .method("unused")
            .stmt(StmtKind::new_object("y", "File"))
            .stmt(StmtKind::ret(None));
        builder.entry("main");
        builder.build().unwrap()
    }

    fn seed(node: &str, var: &str) -> PathEdge<String, AccessPath> {
        PathEdge::new(AccessPath::zero(), node.to_string(), AccessPath::local(var))
    }

    #[test]
    fn test_seeds_in_reachable_methods() {
        let program = program();
        let problem = TypestateProblem::new(&program, FileMustBeClosedProtocol::define());
        let config = AnalysisConfig::default();

        let seeds = SeedDiscovery::<TypestateDomain>::new(&program, &problem, &config).compute_seeds();
        assert_eq!(seeds.len(), 2);
        assert!(seeds.contains(&seed("main:0", "a")));
        assert!(seeds.contains(&seed("helper:0", "x")));
    }

    #[test]
    fn test_application_only_skips_library_bodies() {
        let program = program();
        let problem = TypestateProblem::new(&program, FileMustBeClosedProtocol::define());
        let config = AnalysisConfig::default().seed_in_application_class_methods(true);

        let seeds = SeedDiscovery::<TypestateDomain>::new(&program, &problem, &config).compute_seeds();
        assert_eq!(seeds.len(), 1);
        assert!(seeds.contains(&seed("main:0", "a")));
    }

    #[test]
    fn test_static_field_seeds_follow_config() {
        let program = program();

        let config = AnalysisConfig::default();
        let seeds = SeedDiscovery::<TypestateDomain>::new(&program, &StaticSeeds, &config).compute_seeds();
        assert_eq!(seeds.len(), 1);

        let config = AnalysisConfig::default().enable_static_fields(false);
        let seeds = SeedDiscovery::<TypestateDomain>::new(&program, &StaticSeeds, &config).compute_seeds();
        assert!(seeds.is_empty());
    }
}
