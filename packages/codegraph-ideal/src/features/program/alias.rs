/*
 * Local must-alias oracle
 *
 * Answers "which access paths hold the same object as `fact` right before
 * `location`" for facts rooted at a local:
 *
 * 1. Walk the backward CFG from `location` to collect the statements that
 *    can execute before it in the same method.
 * 2. Run a forward must-alias analysis over that region. The state is a set
 *    of unordered local pairs known to hold the same reference:
 *      to = from       kill `to`, then `to` joins the class of `from`
 *      to = new C()    kill `to`
 *      to = b.f        kill `to`
 *      r = call(...)   kill `r`
 *    Joins intersect.
 * 3. Every local paired with the fact's base yields an alias with the same
 *    fields. The fact itself is always part of the answer.
 *
 * Static-field facts alias only themselves; ZERO has no aliases. The alias
 * deadline is checked once per visited statement.
 */

use std::collections::{BTreeSet, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::features::ideal::domain::{AnalysisDomain, DataflowFact};
use crate::features::ideal::infrastructure::BackwardCfg;
use crate::features::ideal::ports::{AliasOracle, AliasQuery, AliasSet};

use super::access_path::AccessPath;
use super::graph::{ProgramGraph, StmtKind};

type MustPairs = BTreeSet<(String, String)>;

pub struct LocalAliasOracle<'p> {
    program: &'p ProgramGraph,
}

impl<'p> LocalAliasOracle<'p> {
    pub fn new(program: &'p ProgramGraph) -> Self {
        Self { program }
    }

    /// Statements that can run before `location`, or `None` past the deadline
    fn region<D>(
        backward: &BackwardCfg<'_, D>,
        location: &String,
        query: &AliasQuery<'_, D>,
    ) -> Option<FxHashSet<String>>
    where
        D: AnalysisDomain<Node = String, Method = String, Fact = AccessPath>,
    {
        let mut region = FxHashSet::default();
        let mut stack = backward.successors_of(location);
        while let Some(node) = stack.pop() {
            if query.deadline.is_expired() {
                return None;
            }
            if region.insert(node.clone()) {
                stack.extend(backward.successors_of(&node));
            }
        }
        Some(region)
    }

    fn must_pairs_before<D>(&self, query: &AliasQuery<'_, D>) -> Option<MustPairs>
    where
        D: AnalysisDomain<Node = String, Method = String, Fact = AccessPath>,
    {
        let backward = query.backward_cfg;
        let location = query.location;
        let region = Self::region(backward, location, query)?;
        if region.is_empty() {
            return Some(MustPairs::new());
        }

        let method = backward.method_of(location);
        let mut out: FxHashMap<String, MustPairs> = FxHashMap::default();
        let mut worklist: VecDeque<String> = backward
            .end_points_of(&method)
            .into_iter()
            .filter(|sp| region.contains(sp))
            .collect();

        while let Some(node) = worklist.pop_front() {
            if query.deadline.is_expired() {
                return None;
            }
            let before = Self::join(&out, &backward.successors_of(&node));
            let after = self.transfer(&node, before);
            if out.get(&node) == Some(&after) {
                continue;
            }
            out.insert(node.clone(), after);
            worklist.extend(
                backward
                    .predecessors_of(&node)
                    .into_iter()
                    .filter(|succ| region.contains(succ)),
            );
        }

        Some(Self::join(&out, &backward.successors_of(location)))
    }

    /// Intersection over the computed states of `preds`
    fn join(out: &FxHashMap<String, MustPairs>, preds: &[String]) -> MustPairs {
        let mut states = preds.iter().filter_map(|p| out.get(p));
        let Some(first) = states.next() else {
            return MustPairs::new();
        };
        states.fold(first.clone(), |acc, s| acc.intersection(s).cloned().collect())
    }

    fn transfer(&self, node: &str, mut pairs: MustPairs) -> MustPairs {
        let Some(stmt) = self.program.statement(node) else {
            return pairs;
        };
        match stmt {
            StmtKind::Assign { to, from } if to != from => {
                kill(&mut pairs, to);
                let partners: Vec<String> = partners_of(&pairs, from).collect();
                pairs.insert(ordered(to, from));
                for partner in partners {
                    pairs.insert(ordered(to, &partner));
                }
            }
            other => {
                if let Some(defined) = other.defined_local() {
                    kill(&mut pairs, defined);
                }
            }
        }
        pairs
    }
}

fn ordered(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

fn kill(pairs: &mut MustPairs, var: &str) {
    pairs.retain(|(a, b)| a != var && b != var);
}

fn partners_of<'s>(pairs: &'s MustPairs, var: &'s str) -> impl Iterator<Item = String> + 's {
    pairs.iter().filter_map(move |(a, b)| {
        if a == var {
            Some(b.clone())
        } else if b == var {
            Some(a.clone())
        } else {
            None
        }
    })
}

impl<D> AliasOracle<D> for LocalAliasOracle<'_>
where
    D: AnalysisDomain<Node = String, Method = String, Fact = AccessPath>,
{
    fn aliases_for(&self, query: AliasQuery<'_, D>) -> AliasSet<AccessPath> {
        let fact = query.fact;
        if fact.is_zero() {
            return AliasSet::empty();
        }
        let Some(base) = fact.local_name() else {
            let mut answer = AliasSet::empty();
            answer.aliases.insert(fact.clone());
            return answer;
        };

        let Some(pairs) = self.must_pairs_before(&query) else {
            return AliasSet::timed_out();
        };

        let mut answer = AliasSet::empty();
        answer.aliases.insert(fact.clone());
        answer
            .aliases
            .extend(partners_of(&pairs, base).map(|local| fact.with_base(local)));
        answer
    }
}
