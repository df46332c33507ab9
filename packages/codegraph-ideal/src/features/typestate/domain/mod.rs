/*
 * Typestate Domain Models
 *
 * Protocols, lattice values, edge-function payloads, violations and the
 * domain bundle the engine runs the typestate client over.
 */

mod protocol;
mod value;
mod violations;

pub use protocol::{Action, Protocol, SeedRule, State};
pub use value::{StateSet, TransitionFunction};
pub use violations::{ProtocolViolation, ViolationKind};

use crate::features::ideal::domain::AnalysisDomain;
use crate::features::program::AccessPath;

/// Typestate over the reference program model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypestateDomain;

impl AnalysisDomain for TypestateDomain {
    type Node = String;
    type Method = String;
    type Fact = AccessPath;
    type Value = StateSet;
    type Transformer = TransitionFunction;
}
