//! Typestate ports

use crate::features::typestate::domain::Protocol;

/// A protocol known at compile time
///
/// Built-in protocols implement this; custom ones come from
/// [`ProtocolParser`](crate::features::typestate::infrastructure::ProtocolParser).
pub trait ProtocolDefinition {
    fn define() -> Protocol;
}
