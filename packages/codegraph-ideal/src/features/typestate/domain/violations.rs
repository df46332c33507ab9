/*
 * Protocol Violations
 *
 * An object that may still be in an error state when its owning method
 * returns.
 */

use serde::{Deserialize, Serialize};

use super::State;

/// Protocol violation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Every path leaves the object in an error state
    MustBeInError,

    /// Some paths leave the object in an error state
    MayBeInError,
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::MustBeInError => write!(f, "Must Be In Error"),
            ViolationKind::MayBeInError => write!(f, "May Be In Error"),
        }
    }
}

/// Protocol violation
///
/// # Example
/// ```ignore
/// let violation = ProtocolViolation::new(
///     "FileMustBeClosed",
///     "main:4",
///     "f",
///     ViolationKind::MustBeInError,
///     vec![State::new("OPENED")],
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolViolation {
    pub protocol: String,

    /// Method exit the object reaches in an error state
    pub node: String,

    /// Access path of the object
    pub variable: String,

    pub kind: ViolationKind,

    /// Every state the object may be in at `node`
    pub states: Vec<State>,
}

impl ProtocolViolation {
    pub fn new(
        protocol: impl Into<String>,
        node: impl Into<String>,
        variable: impl Into<String>,
        kind: ViolationKind,
        states: Vec<State>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            node: node.into(),
            variable: variable.into(),
            kind,
            states,
        }
    }

    /// Format for display
    pub fn format_message(&self) -> String {
        let states: Vec<&str> = self.states.iter().map(|s| s.name.as_str()).collect();
        format!(
            "{}: {} on '{}' ({}) - states {{{}}}",
            self.node,
            self.kind,
            self.variable,
            self.protocol,
            states.join(", ")
        )
    }
}

impl std::fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.format_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_kind_display() {
        assert_eq!(ViolationKind::MustBeInError.to_string(), "Must Be In Error");
        assert_eq!(ViolationKind::MayBeInError.to_string(), "May Be In Error");
    }

    #[test]
    fn test_format_message() {
        let violation = ProtocolViolation::new(
            "FileMustBeClosed",
            "main:4",
            "f",
            ViolationKind::MayBeInError,
            vec![State::new("CLOSED"), State::new("OPENED")],
        );
        assert_eq!(
            violation.to_string(),
            "main:4: May Be In Error on 'f' (FileMustBeClosed) - states {CLOSED, OPENED}"
        );
    }
}
