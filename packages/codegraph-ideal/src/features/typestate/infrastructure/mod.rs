//! Typestate infrastructure: built-in protocols, protocol parser and the
//! analysis problem over the reference program model

pub mod built_in;
pub mod problem;
pub mod protocol_parser;

pub use built_in::{FileMustBeClosedProtocol, PrintStreamProtocol};
pub use problem::TypestateProblem;
pub use protocol_parser::{ParseError, ProtocolConfig, ProtocolParser, SeedConfig, TransitionConfig};
