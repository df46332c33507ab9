//! Typestate application layer: result collection and violation reporting

pub mod results;

pub use results::TypestateResults;
