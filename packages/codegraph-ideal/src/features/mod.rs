//! Feature slices
//!
//! - `ideal`: the analysis engine, generic over an [`ideal::AnalysisDomain`]
//! - `program`: reference program representation and alias oracle
//! - `typestate`: reference client analysis built on `program`

pub mod ideal;
pub mod program;
pub mod typestate;
