//! Program construction errors

use thiserror::Error;

/// Raised by [`ProgramBuilder::build`](super::ProgramBuilder::build)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("method '{0}' is declared twice")]
    DuplicateMethod(String),

    #[error("entry method '{0}' is not declared")]
    UnknownEntry(String),

    #[error("call at {call_site} targets undeclared method '{callee}'")]
    UnknownCallee { call_site: String, callee: String },

    #[error("branch at {statement} targets index {target}, but '{method}' has {len} statements")]
    BranchOutOfRange {
        method: String,
        statement: String,
        target: usize,
        len: usize,
    },

    #[error("call at {call_site} has a receiver, but '{callee}' is not an instance method")]
    NotAnInstanceMethod { call_site: String, callee: String },

    #[error("call at {call_site} passes {args} arguments to '{callee}', which takes {params}")]
    ArityMismatch {
        call_site: String,
        callee: String,
        args: usize,
        params: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ProgramError::UnknownCallee {
            call_site: "main:3".to_string(),
            callee: "File.open".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "call at main:3 targets undeclared method 'File.open'"
        );
        assert_eq!(
            ProgramError::UnknownEntry("run".to_string()).to_string(),
            "entry method 'run' is not declared"
        );
    }
}
