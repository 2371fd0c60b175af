use crate::link::LinkArity;

/// Raised when a link template cannot be resolved with the supplied parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("link needs {required} parameter(s) but {supplied} were supplied")]
    Insufficient { required: usize, supplied: usize },

    #[error("link takes {required} parameter(s) but {supplied} were supplied")]
    Excess { required: usize, supplied: usize },
}

impl LinkError {
    /// Returns the arity verdict this error was raised for.
    pub fn arity(&self) -> LinkArity {
        match self {
            LinkError::Insufficient { .. } => LinkArity::Insufficient,
            LinkError::Excess { .. } => LinkArity::Excess,
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
