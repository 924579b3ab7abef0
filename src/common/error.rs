//! Error types for multiset_prm

use std::fmt;

/// Main error type for planner operations
#[derive(Debug)]
pub enum PlannerError {
    /// Generator argument string not in canonical form, or unsupported space type
    BadArgs(String),
    /// Planner constructed with no validity subsets
    EmptyFamily,
    /// Solve requested before a problem was set
    NoTarget,
    /// Invariant violation; not recoverable
    Internal(String),
    /// I/O error
    IoError(std::io::Error),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::BadArgs(msg) => write!(f, "Bad arguments: {}", msg),
            PlannerError::EmptyFamily => write!(f, "Family must be non-empty"),
            PlannerError::NoTarget => write!(f, "No problem has been set"),
            PlannerError::Internal(msg) => write!(f, "Internal error: {}", msg),
            PlannerError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::IoError(e)
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;
