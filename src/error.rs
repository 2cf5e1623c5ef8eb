//! Error types for the query model.
//!
//! Every error here is a programming-logic fault: nothing is retried and
//! nothing is suppressed.

use thiserror::Error;

use crate::evaluator::EvalError;

/// Errors raised while building, cloning, visiting or executing a query model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// A required input was absent or empty.
    #[error("Argument error: '{parameter}' {message}")]
    Argument {
        parameter: &'static str,
        message: String,
    },

    /// Structural misuse, such as registering a clause twice in a clone context.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A clause handle has no registered substitute or no arena slot.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An expression failed to evaluate during in-memory execution.
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// The in-memory executor hit one of its configured limits.
    #[error("Execution limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Result type for query model operations
pub type QueryResult<T> = Result<T, QueryError>;

impl QueryError {
    pub(crate) fn argument(parameter: &'static str, message: impl Into<String>) -> Self {
        QueryError::Argument {
            parameter,
            message: message.into(),
        }
    }

    pub(crate) fn absent(parameter: &'static str) -> Self {
        Self::argument(parameter, "must not be absent")
    }

    pub(crate) fn empty(parameter: &'static str) -> Self {
        Self::argument(parameter, "must not be empty")
    }

    pub fn is_argument(&self) -> bool {
        matches!(self, QueryError::Argument { .. })
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, QueryError::InvalidOperation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = QueryError::empty("item_name");
        assert_eq!(err.to_string(), "Argument error: 'item_name' must not be empty");

        let err = QueryError::absent("items");
        assert_eq!(err.to_string(), "Argument error: 'items' must not be absent");

        let err = QueryError::InvalidOperation("clause #1:0 is already mapped".to_string());
        assert_eq!(err.to_string(), "Invalid operation: clause #1:0 is already mapped");

        let err = QueryError::NotFound("clause #1:4".to_string());
        assert_eq!(err.to_string(), "Not found: clause #1:4");

        let err: QueryError = EvalError::DivisionByZero.into();
        assert_eq!(err.to_string(), "Evaluation error: Division by zero");
    }

    #[test]
    fn test_error_kind_predicates() {
        assert!(QueryError::empty("item_type").is_argument());
        assert!(QueryError::InvalidOperation(String::new()).is_invalid_operation());
        assert!(QueryError::NotFound(String::new()).is_not_found());
        assert!(!QueryError::NotFound(String::new()).is_argument());
    }
}
