//! Error types for rule function execution

use thiserror::Error;

use crate::reliability::{FailureKind, OperationFailure};

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors returned by [`FunctionExecutor`](crate::FunctionExecutor)
#[derive(Debug, Error)]
pub enum EngineError {
    /// The rule function declares an invalid operation table
    #[error("configuration error in {function}: {message}")]
    Configuration { function: String, message: String },

    /// Parameters could not be bound to an operation
    #[error("invalid parameters for {function}::{operation}: {source}")]
    Validation {
        function: String,
        operation: String,
        #[source]
        source: ValidationError,
    },

    /// The primary operation failed and the failure was not handled
    #[error("{function} failed after {attempts} attempt(s): {source}")]
    Upstream {
        function: String,
        attempts: u32,
        #[source]
        source: OperationFailure,
    },

    /// The fallback operation failed
    #[error("fallback of {function} failed: {source}")]
    Fallback {
        function: String,
        #[source]
        source: OperationFailure,
    },
}

impl EngineError {
    /// Create a configuration error
    pub fn config(function: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Configuration {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create a validation error for one operation
    pub fn validation(
        function: impl Into<String>,
        operation: impl Into<String>,
        source: ValidationError,
    ) -> Self {
        EngineError::Validation {
            function: function.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Name of the rule function that raised the error
    pub fn function(&self) -> &str {
        match self {
            EngineError::Configuration { function, .. }
            | EngineError::Validation { function, .. }
            | EngineError::Upstream { function, .. }
            | EngineError::Fallback { function, .. } => function,
        }
    }

    /// Kind of the carried operation failure, if any
    pub fn failure_kind(&self) -> Option<&FailureKind> {
        match self {
            EngineError::Upstream { source, .. } | EngineError::Fallback { source, .. } => {
                Some(source.kind())
            }
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, EngineError::Configuration { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation { .. })
    }
}

/// Reasons a parameter map cannot be bound to an operation's parameters
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// A required parameter is absent or null
    #[error("{param} can not be null")]
    Missing { param: String },

    /// A value could not be parsed into the declared type
    #[error("{param}: cannot convert {value} to {expected}")]
    Coercion {
        param: String,
        expected: String,
        value: String,
    },

    /// A collection parameter received a non-array value
    #[error("{param}: expected a collection, got {value}")]
    ExpectedCollection { param: String, value: String },

    /// Map parameters only accept text keys and untyped values
    #[error("{param}: only maps of text keys to untyped values are supported, declared <{key}, {value}>")]
    UnsupportedMapType {
        param: String,
        key: String,
        value: String,
    },

    /// A structured parameter could not be populated from the map
    #[error("{param}: cannot populate {type_name}: {message}")]
    Structured {
        param: String,
        type_name: String,
        message: String,
    },

    /// A populated structured parameter violates a field constraint
    #[error("{path} {message}")]
    Constraint { path: String, message: String },
}

impl ValidationError {
    pub(crate) fn missing(param: &str) -> Self {
        ValidationError::Missing {
            param: param.to_string(),
        }
    }

    pub(crate) fn coercion(param: impl Into<String>, expected: impl ToString, value: impl Into<String>) -> Self {
        ValidationError::Coercion {
            param: param.into(),
            expected: expected.to_string(),
            value: value.into(),
        }
    }
}
