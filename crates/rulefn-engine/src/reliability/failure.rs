//! Operation failures and their classification

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification tag attached to every operation failure
///
/// Execution policies list kinds in `no_failure_for` and `failure_for`; a
/// failure is checked against those lists with [`FailureKind::is_a`].
///
/// `Any` and `Transient` act as parents:
/// - `Any` matches every kind
/// - `Transient` matches `Transient`, `Timeout` and `Unavailable`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Matches every failure
    Any,
    /// Temporary condition, parent of `Timeout` and `Unavailable`
    Transient,
    Timeout,
    Unavailable,
    InvalidInput,
    NotFound,
    Conflict,
    /// Unexpected failure inside the operation
    Internal,
    /// Application-defined kind, matched by name
    Custom(String),
}

impl FailureKind {
    /// Create a custom kind
    pub fn custom(name: impl Into<String>) -> Self {
        FailureKind::Custom(name.into())
    }

    /// Check whether this kind is matched by `matcher`
    pub fn is_a(&self, matcher: &FailureKind) -> bool {
        match matcher {
            FailureKind::Any => true,
            FailureKind::Transient => matches!(
                self,
                FailureKind::Transient | FailureKind::Timeout | FailureKind::Unavailable
            ),
            other => self == other,
        }
    }

    /// First entry of `matchers` that matches this kind, in declaration order
    pub fn first_match<'a>(&self, matchers: &'a [FailureKind]) -> Option<&'a FailureKind> {
        matchers.iter().find(|matcher| self.is_a(matcher))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Any => write!(f, "any"),
            FailureKind::Transient => write!(f, "transient"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Unavailable => write!(f, "unavailable"),
            FailureKind::InvalidInput => write!(f, "invalid_input"),
            FailureKind::NotFound => write!(f, "not_found"),
            FailureKind::Conflict => write!(f, "conflict"),
            FailureKind::Internal => write!(f, "internal"),
            FailureKind::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Failure raised by a primary or fallback operation
///
/// # Example
///
/// ```
/// use rulefn_engine::{FailureKind, OperationFailure};
///
/// let failure = OperationFailure::new(FailureKind::Timeout, "pricing service timed out");
/// assert!(failure.kind().is_a(&FailureKind::Transient));
/// ```
#[derive(Debug)]
pub struct OperationFailure {
    kind: FailureKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl OperationFailure {
    /// Create a failure of the given kind
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a `Transient` failure
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Transient, message)
    }

    /// Create a `Timeout` failure
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    /// Create an `InvalidInput` failure
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidInput, message)
    }

    /// Create an `Internal` failure
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Internal, message)
    }

    /// Create a failure with an application-defined kind
    pub fn custom(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(FailureKind::custom(kind), message)
    }

    /// Attach the underlying error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for OperationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for OperationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<anyhow::Error> for OperationFailure {
    fn from(err: anyhow::Error) -> Self {
        Self {
            kind: FailureKind::Internal,
            message: err.to_string(),
            source: Some(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_matches_everything() {
        assert!(FailureKind::Timeout.is_a(&FailureKind::Any));
        assert!(FailureKind::custom("quota").is_a(&FailureKind::Any));
    }

    #[test]
    fn test_transient_hierarchy() {
        assert!(FailureKind::Timeout.is_a(&FailureKind::Transient));
        assert!(FailureKind::Unavailable.is_a(&FailureKind::Transient));
        assert!(!FailureKind::NotFound.is_a(&FailureKind::Transient));
        assert!(!FailureKind::Transient.is_a(&FailureKind::Timeout));
    }

    #[test]
    fn test_custom_kinds_match_by_name() {
        let quota = FailureKind::custom("quota");
        assert!(quota.is_a(&FailureKind::custom("quota")));
        assert!(!quota.is_a(&FailureKind::custom("limits")));
    }

    #[test]
    fn test_first_match_follows_declaration_order() {
        let matchers = vec![FailureKind::NotFound, FailureKind::Any, FailureKind::Timeout];
        assert_eq!(
            FailureKind::Timeout.first_match(&matchers),
            Some(&FailureKind::Any)
        );
        assert_eq!(FailureKind::Timeout.first_match(&[]), None);
    }

    #[test]
    fn test_failure_display_and_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
        let failure = OperationFailure::new(FailureKind::Unavailable, "rates offline").with_source(io);

        assert_eq!(failure.to_string(), "[unavailable] rates offline");
        let source = std::error::Error::source(&failure).expect("source attached");
        assert_eq!(source.to_string(), "socket closed");
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let failure: OperationFailure = anyhow::anyhow!("boom").into();
        assert_eq!(failure.kind(), &FailureKind::Internal);
        assert_eq!(failure.message(), "boom");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_value(vec![FailureKind::Timeout, FailureKind::custom("quota")])
            .unwrap();
        assert_eq!(json, serde_json::json!(["timeout", {"custom": "quota"}]));
    }
}
