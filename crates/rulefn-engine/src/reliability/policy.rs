//! Execution policy attached to a primary operation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::failure::FailureKind;

/// Retry and fallback configuration of a primary operation
///
/// `max_attempts` counts retries after the first invocation:
/// - `N >= 0` allows exactly `N + 1` invocations
/// - a negative value retries until the operation succeeds
///
/// Every retry waits `delay` on the calling thread first.
///
/// # Example
///
/// ```
/// use rulefn_engine::{ExecutionPolicy, FailureKind};
/// use std::time::Duration;
///
/// let policy = ExecutionPolicy::new()
///     .with_max_attempts(3)
///     .with_delay(Duration::from_millis(200))
///     .with_no_failure_for(FailureKind::InvalidInput)
///     .with_failure_for(FailureKind::Transient);
///
/// assert_eq!(policy.retry_limit(), Some(3));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPolicy {
    /// Retries after the first attempt (negative = unbounded)
    #[serde(default)]
    pub max_attempts: i32,

    /// Pause before each retry
    #[serde(rename = "delay_ms", with = "duration_millis", default)]
    pub delay: Duration,

    /// Failure kinds that always propagate, bypassing the fallback
    #[serde(default)]
    pub no_failure_for: Vec<FailureKind>,

    /// Failure kinds that trigger the fallback
    #[serde(default = "default_failure_for")]
    pub failure_for: Vec<FailureKind>,

    /// `failure_for` still holds the implicit `[Any]` of a builder-made policy
    #[serde(skip)]
    implicit_failure_for: bool,
}

impl PartialEq for ExecutionPolicy {
    fn eq(&self, other: &Self) -> bool {
        self.max_attempts == other.max_attempts
            && self.delay == other.delay
            && self.no_failure_for == other.no_failure_for
            && self.failure_for == other.failure_for
    }
}

fn default_failure_for() -> Vec<FailureKind> {
    vec![FailureKind::Any]
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            delay: Duration::ZERO,
            no_failure_for: vec![],
            failure_for: default_failure_for(),
            implicit_failure_for: true,
        }
    }
}

impl ExecutionPolicy {
    /// Single attempt, no delay, every failure triggers the fallback
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with fixed delay between retries
    pub fn fixed(delay: Duration, max_attempts: i32) -> Self {
        Self {
            max_attempts,
            delay,
            ..Self::default()
        }
    }

    /// Retry until success, waiting `delay` between attempts
    pub fn unbounded(delay: Duration) -> Self {
        Self::fixed(delay, -1)
    }

    /// Set the number of retries (negative = unbounded)
    pub fn with_max_attempts(mut self, max_attempts: i32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay before each retry
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Add a kind that always propagates
    pub fn with_no_failure_for(mut self, kind: FailureKind) -> Self {
        self.no_failure_for.push(kind);
        self
    }

    /// Add a kind that triggers the fallback
    ///
    /// The first call on a builder-made policy drops the implicit `[Any]`
    /// trigger; kinds declared explicitly are always kept.
    pub fn with_failure_for(mut self, kind: FailureKind) -> Self {
        if self.implicit_failure_for {
            self.failure_for.clear();
            self.implicit_failure_for = false;
        }
        self.failure_for.push(kind);
        self
    }

    /// Remove every fallback trigger
    pub fn without_fallback_triggers(mut self) -> Self {
        self.failure_for.clear();
        self.implicit_failure_for = false;
        self
    }

    /// Number of retries allowed, `None` when unbounded
    pub fn retry_limit(&self) -> Option<u32> {
        u32::try_from(self.max_attempts).ok()
    }

    /// Check whether another attempt is allowed after `retries` retries
    pub fn has_retries_remaining(&self, retries: u32) -> bool {
        match self.retry_limit() {
            Some(limit) => retries < limit,
            None => true,
        }
    }

    /// Kind in `no_failure_for` matching `kind`, first match wins
    pub fn propagates(&self, kind: &FailureKind) -> Option<&FailureKind> {
        kind.first_match(&self.no_failure_for)
    }

    /// Kind in `failure_for` matching `kind`, first match wins
    pub fn triggers_fallback(&self, kind: &FailureKind) -> Option<&FailureKind> {
        kind.first_match(&self.failure_for)
    }
}

/// Serde support for Duration as milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
