//! Function executor
//!
//! Drives one invocation of a rule function:
//!
//! ```text
//! resolve ──▶ bind ──▶ attempt ──ok──▶ Primary result
//!                        │  ▲
//!                  failed│  │retries left (sleep delay)
//!                        ▼  │
//!                     classify
//!                        ├─ no_failure_for match ──▶ Upstream error
//!                        ├─ no fallback ───────────▶ Upstream error
//!                        ├─ failure_for match ─────▶ fallback (once) ──▶ Fallback result / error
//!                        └─ otherwise ─────────────▶ Upstream error
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::cache::ResolutionCache;
use super::resolver::{resolve, ResolvedFunction};
use crate::binding::{bind, Arguments, ParamMap};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::function::RuleFunction;
use crate::reliability::OperationFailure;

/// Which operation produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Primary,
    Fallback,
}

/// Successful execution with bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutcome {
    pub value: Value,
    /// Number of primary invocations
    pub attempts: u32,
    pub source: ResultSource,
}

/// Executes rule functions
///
/// Stateless apart from the resolution cache; one executor can be shared by
/// any number of threads.
#[derive(Debug)]
pub struct FunctionExecutor {
    config: EngineConfig,
    cache: ResolutionCache,
}

impl Default for FunctionExecutor {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl FunctionExecutor {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cache: ResolutionCache::new(),
        }
    }

    /// Create an executor configured from environment variables
    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Execute `function` with `params` and return the result value
    ///
    /// See [`run`](Self::run) for the full outcome.
    pub fn execute<F: RuleFunction>(&self, function: &F, params: &ParamMap) -> Result<Value> {
        self.run(function, params).map(|outcome| outcome.value)
    }

    /// Execute `function` with `params`
    ///
    /// # Errors
    ///
    /// - [`EngineError::Configuration`] when the operation table is invalid;
    ///   nothing is invoked
    /// - [`EngineError::Validation`] when the parameters cannot be bound to
    ///   the primary (nothing is invoked) or to the fallback
    /// - [`EngineError::Upstream`] when the primary failed and the failure was
    ///   not handled by a fallback
    /// - [`EngineError::Fallback`] when the fallback itself failed
    #[instrument(skip_all, fields(function = F::function_name()))]
    pub fn run<F: RuleFunction>(&self, function: &F, params: &ParamMap) -> Result<ExecutionOutcome> {
        let resolved = self.resolve::<F>()?;
        let primary = resolved.primary();

        let args = bind(primary.parameters(), params)
            .map_err(|e| EngineError::validation(resolved.name(), primary.name(), e))?;
        debug!(operation = primary.name(), arguments = args.len(), "bound primary arguments");

        match self.attempt_primary(&resolved, function, &args) {
            Ok((value, attempts)) => Ok(ExecutionOutcome {
                value,
                attempts,
                source: ResultSource::Primary,
            }),
            Err((failure, attempts)) => {
                self.handle_failure(&resolved, function, params, failure, attempts)
            }
        }
    }

    fn resolve<F: RuleFunction>(&self) -> Result<Arc<ResolvedFunction<F>>> {
        if self.config.cache_resolutions {
            self.cache.get_or_resolve::<F>()
        } else {
            resolve::<F>().map(Arc::new)
        }
    }

    /// Invoke the primary until it succeeds or the policy runs out of retries
    ///
    /// Returns the value or the last failure, with the number of invocations.
    fn attempt_primary<F: RuleFunction>(
        &self,
        resolved: &ResolvedFunction<F>,
        function: &F,
        args: &Arguments<'_>,
    ) -> std::result::Result<(Value, u32), (OperationFailure, u32)> {
        let policy = resolved.policy();
        let mut retries: u32 = 0;

        loop {
            let attempt = retries.saturating_add(1);
            match resolved.primary().invoke(function, args) {
                Ok(value) => {
                    if retries > 0 {
                        debug!(attempt, "primary operation succeeded after retry");
                    }
                    return Ok((value, attempt));
                }
                Err(failure) => {
                    if !policy.has_retries_remaining(retries) {
                        return Err((failure, attempt));
                    }
                    warn!(
                        attempt,
                        max_attempts = policy.max_attempts,
                        delay_ms = policy.delay.as_millis() as u64,
                        error = %failure,
                        "primary operation failed, retrying"
                    );
                    if !policy.delay.is_zero() {
                        std::thread::sleep(policy.delay);
                    }
                    retries = retries.saturating_add(1);
                }
            }
        }
    }

    /// Classify a terminal primary failure and run the fallback when it
    /// triggers one
    fn handle_failure<F: RuleFunction>(
        &self,
        resolved: &ResolvedFunction<F>,
        function: &F,
        params: &ParamMap,
        failure: OperationFailure,
        attempts: u32,
    ) -> Result<ExecutionOutcome> {
        let policy = resolved.policy();
        let upstream = |source: OperationFailure| EngineError::Upstream {
            function: resolved.name().to_string(),
            attempts,
            source,
        };

        if let Some(matched) = policy.propagates(failure.kind()) {
            debug!(kind = %failure.kind(), %matched, "failure excluded from fallback");
            return Err(upstream(failure));
        }

        let Some(fallback) = resolved.fallback() else {
            return Err(upstream(failure));
        };

        let Some(matched) = policy.triggers_fallback(failure.kind()) else {
            warn!(
                kind = %failure.kind(),
                fallback = fallback.name(),
                "failure does not trigger fallback"
            );
            return Err(upstream(failure));
        };

        info!(
            kind = %failure.kind(),
            %matched,
            attempts,
            fallback = fallback.name(),
            "primary operation failed, running fallback"
        );

        let args = bind(fallback.parameters(), params)
            .map_err(|e| EngineError::validation(resolved.name(), fallback.name(), e))?;

        match fallback.invoke(function, &args) {
            Ok(value) => Ok(ExecutionOutcome {
                value,
                attempts,
                source: ResultSource::Fallback,
            }),
            Err(source) => {
                error!(fallback = fallback.name(), error = %source, "fallback operation failed");
                Err(EngineError::Fallback {
                    function: resolved.name().to_string(),
                    source,
                })
            }
        }
    }
}
