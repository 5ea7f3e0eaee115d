//! # Rule Function Execution Engine
//!
//! Executes rule functions: types that declare a primary operation, an
//! optional fallback operation and any number of helpers. Each call binds a
//! loosely-typed parameter map to the primary's declared parameters, retries
//! the primary under its [`ExecutionPolicy`] and, when the failure kind calls
//! for it, runs the fallback once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     FunctionExecutor                         │
//! │  (retry loop, failure classification, fallback dispatch)    │
//! └─────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │     ResolutionCache      │     │          bind            │
//! │ (primary/fallback lookup │     │ (coercion, required and  │
//! │  per rule function type) │     │  structured validation)  │
//! └──────────────────────────┘     └──────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use rulefn_engine::prelude::*;
//! use serde_json::json;
//!
//! struct Discount;
//!
//! impl RuleFunction for Discount {
//!     fn operations() -> Vec<Operation<Self>> {
//!         vec![
//!             Operation::primary("apply", ExecutionPolicy::new().with_max_attempts(1))
//!                 .param(ParameterSpec::decimal("amount").required())
//!                 .handler(|_, args| {
//!                     let amount = args.require_decimal("amount")?;
//!                     Ok(json!((amount * rust_decimal::Decimal::new(9, 1)).to_string()))
//!                 }),
//!             Operation::fallback("no_discount").handler(|_, _| Ok(json!(null))),
//!         ]
//!     }
//! }
//!
//! let mut params = ParamMap::new();
//! params.insert("amount".into(), json!("100"));
//!
//! let executor = FunctionExecutor::default();
//! assert_eq!(executor.execute(&Discount, &params).unwrap(), json!("90.0"));
//! ```

pub mod binding;
pub mod config;
pub mod engine;
pub mod error;
pub mod function;
pub mod reliability;

/// Prelude for common imports
pub mod prelude {
    pub use crate::binding::{Arguments, FieldViolation, ParamMap, ParameterSpec, Scalar, Validate};
    pub use crate::engine::{ExecutionOutcome, FunctionExecutor, ResultSource};
    pub use crate::error::{EngineError, ValidationError};
    pub use crate::function::{AnyRuleFunction, Operation, RuleFunction};
    pub use crate::reliability::{ExecutionPolicy, FailureKind, OperationFailure};
}

// Re-export key types at crate root
pub use binding::{
    bind, Argument, Arguments, Collection, CollectionKind, ElementType, FieldViolation, ParamMap,
    ParameterSpec, Scalar, ScalarType, Structured, Validate,
};
pub use config::EngineConfig;
pub use engine::{ExecutionOutcome, FunctionExecutor, ResolutionCache, ResultSource};
pub use error::{EngineError, Result, ValidationError};
pub use function::{AnyRuleFunction, Operation, OperationResult, OperationRole, RuleFunction};
pub use reliability::{ExecutionPolicy, FailureKind, OperationFailure};
