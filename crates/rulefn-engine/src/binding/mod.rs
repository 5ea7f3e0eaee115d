//! Parameter binding
//!
//! Turns a flat, loosely-typed parameter map into the typed, positional
//! argument list of one operation:
//! - [`ParameterSpec`] - formal parameter declarations
//! - [`bind`] - coercion and required-field validation
//! - [`Arguments`] - bound values with typed accessors

mod arguments;
mod binder;
mod param;
mod scalar;

pub use arguments::{Argument, Arguments};
pub use binder::bind;
pub use param::{
    ElementType, FieldViolation, ParamKind, ParameterSpec, Structured, StructuredBinder, Validate,
};
pub use scalar::{Collection, CollectionKind, CoercionError, Scalar, ScalarType};

/// Name-keyed parameter map supplied with each invocation
pub type ParamMap = serde_json::Map<String, serde_json::Value>;
