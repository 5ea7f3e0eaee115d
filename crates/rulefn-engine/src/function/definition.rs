//! Rule function and operation declarations

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use crate::binding::{Arguments, ParameterSpec};
use crate::reliability::{ExecutionPolicy, OperationFailure};

/// Result of one operation invocation
pub type OperationResult = Result<Value, OperationFailure>;

/// Operation body, called with the artifact and its bound arguments
pub type Handler<F> = Arc<dyn Fn(&F, &Arguments<'_>) -> OperationResult + Send + Sync>;

/// Declared result type of an operation
///
/// Operations return JSON values; the declared type is what primary and
/// fallback must agree on.
#[derive(Debug, Clone, Copy)]
pub struct ReturnType {
    id: TypeId,
    name: &'static str,
}

impl ReturnType {
    pub fn of<T: 'static + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ReturnType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ReturnType {}

impl fmt::Display for ReturnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Tag marking how the engine treats an operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationRole {
    /// Main behavior, executed under its policy
    Primary(ExecutionPolicy),
    /// Invoked once when the primary fails with a triggering kind
    Fallback,
    /// Untagged, ignored by the engine
    Helper,
}

/// One operation declared by a rule function type
pub struct Operation<F> {
    name: String,
    role: OperationRole,
    parameters: Vec<ParameterSpec>,
    returns: ReturnType,
    handler: Handler<F>,
}

impl<F: 'static> Operation<F> {
    /// Declare the primary operation
    pub fn primary(name: impl Into<String>, policy: ExecutionPolicy) -> OperationBuilder<F> {
        OperationBuilder::new(name, OperationRole::Primary(policy))
    }

    /// Declare the fallback operation
    pub fn fallback(name: impl Into<String>) -> OperationBuilder<F> {
        OperationBuilder::new(name, OperationRole::Fallback)
    }

    /// Declare an untagged operation
    pub fn helper(name: impl Into<String>) -> OperationBuilder<F> {
        OperationBuilder::new(name, OperationRole::Helper)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &OperationRole {
        &self.role
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn returns(&self) -> ReturnType {
        self.returns
    }

    /// Call the operation body
    pub fn invoke(&self, function: &F, args: &Arguments<'_>) -> OperationResult {
        (self.handler)(function, args)
    }
}

impl<F> fmt::Debug for Operation<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("parameters", &self.parameters)
            .field("returns", &self.returns)
            .finish()
    }
}

/// Builder for [`Operation`]
pub struct OperationBuilder<F> {
    name: String,
    role: OperationRole,
    parameters: Vec<ParameterSpec>,
    returns: ReturnType,
    _function: PhantomData<fn(&F)>,
}

impl<F: 'static> OperationBuilder<F> {
    fn new(name: impl Into<String>, role: OperationRole) -> Self {
        Self {
            name: name.into(),
            role,
            parameters: Vec::new(),
            returns: ReturnType::of::<Value>(),
            _function: PhantomData,
        }
    }

    /// Append a formal parameter
    pub fn param(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Append several formal parameters
    pub fn params(mut self, params: impl IntoIterator<Item = ParameterSpec>) -> Self {
        self.parameters.extend(params);
        self
    }

    /// Declare the result type (defaults to `serde_json::Value`)
    pub fn returns<T: 'static + ?Sized>(mut self) -> Self {
        self.returns = ReturnType::of::<T>();
        self
    }

    /// Finish the declaration with the operation body
    pub fn handler<H>(self, handler: H) -> Operation<F>
    where
        H: Fn(&F, &Arguments<'_>) -> OperationResult + Send + Sync + 'static,
    {
        Operation {
            name: self.name,
            role: self.role,
            parameters: self.parameters,
            returns: self.returns,
            handler: Arc::new(handler),
        }
    }
}

/// A rule function artifact
///
/// The implementing type declares its operations once; exactly one must be
/// tagged primary and at most one fallback. Instances carry whatever state
/// the operations need and are only borrowed for the duration of a call.
///
/// # Example
///
/// ```
/// use rulefn_engine::{
///     ExecutionPolicy, FailureKind, Operation, OperationFailure, ParameterSpec, RuleFunction,
/// };
/// use serde_json::json;
///
/// struct CreditCheck;
///
/// impl RuleFunction for CreditCheck {
///     fn operations() -> Vec<Operation<Self>> {
///         vec![
///             Operation::primary(
///                 "check",
///                 ExecutionPolicy::new()
///                     .with_max_attempts(2)
///                     .with_failure_for(FailureKind::Transient),
///             )
///             .param(ParameterSpec::integer("score").required())
///             .returns::<bool>()
///             .handler(|_, args| {
///                 let score = args.require_integer("score")?;
///                 if score < 0 {
///                     return Err(OperationFailure::invalid_input("negative score"));
///                 }
///                 Ok(json!(score >= 650))
///             }),
///             Operation::fallback("assume_rejected")
///                 .returns::<bool>()
///                 .handler(|_, _| Ok(json!(false))),
///         ]
///     }
/// }
/// ```
pub trait RuleFunction: Send + Sync + 'static {
    /// Operation table of this type
    fn operations() -> Vec<Operation<Self>>
    where
        Self: Sized;

    /// Name used in errors and logs
    fn function_name() -> &'static str
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }
}

/// Last path segment of a type name, generic arguments dropped
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
