//! Rule function declarations
//!
//! A rule function type lists its operations once through
//! [`RuleFunction::operations`]; the engine picks the primary and fallback
//! operations out of that table.

mod definition;
mod erased;

pub use definition::{
    Handler, Operation, OperationBuilder, OperationResult, OperationRole, ReturnType, RuleFunction,
};
pub use erased::AnyRuleFunction;

pub(crate) use definition::short_type_name;
