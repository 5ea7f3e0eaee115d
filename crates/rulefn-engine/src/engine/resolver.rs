//! Operation resolution
//!
//! Picks the primary and fallback operations out of a rule function's
//! operation table and checks that they fit together.

use crate::error::{EngineError, Result};
use crate::function::{Operation, OperationRole, RuleFunction};
use crate::reliability::ExecutionPolicy;

/// Primary operation, its policy and the optional fallback of one rule
/// function type
#[derive(Debug)]
pub struct ResolvedFunction<F> {
    name: &'static str,
    primary: Operation<F>,
    policy: ExecutionPolicy,
    fallback: Option<Operation<F>>,
}

impl<F> ResolvedFunction<F> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn primary(&self) -> &Operation<F> {
        &self.primary
    }

    pub fn policy(&self) -> &ExecutionPolicy {
        &self.policy
    }

    pub fn fallback(&self) -> Option<&Operation<F>> {
        self.fallback.as_ref()
    }
}

/// Resolve the operation table of `F`
///
/// # Errors
///
/// Returns [`EngineError::Configuration`] when `F` declares no primary
/// operation, more than one primary or fallback operation, or a fallback whose
/// result type differs from the primary's.
pub fn resolve<F: RuleFunction>() -> Result<ResolvedFunction<F>> {
    let name = F::function_name();
    let mut primary: Option<(Operation<F>, ExecutionPolicy)> = None;
    let mut fallback: Option<Operation<F>> = None;

    for operation in F::operations() {
        match operation.role().clone() {
            OperationRole::Primary(policy) => {
                if let Some((existing, _)) = &primary {
                    return Err(EngineError::config(
                        name,
                        format!(
                            "multiple primary operations declared: {} and {}",
                            existing.name(),
                            operation.name()
                        ),
                    ));
                }
                primary = Some((operation, policy));
            }
            OperationRole::Fallback => {
                if let Some(existing) = &fallback {
                    return Err(EngineError::config(
                        name,
                        format!(
                            "multiple fallback operations declared: {} and {}",
                            existing.name(),
                            operation.name()
                        ),
                    ));
                }
                fallback = Some(operation);
            }
            OperationRole::Helper => {}
        }
    }

    let (primary, policy) =
        primary.ok_or_else(|| EngineError::config(name, "no primary operation declared"))?;

    if let Some(fallback) = &fallback {
        if fallback.returns() != primary.returns() {
            return Err(EngineError::config(
                name,
                format!(
                    "fallback {} returns {} but primary {} returns {}",
                    fallback.name(),
                    fallback.returns(),
                    primary.name(),
                    primary.returns()
                ),
            ));
        }
    }

    Ok(ResolvedFunction {
        name,
        primary,
        policy,
        fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct NoPrimary;

    impl RuleFunction for NoPrimary {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::helper("format").handler(|_, _| Ok(json!(null))),
                Operation::fallback("recover").handler(|_, _| Ok(json!(null))),
            ]
        }
    }

    struct TwoPrimaries;

    impl RuleFunction for TwoPrimaries {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::primary("first", ExecutionPolicy::default()).handler(|_, _| Ok(json!(1))),
                Operation::primary("second", ExecutionPolicy::default())
                    .handler(|_, _| Ok(json!(2))),
            ]
        }
    }

    struct TwoFallbacks;

    impl RuleFunction for TwoFallbacks {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::primary("run", ExecutionPolicy::default()).handler(|_, _| Ok(json!(1))),
                Operation::fallback("a").handler(|_, _| Ok(json!(2))),
                Operation::fallback("b").handler(|_, _| Ok(json!(3))),
            ]
        }
    }

    struct MismatchedReturn;

    impl RuleFunction for MismatchedReturn {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::primary("run", ExecutionPolicy::default())
                    .returns::<i64>()
                    .handler(|_, _| Ok(json!(1))),
                Operation::fallback("recover")
                    .returns::<String>()
                    .handler(|_, _| Ok(json!("one"))),
            ]
        }
    }

    struct WellFormed;

    impl RuleFunction for WellFormed {
        fn operations() -> Vec<Operation<Self>> {
            vec![
                Operation::helper("unused").handler(|_, _| Ok(json!(0))),
                Operation::primary("run", ExecutionPolicy::default().with_max_attempts(2))
                    .returns::<i64>()
                    .handler(|_, _| Ok(json!(1))),
                Operation::fallback("recover")
                    .returns::<i64>()
                    .handler(|_, _| Ok(json!(0))),
            ]
        }
    }

    fn config_message<F: RuleFunction>() -> String {
        match resolve::<F>() {
            Err(EngineError::Configuration { message, .. }) => message,
            other => panic!("expected configuration error, got {:?}", other.map(|r| r.name())),
        }
    }

    #[test]
    fn test_missing_primary() {
        assert_eq!(config_message::<NoPrimary>(), "no primary operation declared");
    }

    #[test]
    fn test_multiple_primaries() {
        assert_eq!(
            config_message::<TwoPrimaries>(),
            "multiple primary operations declared: first and second"
        );
    }

    #[test]
    fn test_multiple_fallbacks() {
        assert_eq!(
            config_message::<TwoFallbacks>(),
            "multiple fallback operations declared: a and b"
        );
    }

    #[test]
    fn test_return_type_mismatch() {
        let message = config_message::<MismatchedReturn>();
        assert!(message.starts_with("fallback recover returns "), "{}", message);
        assert!(message.contains("String"), "{}", message);
        assert!(message.contains("but primary run returns "), "{}", message);
        assert!(message.ends_with("i64"), "{}", message);
    }

    #[test]
    fn test_resolves_well_formed_function() {
        let resolved = resolve::<WellFormed>().unwrap();
        assert_eq!(resolved.name(), "WellFormed");
        assert_eq!(resolved.primary().name(), "run");
        assert_eq!(resolved.policy().max_attempts, 2);
        assert_eq!(resolved.fallback().map(|f| f.name()), Some("recover"));
    }
}
