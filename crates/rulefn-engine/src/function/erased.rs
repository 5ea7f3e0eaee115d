//! Type-erased rule functions
//!
//! Lets callers hold rule functions of different types in one collection
//! (e.g. a batch) and still execute them through the typed engine.

use serde_json::Value;

use super::definition::RuleFunction;
use crate::binding::ParamMap;
use crate::engine::FunctionExecutor;
use crate::error::Result;

/// Object-safe view of a [`RuleFunction`]
///
/// Implemented for every rule function type.
pub trait AnyRuleFunction: Send + Sync {
    /// Name used in errors and logs
    fn name(&self) -> &'static str;

    /// Execute through `executor`
    fn invoke(&self, executor: &FunctionExecutor, params: &ParamMap) -> Result<Value>;
}

impl<F: RuleFunction> AnyRuleFunction for F {
    fn name(&self) -> &'static str {
        <F as RuleFunction>::function_name()
    }

    fn invoke(&self, executor: &FunctionExecutor, params: &ParamMap) -> Result<Value> {
        executor.execute(self, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::Operation;
    use crate::reliability::ExecutionPolicy;
    use serde_json::json;
    use std::sync::Arc;

    struct Constant(i64);

    impl RuleFunction for Constant {
        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::primary("value", ExecutionPolicy::default())
                .handler(|f: &Constant, _| Ok(json!(f.0)))]
        }
    }

    struct Greeting;

    impl RuleFunction for Greeting {
        fn operations() -> Vec<Operation<Self>> {
            vec![Operation::primary("greet", ExecutionPolicy::default())
                .handler(|_, _| Ok(json!("hello")))]
        }
    }

    #[test]
    fn test_heterogeneous_functions() {
        let executor = FunctionExecutor::default();
        let functions: Vec<Arc<dyn AnyRuleFunction>> = vec![
            Arc::new(Constant(7)) as Arc<dyn AnyRuleFunction>,
            Arc::new(Greeting),
        ];

        let names: Vec<_> = functions.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["Constant", "Greeting"]);

        let results: Vec<_> = functions
            .iter()
            .map(|f| f.invoke(&executor, &ParamMap::new()).unwrap())
            .collect();
        assert_eq!(results, vec![json!(7), json!("hello")]);
    }
}
