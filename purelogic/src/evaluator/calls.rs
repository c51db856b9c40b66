//! Function calls
//!
//! Arguments are evaluated eagerly, left to right, before the descriptor is
//! looked up. A failure inside a function body surfaces as `FunctionError`
//! wrapping the cause; call-site problems (unknown name, wrong arity, wrong
//! argument type) are reported as themselves.

use super::context::Context;
use super::Evaluator;
use crate::registry::FunctionImpl;
use crate::{metalogic, Expression, LogicError, LogicResult, Value};
use std::sync::Arc;

pub(crate) fn evaluate_call(
    evaluator: &mut Evaluator,
    function: &str,
    args: &[Expression],
    context: &mut Context,
) -> LogicResult<Value> {
    let values = args
        .iter()
        .map(|arg| evaluator.eval(arg, context))
        .collect::<LogicResult<Vec<_>>>()?;

    let registry = Arc::clone(&evaluator.registry);
    let descriptor = registry.get(function)?;
    descriptor.signature.check(function, &values)?;
    evaluator.metrics.function_calls += 1;

    let result = match &descriptor.implementation {
        FunctionImpl::Native(f) => f(&values),
        FunctionImpl::User { params, body } => {
            // Closed scope: the body sees its parameters and nothing else
            let mut local = Context::with_facts(params.iter().cloned().zip(values));
            evaluator.eval(body, &mut local)
        }
        FunctionImpl::Intrinsic(intrinsic) => {
            metalogic::call_intrinsic(evaluator, *intrinsic, &values, context)
        }
    };

    let value = result.map_err(|cause| match cause {
        // Exhausted limits abort the whole evaluation unchanged
        LogicError::ResourceLimitExceeded { .. } => cause,
        cause => LogicError::function_error(function, cause),
    })?;
    evaluator.bounded(value)
}
