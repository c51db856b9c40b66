//! Fixpoint evaluation
//!
//! Both the `fixpoint` node and the μ/ν built-ins iterate a step until two
//! successive values are equal, giving up with `NonConvergentFixpoint` after
//! `max_fixpoint_iterations` steps. Divergence is a defined outcome, not a
//! bug in the engine.

use super::context::Context;
use super::Evaluator;
use crate::builtins::collections::{distinct, set_equal};
use crate::{Expression, LogicError, LogicResult, Value};

pub(crate) fn evaluate_fixpoint(
    evaluator: &mut Evaluator,
    variable: &str,
    initial: Option<&Expression>,
    step: &Expression,
    context: &mut Context,
) -> LogicResult<Value> {
    let Some(initial) = initial else {
        // Without a seed the step cannot mention the variable, so its first
        // value is already stable
        if step.free_variables().contains(variable) {
            return Err(LogicError::UnboundVariable(variable.to_string()));
        }
        let value = context.with_scope(|context| evaluator.eval(step, context))?;
        evaluator.metrics.fixpoint_iterations += 1;
        return Ok(value);
    };

    let max = evaluator.limits.max_fixpoint_iterations;
    let mut current = evaluator.eval(initial, context)?;
    context.with_scope(|context| {
        for _ in 0..max {
            context.bind_variable(variable, current.clone());
            let next = evaluator.eval(step, context)?;
            evaluator.metrics.fixpoint_iterations += 1;
            if next == current {
                return Ok(next);
            }
            current = next;
        }
        Err(LogicError::NonConvergentFixpoint {
            variable: variable.to_string(),
            iterations: max,
        })
    })
}

/// μX. step, iterated upwards from the empty set
pub(crate) fn least_fixpoint(
    evaluator: &mut Evaluator,
    variable: &str,
    step: &Expression,
    context: &mut Context,
) -> LogicResult<Value> {
    set_fixpoint(evaluator, variable, step, Vec::new(), context)
}

/// νX. step, iterated downwards from `universe`
pub(crate) fn greatest_fixpoint(
    evaluator: &mut Evaluator,
    variable: &str,
    step: &Expression,
    universe: Vec<Value>,
    context: &mut Context,
) -> LogicResult<Value> {
    set_fixpoint(evaluator, variable, step, universe, context)
}

fn set_fixpoint(
    evaluator: &mut Evaluator,
    variable: &str,
    step: &Expression,
    start: Vec<Value>,
    context: &mut Context,
) -> LogicResult<Value> {
    let max = evaluator.limits.max_fixpoint_iterations;
    let mut current = distinct(&start);
    context.with_scope(|context| {
        for _ in 0..max {
            context.bind_variable(variable, Value::Collection(current.clone()));
            let next = evaluator.eval(step, context)?;
            let next = distinct(next.as_collection().map_err(|_| {
                LogicError::type_mismatch(
                    "collection",
                    next.type_name(),
                    format!("step of fixpoint over {}", variable),
                )
            })?);
            evaluator.metrics.fixpoint_iterations += 1;
            if set_equal(&next, &current) {
                return Ok(Value::Collection(next));
            }
            current = next;
        }
        Err(LogicError::NonConvergentFixpoint {
            variable: variable.to_string(),
            iterations: max,
        })
    })
}
