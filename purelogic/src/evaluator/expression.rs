//! Expression evaluation
//!
//! Evaluation rules for each node kind. Children are evaluated through
//! `Evaluator::eval` so that depth limits, caching and tracing apply to every
//! node.

use super::context::Context;
use super::{calls, fixpoint, operations, Evaluator};
use crate::expression::{ExpressionKind, Operator, QuantifierKind, Statement};
use crate::{Expression, LogicError, LogicResult, Value};

pub(crate) fn evaluate_expression(
    evaluator: &mut Evaluator,
    expr: &Expression,
    context: &mut Context,
) -> LogicResult<Value> {
    match expr.kind() {
        ExpressionKind::Literal { value } => Ok(value.clone()),

        ExpressionKind::Variable { name } => context.get_variable(name).cloned(),

        ExpressionKind::Operator { op, operands } => {
            evaluate_operator(evaluator, *op, operands, context)
        }

        ExpressionKind::Call { function, args } => {
            calls::evaluate_call(evaluator, function, args, context)
        }

        ExpressionKind::Quantifier {
            quantifier,
            variable,
            domain,
            body,
        } => evaluate_quantifier(evaluator, *quantifier, variable, domain, body, context),

        ExpressionKind::Conditional {
            condition,
            then,
            otherwise,
        } => {
            let condition = evaluator.eval(condition, context)?;
            if expect_bool(condition, "condition of if")? {
                evaluator.eval(then, context)
            } else {
                match otherwise {
                    Some(otherwise) => evaluator.eval(otherwise, context),
                    None => Ok(Value::Null),
                }
            }
        }

        ExpressionKind::Fixpoint {
            variable,
            initial,
            step,
        } => fixpoint::evaluate_fixpoint(evaluator, variable, initial.as_deref(), step, context),

        ExpressionKind::Block { statements } => context.with_scope(|context| {
            let mut last = Value::Null;
            for statement in statements {
                last = match statement {
                    Statement::Let { variable, value } => {
                        let value = evaluator.eval(value, context)?;
                        context.bind_variable(variable.clone(), value.clone());
                        value
                    }
                    Statement::Eval { expression } => evaluator.eval(expression, context)?,
                };
            }
            Ok(last)
        }),

        ExpressionKind::Collection { elements } => {
            let items = elements
                .iter()
                .map(|element| evaluator.eval(element, context))
                .collect::<LogicResult<Vec<_>>>()?;
            evaluator.bounded(Value::Collection(items))
        }

        ExpressionKind::Object { fields } => {
            let mut values = std::collections::BTreeMap::new();
            for (key, field) in fields {
                values.insert(key.clone(), evaluator.eval(field, context)?);
            }
            evaluator.bounded(Value::Object(values))
        }
    }
}

fn expect_bool(value: Value, context: &str) -> LogicResult<bool> {
    match value {
        Value::Boolean(b) => Ok(b),
        other => Err(LogicError::type_mismatch(
            "boolean",
            other.type_name(),
            context,
        )),
    }
}

fn evaluate_operator(
    evaluator: &mut Evaluator,
    op: Operator,
    operands: &[Expression],
    context: &mut Context,
) -> LogicResult<Value> {
    let (min, max) = op.arity();
    if operands.len() < min || max.is_some_and(|max| operands.len() > max) {
        return Err(LogicError::MalformedExpression(format!(
            "operator '{}' given {} operand(s)",
            op.symbol(),
            operands.len()
        )));
    }
    let what = format!("operand of '{}'", op.symbol());

    match op {
        // Connectives short-circuit: later operands are not evaluated once
        // the result is decided
        Operator::And => {
            for operand in operands {
                if !expect_bool(evaluator.eval(operand, context)?, &what)? {
                    return Ok(Value::Boolean(false));
                }
            }
            Ok(Value::Boolean(true))
        }
        Operator::Or => {
            for operand in operands {
                if expect_bool(evaluator.eval(operand, context)?, &what)? {
                    return Ok(Value::Boolean(true));
                }
            }
            Ok(Value::Boolean(false))
        }
        Operator::Implies => {
            if !expect_bool(evaluator.eval(&operands[0], context)?, &what)? {
                return Ok(Value::Boolean(true));
            }
            let consequent = expect_bool(evaluator.eval(&operands[1], context)?, &what)?;
            Ok(Value::Boolean(consequent))
        }
        Operator::Not => {
            let value = expect_bool(evaluator.eval(&operands[0], context)?, &what)?;
            Ok(Value::Boolean(!value))
        }
        Operator::Iff => {
            let left = expect_bool(evaluator.eval(&operands[0], context)?, &what)?;
            let right = expect_bool(evaluator.eval(&operands[1], context)?, &what)?;
            Ok(Value::Boolean(left == right))
        }
        Operator::Neg => operations::negate(&evaluator.eval(&operands[0], context)?),
        _ => {
            let left = evaluator.eval(&operands[0], context)?;
            let right = evaluator.eval(&operands[1], context)?;
            match op {
                Operator::Eq | Operator::Ne | Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
                    operations::comparison(op, &left, &right).map(Value::Boolean)
                }
                Operator::In => operations::membership(&left, &right).map(Value::Boolean),
                Operator::Index => operations::index(&left, &right),
                _ => evaluator.bounded(operations::arithmetic(op, &left, &right)?),
            }
        }
    }
}

fn evaluate_quantifier(
    evaluator: &mut Evaluator,
    quantifier: QuantifierKind,
    variable: &str,
    domain: &Expression,
    body: &Expression,
    context: &mut Context,
) -> LogicResult<Value> {
    let items = match evaluator.eval(domain, context)? {
        Value::Collection(items) => items,
        other => {
            return Err(LogicError::type_mismatch(
                "collection",
                other.type_name(),
                format!("domain of {} {}", quantifier, variable),
            ))
        }
    };

    let limit = evaluator.limits.max_quantifier_domain;
    if items.len() > limit {
        return Err(LogicError::ResourceLimitExceeded {
            limit_name: "max_quantifier_domain".to_string(),
            limit_value: limit.to_string(),
            actual_value: items.len().to_string(),
            suggestion: "Filter the domain before quantifying over it".to_string(),
        });
    }

    // forall stops at the first false, exists at the first true
    let decisive = quantifier == QuantifierKind::Exists;
    let what = format!("body of {} {}", quantifier, variable);
    for item in items {
        let holds = context.with_scope(|context| {
            context.bind_variable(variable, item);
            evaluator.eval(body, context)
        })?;
        if expect_bool(holds, &what)? == decisive {
            return Ok(Value::Boolean(decisive));
        }
    }
    Ok(Value::Boolean(!decisive))
}
