//! Operator algebra over already-evaluated values
//!
//! Boolean connectives live in the evaluator because they short-circuit and
//! need unevaluated operands. Everything here is strict.

use crate::expression::Operator;
use crate::{LogicError, LogicResult, Value};
use std::cmp::Ordering;

enum NumericPair {
    Integers(i64, i64),
    Floats(f64, f64),
}

fn numeric_pair(op: Operator, left: &Value, right: &Value) -> LogicResult<NumericPair> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(NumericPair::Integers(*a, *b)),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            Ok(NumericPair::Floats(left.as_float()?, right.as_float()?))
        }
        (Value::Integer(_) | Value::Float(_), other) | (other, _) => Err(
            LogicError::type_mismatch("number", other.type_name(), format!("operator '{}'", op.symbol())),
        ),
    }
}

fn overflow(op: Operator) -> LogicError {
    LogicError::Arithmetic(format!("integer overflow in '{}'", op.symbol()))
}

/// Apply an arithmetic operator
pub fn arithmetic(op: Operator, left: &Value, right: &Value) -> LogicResult<Value> {
    match (op, left, right) {
        (Operator::Add, Value::String(a), Value::String(b)) => {
            return Ok(Value::String(format!("{}{}", a, b)))
        }
        (Operator::Add, Value::Collection(a), Value::Collection(b)) => {
            return Ok(Value::Collection(a.iter().chain(b).cloned().collect()))
        }
        _ => {}
    }

    match (op, numeric_pair(op, left, right)?) {
        (Operator::Add, NumericPair::Integers(a, b)) => {
            a.checked_add(b).map(Value::Integer).ok_or_else(|| overflow(op))
        }
        (Operator::Sub, NumericPair::Integers(a, b)) => {
            a.checked_sub(b).map(Value::Integer).ok_or_else(|| overflow(op))
        }
        (Operator::Mul, NumericPair::Integers(a, b)) => {
            a.checked_mul(b).map(Value::Integer).ok_or_else(|| overflow(op))
        }
        (Operator::Div, NumericPair::Integers(_, 0)) | (Operator::Mod, NumericPair::Integers(_, 0)) => {
            Err(LogicError::Arithmetic("division by zero".to_string()))
        }
        (Operator::Div, NumericPair::Integers(a, b)) => {
            let remainder = a.checked_rem(b).ok_or_else(|| overflow(op))?;
            if remainder == 0 {
                a.checked_div(b).map(Value::Integer).ok_or_else(|| overflow(op))
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        (Operator::Mod, NumericPair::Integers(a, b)) => {
            a.checked_rem(b).map(Value::Integer).ok_or_else(|| overflow(op))
        }
        (Operator::Pow, NumericPair::Integers(a, b)) => match u32::try_from(b) {
            Ok(exp) => a.checked_pow(exp).map(Value::Integer).ok_or_else(|| overflow(op)),
            Err(_) if b < 0 => Ok(Value::Float((a as f64).powf(b as f64))),
            Err(_) => Err(overflow(op)),
        },
        (Operator::Div | Operator::Mod, NumericPair::Floats(_, b)) if b == 0.0 => {
            Err(LogicError::Arithmetic("division by zero".to_string()))
        }
        (Operator::Add, NumericPair::Floats(a, b)) => Ok(Value::Float(a + b)),
        (Operator::Sub, NumericPair::Floats(a, b)) => Ok(Value::Float(a - b)),
        (Operator::Mul, NumericPair::Floats(a, b)) => Ok(Value::Float(a * b)),
        (Operator::Div, NumericPair::Floats(a, b)) => Ok(Value::Float(a / b)),
        (Operator::Mod, NumericPair::Floats(a, b)) => Ok(Value::Float(a % b)),
        (Operator::Pow, NumericPair::Floats(a, b)) => Ok(Value::Float(a.powf(b))),
        (other, _) => Err(LogicError::MalformedExpression(format!(
            "'{}' is not an arithmetic operator",
            other.symbol()
        ))),
    }
}

pub fn negate(value: &Value) -> LogicResult<Value> {
    match value {
        Value::Integer(i) => i
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| overflow(Operator::Neg)),
        Value::Float(f) => Ok(Value::Float(-f)),
        other => Err(LogicError::type_mismatch(
            "number",
            other.type_name(),
            "operator '-'",
        )),
    }
}

/// Apply a comparison operator under the numeric-promotion rule
pub fn comparison(op: Operator, left: &Value, right: &Value) -> LogicResult<bool> {
    match op {
        Operator::Eq => left.checked_eq(right),
        Operator::Ne => left.checked_eq(right).map(|eq| !eq),
        Operator::Lt => Ok(left.compare(right)? == Ordering::Less),
        Operator::Le => Ok(left.compare(right)? != Ordering::Greater),
        Operator::Gt => Ok(left.compare(right)? == Ordering::Greater),
        Operator::Ge => Ok(left.compare(right)? != Ordering::Less),
        other => Err(LogicError::MalformedExpression(format!(
            "'{}' is not a comparison operator",
            other.symbol()
        ))),
    }
}

/// `needle in haystack`: element of a collection, substring of a string,
/// or key of an object
pub fn membership(needle: &Value, haystack: &Value) -> LogicResult<bool> {
    match haystack {
        Value::Collection(_) => haystack.contains(needle),
        Value::String(s) => Ok(s.contains(needle.as_str()?)),
        Value::Object(fields) => Ok(fields.contains_key(needle.as_str()?)),
        other => Err(LogicError::type_mismatch(
            "collection, string or object",
            other.type_name(),
            "operator 'in'",
        )),
    }
}

/// `target[index]`
pub fn index(target: &Value, index: &Value) -> LogicResult<Value> {
    match target {
        Value::Collection(_) => target.at(index.as_integer()?).cloned(),
        Value::Object(fields) => {
            let key = index.as_str()?;
            Ok(fields.get(key).cloned().unwrap_or(Value::Null))
        }
        Value::String(s) => {
            let i = index.as_integer()?;
            usize::try_from(i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Value::String(c.to_string()))
                .ok_or(LogicError::IndexOutOfRange {
                    index: i,
                    len: s.chars().count(),
                })
        }
        other => Err(LogicError::type_mismatch(
            "collection, object or string",
            other.type_name(),
            "index",
        )),
    }
}
