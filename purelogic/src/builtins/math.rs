use super::arg;
use crate::evaluator::operations::{arithmetic, comparison};
use crate::expression::Operator;
use crate::registry::{FunctionDescriptor, FunctionRegistry};
use crate::{LogicError, Value, ValueType};

const BINARY: [(&str, Operator, &str); 6] = [
    ("math.add", Operator::Add, "Sum of two numbers"),
    ("math.subtract", Operator::Sub, "Difference of two numbers"),
    ("math.multiply", Operator::Mul, "Product of two numbers"),
    ("math.divide", Operator::Div, "Quotient; integer when exact"),
    ("math.modulo", Operator::Mod, "Remainder of integer or float division"),
    ("math.power", Operator::Pow, "First number raised to the second"),
];

pub(super) fn register(registry: &mut FunctionRegistry) {
    let number2 = || vec![ValueType::Number, ValueType::Number];

    for (name, op, description) in BINARY {
        registry.register(
            FunctionDescriptor::native(name, number2(), move |args| {
                arithmetic(op, arg(args, 0)?, arg(args, 1)?)
            })
            .with_description(description),
        );
    }

    registry.register(
        FunctionDescriptor::native("math.min", number2(), |args| {
            let (a, b) = (arg(args, 0)?, arg(args, 1)?);
            let smaller = if comparison(Operator::Le, a, b)? { a } else { b };
            Ok(smaller.clone())
        })
        .with_description("Smaller of two numbers"),
    );
    registry.register(
        FunctionDescriptor::native("math.max", number2(), |args| {
            let (a, b) = (arg(args, 0)?, arg(args, 1)?);
            let larger = if comparison(Operator::Ge, a, b)? { a } else { b };
            Ok(larger.clone())
        })
        .with_description("Larger of two numbers"),
    );
    registry.register(
        FunctionDescriptor::native("math.abs", vec![ValueType::Number], |args| {
            match arg(args, 0)? {
                Value::Integer(i) => i
                    .checked_abs()
                    .map(Value::Integer)
                    .ok_or_else(|| LogicError::Arithmetic("integer overflow in abs".to_string())),
                other => Ok(Value::Float(other.as_float()?.abs())),
            }
        })
        .with_description("Absolute value"),
    );
    registry.register(
        FunctionDescriptor::native("math.sqrt", vec![ValueType::Number], |args| {
            let x = arg(args, 0)?.as_float()?;
            if x < 0.0 {
                return Err(LogicError::native("square root of a negative number"));
            }
            Ok(Value::Float(x.sqrt()))
        })
        .with_description("Square root as a float"),
    );
    registry.register(
        FunctionDescriptor::native("math.floor", vec![ValueType::Number], |args| {
            round_with(arg(args, 0)?, f64::floor)
        })
        .with_description("Largest integer not above the number"),
    );
    registry.register(
        FunctionDescriptor::native("math.ceil", vec![ValueType::Number], |args| {
            round_with(arg(args, 0)?, f64::ceil)
        })
        .with_description("Smallest integer not below the number"),
    );

    // Peano arithmetic over non-negative integers
    registry.register(
        FunctionDescriptor::native("peano.successor", vec![ValueType::Integer], |args| {
            natural(arg(args, 0)?)?
                .checked_add(1)
                .map(Value::Integer)
                .ok_or_else(|| LogicError::Arithmetic("successor overflow".to_string()))
        })
        .with_description("n + 1"),
    );
    registry.register(
        FunctionDescriptor::native("peano.predecessor", vec![ValueType::Integer], |args| {
            Ok(Value::Integer((natural(arg(args, 0)?)? - 1).max(0)))
        })
        .with_description("n - 1, with the predecessor of 0 being 0"),
    );
    registry.register(
        FunctionDescriptor::native("peano.is_zero", vec![ValueType::Integer], |args| {
            Ok(Value::Boolean(natural(arg(args, 0)?)? == 0))
        })
        .with_description("Whether n is 0"),
    );
}

fn natural(value: &Value) -> Result<i64, LogicError> {
    let n = value.as_integer()?;
    if n < 0 {
        return Err(LogicError::native(format!(
            "{} is not a natural number",
            n
        )));
    }
    Ok(n)
}

fn round_with(value: &Value, f: fn(f64) -> f64) -> Result<Value, LogicError> {
    match value {
        Value::Integer(i) => Ok(Value::Integer(*i)),
        other => {
            let rounded = f(other.as_float()?);
            if rounded.is_finite() && rounded.abs() < i64::MAX as f64 {
                Ok(Value::Integer(rounded as i64))
            } else {
                Err(LogicError::Arithmetic(format!("{} does not fit an integer", rounded)))
            }
        }
    }
}
