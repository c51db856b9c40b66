//! Built-in function library
//!
//! Every built-in is a pure function over already-evaluated arguments. None
//! of them touch the filesystem, the network or the clock; facts about the
//! outside world arrive as values bound in the context.

pub(crate) mod collections;
mod math;
mod objects;
mod strings;

use crate::evaluator::value_limit;
use crate::registry::{FunctionDescriptor, FunctionRegistry, Intrinsic};
use crate::{LogicError, LogicResult, Value, ValueType};

/// Register the whole standard library, the structural meta-logic helpers
/// and the engine intrinsics
pub fn register_all(registry: &mut FunctionRegistry) {
    math::register(registry);
    strings::register(registry);
    collections::register(registry);
    objects::register(registry);
    register_testing(registry);
    crate::metalogic::register(registry);
}

/// Typed argument access for native bodies. The signature check has already
/// run, so a mismatch here means the descriptor and body disagree.
pub(crate) fn arg(args: &[Value], index: usize) -> LogicResult<&Value> {
    args.get(index).ok_or_else(|| {
        LogicError::native(format!("missing argument {}", index + 1))
    })
}

fn register_testing(registry: &mut FunctionRegistry) {
    registry.register(
        FunctionDescriptor::native("type.of", vec![ValueType::Any], |args| {
            Ok(Value::String(arg(args, 0)?.type_name()))
        })
        .with_description("Name of the value's type"),
    );

    registry.register(
        FunctionDescriptor::intrinsic(
            "test.mock_collection",
            vec![ValueType::String, ValueType::Integer],
            Intrinsic::MockCollection,
        )
        .with_description("Deterministic fixture: 'numbers' gives 1..=n, 'strings' gives item1..itemN"),
    );
}

pub(crate) fn mock_collection(kind: &str, count: i64, max_len: usize) -> LogicResult<Value> {
    if count < 0 {
        return Err(LogicError::native("count must not be negative"));
    }
    if count as u64 > max_len as u64 {
        return Err(value_limit("max_value_size", max_len, count));
    }
    match kind {
        "numbers" => Ok(Value::collection((1..=count).map(Value::Integer))),
        "strings" => Ok(Value::collection(
            (1..=count).map(|i| Value::String(format!("item{}", i))),
        )),
        other => Err(LogicError::native(format!(
            "unknown mock collection kind '{}'",
            other
        ))),
    }
}
