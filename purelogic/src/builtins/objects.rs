use super::arg;
use crate::registry::{FunctionDescriptor, FunctionRegistry};
use crate::{LogicResult, Value, ValueType};

fn has_field(args: &[Value]) -> LogicResult<Value> {
    let fields = arg(args, 0)?.as_object()?;
    Ok(Value::Boolean(fields.contains_key(arg(args, 1)?.as_str()?)))
}

/// Missing fields read as Null
fn get_field(args: &[Value]) -> LogicResult<Value> {
    let fields = arg(args, 0)?.as_object()?;
    Ok(fields
        .get(arg(args, 1)?.as_str()?)
        .cloned()
        .unwrap_or(Value::Null))
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    let object_and_key = || vec![ValueType::Object, ValueType::String];

    // Short names are kept for rule files written against the older library
    for name in ["object.has_field", "has_field"] {
        registry.register(
            FunctionDescriptor::native(name, object_and_key(), has_field)
                .with_description("Whether the object has the field"),
        );
    }
    for name in ["object.get_field", "get_field"] {
        registry.register(
            FunctionDescriptor::native(name, object_and_key(), get_field)
                .with_description("Field value, or null when absent"),
        );
    }

    registry.register(
        FunctionDescriptor::native("object.keys", vec![ValueType::Object], |args| {
            let fields = arg(args, 0)?.as_object()?;
            Ok(Value::collection(fields.keys().map(|k| Value::from(k.as_str()))))
        })
        .with_description("Field names in sorted order"),
    );
    registry.register(
        FunctionDescriptor::native("object.values", vec![ValueType::Object], |args| {
            let fields = arg(args, 0)?.as_object()?;
            Ok(Value::collection(fields.values().cloned()))
        })
        .with_description("Field values in key order"),
    );
    registry.register(
        FunctionDescriptor::native(
            "object.with_field",
            vec![ValueType::Object, ValueType::String, ValueType::Any],
            |args| {
                let mut fields = arg(args, 0)?.as_object()?.clone();
                fields.insert(arg(args, 1)?.as_str()?.to_string(), arg(args, 2)?.clone());
                Ok(Value::Object(fields))
            },
        )
        .with_description("Copy with the field set"),
    );
}
