use super::arg;
use crate::registry::{FunctionDescriptor, FunctionRegistry};
use crate::{LogicError, LogicResult, Value, ValueType};
use regex::Regex;

fn text_fn(
    registry: &mut FunctionRegistry,
    name: &str,
    description: &str,
    f: fn(&str) -> Value,
) {
    registry.register(
        FunctionDescriptor::native(name, vec![ValueType::String], move |args| {
            Ok(f(arg(args, 0)?.as_str()?))
        })
        .with_description(description),
    );
}

fn text2_fn(
    registry: &mut FunctionRegistry,
    name: &str,
    description: &str,
    f: fn(&str, &str) -> LogicResult<Value>,
) {
    registry.register(
        FunctionDescriptor::native(
            name,
            vec![ValueType::String, ValueType::String],
            move |args| f(arg(args, 0)?.as_str()?, arg(args, 1)?.as_str()?),
        )
        .with_description(description),
    );
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    text_fn(registry, "string.length", "Number of characters", |s| {
        Value::from(s.chars().count())
    });
    text_fn(
        registry,
        "string.normalize",
        "Lowercase with underscores turned into dashes",
        normalize,
    );
    text_fn(registry, "string.lowercase", "Lowercase copy", |s| {
        Value::String(s.to_lowercase())
    });
    text_fn(registry, "string.uppercase", "Uppercase copy", |s| {
        Value::String(s.to_uppercase())
    });
    text_fn(registry, "string.trim", "Copy without surrounding whitespace", |s| {
        Value::from(s.trim())
    });

    text2_fn(registry, "string.concat", "Concatenation of two strings", |a, b| {
        Ok(Value::String(format!("{}{}", a, b)))
    });
    text2_fn(
        registry,
        "string.starts_with",
        "Whether the first string starts with the second",
        |a, b| Ok(Value::Boolean(a.starts_with(b))),
    );
    text2_fn(
        registry,
        "string.ends_with",
        "Whether the first string ends with the second",
        |a, b| Ok(Value::Boolean(a.ends_with(b))),
    );
    text2_fn(
        registry,
        "string.contains",
        "Whether the second string occurs in the first",
        |a, b| Ok(Value::Boolean(a.contains(b))),
    );
    text2_fn(
        registry,
        "string.split",
        "Pieces of the first string around each occurrence of the second",
        |a, b| {
            if b.is_empty() {
                return Err(LogicError::native("separator must not be empty"));
            }
            Ok(Value::collection(a.split(b).map(Value::from)))
        },
    );
    text2_fn(
        registry,
        "string.matches",
        "Whether the string matches the regular expression",
        matches,
    );
}

fn normalize(s: &str) -> Value {
    Value::String(s.to_lowercase().replace('_', "-"))
}

fn matches(text: &str, pattern: &str) -> LogicResult<Value> {
    let regex = Regex::new(pattern)
        .map_err(|e| LogicError::native(format!("invalid regular expression: {}", e)))?;
    Ok(Value::Boolean(regex.is_match(text)))
}
