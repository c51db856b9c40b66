use super::arg;
use crate::evaluator::operations::arithmetic;
use crate::evaluator::value_limit;
use crate::expression::Operator;
use crate::registry::{FunctionDescriptor, FunctionRegistry, Intrinsic};
use crate::{LogicError, LogicResult, Value, ValueType};

use crate::value::ValueType::{Any, Collection, Integer};

/// Items in first-occurrence order with later duplicates dropped
pub(crate) fn distinct(items: &[Value]) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    seen
}

/// `start..end`, refused before allocation when it would hold more than
/// `max_len` elements
pub(crate) fn range(args: &[Value], max_len: usize) -> LogicResult<Value> {
    let (start, end) = (arg(args, 0)?.as_integer()?, arg(args, 1)?.as_integer()?);
    let len = i128::from(end) - i128::from(start);
    if len > max_len as i128 {
        return Err(value_limit("max_value_size", max_len, len));
    }
    Ok(Value::collection((start..end).map(Value::Integer)))
}

/// Equality of two collections read as sets
pub(crate) fn set_equal(a: &[Value], b: &[Value]) -> bool {
    a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
}

fn coll(args: &[Value], index: usize) -> LogicResult<&[Value]> {
    arg(args, index)?.as_collection()
}

type Body = fn(&[Value]) -> LogicResult<Value>;

fn add(registry: &mut FunctionRegistry, name: &str, params: Vec<ValueType>, description: &str, f: Body) {
    registry.register(FunctionDescriptor::native(name, params, f).with_description(description));
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    add(registry, "collection.count", vec![Collection], "Number of elements", |args| {
        Ok(Value::from(coll(args, 0)?.len()))
    });
    add(registry, "collection.is_empty", vec![Collection], "Whether there are no elements", |args| {
        Ok(Value::Boolean(coll(args, 0)?.is_empty()))
    });
    add(
        registry,
        "collection.contains",
        vec![Collection, Any],
        "Whether an element equals the value",
        |args| Ok(Value::Boolean(arg(args, 0)?.contains(arg(args, 1)?)?)),
    );
    add(registry, "collection.append", vec![Collection, Any], "Copy with the value added at the end", |args| {
        let mut items = coll(args, 0)?.to_vec();
        items.push(arg(args, 1)?.clone());
        Ok(Value::Collection(items))
    });
    add(registry, "collection.concat", vec![Collection, Collection], "Elements of both, in order", |args| {
        arithmetic(Operator::Add, arg(args, 0)?, arg(args, 1)?)
    });
    add(registry, "collection.distinct", vec![Collection], "Duplicates removed, first occurrence kept", |args| {
        Ok(Value::Collection(distinct(coll(args, 0)?)))
    });
    add(registry, "collection.union", vec![Collection, Collection], "Set union in first-occurrence order", |args| {
        let mut items = coll(args, 0)?.to_vec();
        items.extend_from_slice(coll(args, 1)?);
        Ok(Value::Collection(distinct(&items)))
    });
    add(
        registry,
        "collection.intersection",
        vec![Collection, Collection],
        "Elements of the first that are also in the second",
        |args| {
            let other = coll(args, 1)?;
            let kept: Vec<Value> = coll(args, 0)?
                .iter()
                .filter(|x| other.contains(x))
                .cloned()
                .collect();
            Ok(Value::Collection(distinct(&kept)))
        },
    );
    add(
        registry,
        "collection.difference",
        vec![Collection, Collection],
        "Elements of the first that are not in the second",
        |args| {
            let other = coll(args, 1)?;
            let kept: Vec<Value> = coll(args, 0)?
                .iter()
                .filter(|x| !other.contains(x))
                .cloned()
                .collect();
            Ok(Value::Collection(distinct(&kept)))
        },
    );
    add(registry, "collection.set_equals", vec![Collection, Collection], "Equality ignoring order and duplicates", |args| {
        Ok(Value::Boolean(set_equal(coll(args, 0)?, coll(args, 1)?)))
    });
    registry.register(
        FunctionDescriptor::intrinsic("collection.range", vec![Integer, Integer], Intrinsic::Range)
            .with_description("Integers from start up to but excluding end"),
    );
    add(registry, "collection.sum", vec![Collection], "Sum of numeric elements; 0 when empty", |args| {
        coll(args, 0)?
            .iter()
            .try_fold(Value::Integer(0), |acc, x| arithmetic(Operator::Add, &acc, x))
    });
    add(registry, "collection.first", vec![Collection], "First element", |args| {
        arg(args, 0)?.at(0).cloned()
    });
    add(registry, "collection.last", vec![Collection], "Last element", |args| {
        let items = coll(args, 0)?;
        items.last().cloned().ok_or(LogicError::IndexOutOfRange { index: -1, len: 0 })
    });
    add(registry, "collection.at", vec![Collection, Integer], "Element at a zero-based index", |args| {
        arg(args, 0)?.at(arg(args, 1)?.as_integer()?).cloned()
    });
    add(registry, "collection.reverse", vec![Collection], "Elements in reverse order", |args| {
        Ok(Value::collection(coll(args, 0)?.iter().rev().cloned()))
    });
    add(registry, "collection.sort", vec![Collection], "Numbers or strings in ascending order", |args| {
        let mut items = coll(args, 0)?.to_vec();
        let mut failure = None;
        items.sort_by(|a, b| {
            a.compare(b).unwrap_or_else(|e| {
                failure.get_or_insert(e);
                std::cmp::Ordering::Equal
            })
        });
        match failure {
            Some(e) => Err(e),
            None => Ok(Value::Collection(items)),
        }
    });
    add(
        registry,
        "collection.image",
        vec![Collection, Collection],
        "Targets of [from, to] pairs in the relation whose source is in the nodes",
        |args| image(coll(args, 0)?, coll(args, 1)?),
    );
}

/// Image of `nodes` under a relation given as `[from, to]` pairs
fn image(relation: &[Value], nodes: &[Value]) -> LogicResult<Value> {
    let mut targets = Vec::new();
    for pair in relation {
        let edge = pair.as_collection()?;
        if edge.len() != 2 {
            return Err(LogicError::native(format!(
                "relation entries must be [from, to] pairs, found {} element(s)",
                edge.len()
            )));
        }
        if nodes.contains(&edge[0]) && !targets.contains(&edge[1]) {
            targets.push(edge[1].clone());
        }
    }
    Ok(Value::Collection(targets))
}
