//! Runtime values
//!
//! `Value` is a closed tagged union. All type checks go through the accessors
//! here so that adding a kind of value touches one place.

use crate::fingerprint::StableHasher;
use crate::{LogicError, LogicResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Engine runtime datum
///
/// Object keys are kept in a `BTreeMap`, so iteration order is fixed and
/// repeated runs over the same input see keys in the same order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Collection(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

/// Declared parameter types for function signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Null,
    Boolean,
    Integer,
    Float,
    /// Integer or Float
    Number,
    String,
    Collection,
    Object,
    Any,
}

impl ValueType {
    /// Whether a value of this runtime type may be passed where `self` is declared
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ValueType::Any => true,
            ValueType::Number => matches!(value, Value::Integer(_) | Value::Float(_)),
            other => value.value_type() == other,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Boolean => "boolean",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Collection => "collection",
            ValueType::Object => "object",
            ValueType::Any => "any",
        };
        f.write_str(name)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(_) => ValueType::Boolean,
            Value::Integer(_) => ValueType::Integer,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::Collection(_) => ValueType::Collection,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn type_name(&self) -> String {
        self.value_type().to_string()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn collection(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Collection(items.into_iter().collect())
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    fn mismatch(&self, expected: &str, context: &str) -> LogicError {
        LogicError::type_mismatch(expected, self.type_name(), context)
    }

    pub fn as_bool(&self) -> LogicResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            other => Err(other.mismatch("boolean", "as_bool")),
        }
    }

    pub fn as_integer(&self) -> LogicResult<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            other => Err(other.mismatch("integer", "as_integer")),
        }
    }

    /// Float payload; integers are promoted
    pub fn as_float(&self) -> LogicResult<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            other => Err(other.mismatch("float", "as_float")),
        }
    }

    pub fn as_str(&self) -> LogicResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch("string", "as_str")),
        }
    }

    pub fn as_collection(&self) -> LogicResult<&[Value]> {
        match self {
            Value::Collection(items) => Ok(items),
            other => Err(other.mismatch("collection", "as_collection")),
        }
    }

    pub fn as_object(&self) -> LogicResult<&BTreeMap<String, Value>> {
        match self {
            Value::Object(fields) => Ok(fields),
            other => Err(other.mismatch("object", "as_object")),
        }
    }

    /// Bounds-checked element access
    pub fn at(&self, index: i64) -> LogicResult<&Value> {
        let items = self.as_collection()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| items.get(i))
            .ok_or(LogicError::IndexOutOfRange {
                index,
                len: items.len(),
            })
    }

    /// Field lookup on an Object; `None` for absent keys and non-objects
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Linear value-equality scan of a Collection
    pub fn contains(&self, needle: &Value) -> LogicResult<bool> {
        Ok(self.as_collection()?.iter().any(|item| item == needle))
    }

    pub fn len(&self) -> LogicResult<usize> {
        match self {
            Value::String(s) => Ok(s.chars().count()),
            Value::Collection(items) => Ok(items.len()),
            Value::Object(fields) => Ok(fields.len()),
            other => Err(other.mismatch("string, collection or object", "len")),
        }
    }

    pub fn is_empty(&self) -> LogicResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Equality with the cross-type rule applied.
    ///
    /// Integer and Float compare numerically. Null may be compared with
    /// anything and equals only Null. Any other pair of different types is a
    /// `TypeMismatch`.
    pub fn checked_eq(&self, other: &Value) -> LogicResult<bool> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => Ok(self.is_null() && other.is_null()),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                Ok(self == other)
            }
            _ if self.value_type() == other.value_type() => Ok(self == other),
            _ => Err(LogicError::type_mismatch(
                self.type_name(),
                other.type_name(),
                "equality",
            )),
        }
    }

    /// Ordering, defined for numbers (with promotion) and strings only
    pub fn compare(&self, other: &Value) -> LogicResult<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Ok(a.cmp(b)),
            (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
                numeric_cmp(self, other)
                    .ok_or_else(|| LogicError::Arithmetic("cannot order NaN".to_string()))
            }
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            (Value::Integer(_) | Value::Float(_) | Value::String(_), _) => Err(
                LogicError::type_mismatch(self.type_name(), other.type_name(), "comparison"),
            ),
            _ => Err(self.mismatch("number or string", "comparison")),
        }
    }

    /// Feed this value into a stable hasher. Integer 1 and Float 1.0 hash
    /// differently; callers that need promotion-aware keys must normalize.
    pub fn hash_into(&self, hasher: &mut StableHasher) {
        match self {
            Value::Null => hasher.write_le_u64(0),
            Value::Boolean(b) => {
                hasher.write_le_u64(1);
                hasher.write_le_u64(u64::from(*b));
            }
            Value::Integer(i) => {
                hasher.write_le_u64(2);
                hasher.write_le_u64(*i as u64);
            }
            Value::Float(f) => {
                hasher.write_le_u64(3);
                hasher.write_le_u64(f.to_bits());
            }
            Value::String(s) => hasher.write_tagged_str(4, s),
            Value::Collection(items) => {
                hasher.write_le_u64(5);
                hasher.write_le_u64(items.len() as u64);
                for item in items {
                    item.hash_into(hasher);
                }
            }
            Value::Object(fields) => {
                hasher.write_le_u64(6);
                hasher.write_le_u64(fields.len() as u64);
                for (key, value) in fields {
                    hasher.write_tagged_str(7, key);
                    value.hash_into(hasher);
                }
            }
        }
    }
}

/// Ordering of two numeric values. `None` when either side is NaN or a side
/// is not a number.
fn numeric_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => cmp_integer_float(*a, *b),
        (Value::Float(a), Value::Integer(b)) => cmp_integer_float(*b, *a).map(Ordering::reverse),
        _ => None,
    }
}

/// Exact comparison of an integer with a float. Converting the integer to
/// `f64` would round it above 2^53.
fn cmp_integer_float(i: i64, f: f64) -> Option<Ordering> {
    // 2^63 is exactly representable; every i64 lies in [-2^63, 2^63)
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return None;
    }
    if f >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if f < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&f),
        unequal => Some(unequal),
    }
}

/// Size and nesting of a value, see [`Value::shape`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueShape {
    /// Container levels: 0 for scalars, 1 for a flat collection or object
    pub depth: usize,
    /// Number of values, the value itself included
    pub size: usize,
    /// Byte length of the longest string
    pub longest_string: usize,
}

impl Value {
    /// Measure this value without recursing, so measuring is safe however
    /// deep the value is. Counting stops once `size` passes `size_cap`.
    pub fn shape(&self, size_cap: usize) -> ValueShape {
        let mut shape = ValueShape::default();
        let mut pending: Vec<(&Value, usize)> = vec![(self, 0)];
        while let Some((value, depth)) = pending.pop() {
            shape.size += 1;
            if shape.size > size_cap {
                break;
            }
            match value {
                Value::String(s) => shape.longest_string = shape.longest_string.max(s.len()),
                Value::Collection(items) => {
                    shape.depth = shape.depth.max(depth + 1);
                    pending.extend(items.iter().map(|item| (item, depth + 1)));
                }
                Value::Object(fields) => {
                    shape.depth = shape.depth.max(depth + 1);
                    pending.extend(fields.values().map(|field| (field, depth + 1)));
                }
                _ => {}
            }
        }
        shape
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                cmp_integer_float(*a, *b) == Some(Ordering::Equal)
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Collection(a), Value::Collection(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Collection(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(fields) => {
                write!(f, "{{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(n as f64), Value::Integer)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Collection(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Object(fields)
    }
}
