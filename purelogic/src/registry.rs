//! Function registry
//!
//! A name → descriptor capability table. Registration happens before any
//! evaluation refers to the name; the last registration for a name wins.
//! Once frozen behind an `Arc`, a registry can be shared read-only between
//! evaluators on different threads.

use crate::{Expression, LogicError, LogicResult, Value, ValueType};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Native function body over already-evaluated arguments
pub type NativeFn = Arc<dyn Fn(&[Value]) -> LogicResult<Value> + Send + Sync>;

/// Functions that need access to the evaluator itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    HasFunction,
    AllFunctionsExist,
    EncodeFormula,
    DecodeFormula,
    SelfReference,
    Diagonalization,
    Evaluate,
    ConsistencyCheck,
    Provability,
    Refutability,
    SearchProof,
    LeastFixpoint,
    GreatestFixpoint,
    /// Generators that must check their size against the limits before
    /// allocating
    Range,
    MockCollection,
}

#[derive(Clone)]
pub enum FunctionImpl {
    Native(NativeFn),
    /// Closed user function; the body sees only its parameters
    User {
        params: Vec<String>,
        body: Arc<Expression>,
    },
    Intrinsic(Intrinsic),
}

impl fmt::Debug for FunctionImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionImpl::Native(_) => write!(f, "Native(<fn>)"),
            FunctionImpl::User { params, body } => f
                .debug_struct("User")
                .field("params", params)
                .field("body", &body.to_string())
                .finish(),
            FunctionImpl::Intrinsic(intrinsic) => write!(f, "Intrinsic({:?})", intrinsic),
        }
    }
}

/// Declared parameter types
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    pub params: Vec<ValueType>,
}

impl Signature {
    pub fn new(params: Vec<ValueType>) -> Self {
        Self { params }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Check argument count first, then each argument's type in order
    pub fn check(&self, function: &str, args: &[Value]) -> LogicResult<()> {
        if args.len() != self.params.len() {
            return Err(LogicError::ArityMismatch {
                function: function.to_string(),
                expected: self.params.len(),
                found: args.len(),
            });
        }
        for (position, (param, arg)) in self.params.iter().zip(args).enumerate() {
            if !param.accepts(arg) {
                return Err(LogicError::type_mismatch(
                    param.to_string(),
                    arg.type_name(),
                    format!("argument {} of {}", position + 1, function),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDescriptor {
    pub name: String,
    pub signature: Signature,
    pub implementation: FunctionImpl,
    pub description: String,
}

impl FunctionDescriptor {
    pub fn native<F>(name: impl Into<String>, params: Vec<ValueType>, f: F) -> Self
    where
        F: Fn(&[Value]) -> LogicResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature: Signature::new(params),
            implementation: FunctionImpl::Native(Arc::new(f)),
            description: String::new(),
        }
    }

    pub fn user(
        name: impl Into<String>,
        params: Vec<(String, ValueType)>,
        body: Expression,
    ) -> Self {
        let (names, types): (Vec<String>, Vec<ValueType>) = params.into_iter().unzip();
        Self {
            name: name.into(),
            signature: Signature::new(types),
            implementation: FunctionImpl::User {
                params: names,
                body: Arc::new(body),
            },
            description: String::new(),
        }
    }

    pub(crate) fn intrinsic(
        name: impl Into<String>,
        params: Vec<ValueType>,
        intrinsic: Intrinsic,
    ) -> Self {
        Self {
            name: name.into(),
            signature: Signature::new(params),
            implementation: FunctionImpl::Intrinsic(intrinsic),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_native(&self) -> bool {
        matches!(self.implementation, FunctionImpl::Native(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, FunctionDescriptor>,
}

impl FunctionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the standard library and the engine intrinsics
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_all(&mut registry);
        registry
    }

    /// Register a function, returning the descriptor it replaced
    pub fn register(&mut self, descriptor: FunctionDescriptor) -> Option<FunctionDescriptor> {
        self.functions.insert(descriptor.name.clone(), descriptor)
    }

    pub fn register_native<F>(
        &mut self,
        name: impl Into<String>,
        params: Vec<ValueType>,
        f: F,
    ) -> Option<FunctionDescriptor>
    where
        F: Fn(&[Value]) -> LogicResult<Value> + Send + Sync + 'static,
    {
        self.register(FunctionDescriptor::native(name, params, f))
    }

    pub fn register_user(
        &mut self,
        name: impl Into<String>,
        params: Vec<(String, ValueType)>,
        body: Expression,
    ) -> Option<FunctionDescriptor> {
        self.register(FunctionDescriptor::user(name, params, body))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> LogicResult<&FunctionDescriptor> {
        self.functions
            .get(name)
            .ok_or_else(|| LogicError::FunctionNotFound(name.to_string()))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
