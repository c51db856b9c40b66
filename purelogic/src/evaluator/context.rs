//! Evaluation context
//!
//! A stack of lexical scopes. Lookups walk from the innermost scope outwards;
//! bindings always land in the innermost scope, so an enclosing scope is never
//! modified from within.

use crate::fingerprint::StableHasher;
use crate::{LogicError, LogicResult, Value};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::hash::Hasher;

type Scope = BTreeMap<String, Value>;

/// Lexical variable environment
#[derive(Debug, Clone)]
pub struct Context {
    scopes: Vec<Scope>,
    /// Memoized fingerprint of the whole stack, reset by every mutation
    fingerprint: Cell<Option<u64>>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            scopes: vec![Scope::new()],
            fingerprint: Cell::new(None),
        }
    }
}

impl Context {
    /// Create a context holding only an empty base scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context whose base scope holds the given facts
    pub fn with_facts<K: Into<String>>(facts: impl IntoIterator<Item = (K, Value)>) -> Self {
        let mut context = Self::new();
        for (name, value) in facts {
            context.bind_variable(name, value);
        }
        context
    }

    /// Create a context from the fields of an Object value
    pub fn from_object(value: &Value) -> LogicResult<Self> {
        let fields = value.as_object()?;
        Ok(Self::with_facts(
            fields.iter().map(|(k, v)| (k.clone(), v.clone())),
        ))
    }

    /// Bind `name` in the innermost scope, shadowing any outer binding
    pub fn bind_variable(&mut self, name: impl Into<String>, value: Value) {
        self.fingerprint.set(None);
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    pub fn get_variable(&self, name: &str) -> LogicResult<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .ok_or_else(|| LogicError::UnboundVariable(name.to_string()))
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains_key(name))
    }

    pub fn push_scope(&mut self) {
        self.fingerprint.set(None);
        self.scopes.push(Scope::new());
    }

    /// Discard the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics when only the base scope is left. Push and pop must be paired.
    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "pop_scope called on the base scope");
        self.fingerprint.set(None);
        self.scopes.pop();
    }

    /// Run `f` inside a freshly pushed scope, popping it on every exit path
    pub fn with_scope<T>(&mut self, f: impl FnOnce(&mut Context) -> T) -> T {
        let depth = self.depth();
        self.push_scope();
        let result = f(self);
        while self.depth() > depth {
            self.pop_scope();
        }
        result
    }

    /// Number of active scopes, including the base scope
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Visible bindings, innermost wins
    pub fn visible_bindings(&self) -> BTreeMap<&str, &Value> {
        let mut visible = BTreeMap::new();
        for scope in &self.scopes {
            for (name, value) in scope {
                visible.insert(name.as_str(), value);
            }
        }
        visible
    }

    /// Fingerprint of every binding in every scope.
    ///
    /// Shadowed bindings are included, so this is conservative: two contexts
    /// that would resolve every name identically may still differ here.
    pub fn fingerprint(&self) -> u64 {
        if let Some(cached) = self.fingerprint.get() {
            return cached;
        }
        let mut hasher = StableHasher::new();
        hasher.write_le_u64(self.scopes.len() as u64);
        for scope in &self.scopes {
            hasher.write_le_u64(scope.len() as u64);
            for (name, value) in scope {
                hasher.write_tagged_str(0xff, name);
                value.hash_into(&mut hasher);
            }
        }
        let fingerprint = hasher.finish();
        self.fingerprint.set(Some(fingerprint));
        fingerprint
    }
}
