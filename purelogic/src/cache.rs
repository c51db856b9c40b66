//! Expression cache
//!
//! Memoizes `(expression identity, context fingerprint) -> Value` for the
//! lifetime of one evaluator. Only successful results are stored.

use crate::ast::ExpressionId;
use crate::expression::ExpressionKind;
use crate::{Expression, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub expression: ExpressionId,
    pub context: u64,
}

impl CacheKey {
    pub fn new(expression: ExpressionId, context: u64) -> Self {
        Self {
            expression,
            context,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionCache {
    enabled: bool,
    entries: HashMap<CacheKey, Value>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning the cache off drops every entry
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.entries.clear();
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<&Value> {
        if !self.enabled {
            return None;
        }
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, value: Value) {
        if self.enabled {
            self.entries.insert(key, value);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Leaves are cheaper to evaluate than to look up
pub fn is_cacheable(expression: &Expression) -> bool {
    !matches!(
        expression.kind(),
        ExpressionKind::Literal { .. } | ExpressionKind::Variable { .. }
    )
}
