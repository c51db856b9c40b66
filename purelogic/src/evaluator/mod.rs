//! Tree-walking evaluator
//!
//! Evaluates expression trees by recursive dispatch on node kind:
//! 1. Depth check against `max_evaluation_depth`
//! 2. Cache lookup (when caching is enabled)
//! 3. Dispatch to the node's evaluation rule
//! 4. Cache store and trace record
//!
//! Evaluation is synchronous and single-threaded. One `Evaluator` owns its
//! cache, tracer and formula table; it shares nothing mutable with other
//! evaluators. Only the function registry may be shared, read-only.

pub mod calls;
pub mod context;
pub mod expression;
pub mod fixpoint;
pub mod operations;

pub use context::Context;

use crate::cache::{is_cacheable, CacheKey, ExpressionCache};
use crate::metalogic::FormulaTable;
use crate::registry::{FunctionDescriptor, FunctionRegistry};
use crate::trace::{TraceEvent, TraceOutcome, Tracer};
use crate::{Expression, LogicError, LogicResult, ResourceLimits, Value};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters collected across evaluations until reset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub nodes_evaluated: u64,
    pub function_calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fixpoint_iterations: u64,
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    pub(crate) registry: Arc<FunctionRegistry>,
    pub(crate) limits: ResourceLimits,
    pub(crate) formulas: FormulaTable,
    pub(crate) metrics: Metrics,
    cache: ExpressionCache,
    tracer: Tracer,
    depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::with_registry(Arc::new(FunctionRegistry::with_builtins()))
    }
}

impl Evaluator {
    /// Evaluator over the standard library
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluator over a shared, already-populated registry
    pub fn with_registry(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            limits: ResourceLimits::default(),
            formulas: FormulaTable::new(),
            metrics: Metrics::default(),
            cache: ExpressionCache::new(),
            tracer: Tracer::new(),
            depth: 0,
        }
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<FunctionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Register a function. A registry shared with other evaluators is
    /// copied first, so they keep seeing the old table.
    ///
    /// Cached results may depend on the replaced function, so the cache is
    /// cleared.
    pub fn register_function(&mut self, descriptor: FunctionDescriptor) {
        Arc::make_mut(&mut self.registry).register(descriptor);
        self.cache.clear();
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.registry.has_function(name)
    }

    pub fn enable_caching(&mut self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    pub fn caching_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn enable_tracing(&mut self, enabled: bool) {
        self.tracer.set_enabled(enabled);
    }

    pub fn tracing_enabled(&self) -> bool {
        self.tracer.is_enabled()
    }

    pub fn trace(&self) -> &[TraceEvent] {
        self.tracer.events()
    }

    pub fn take_trace(&mut self) -> Vec<TraceEvent> {
        self.tracer.take()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = Metrics::default();
    }

    pub fn formulas(&self) -> &FormulaTable {
        &self.formulas
    }

    pub fn formulas_mut(&mut self) -> &mut FormulaTable {
        &mut self.formulas
    }

    /// Evaluate `expression` in `context`.
    ///
    /// Any error aborts the whole evaluation; there are no partial results.
    /// The context is left with the same scope depth it had on entry.
    pub fn evaluate(&mut self, expression: &Expression, context: &mut Context) -> LogicResult<Value> {
        let depth = context.depth();
        let result = self.eval(expression, context);
        debug_assert_eq!(depth, context.depth(), "unbalanced scopes");
        result
    }

    /// Reject a freshly built value that is nested too deeply or holds too
    /// much. Construction sites call this on every value they produce, so a
    /// diverging step stops here long before the value is deep enough to
    /// exhaust the stack when compared or dropped.
    pub(crate) fn bounded(&self, value: Value) -> LogicResult<Value> {
        if !matches!(value, Value::String(_) | Value::Collection(_) | Value::Object(_)) {
            return Ok(value);
        }
        let limits = &self.limits;
        let shape = value.shape(limits.max_value_size);
        if shape.depth > limits.max_value_depth {
            return Err(value_limit("max_value_depth", limits.max_value_depth, shape.depth));
        }
        if shape.size > limits.max_value_size {
            // Counting stopped at the cap
            let actual = format!("more than {}", limits.max_value_size);
            return Err(value_limit("max_value_size", limits.max_value_size, actual));
        }
        if shape.longest_string > limits.max_string_bytes {
            return Err(value_limit(
                "max_string_bytes",
                limits.max_string_bytes,
                shape.longest_string,
            ));
        }
        Ok(value)
    }

    pub(crate) fn eval(&mut self, expression: &Expression, context: &mut Context) -> LogicResult<Value> {
        if self.depth >= self.limits.max_evaluation_depth {
            return Err(LogicError::ResourceLimitExceeded {
                limit_name: "max_evaluation_depth".to_string(),
                limit_value: self.limits.max_evaluation_depth.to_string(),
                actual_value: (self.depth + 1).to_string(),
                suggestion: "Reduce nesting or recursion depth of the logic".to_string(),
            });
        }
        self.metrics.nodes_evaluated += 1;

        let key = (self.cache.is_enabled() && is_cacheable(expression))
            .then(|| CacheKey::new(expression.id(), context.fingerprint()));

        if let Some(key) = &key {
            if let Some(hit) = self.cache.get(key).cloned() {
                self.metrics.cache_hits += 1;
                self.tracer.record(
                    expression,
                    self.depth,
                    TraceOutcome::Value { value: hit.clone() },
                    Duration::ZERO,
                    true,
                );
                return Ok(hit);
            }
            self.metrics.cache_misses += 1;
        }

        let started = self.tracer.is_enabled().then(Instant::now);
        self.depth += 1;
        let result = expression::evaluate_expression(self, expression, context);
        self.depth -= 1;

        if let (Some(key), Ok(value)) = (key, &result) {
            self.cache.insert(key, value.clone());
        }
        if let Some(started) = started {
            self.tracer.record(
                expression,
                self.depth,
                TraceOutcome::from_result(&result),
                started.elapsed(),
                false,
            );
        }
        result
    }
}

/// `ResourceLimitExceeded` for a value that is, or would be, too large
pub(crate) fn value_limit(name: &str, limit: usize, actual: impl ToString) -> LogicError {
    LogicError::ResourceLimitExceeded {
        limit_name: name.to_string(),
        limit_value: limit.to_string(),
        actual_value: actual.to_string(),
        suggestion: "Bound the growth of the value, or filter its input first".to_string(),
    }
}
