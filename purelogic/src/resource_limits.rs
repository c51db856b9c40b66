use serde::{Deserialize, Serialize};

/// Resource limits that bound parsing and evaluation
///
/// The evaluator has no preemption point; these bounds are the only built-in
/// way a runaway evaluation stops. Wall-clock timeouts belong to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceLimits {
    /// Maximum size of textual expression source in bytes
    /// Real usage: ~2KB, Limit: 5MB
    pub max_source_bytes: usize,

    /// Maximum nesting depth accepted by the parser
    /// Real usage: ~8 levels, Limit: 100
    pub max_expression_depth: usize,

    /// Maximum evaluator recursion depth, user-function calls included
    /// Real usage: ~20 levels, Limit: 256
    pub max_evaluation_depth: usize,

    /// Iteration bound for fixpoint nodes and the mu/nu built-ins
    pub max_fixpoint_iterations: usize,

    /// Largest collection a quantifier will iterate over
    pub max_quantifier_domain: usize,

    /// Forward-chaining rounds for the bounded provability checks
    pub max_proof_steps: usize,

    /// Deepest nesting of collections and objects a computed value may have.
    /// A quoted formula nests about two levels per expression level.
    /// Real usage: ~20 levels, Limit: 256
    pub max_value_depth: usize,

    /// Most values (elements at every level) one computed value may hold
    pub max_value_size: usize,

    /// Longest string a computed value may hold, in bytes
    pub max_string_bytes: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_source_bytes: 5 * 1024 * 1024, // 5 MB
            max_expression_depth: 100,
            max_evaluation_depth: 256,
            max_fixpoint_iterations: 10_000,
            max_quantifier_domain: 1_000_000,
            max_proof_steps: 64,
            max_value_depth: 256,
            max_value_size: 1_000_000,
            max_string_bytes: 5 * 1024 * 1024, // 5 MB
        }
    }
}

impl ResourceLimits {
    /// Create a new ResourceLimits with default values
    pub fn new() -> Self {
        Self::default()
    }
}
