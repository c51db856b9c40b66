//! # PureLogic Engine
//!
//! **Rules that can check themselves**
//!
//! PureLogic evaluates logic expressions (boolean connectives, quantifiers,
//! fixpoints, function calls over a small value algebra) against named facts.
//! Rules wrap a logic expression together with a self-validation expression and
//! unit tests, all evaluated by the same evaluator.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use purelogic::{Context, Engine, LogicResult, Value};
//!
//! fn main() -> LogicResult<()> {
//!     let mut engine = Engine::new();
//!
//!     let mut context = Context::with_facts([(
//!         "files",
//!         Value::collection([
//!             Value::object([("lines", Value::from(120))]),
//!             Value::object([("lines", Value::from(480))]),
//!         ]),
//!     )]);
//!
//!     let result = engine.evaluate_source("forall f in files: f.lines <= 500", &mut context)?;
//!     assert_eq!(result, Value::Boolean(true));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Expressions
//! Expressions are immutable trees. Each node has a structural identity, so two
//! independently built copies of the same tree compare (and cache) as equal.
//!
//! ### Functions
//! Every call goes through the function registry. Natives are Rust closures,
//! user functions are expression bodies, and a handful of meta-logic functions
//! have access to the evaluator itself.
//!
//! ### Rules
//! A rule is logic plus optional self-validation and unit tests. Before a rule
//! runs, the executor checks that every function it calls is registered and
//! that its self-validation holds.

pub mod ast;
pub mod builtins;
pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod expression;
pub mod fingerprint;
pub mod metalogic;
pub mod parser;
pub mod registry;
pub mod resource_limits;
pub mod rule;
pub mod trace;
pub mod value;

pub use ast::{ExpressionId, Span};
pub use engine::Engine;
pub use error::{ErrorDetails, LogicError};
pub use evaluator::{Context, Evaluator, Metrics};
pub use executor::{
    CheckOutcome, Diagnostic, RuleExecutor, RuleOutcome, RuleReport, SelfValidationReport,
    UnitTestReport, UnitTestResult,
};
pub use expression::{Expression, ExpressionKind, NodeKind, Operator, QuantifierKind, Statement};
pub use parser::{parse, parse_expression};
pub use registry::{FunctionDescriptor, FunctionImpl, FunctionRegistry, Signature};
pub use resource_limits::ResourceLimits;
pub use rule::{LogicRule, RuleDocument, RuleSet, RuleSource, Severity, UnitTest};
pub use trace::{TraceEvent, TraceOutcome};
pub use value::{Value, ValueShape, ValueType};

/// Result type for PureLogic operations
pub type LogicResult<T> = Result<T, LogicError>;

#[cfg(test)]
mod tests;
