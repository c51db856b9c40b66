use crate::ast::Span;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Detailed error information with source location
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: String,
    pub span: Span,
    pub source_id: String,
    pub source_text: Arc<str>,
    pub suggestion: Option<String>,
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        write!(f, " at {}:{}:{}", self.source_id, self.span.line, self.span.col)
    }
}

/// Errors raised while loading or evaluating logic.
///
/// Every variant aborts the enclosing evaluation. Rule-level failures
/// (a self-validation returning `false`, a failing unit test) are ordinary
/// results and never show up here.
#[derive(Debug, Clone, Error)]
pub enum LogicError {
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        context: String,
    },

    #[error("unbound variable '{0}'")]
    UnboundVariable(String),

    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("function '{0}' is not registered")]
    FunctionNotFound(String),

    #[error("function '{function}' failed: {source}")]
    FunctionError {
        function: String,
        #[source]
        source: Box<LogicError>,
    },

    #[error("function '{function}' expects {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("fixpoint over '{variable}' did not converge after {iterations} iterations")]
    NonConvergentFixpoint { variable: String, iterations: usize },

    #[error("malformed expression: {0}")]
    MalformedExpression(String),

    /// Division by zero, integer overflow and similar numeric faults
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Failure reported by a native function body, before the evaluator wraps it
    #[error("{0}")]
    Native(String),

    #[error("resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value}). {suggestion}")]
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },

    /// Parse error in the textual expression syntax
    #[error("parse error: {0}")]
    Parse(Box<ErrorDetails>),

    /// Problems with rule documents: bad JSON, duplicate or unknown ids
    #[error("load error: {0}")]
    Load(String),
}

impl LogicError {
    /// Create a parse error with source information
    pub fn parse(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: None,
        }))
    }

    /// Create a parse error with suggestion
    pub fn parse_with_suggestion(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: Some(suggestion.into()),
        }))
    }

    pub fn type_mismatch(
        expected: impl Into<String>,
        found: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
            context: context.into(),
        }
    }

    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(message.into())
    }

    pub fn function_error(function: impl Into<String>, cause: LogicError) -> Self {
        Self::FunctionError {
            function: function.into(),
            source: Box::new(cause),
        }
    }

    /// Stable snake_case name of the error kind, used in diagnostics and
    /// serialized responses.
    pub fn kind(&self) -> &'static str {
        match self {
            LogicError::TypeMismatch { .. } => "type_mismatch",
            LogicError::UnboundVariable(_) => "unbound_variable",
            LogicError::IndexOutOfRange { .. } => "index_out_of_range",
            LogicError::FunctionNotFound(_) => "function_not_found",
            LogicError::FunctionError { .. } => "function_error",
            LogicError::ArityMismatch { .. } => "arity_mismatch",
            LogicError::NonConvergentFixpoint { .. } => "non_convergent_fixpoint",
            LogicError::MalformedExpression(_) => "malformed_expression",
            LogicError::Arithmetic(_) => "arithmetic",
            LogicError::Native(_) => "native",
            LogicError::ResourceLimitExceeded { .. } => "resource_limit_exceeded",
            LogicError::Parse(_) => "parse",
            LogicError::Load(_) => "load",
        }
    }

    /// Innermost cause of a chain of `FunctionError` wrappers
    pub fn root_cause(&self) -> &LogicError {
        match self {
            LogicError::FunctionError { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for LogicError {
    fn from(err: serde_json::Error) -> Self {
        LogicError::Load(format!("invalid JSON: {}", err))
    }
}
