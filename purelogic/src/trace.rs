//! Evaluation tracing
//!
//! While enabled, the tracer records one event per evaluated node, in the
//! order evaluation of each node finishes. It only observes: results are the
//! same with tracing on or off.

use crate::ast::ExpressionId;
use crate::expression::{ExpressionKind, NodeKind};
use crate::{Expression, LogicError, Value};
use serde::{Serialize, Serializer};
use std::time::Duration;

const SUMMARY_CHARS: usize = 80;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceOutcome {
    Value { value: Value },
    Error { kind: String, message: String },
}

impl TraceOutcome {
    pub fn from_result(result: &Result<Value, LogicError>) -> Self {
        match result {
            Ok(value) => TraceOutcome::Value {
                value: value.clone(),
            },
            Err(error) => TraceOutcome::Error {
                kind: error.kind().to_string(),
                message: error.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub sequence: usize,
    /// Evaluator recursion depth of the node, 0 for the root
    pub depth: usize,
    pub node: NodeKind,
    pub expression: ExpressionId,
    pub summary: String,
    pub outcome: TraceOutcome,
    #[serde(rename = "duration_us", serialize_with = "as_micros")]
    pub duration: Duration,
    /// Result came from the expression cache
    pub cached: bool,
}

fn as_micros<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_micros()).unwrap_or(u64::MAX))
}

#[derive(Debug, Clone, Default)]
pub struct Tracer {
    enabled: bool,
    events: Vec<TraceEvent>,
}

impl Tracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggling in either direction starts a fresh log
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.events.clear();
    }

    pub fn record(
        &mut self,
        expression: &Expression,
        depth: usize,
        outcome: TraceOutcome,
        duration: Duration,
        cached: bool,
    ) {
        if !self.enabled {
            return;
        }
        self.events.push(TraceEvent {
            sequence: self.events.len(),
            depth,
            node: expression.node_kind(),
            expression: expression.id(),
            summary: summarize(expression),
            outcome,
            duration,
            cached,
        });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Take the log, leaving tracing enabled with an empty log
    pub fn take(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Short, single-line description of a node's input
pub fn summarize(expression: &Expression) -> String {
    let text = match expression.kind() {
        ExpressionKind::Call { function, args } => format!("{}/{}", function, args.len()),
        ExpressionKind::Quantifier {
            quantifier,
            variable,
            ..
        } => format!("{} {}", quantifier, variable),
        ExpressionKind::Fixpoint { variable, .. } => format!("fixpoint {}", variable),
        ExpressionKind::Block { statements } => format!("block of {}", statements.len()),
        _ => expression.to_string(),
    };
    if text.chars().count() <= SUMMARY_CHARS {
        return text;
    }
    let mut truncated: String = text.chars().take(SUMMARY_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}
