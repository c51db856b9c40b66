//! Textual expression syntax
//!
//! A compact, human-writable form of expression trees used by rule documents,
//! the command line and tests. It is one loader among many: anything that
//! produces the serialized tree form is equally valid input to the engine.
//!
//! ```text
//! forall f in files: f.lines <= 500 and not string.starts_with(f.name, "tmp_")
//! ```

use crate::ast::Span;
use crate::error::LogicError;
use crate::resource_limits::ResourceLimits;
use crate::Expression;
use pest::Parser;
use pest_derive::Parser;
use std::sync::Arc;

pub mod expressions;
pub mod literals;

#[derive(Parser)]
#[grammar = "src/parser/purelogic.pest"]
pub struct LogicParser;

/// Parse with default limits
pub fn parse(source: &str) -> Result<Expression, LogicError> {
    parse_expression(source, "<input>", &ResourceLimits::default())
}

pub fn parse_expression(
    source: &str,
    source_id: &str,
    limits: &ResourceLimits,
) -> Result<Expression, LogicError> {
    if source.len() > limits.max_source_bytes {
        return Err(LogicError::ResourceLimitExceeded {
            limit_name: "max_source_bytes".to_string(),
            limit_value: format!("{} bytes", limits.max_source_bytes),
            actual_value: format!("{} bytes", source.len()),
            suggestion: "Split the logic into smaller rules".to_string(),
        });
    }

    let nesting = bracket_nesting(source);
    if nesting > limits.max_expression_depth {
        return Err(LogicError::ResourceLimitExceeded {
            limit_name: "max_expression_depth".to_string(),
            limit_value: limits.max_expression_depth.to_string(),
            actual_value: nesting.to_string(),
            suggestion: "Simplify the expression or break it into helper functions".to_string(),
        });
    }

    let source_text: Arc<str> = Arc::from(source);
    let mut pairs = LogicParser::parse(Rule::expression_file, source)
        .map_err(|e| pest_error(e, source_id, Arc::clone(&source_text)))?;

    let root = pairs
        .next()
        .and_then(|file| file.into_inner().find(|p| p.as_rule() == Rule::expression))
        .ok_or_else(|| {
            LogicError::parse(
                "Empty expression",
                Span::default(),
                source_id,
                Arc::clone(&source_text),
            )
        })?;

    let mut builder = expressions::Builder::new(source_id, source_text, limits.max_expression_depth);
    let expression = builder.expression(root)?;
    expression.validate()?;
    Ok(expression)
}

fn pest_error(e: pest::error::Error<Rule>, source_id: &str, source_text: Arc<str>) -> LogicError {
    let (start, end) = match e.location {
        pest::error::InputLocation::Pos(pos) => (pos, pos),
        pest::error::InputLocation::Span((start, end)) => (start, end),
    };
    let (line, col) = match e.line_col {
        pest::error::LineColLocation::Pos((line, col)) => (line, col),
        pest::error::LineColLocation::Span((line, col), _) => (line, col),
    };
    let span = Span {
        start,
        end,
        line,
        col,
    };
    let message = match &e.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. } if !positives.is_empty() => {
            let expected: Vec<String> = positives.iter().map(|r| format!("{:?}", r)).collect();
            format!("Unexpected input, expected {}", expected.join(" or "))
        }
        pest::error::ErrorVariant::CustomError { message } => message.clone(),
        _ => "Unexpected input".to_string(),
    };
    LogicError::parse(message, span, source_id, source_text)
}

/// Deepest nesting of brackets outside string literals and comments
fn bracket_nesting(source: &str) -> usize {
    let mut depth: usize = 0;
    let mut deepest = 0;
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
            }
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | '[' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_ignores_strings_and_comments() {
        assert_eq!(bracket_nesting("f((1), [2])"), 2);
        assert_eq!(bracket_nesting(r#""((((" # ((((("#), 0);
        assert_eq!(bracket_nesting(r#""\"(" + (x)"#), 1);
    }
}
