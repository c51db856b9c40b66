use ariadne::{Color, Label, Report, ReportKind, Source};
use purelogic::LogicError;

/// Format a LogicError for the terminal, with an Ariadne report for parse errors
pub fn format_error(error: &LogicError) -> String {
    match error {
        LogicError::Parse(details) => {
            let mut output = Vec::new();

            let message = format!(
                "Parse error: {} (at {}:{}:{})",
                details.message, details.source_id, details.span.line, details.span.col
            );

            let mut report = Report::build(ReportKind::Error, &details.source_id, details.span.start)
                .with_message(message)
                .with_label(
                    Label::new((&details.source_id, details.span.start..details.span.end))
                        .with_message("")
                        .with_color(Color::Red),
                );

            if let Some(suggestion) = &details.suggestion {
                report = report.with_help(suggestion);
            }

            match report.finish().write(
                (
                    &details.source_id,
                    Source::from(details.source_text.as_ref()),
                ),
                &mut output,
            ) {
                Ok(_) => String::from_utf8_lossy(&output).to_string(),
                Err(_) => format!("{}", error),
            }
        }
        LogicError::ResourceLimitExceeded {
            limit_name,
            limit_value,
            actual_value,
            suggestion,
        } => {
            format!(
                "Resource limit exceeded: {}\n  Limit: {}\n  Actual: {}\n  {}",
                limit_name, limit_value, actual_value, suggestion
            )
        }
        LogicError::FunctionError { function, source } => {
            let mut output = format!("Error in function '{}'", function);
            let mut cause: &LogicError = source;
            loop {
                output.push_str(&format!("\n  caused by: {}", cause));
                match cause {
                    LogicError::FunctionError { source, .. } => cause = source,
                    _ => break,
                }
            }
            output
        }
        other => format!("Error ({}): {}", other.kind(), other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_report_names_the_source() {
        let error = purelogic::parse("forall x in xs x > 0").unwrap_err();
        let output = format_error(&error);
        assert!(output.contains("Parse error"));
        assert!(output.contains("<input>"));
    }

    #[test]
    fn test_function_error_chain() {
        let error = LogicError::function_error(
            "outer.check",
            LogicError::function_error("inner.check", LogicError::Native("boom".to_string())),
        );
        let output = format_error(&error);
        assert!(output.contains("Error in function 'outer.check'"));
        assert!(output.contains("caused by: boom"));
    }

    #[test]
    fn test_other_errors_show_their_kind() {
        let output = format_error(&LogicError::UnboundVariable("files".to_string()));
        assert_eq!(output, "Error (unbound_variable): unbound variable 'files'");
    }
}
