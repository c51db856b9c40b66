use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, Row, Table};
use purelogic::{
    CheckOutcome, FunctionImpl, FunctionRegistry, LogicRule, RuleOutcome, RuleReport,
    SelfValidationReport, TraceEvent, TraceOutcome, UnitTestReport, Value,
};

enum Status {
    Pass,
    Fail,
    Error,
    Skip,
}

impl Status {
    fn cell(&self) -> Cell {
        match self {
            Status::Pass => Cell::new("pass").fg(Color::Green),
            Status::Fail => Cell::new("fail").fg(Color::Red),
            Status::Error => Cell::new("error").fg(Color::Red),
            Status::Skip => Cell::new("skip").fg(Color::DarkGrey),
        }
    }

    fn of_check(outcome: &CheckOutcome) -> (Self, String) {
        match outcome {
            CheckOutcome::Passed => (Status::Pass, String::new()),
            CheckOutcome::Failed => (Status::Fail, "returned false".to_string()),
            CheckOutcome::Errored { diagnostic } => (Status::Error, diagnostic.reason.clone()),
        }
    }
}

pub struct Formatter {}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {}
    }

    pub fn format_value(&self, value: &Value) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec![
            Cell::new("Result").set_alignment(CellAlignment::Left),
            Cell::new("Type").set_alignment(CellAlignment::Left),
        ]));
        table.add_row(Row::from(vec![value.to_string(), value.type_name()]));
        format!("{}\n", table)
    }

    /// Trace events in evaluation order, indented by depth
    pub fn format_trace(&self, events: &[TraceEvent]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec!["#", "Node", "Expression", "Outcome", "µs"]));

        for event in events {
            let expression = format!("{}{}", "│ ".repeat(event.depth), event.summary);
            let outcome = match &event.outcome {
                TraceOutcome::Value { value } => value.to_string(),
                TraceOutcome::Error { kind, .. } => format!("error: {}", kind),
            };
            let outcome = if event.cached {
                format!("{} (cached)", outcome)
            } else {
                outcome
            };
            table.add_row(Row::from(vec![
                Cell::new(event.sequence),
                Cell::new(event.node),
                Cell::new(expression),
                Cell::new(outcome),
                Cell::new(event.duration.as_micros()).set_alignment(CellAlignment::Right),
            ]));
        }

        format!("{}\n", table)
    }

    pub fn format_rule_reports(&self, reports: &[RuleReport]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec!["Rule", "Status", "Detail"]));

        let mut held = 0;
        for report in reports {
            let (status, detail) = match &report.outcome {
                RuleOutcome::Skipped => (Status::Skip, "not eligible".to_string()),
                RuleOutcome::Completed { value } if report.outcome.holds() => {
                    (Status::Pass, value.to_string())
                }
                RuleOutcome::Completed { value } => (Status::Fail, value.to_string()),
                RuleOutcome::Untrusted { report } => (Status::Error, untrusted_detail(report)),
                RuleOutcome::Failed { diagnostic } => (Status::Error, diagnostic.reason.clone()),
            };
            if matches!(status, Status::Pass) {
                held += 1;
            }
            table.add_row(Row::from(vec![
                Cell::new(&report.rule_id),
                status.cell(),
                Cell::new(detail),
            ]));
        }

        format!("{}\n{} of {} rule(s) hold\n", table, held, reports.len())
    }

    pub fn format_test_reports(&self, results: &[(SelfValidationReport, UnitTestReport)]) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec!["Rule", "Check", "Status", "Detail"]));

        let mut passed = 0;
        let mut total = 0;
        for (validation, tests) in results {
            let (status, detail) = if !validation.missing_functions.is_empty() {
                (Status::Fail, untrusted_detail(validation))
            } else {
                match &validation.declared {
                    Some(outcome) => Status::of_check(outcome),
                    None => (Status::Pass, "all called functions exist".to_string()),
                }
            };
            total += 1;
            if validation.trusted() {
                passed += 1;
            }
            table.add_row(Row::from(vec![
                Cell::new(&validation.rule_id),
                Cell::new("self-validation"),
                status.cell(),
                Cell::new(detail),
            ]));

            for result in &tests.results {
                let (status, detail) = Status::of_check(&result.outcome);
                total += 1;
                if result.outcome.passed() {
                    passed += 1;
                }
                table.add_row(Row::from(vec![
                    Cell::new(&tests.rule_id),
                    Cell::new(&result.name),
                    status.cell(),
                    Cell::new(detail),
                ]));
            }
        }

        format!("{}\n{} of {} check(s) passed\n", table, passed, total)
    }

    pub fn format_rule(&self, rule: &LogicRule) -> String {
        let mut output = String::new();
        output.push_str(&format!("Rule: {}\n", rule.id));
        if rule.name != rule.id {
            output.push_str(&format!("Name: {}\n", rule.name));
        }
        if !rule.description.is_empty() {
            output.push_str(&format!("Description: {}\n", rule.description));
        }
        if !rule.category.is_empty() {
            output.push_str(&format!("Category: {}\n", rule.category));
        }
        output.push_str(&format!("Severity: {}\n", rule.severity));
        if !rule.philosophies.is_empty() {
            output.push_str(&format!("Philosophies: {}\n", rule.philosophies.join(", ")));
        }

        output.push_str(&format!("\nlogic:\n  {}\n", rule.logic));
        if let Some(validation) = &rule.self_validation {
            output.push_str(&format!("\nself-validation:\n  {}\n", validation));
        }

        output.push_str(&format!("\nunit tests ({}):\n", rule.unit_tests.len()));
        for test in &rule.unit_tests {
            output.push_str(&format!("  - {}: {}\n", test.name, test.expression));
        }

        let free: Vec<String> = rule.logic.free_variables().into_iter().collect();
        output.push_str(&format!("\nfacts used: {}\n", list_or_none(&free)));
        let called: Vec<String> = rule.called_functions().into_iter().collect();
        output.push_str(&format!("functions called: {}\n", list_or_none(&called)));
        output
    }

    pub fn format_functions(&self, registry: &FunctionRegistry) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(Row::from(vec!["Function", "Parameters", "Kind", "Description"]));

        for descriptor in registry.descriptors() {
            let kind = match descriptor.implementation {
                FunctionImpl::Native(_) => "native",
                FunctionImpl::User { .. } => "user",
                FunctionImpl::Intrinsic(_) => "engine",
            };
            table.add_row(Row::from(vec![
                Cell::new(&descriptor.name),
                Cell::new(descriptor.signature.to_string()),
                Cell::new(kind),
                Cell::new(&descriptor.description),
            ]));
        }

        format!("{}\n{} function(s)\n", table, registry.len())
    }
}

fn untrusted_detail(report: &SelfValidationReport) -> String {
    if !report.missing_functions.is_empty() {
        return format!("unknown functions: {}", report.missing_functions.join(", "));
    }
    match &report.declared {
        Some(CheckOutcome::Errored { diagnostic }) => {
            format!("self-validation errored: {}", diagnostic.reason)
        }
        _ => "self-validation returned false".to_string(),
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
