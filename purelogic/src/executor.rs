//! Rule execution
//!
//! Runs a rule's logic against caller facts, and runs its self-validation and
//! unit tests against a meta-context describing the rule itself. Both go
//! through the same `Evaluator`, so "real" and "meta" evaluation share one
//! set of semantics.
//!
//! Engine errors never escape as panics or partial results. They become
//! [`Diagnostic`]s carrying the rule id, and only the offending rule (or unit
//! test) is marked as failed.

use crate::evaluator::{Context, Evaluator};
use crate::rule::{LogicRule, RuleSource};
use crate::{LogicError, LogicResult, Value};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Engine error translated for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub rule_id: String,
    pub kind: String,
    pub reason: String,
}

impl Diagnostic {
    pub fn from_error(rule_id: &str, error: &LogicError) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            kind: error.kind().to_string(),
            reason: error.to_string(),
        }
    }
}

/// Result of a boolean check (self-validation or unit test)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    Passed,
    Failed,
    Errored { diagnostic: Diagnostic },
}

impl CheckOutcome {
    fn from_result(rule_id: &str, what: &str, result: LogicResult<Value>) -> Self {
        match result {
            Ok(Value::Boolean(true)) => CheckOutcome::Passed,
            Ok(Value::Boolean(false)) => CheckOutcome::Failed,
            Ok(other) => CheckOutcome::Errored {
                diagnostic: Diagnostic::from_error(
                    rule_id,
                    &LogicError::type_mismatch("boolean", other.type_name(), what),
                ),
            },
            Err(error) => CheckOutcome::Errored {
                diagnostic: Diagnostic::from_error(rule_id, &error),
            },
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, CheckOutcome::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelfValidationReport {
    pub rule_id: String,
    /// Functions called by the rule that the registry does not know
    pub missing_functions: Vec<String>,
    /// Outcome of the rule's own self-validation expression, if it has one
    pub declared: Option<CheckOutcome>,
}

impl SelfValidationReport {
    /// A rule is trusted when everything it calls exists and its declared
    /// self-validation, if any, evaluated to `true`
    pub fn trusted(&self) -> bool {
        self.missing_functions.is_empty() && self.declared.as_ref().map_or(true, CheckOutcome::passed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitTestResult {
    pub name: String,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitTestReport {
    pub rule_id: String,
    pub results: Vec<UnitTestResult>,
}

impl UnitTestReport {
    /// Aggregate verdict; a rule without tests passes
    pub fn passed(&self) -> bool {
        self.results.iter().all(|result| result.outcome.passed())
    }

    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|result| result.outcome.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.passed_count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    /// The eligibility predicate excluded the rule
    Skipped,
    Untrusted { report: SelfValidationReport },
    Completed { value: Value },
    Failed { diagnostic: Diagnostic },
}

impl RuleOutcome {
    /// Whether the rule ran and its logic evaluated to `true`
    pub fn holds(&self) -> bool {
        matches!(self, RuleOutcome::Completed { value: Value::Boolean(true) })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    pub rule_id: String,
    pub outcome: RuleOutcome,
}

type Eligibility<'a> = Box<dyn Fn(&LogicRule) -> bool + 'a>;

/// Runs rules from a [`RuleSource`] on a borrowed evaluator
pub struct RuleExecutor<'a> {
    evaluator: &'a mut Evaluator,
    source: &'a dyn RuleSource,
    eligibility: Option<Eligibility<'a>>,
}

impl<'a> RuleExecutor<'a> {
    pub fn new(evaluator: &'a mut Evaluator, source: &'a dyn RuleSource) -> Self {
        Self {
            evaluator,
            source,
            eligibility: None,
        }
    }

    /// Only rules for which `eligible` returns true are run by `run_rule`
    pub fn with_eligibility(mut self, eligible: impl Fn(&LogicRule) -> bool + 'a) -> Self {
        self.eligibility = Some(Box::new(eligible));
        self
    }

    pub fn load_rule(&self, id: &str) -> LogicResult<Arc<LogicRule>> {
        self.source.load_rule(id)
    }

    /// Evaluate the rule's logic against `context` and return the raw result
    pub fn execute_rule(&mut self, rule: &LogicRule, context: &mut Context) -> LogicResult<Value> {
        self.evaluator.evaluate(&rule.logic, context)
    }

    pub fn execute_rule_self_validation(&mut self, rule: &LogicRule) -> SelfValidationReport {
        let missing_functions: Vec<String> = rule
            .called_functions()
            .into_iter()
            .filter(|name| !self.evaluator.has_function(name))
            .collect();

        let declared = rule.self_validation.as_ref().map(|validation| {
            let result = self
                .meta_context(rule)
                .and_then(|mut meta| self.evaluator.evaluate(validation, &mut meta));
            CheckOutcome::from_result(&rule.id, "self-validation", result)
        });

        SelfValidationReport {
            rule_id: rule.id.clone(),
            missing_functions,
            declared,
        }
    }

    /// Run every unit test in order. A failure in one test does not stop
    /// the others.
    pub fn execute_rule_unit_tests(&mut self, rule: &LogicRule) -> UnitTestReport {
        let meta = self.meta_context(rule);
        let results = rule
            .unit_tests
            .iter()
            .map(|test| {
                let result = match &meta {
                    Ok(meta) => self.evaluator.evaluate(&test.expression, &mut meta.clone()),
                    Err(error) => Err(error.clone()),
                };
                let outcome =
                    CheckOutcome::from_result(&rule.id, &format!("unit test '{}'", test.name), result);
                if !outcome.passed() {
                    debug!(rule = %rule.id, test = %test.name, "unit test did not pass");
                }
                UnitTestResult {
                    name: test.name.clone(),
                    outcome,
                }
            })
            .collect();

        UnitTestReport {
            rule_id: rule.id.clone(),
            results,
        }
    }

    /// Load, gate, self-validate and execute one rule
    pub fn run_rule(&mut self, id: &str, context: &Context) -> RuleReport {
        let outcome = match self.load_rule(id) {
            Ok(rule) => self.run_loaded(&rule, context),
            Err(error) => {
                warn!(rule = %id, error = %error, "could not load rule");
                RuleOutcome::Failed {
                    diagnostic: Diagnostic::from_error(id, &error),
                }
            }
        };
        RuleReport {
            rule_id: id.to_string(),
            outcome,
        }
    }

    /// Run every rule the source provides, in id order
    pub fn run_all(&mut self, context: &Context) -> Vec<RuleReport> {
        self.source
            .rule_ids()
            .iter()
            .map(|id| self.run_rule(id, context))
            .collect()
    }

    fn run_loaded(&mut self, rule: &LogicRule, context: &Context) -> RuleOutcome {
        if let Some(eligible) = &self.eligibility {
            if !eligible(rule) {
                debug!(rule = %rule.id, "rule not eligible, skipping");
                return RuleOutcome::Skipped;
            }
        }

        let report = self.execute_rule_self_validation(rule);
        if !report.trusted() {
            warn!(
                rule = %rule.id,
                missing = ?report.missing_functions,
                "rule failed self-validation and will not run"
            );
            return RuleOutcome::Untrusted { report };
        }

        debug!(rule = %rule.id, "executing rule");
        let mut context = context.clone();
        match self.execute_rule(rule, &mut context) {
            Ok(value) => {
                debug!(rule = %rule.id, result = %value, "rule finished");
                RuleOutcome::Completed { value }
            }
            Err(error) => {
                warn!(rule = %rule.id, error = %error, "rule evaluation failed");
                RuleOutcome::Failed {
                    diagnostic: Diagnostic::from_error(&rule.id, &error),
                }
            }
        }
    }

    /// Context whose only binding is `rule`, an object describing the rule's
    /// own structure with formulas in quoted form
    pub fn meta_context(&mut self, rule: &LogicRule) -> LogicResult<Context> {
        let description = describe_rule(self.evaluator, rule)?;
        Ok(Context::with_facts([("rule", description)]))
    }
}

fn describe_rule(evaluator: &mut Evaluator, rule: &LogicRule) -> LogicResult<Value> {
    let names = |set: std::collections::BTreeSet<String>| Value::collection(set.into_iter().map(Value::String));

    let self_validation = match &rule.self_validation {
        Some(validation) => validation.to_value()?,
        None => Value::Null,
    };
    let unit_tests = rule
        .unit_tests
        .iter()
        .map(|test| test.expression.to_value())
        .collect::<LogicResult<Vec<_>>>()?;
    let code = evaluator.formulas_mut().encode(&rule.logic)?;

    Ok(Value::object([
        ("id", Value::from(rule.id.as_str())),
        ("name", Value::from(rule.name.as_str())),
        ("category", Value::from(rule.category.as_str())),
        ("severity", Value::String(rule.severity.to_string())),
        (
            "philosophies",
            Value::collection(rule.philosophies.iter().map(|p| Value::from(p.as_str()))),
        ),
        ("logic", rule.logic.to_value()?),
        ("self_validation", self_validation),
        ("unit_tests", Value::Collection(unit_tests)),
        ("called_functions", names(rule.logic.called_functions())),
        ("free_variables", names(rule.logic.free_variables())),
        ("code", Value::Integer(code)),
    ]))
}
