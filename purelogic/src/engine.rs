use crate::evaluator::{Context, Evaluator};
use crate::executor::{RuleExecutor, RuleReport, SelfValidationReport, UnitTestReport};
use crate::parser::parse_expression;
use crate::registry::FunctionDescriptor;
use crate::rule::{LogicRule, RuleSet, RuleSource};
use crate::{Expression, LogicResult, ResourceLimits, Value};
use std::sync::Arc;

type EligibilityFn = Arc<dyn Fn(&LogicRule) -> bool + Send + Sync>;

/// Engine facade: one evaluator plus the rules loaded into it
#[derive(Default)]
pub struct Engine {
    evaluator: Evaluator,
    rules: RuleSet,
    eligibility: Option<EligibilityFn>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: ResourceLimits) -> Self {
        Self {
            evaluator: Evaluator::new().with_limits(limits),
            ..Self::default()
        }
    }

    pub fn with_evaluator(evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            ..Self::default()
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut Evaluator {
        &mut self.evaluator
    }

    pub fn limits(&self) -> &ResourceLimits {
        self.evaluator.limits()
    }

    pub fn register_function(&mut self, descriptor: FunctionDescriptor) {
        self.evaluator.register_function(descriptor);
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Load rule documents (one object or an array) and return the new ids
    pub fn load_rules(&mut self, json: &str, source_id: &str) -> LogicResult<Vec<String>> {
        let limits = self.evaluator.limits().clone();
        self.rules.add_json(json, source_id, &limits)
    }

    pub fn add_rule(&mut self, rule: LogicRule) -> LogicResult<()> {
        self.rules.insert(rule)
    }

    pub fn get_rule(&self, id: &str) -> LogicResult<Arc<LogicRule>> {
        self.rules.load_rule(id)
    }

    /// Install the predicate deciding whether a rule may run
    pub fn set_eligibility(&mut self, eligible: impl Fn(&LogicRule) -> bool + Send + Sync + 'static) {
        self.eligibility = Some(Arc::new(eligible));
    }

    pub fn clear_eligibility(&mut self) {
        self.eligibility = None;
    }

    pub fn parse(&self, source: &str) -> LogicResult<Expression> {
        parse_expression(source, "<input>", self.evaluator.limits())
    }

    pub fn evaluate(&mut self, expression: &Expression, context: &mut Context) -> LogicResult<Value> {
        self.evaluator.evaluate(expression, context)
    }

    /// Parse `source` in the textual syntax and evaluate it
    pub fn evaluate_source(&mut self, source: &str, context: &mut Context) -> LogicResult<Value> {
        let expression = self.parse(source)?;
        self.evaluator.evaluate(&expression, context)
    }

    /// Executor over this engine's evaluator and rules
    pub fn executor(&mut self) -> RuleExecutor<'_> {
        let executor = RuleExecutor::new(&mut self.evaluator, &self.rules);
        match &self.eligibility {
            Some(eligible) => {
                let eligible = Arc::clone(eligible);
                executor.with_eligibility(move |rule| eligible(rule))
            }
            None => executor,
        }
    }

    pub fn run_rule(&mut self, id: &str, context: &Context) -> RuleReport {
        self.executor().run_rule(id, context)
    }

    pub fn run_all(&mut self, context: &Context) -> Vec<RuleReport> {
        self.executor().run_all(context)
    }

    pub fn validate_rule(&mut self, id: &str) -> LogicResult<SelfValidationReport> {
        let rule = self.get_rule(id)?;
        Ok(self.executor().execute_rule_self_validation(&rule))
    }

    pub fn test_rule(&mut self, id: &str) -> LogicResult<UnitTestReport> {
        let rule = self.get_rule(id)?;
        Ok(self.executor().execute_rule_unit_tests(&rule))
    }
}
