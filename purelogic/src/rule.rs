//! Rules and rule sources
//!
//! A rule is immutable once loaded. Rule documents are JSON; every expression
//! field accepts either the textual syntax (a JSON string) or a serialized
//! tree (a JSON object):
//!
//! ```json
//! {
//!   "id": "structure.max_file_lines",
//!   "severity": "warning",
//!   "logic": "forall f in files: f.lines <= 500",
//!   "self_validation": "logic.all_functions_exist(rule.logic)",
//!   "unit_tests": [
//!     {"name": "short files pass",
//!      "test": "metalogic.evaluate(rule.logic, {files: [{lines: 10}]})"}
//!   ]
//! }
//! ```

use crate::parser::parse_expression;
use crate::{Expression, LogicError, LogicResult, ResourceLimits};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitTest {
    pub name: String,
    pub expression: Expression,
}

/// A named logic expression with optional self-validation and unit tests
#[derive(Debug, Clone, PartialEq)]
pub struct LogicRule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub severity: Severity,
    /// Rulesets this rule belongs to; used by eligibility predicates
    pub philosophies: Vec<String>,
    pub logic: Expression,
    pub self_validation: Option<Expression>,
    pub unit_tests: Vec<UnitTest>,
}

impl LogicRule {
    pub fn new(id: impl Into<String>, logic: Expression) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            category: String::new(),
            severity: Severity::default(),
            philosophies: Vec::new(),
            logic,
            self_validation: None,
            unit_tests: Vec::new(),
        }
    }

    pub fn with_self_validation(mut self, expression: Expression) -> Self {
        self.self_validation = Some(expression);
        self
    }

    pub fn with_unit_test(mut self, name: impl Into<String>, expression: Expression) -> Self {
        self.unit_tests.push(UnitTest {
            name: name.into(),
            expression,
        });
        self
    }

    /// Every function called by the logic, the self-validation or a test
    pub fn called_functions(&self) -> BTreeSet<String> {
        let mut names = self.logic.called_functions();
        if let Some(validation) = &self.self_validation {
            names.extend(validation.called_functions());
        }
        for test in &self.unit_tests {
            names.extend(test.expression.called_functions());
        }
        names
    }
}

/// Where the executor obtains rules from
pub trait RuleSource {
    fn load_rule(&self, id: &str) -> LogicResult<Arc<LogicRule>>;

    /// Identifiers of every available rule, in a stable order
    fn rule_ids(&self) -> Vec<String>;
}

/// Expression field of a rule document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionSource {
    Text(String),
    Tree(Expression),
}

impl ExpressionSource {
    pub fn into_expression(self, source_id: &str, limits: &ResourceLimits) -> LogicResult<Expression> {
        match self {
            ExpressionSource::Text(text) => parse_expression(&text, source_id, limits),
            ExpressionSource::Tree(tree) => {
                tree.validate()?;
                Ok(tree)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnitTestDocument {
    Named { name: String, test: ExpressionSource },
    Bare(ExpressionSource),
}

/// Storage shape of a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDocument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub philosophies: Vec<String>,
    pub logic: ExpressionSource,
    #[serde(default)]
    pub self_validation: Option<ExpressionSource>,
    #[serde(default)]
    pub unit_tests: Vec<UnitTestDocument>,
}

impl RuleDocument {
    pub fn into_rule(self, source_id: &str, limits: &ResourceLimits) -> LogicResult<LogicRule> {
        if self.id.trim().is_empty() {
            return Err(LogicError::Load(format!("{}: rule without an id", source_id)));
        }
        let field = |name: &str| format!("{}#{}.{}", source_id, self.id, name);

        let logic = self.logic.into_expression(&field("logic"), limits)?;
        let self_validation = self
            .self_validation
            .map(|source| source.into_expression(&field("self_validation"), limits))
            .transpose()?;

        let mut unit_tests = Vec::with_capacity(self.unit_tests.len());
        for (index, test) in self.unit_tests.into_iter().enumerate() {
            let (name, source) = match test {
                UnitTestDocument::Named { name, test } => (name, test),
                UnitTestDocument::Bare(source) => (format!("test_{}", index + 1), source),
            };
            let expression = source.into_expression(&field(&format!("unit_tests[{}]", index)), limits)?;
            unit_tests.push(UnitTest { name, expression });
        }

        Ok(LogicRule {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            id: self.id,
            description: self.description,
            category: self.category,
            severity: self.severity,
            philosophies: self.philosophies,
            logic,
            self_validation,
            unit_tests,
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RuleDocument>),
    One(Box<RuleDocument>),
}

/// In-memory rule source keyed by rule id
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: BTreeMap<String, Arc<LogicRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str, source_id: &str, limits: &ResourceLimits) -> LogicResult<Self> {
        let mut set = Self::new();
        set.add_json(text, source_id, limits)?;
        Ok(set)
    }

    /// Load one document or an array of documents. Nothing is added unless
    /// every document in `text` loads.
    pub fn add_json(
        &mut self,
        text: &str,
        source_id: &str,
        limits: &ResourceLimits,
    ) -> LogicResult<Vec<String>> {
        let documents = match serde_json::from_str::<OneOrMany>(text)
            .map_err(|e| LogicError::Load(format!("{}: {}", source_id, e)))?
        {
            OneOrMany::Many(documents) => documents,
            OneOrMany::One(document) => vec![*document],
        };

        let mut loaded = Vec::with_capacity(documents.len());
        for document in documents {
            let rule = document.into_rule(source_id, limits)?;
            if self.rules.contains_key(&rule.id) || loaded.iter().any(|r: &LogicRule| r.id == rule.id) {
                return Err(LogicError::Load(format!(
                    "{}: duplicate rule id '{}'",
                    source_id, rule.id
                )));
            }
            loaded.push(rule);
        }

        let ids = loaded.iter().map(|rule| rule.id.clone()).collect();
        for rule in loaded {
            self.rules.insert(rule.id.clone(), Arc::new(rule));
        }
        Ok(ids)
    }

    pub fn insert(&mut self, rule: LogicRule) -> LogicResult<()> {
        if self.rules.contains_key(&rule.id) {
            return Err(LogicError::Load(format!("duplicate rule id '{}'", rule.id)));
        }
        self.rules.insert(rule.id.clone(), Arc::new(rule));
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<LogicRule>> {
        self.rules.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LogicRule>> {
        self.rules.values()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleSource for RuleSet {
    fn load_rule(&self, id: &str) -> LogicResult<Arc<LogicRule>> {
        self.rules
            .get(id)
            .cloned()
            .ok_or_else(|| LogicError::Load(format!("unknown rule '{}'", id)))
    }

    fn rule_ids(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }
}
