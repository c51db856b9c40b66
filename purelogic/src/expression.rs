//! Expression trees
//!
//! Trees are immutable once built. Every node carries an `ExpressionId`
//! computed bottom-up from its structure, so structurally equal trees share an
//! id no matter where they came from (parser, JSON, quoting).
//!
//! The serialized form is internally tagged on `kind`:
//!
//! ```json
//! {"kind": "operator", "op": "lt", "operands": [
//!     {"kind": "variable", "name": "x"},
//!     {"kind": "literal", "value": 10}
//! ]}
//! ```

use crate::ast::ExpressionId;
use crate::fingerprint::StableHasher;
use crate::{LogicError, LogicResult, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::Hasher;

/// An immutable expression node
#[derive(Debug, Clone)]
pub struct Expression {
    id: ExpressionId,
    kind: ExpressionKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpressionKind {
    Literal {
        value: Value,
    },
    Variable {
        name: String,
    },
    Operator {
        op: Operator,
        operands: Vec<Expression>,
    },
    Call {
        function: String,
        #[serde(default)]
        args: Vec<Expression>,
    },
    Quantifier {
        quantifier: QuantifierKind,
        variable: String,
        domain: Box<Expression>,
        body: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then: Box<Expression>,
        #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<Expression>>,
    },
    Fixpoint {
        variable: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial: Option<Box<Expression>>,
        step: Box<Expression>,
    },
    Block {
        statements: Vec<Statement>,
    },
    /// Collection constructor; elements are evaluated in order
    Collection {
        elements: Vec<Expression>,
    },
    /// Object constructor
    Object {
        fields: BTreeMap<String, Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Statement {
    /// Bind a variable in the enclosing block's scope
    Let { variable: String, value: Expression },
    Eval { expression: Expression },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantifierKind {
    Forall,
    Exists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    And,
    Or,
    Not,
    Implies,
    Iff,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Neg,
    In,
    Index,
}

impl Operator {
    /// Minimum and maximum operand count
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Operator::And | Operator::Or => (1, None),
            Operator::Not | Operator::Neg => (1, Some(1)),
            _ => (2, Some(2)),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Implies => "implies",
            Operator::Iff => "iff",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "**",
            Operator::Neg => "-",
            Operator::In => "in",
            Operator::Index => "[]",
        }
    }
}

impl fmt::Display for QuantifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantifierKind::Forall => write!(f, "forall"),
            QuantifierKind::Exists => write!(f, "exists"),
        }
    }
}

/// Node kind without payload, used by the tracer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Literal,
    Variable,
    Operator,
    Call,
    Quantifier,
    Conditional,
    Fixpoint,
    Block,
    Collection,
    Object,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Literal => "literal",
            NodeKind::Variable => "variable",
            NodeKind::Operator => "operator",
            NodeKind::Call => "call",
            NodeKind::Quantifier => "quantifier",
            NodeKind::Conditional => "conditional",
            NodeKind::Fixpoint => "fixpoint",
            NodeKind::Block => "block",
            NodeKind::Collection => "collection",
            NodeKind::Object => "object",
        };
        f.write_str(name)
    }
}

impl Expression {
    pub fn new(kind: ExpressionKind) -> Self {
        let id = structural_id(&kind);
        Self { id, kind }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(ExpressionKind::Literal {
            value: value.into(),
        })
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ExpressionKind::Variable { name: name.into() })
    }

    pub fn operator(op: Operator, operands: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Operator { op, operands })
    }

    pub fn binary(op: Operator, left: Expression, right: Expression) -> Self {
        Self::operator(op, vec![left, right])
    }

    pub fn unary(op: Operator, operand: Expression) -> Self {
        Self::operator(op, vec![operand])
    }

    pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Call {
            function: function.into(),
            args,
        })
    }

    pub fn quantifier(
        quantifier: QuantifierKind,
        variable: impl Into<String>,
        domain: Expression,
        body: Expression,
    ) -> Self {
        Self::new(ExpressionKind::Quantifier {
            quantifier,
            variable: variable.into(),
            domain: Box::new(domain),
            body: Box::new(body),
        })
    }

    pub fn forall(variable: impl Into<String>, domain: Expression, body: Expression) -> Self {
        Self::quantifier(QuantifierKind::Forall, variable, domain, body)
    }

    pub fn exists(variable: impl Into<String>, domain: Expression, body: Expression) -> Self {
        Self::quantifier(QuantifierKind::Exists, variable, domain, body)
    }

    pub fn conditional(
        condition: Expression,
        then: Expression,
        otherwise: Option<Expression>,
    ) -> Self {
        Self::new(ExpressionKind::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: otherwise.map(Box::new),
        })
    }

    pub fn fixpoint(
        variable: impl Into<String>,
        initial: Option<Expression>,
        step: Expression,
    ) -> Self {
        Self::new(ExpressionKind::Fixpoint {
            variable: variable.into(),
            initial: initial.map(Box::new),
            step: Box::new(step),
        })
    }

    pub fn block(statements: Vec<Statement>) -> Self {
        Self::new(ExpressionKind::Block { statements })
    }

    pub fn collection(elements: Vec<Expression>) -> Self {
        Self::new(ExpressionKind::Collection { elements })
    }

    pub fn object(fields: BTreeMap<String, Expression>) -> Self {
        Self::new(ExpressionKind::Object { fields })
    }

    pub fn id(&self) -> ExpressionId {
        self.id
    }

    pub fn kind(&self) -> &ExpressionKind {
        &self.kind
    }

    pub fn into_kind(self) -> ExpressionKind {
        self.kind
    }

    pub fn node_kind(&self) -> NodeKind {
        match &self.kind {
            ExpressionKind::Literal { .. } => NodeKind::Literal,
            ExpressionKind::Variable { .. } => NodeKind::Variable,
            ExpressionKind::Operator { .. } => NodeKind::Operator,
            ExpressionKind::Call { .. } => NodeKind::Call,
            ExpressionKind::Quantifier { .. } => NodeKind::Quantifier,
            ExpressionKind::Conditional { .. } => NodeKind::Conditional,
            ExpressionKind::Fixpoint { .. } => NodeKind::Fixpoint,
            ExpressionKind::Block { .. } => NodeKind::Block,
            ExpressionKind::Collection { .. } => NodeKind::Collection,
            ExpressionKind::Object { .. } => NodeKind::Object,
        }
    }

    /// Direct children in evaluation order
    pub fn children(&self) -> Vec<&Expression> {
        match &self.kind {
            ExpressionKind::Literal { .. } | ExpressionKind::Variable { .. } => Vec::new(),
            ExpressionKind::Operator { operands, .. } => operands.iter().collect(),
            ExpressionKind::Call { args, .. } => args.iter().collect(),
            ExpressionKind::Quantifier { domain, body, .. } => vec![domain.as_ref(), body.as_ref()],
            ExpressionKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                let mut children = vec![condition.as_ref(), then.as_ref()];
                children.extend(otherwise.as_deref());
                children
            }
            ExpressionKind::Fixpoint { initial, step, .. } => {
                let mut children: Vec<&Expression> = initial.as_deref().into_iter().collect();
                children.push(step.as_ref());
                children
            }
            ExpressionKind::Block { statements } => statements
                .iter()
                .map(|statement| match statement {
                    Statement::Let { value, .. } => value,
                    Statement::Eval { expression } => expression,
                })
                .collect(),
            ExpressionKind::Collection { elements } => elements.iter().collect(),
            ExpressionKind::Object { fields } => fields.values().collect(),
        }
    }

    /// Nesting depth; a leaf has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expression::depth)
            .max()
            .unwrap_or(0)
    }

    /// Check the structural invariants serde cannot express
    pub fn validate(&self) -> LogicResult<()> {
        match &self.kind {
            ExpressionKind::Operator { op, operands } => {
                let (min, max) = op.arity();
                if operands.len() < min || max.is_some_and(|max| operands.len() > max) {
                    return Err(LogicError::MalformedExpression(format!(
                        "operator '{}' given {} operand(s)",
                        op.symbol(),
                        operands.len()
                    )));
                }
            }
            ExpressionKind::Variable { name } if name.is_empty() => {
                return Err(LogicError::MalformedExpression(
                    "variable with empty name".to_string(),
                ));
            }
            ExpressionKind::Call { function, .. } if function.is_empty() => {
                return Err(LogicError::MalformedExpression(
                    "call with empty function name".to_string(),
                ));
            }
            ExpressionKind::Quantifier { variable, .. }
            | ExpressionKind::Fixpoint { variable, .. }
                if variable.is_empty() =>
            {
                return Err(LogicError::MalformedExpression(
                    "binder with empty variable name".to_string(),
                ));
            }
            _ => {}
        }
        self.children()
            .into_iter()
            .try_for_each(Expression::validate)
    }

    /// Variables referenced but not bound inside this expression
    pub fn free_variables(&self) -> BTreeSet<String> {
        let mut free = BTreeSet::new();
        collect_free(self, &mut Vec::new(), &mut free);
        free
    }

    /// Names of every function called anywhere in this expression
    pub fn called_functions(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_calls(&mut names);
        names
    }

    fn collect_calls(&self, names: &mut BTreeSet<String>) {
        if let ExpressionKind::Call { function, .. } = &self.kind {
            names.insert(function.clone());
        }
        for child in self.children() {
            child.collect_calls(names);
        }
    }

    /// Replace free occurrences of `name` with `replacement`.
    ///
    /// Substitution stops at binders that rebind `name`.
    pub fn substitute(&self, name: &str, replacement: &Expression) -> Expression {
        let sub = |e: &Expression| e.substitute(name, replacement);
        let sub_box = |e: &Expression| Box::new(e.substitute(name, replacement));
        match &self.kind {
            ExpressionKind::Variable { name: var } if var == name => replacement.clone(),
            ExpressionKind::Literal { .. } | ExpressionKind::Variable { .. } => self.clone(),
            ExpressionKind::Operator { op, operands } => {
                Expression::operator(*op, operands.iter().map(sub).collect())
            }
            ExpressionKind::Call { function, args } => {
                Expression::call(function.clone(), args.iter().map(sub).collect())
            }
            ExpressionKind::Quantifier {
                quantifier,
                variable,
                domain,
                body,
            } => {
                let body = if variable == name {
                    body.as_ref().clone()
                } else {
                    sub(body.as_ref())
                };
                Expression::quantifier(*quantifier, variable.clone(), sub(domain.as_ref()), body)
            }
            ExpressionKind::Conditional {
                condition,
                then,
                otherwise,
            } => Expression::new(ExpressionKind::Conditional {
                condition: sub_box(condition.as_ref()),
                then: sub_box(then.as_ref()),
                otherwise: otherwise.as_deref().map(sub_box),
            }),
            ExpressionKind::Fixpoint {
                variable,
                initial,
                step,
            } => {
                let step = if variable == name {
                    step.as_ref().clone()
                } else {
                    sub(step.as_ref())
                };
                Expression::fixpoint(variable.clone(), initial.as_deref().map(sub), step)
            }
            ExpressionKind::Block { statements } => {
                let mut shadowed = false;
                let statements = statements
                    .iter()
                    .map(|statement| match statement {
                        Statement::Let { variable, value } => {
                            let value = if shadowed { value.clone() } else { sub(value) };
                            shadowed |= variable == name;
                            Statement::Let {
                                variable: variable.clone(),
                                value,
                            }
                        }
                        Statement::Eval { expression } => Statement::Eval {
                            expression: if shadowed {
                                expression.clone()
                            } else {
                                sub(expression)
                            },
                        },
                    })
                    .collect();
                Expression::block(statements)
            }
            ExpressionKind::Collection { elements } => {
                Expression::collection(elements.iter().map(sub).collect())
            }
            ExpressionKind::Object { fields } => Expression::object(
                fields.iter().map(|(k, v)| (k.clone(), sub(v))).collect(),
            ),
        }
    }

    /// Quote this expression as a Value (its canonical data form)
    pub fn to_value(&self) -> LogicResult<Value> {
        serde_json::to_value(self)
            .and_then(serde_json::from_value)
            .map_err(|e| LogicError::MalformedExpression(format!("cannot quote expression: {}", e)))
    }

    /// Rebuild an expression from its quoted Value form
    pub fn from_value(value: &Value) -> LogicResult<Expression> {
        let expression: Expression = serde_json::to_value(value)
            .and_then(serde_json::from_value)
            .map_err(|e| LogicError::MalformedExpression(e.to_string()))?;
        expression.validate()?;
        Ok(expression)
    }

    /// Parse the JSON tree form
    pub fn from_json(text: &str) -> LogicResult<Expression> {
        let expression: Expression = serde_json::from_str(text)
            .map_err(|e| LogicError::MalformedExpression(e.to_string()))?;
        expression.validate()?;
        Ok(expression)
    }

    /// Canonical JSON text; object keys are sorted, so equal trees print equally
    pub fn to_canonical_json(&self) -> LogicResult<String> {
        let value = self.to_value()?;
        serde_json::to_string(&value)
            .map_err(|e| LogicError::MalformedExpression(format!("cannot serialize: {}", e)))
    }
}

fn collect_free(expr: &Expression, bound: &mut Vec<String>, free: &mut BTreeSet<String>) {
    match &expr.kind {
        ExpressionKind::Variable { name } => {
            if !bound.iter().any(|b| b == name) {
                free.insert(name.clone());
            }
        }
        ExpressionKind::Quantifier {
            variable,
            domain,
            body,
            ..
        } => {
            collect_free(domain, bound, free);
            bound.push(variable.clone());
            collect_free(body, bound, free);
            bound.pop();
        }
        ExpressionKind::Fixpoint {
            variable,
            initial,
            step,
        } => {
            if let Some(initial) = initial {
                collect_free(initial, bound, free);
            }
            bound.push(variable.clone());
            collect_free(step, bound, free);
            bound.pop();
        }
        ExpressionKind::Block { statements } => {
            let mark = bound.len();
            for statement in statements {
                match statement {
                    Statement::Let { variable, value } => {
                        collect_free(value, bound, free);
                        bound.push(variable.clone());
                    }
                    Statement::Eval { expression } => collect_free(expression, bound, free),
                }
            }
            bound.truncate(mark);
        }
        _ => {
            for child in expr.children() {
                collect_free(child, bound, free);
            }
        }
    }
}

fn structural_id(kind: &ExpressionKind) -> ExpressionId {
    let mut h = StableHasher::new();
    let child = |h: &mut StableHasher, e: &Expression| h.write_le_u64(e.id.as_u64());
    match kind {
        ExpressionKind::Literal { value } => {
            h.write_le_u64(1);
            value.hash_into(&mut h);
        }
        ExpressionKind::Variable { name } => h.write_tagged_str(2, name),
        ExpressionKind::Operator { op, operands } => {
            h.write_tagged_str(3, op.symbol());
            // `-` is both Sub and Neg; arity separates them
            h.write_le_u64(operands.len() as u64);
            for operand in operands {
                child(&mut h, operand);
            }
        }
        ExpressionKind::Call { function, args } => {
            h.write_tagged_str(4, function);
            h.write_le_u64(args.len() as u64);
            for arg in args {
                child(&mut h, arg);
            }
        }
        ExpressionKind::Quantifier {
            quantifier,
            variable,
            domain,
            body,
        } => {
            h.write_le_u64(5);
            h.write_le_u64(match quantifier {
                QuantifierKind::Forall => 0,
                QuantifierKind::Exists => 1,
            });
            h.write_tagged_str(5, variable);
            child(&mut h, domain);
            child(&mut h, body);
        }
        ExpressionKind::Conditional {
            condition,
            then,
            otherwise,
        } => {
            h.write_le_u64(6);
            child(&mut h, condition);
            child(&mut h, then);
            match otherwise {
                Some(otherwise) => child(&mut h, otherwise),
                None => h.write_le_u64(0),
            }
        }
        ExpressionKind::Fixpoint {
            variable,
            initial,
            step,
        } => {
            h.write_tagged_str(7, variable);
            match initial {
                Some(initial) => {
                    h.write_le_u64(1);
                    child(&mut h, initial);
                }
                None => h.write_le_u64(0),
            }
            child(&mut h, step);
        }
        ExpressionKind::Block { statements } => {
            h.write_le_u64(8);
            h.write_le_u64(statements.len() as u64);
            for statement in statements {
                match statement {
                    Statement::Let { variable, value } => {
                        h.write_tagged_str(9, variable);
                        child(&mut h, value);
                    }
                    Statement::Eval { expression } => {
                        h.write_le_u64(10);
                        child(&mut h, expression);
                    }
                }
            }
        }
        ExpressionKind::Collection { elements } => {
            h.write_le_u64(11);
            h.write_le_u64(elements.len() as u64);
            for element in elements {
                child(&mut h, element);
            }
        }
        ExpressionKind::Object { fields } => {
            h.write_le_u64(12);
            h.write_le_u64(fields.len() as u64);
            for (key, value) in fields {
                h.write_tagged_str(13, key);
                child(&mut h, value);
            }
        }
    }
    ExpressionId::new(h.finish())
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.kind.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ExpressionKind::deserialize(deserializer).map(Expression::new)
    }
}

impl From<ExpressionKind> for Expression {
    fn from(kind: ExpressionKind) -> Self {
        Expression::new(kind)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Literal { value } => write!(f, "{}", value),
            ExpressionKind::Variable { name } => write!(f, "{}", name),
            ExpressionKind::Operator { op, operands } => match (op, operands.as_slice()) {
                (Operator::Not, [operand]) => write!(f, "(not {})", operand),
                (Operator::Neg, [operand]) => write!(f, "(-{})", operand),
                (Operator::Index, [target, index]) => write!(f, "{}[{}]", target, index),
                _ => {
                    write!(f, "(")?;
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            write!(f, " {} ", op.symbol())?;
                        }
                        write!(f, "{}", operand)?;
                    }
                    write!(f, ")")
                }
            },
            ExpressionKind::Call { function, args } => {
                write!(f, "{}(", function)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            ExpressionKind::Quantifier {
                quantifier,
                variable,
                domain,
                body,
            } => write!(f, "({} {} in {}: {})", quantifier, variable, domain, body),
            ExpressionKind::Conditional {
                condition,
                then,
                otherwise,
            } => {
                write!(f, "(if {} then {}", condition, then)?;
                if let Some(otherwise) = otherwise {
                    write!(f, " else {}", otherwise)?;
                }
                write!(f, ")")
            }
            ExpressionKind::Fixpoint {
                variable,
                initial,
                step,
            } => {
                write!(f, "(fixpoint {}", variable)?;
                if let Some(initial) = initial {
                    write!(f, " from {}", initial)?;
                }
                write!(f, ": {})", step)
            }
            ExpressionKind::Block { statements } => {
                write!(f, "{{ ")?;
                for (i, statement) in statements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    match statement {
                        Statement::Let { variable, value } => {
                            write!(f, "let {} = {}", variable, value)?
                        }
                        Statement::Eval { expression } => write!(f, "{}", expression)?,
                    }
                }
                write!(f, " }}")
            }
            ExpressionKind::Collection { elements } => {
                write!(f, "[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            ExpressionKind::Object { fields } => {
                write!(f, "{{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
