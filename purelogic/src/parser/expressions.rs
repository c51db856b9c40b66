use crate::ast::Span;
use crate::error::LogicError;
use crate::expression::{Operator, QuantifierKind, Statement};
use crate::parser::literals::{parse_literal, unescape};
use crate::parser::Rule;
use crate::{Expression, Value};
use pest::iterators::Pair;
use std::collections::BTreeMap;
use std::sync::Arc;

type ParseResult<T> = Result<T, LogicError>;

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_in
            | Rule::kw_fixpoint
            | Rule::kw_from
            | Rule::kw_if
            | Rule::kw_then
            | Rule::kw_else
            | Rule::kw_let
            | Rule::kw_quote
    )
}

/// Significant children of a pair, keywords dropped
fn children<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule()))
}

/// Walks pest pairs into expression trees, keeping enough source context to
/// report errors with a location
pub struct Builder {
    source_id: String,
    source_text: Arc<str>,
    max_depth: usize,
    depth: usize,
}

impl Builder {
    pub fn new(source_id: &str, source_text: Arc<str>, max_depth: usize) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_text,
            max_depth,
            depth: 0,
        }
    }

    fn error(&self, message: impl Into<String>, pair: &Pair<Rule>) -> LogicError {
        LogicError::parse(
            message,
            Span::from_pest_span(pair.as_span()),
            self.source_id.clone(),
            Arc::clone(&self.source_text),
        )
    }

    fn next<'i>(
        &self,
        parent: &Pair<'i, Rule>,
        iter: &mut impl Iterator<Item = Pair<'i, Rule>>,
        what: &str,
    ) -> ParseResult<Pair<'i, Rule>> {
        iter.next()
            .ok_or_else(|| self.error(format!("Expected {}", what), parent))
    }

    /// Build any expression-level pair. Only full `expression` pairs count
    /// towards the nesting limit; precedence levels do not.
    pub fn expression(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        if pair.as_rule() != Rule::expression {
            return self.dispatch(pair);
        }
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(LogicError::ResourceLimitExceeded {
                limit_name: "max_expression_depth".to_string(),
                limit_value: self.max_depth.to_string(),
                actual_value: self.depth.to_string(),
                suggestion: "Simplify the expression or break it into helper functions"
                    .to_string(),
            });
        }
        let result = self.dispatch(pair);
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        match pair.as_rule() {
            Rule::expression => {
                let outer = pair.clone();
                let inner = self.next(&outer, &mut pair.into_inner(), "expression")?;
                self.dispatch(inner)
            }
            Rule::quantifier => self.quantifier(pair),
            Rule::fixpoint => self.fixpoint(pair),
            Rule::conditional => self.conditional(pair),
            Rule::implication => self.implication(pair),
            Rule::iff_expr => self.left_chain(pair),
            Rule::or_expr => self.n_ary(pair, Operator::Or),
            Rule::and_expr => self.n_ary(pair, Operator::And),
            Rule::not_expr => self.not_expr(pair),
            Rule::comparison | Rule::sum | Rule::product => self.left_chain(pair),
            Rule::power => self.power(pair),
            Rule::unary => self.unary(pair),
            Rule::postfix => self.postfix(pair),
            Rule::primary => self.primary(pair),
            other => Err(self.error(format!("Unexpected {:?}", other), &pair)),
        }
    }

    fn quantifier(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut inner = children(pair);
        let kind = self.next(&outer, &mut inner, "forall or exists")?;
        let quantifier = if kind.as_str().starts_with("exists") || kind.as_str() == "∃" {
            QuantifierKind::Exists
        } else {
            QuantifierKind::Forall
        };
        let variable = self.next(&outer, &mut inner, "bound variable")?;
        let domain = self.next(&outer, &mut inner, "domain")?;
        let body = self.next(&outer, &mut inner, "body")?;
        Ok(Expression::quantifier(
            quantifier,
            variable.as_str(),
            self.expression(domain)?,
            self.expression(body)?,
        ))
    }

    fn fixpoint(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut variable = None;
        let mut initial = None;
        let mut step = None;
        for part in children(pair) {
            match part.as_rule() {
                Rule::identifier => variable = Some(part.as_str().to_string()),
                Rule::fixpoint_from => {
                    let from = part.clone();
                    let seed = self.next(&from, &mut children(part), "initial value")?;
                    initial = Some(self.expression(seed)?);
                }
                Rule::expression => step = Some(self.expression(part)?),
                _ => {}
            }
        }
        match (variable, step) {
            (Some(variable), Some(step)) => Ok(Expression::fixpoint(variable, initial, step)),
            _ => Err(self.error("Fixpoint needs a variable and a step", &outer)),
        }
    }

    fn conditional(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut inner = children(pair);
        let condition = self.next(&outer, &mut inner, "condition")?;
        let then = self.next(&outer, &mut inner, "then branch")?;
        let otherwise = match inner.next() {
            Some(branch) => {
                let else_pair = branch.clone();
                let body = self.next(&else_pair, &mut children(branch), "else branch")?;
                Some(self.expression(body)?)
            }
            None => None,
        };
        Ok(Expression::conditional(
            self.expression(condition)?,
            self.expression(then)?,
            otherwise,
        ))
    }

    /// `a -> b -> c` groups as `a -> (b -> c)`
    fn implication(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let mut operands = Vec::new();
        for part in pair.into_inner() {
            if part.as_rule() != Rule::implies_op {
                operands.push(self.expression(part)?);
            }
        }
        let mut result = operands
            .pop()
            .ok_or_else(|| LogicError::MalformedExpression("empty implication".to_string()))?;
        while let Some(antecedent) = operands.pop() {
            result = Expression::binary(Operator::Implies, antecedent, result);
        }
        Ok(result)
    }

    /// Connectives with any number of operands collapse into one n-ary node
    fn n_ary(&mut self, pair: Pair<Rule>, op: Operator) -> ParseResult<Expression> {
        let mut operands = Vec::new();
        for part in pair.into_inner() {
            if !matches!(part.as_rule(), Rule::or_op | Rule::and_op) {
                operands.push(self.expression(part)?);
            }
        }
        if operands.len() == 1 {
            return operands
                .pop()
                .ok_or_else(|| LogicError::MalformedExpression("empty operand list".to_string()));
        }
        Ok(Expression::operator(op, operands))
    }

    /// Left-associative binary chains: iff, comparison, sum, product
    fn left_chain(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut inner = pair.into_inner();
        let first = self.next(&outer, &mut inner, "operand")?;
        let mut result = self.expression(first)?;
        while let Some(op_pair) = inner.next() {
            let op = self.binary_operator(&op_pair)?;
            let operand = self.next(&outer, &mut inner, "right operand")?;
            result = Expression::binary(op, result, self.expression(operand)?);
        }
        Ok(result)
    }

    fn binary_operator(&self, pair: &Pair<Rule>) -> ParseResult<Operator> {
        let text = pair.as_str().trim();
        let op = match (pair.as_rule(), text) {
            (Rule::iff_op, _) => Operator::Iff,
            (Rule::comparison_op, "==") => Operator::Eq,
            (Rule::comparison_op, "!=") => Operator::Ne,
            (Rule::comparison_op, "<=") => Operator::Le,
            (Rule::comparison_op, ">=") => Operator::Ge,
            (Rule::comparison_op, "<") => Operator::Lt,
            (Rule::comparison_op, ">") => Operator::Gt,
            (Rule::comparison_op, "in") => Operator::In,
            (Rule::sum_op, "+") => Operator::Add,
            (Rule::sum_op, "-") => Operator::Sub,
            (Rule::product_op, "*") => Operator::Mul,
            (Rule::product_op, "/") => Operator::Div,
            (Rule::product_op, "%") => Operator::Mod,
            _ => return Err(self.error(format!("Unknown operator '{}'", text), pair)),
        };
        Ok(op)
    }

    fn not_expr(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut inner = pair.into_inner();
        let first = self.next(&outer, &mut inner, "operand")?;
        if first.as_rule() == Rule::not_op {
            let operand = self.next(&outer, &mut inner, "operand of not")?;
            return Ok(Expression::unary(Operator::Not, self.expression(operand)?));
        }
        self.expression(first)
    }

    /// `**` is right-associative
    fn power(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::pow_op);
        let base = self.next(&outer, &mut inner, "base")?;
        let base = self.expression(base)?;
        match inner.next() {
            Some(exponent) => Ok(Expression::binary(
                Operator::Pow,
                base,
                self.expression(exponent)?,
            )),
            None => Ok(base),
        }
    }

    /// Negation of a numeric literal folds into the literal
    fn unary(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut inner = pair.into_inner();
        let first = self.next(&outer, &mut inner, "operand")?;
        if first.as_rule() != Rule::neg_op {
            return self.expression(first);
        }
        let operand = self.next(&outer, &mut inner, "operand of -")?;
        // The sign belongs to the digits, so i64::MIN is writable
        if let Some(digits) = bare_integer(&operand) {
            let negative = format!("-{}", digits);
            return match negative.parse::<i64>() {
                Ok(i) => Ok(Expression::literal(i)),
                Err(_) => Err(self.error(
                    format!("Integer literal '{}' is out of range", negative),
                    &operand,
                )),
            };
        }
        let operand = self.expression(operand)?;
        let folded = match operand.kind() {
            crate::expression::ExpressionKind::Literal {
                value: Value::Integer(i),
            } => i.checked_neg().map(Expression::literal),
            crate::expression::ExpressionKind::Literal {
                value: Value::Float(f),
            } => Some(Expression::literal(-f)),
            _ => None,
        };
        Ok(folded.unwrap_or_else(|| Expression::unary(Operator::Neg, operand)))
    }

    /// `x[i]` and `x.field` both become index nodes
    fn postfix(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let mut inner = pair.into_inner();
        let first = self.next(&outer, &mut inner, "operand")?;
        let mut result = self.expression(first)?;
        for suffix in inner {
            let suffix_pair = suffix.clone();
            let index = self.next(&suffix_pair, &mut suffix.into_inner(), "index")?;
            let index = match suffix_pair.as_rule() {
                Rule::field_suffix => Expression::literal(index.as_str()),
                _ => self.expression(index)?,
            };
            result = Expression::binary(Operator::Index, result, index);
        }
        Ok(result)
    }

    fn primary(&mut self, pair: Pair<Rule>) -> ParseResult<Expression> {
        let outer = pair.clone();
        let inner = self.next(&outer, &mut pair.into_inner(), "operand")?;
        match inner.as_rule() {
            Rule::literal => {
                let literal = self.next(&outer, &mut inner.into_inner(), "literal")?;
                let value = parse_literal(literal.clone()).map_err(|m| self.error(m, &literal))?;
                Ok(Expression::literal(value))
            }
            Rule::identifier => Ok(Expression::variable(inner.as_str())),
            Rule::expression => self.expression(inner),
            Rule::quote => {
                let quoted_pair = inner.clone();
                let body = self.next(&quoted_pair, &mut children(inner), "quoted expression")?;
                let quoted = self.expression(body)?;
                Ok(Expression::literal(quoted.to_value()?))
            }
            Rule::call => {
                let call_pair = inner.clone();
                let mut parts = inner.into_inner();
                let name = self.next(&call_pair, &mut parts, "function name")?;
                let mut args = Vec::new();
                if let Some(arguments) = parts.next() {
                    for arg in arguments.into_inner() {
                        args.push(self.expression(arg)?);
                    }
                }
                Ok(Expression::call(name.as_str(), args))
            }
            Rule::list => {
                let mut elements = Vec::new();
                for element in inner.into_inner() {
                    elements.push(self.expression(element)?);
                }
                Ok(Expression::collection(elements))
            }
            Rule::object => {
                let mut fields = BTreeMap::new();
                for field in inner.into_inner() {
                    let field_pair = field.clone();
                    let mut parts = field.into_inner();
                    let key = self.next(&field_pair, &mut parts, "field name")?;
                    let key_text = match key.as_rule() {
                        Rule::string => unescape(key.as_str()).map_err(|m| self.error(m, &key))?,
                        _ => key.as_str().to_string(),
                    };
                    let value = self.next(&field_pair, &mut parts, "field value")?;
                    let value = self.expression(value)?;
                    if fields.insert(key_text.clone(), value).is_some() {
                        return Err(self.error(format!("Duplicate field '{}'", key_text), &field_pair));
                    }
                }
                Ok(Expression::object(fields))
            }
            Rule::block => {
                let mut statements = Vec::new();
                for item in inner.into_inner() {
                    let item_pair = item.clone();
                    let content = self.next(&item_pair, &mut item.into_inner(), "statement")?;
                    if content.as_rule() == Rule::let_statement {
                        let let_pair = content.clone();
                        let mut parts = children(content);
                        let variable = self.next(&let_pair, &mut parts, "variable")?;
                        let value = self.next(&let_pair, &mut parts, "value")?;
                        statements.push(Statement::Let {
                            variable: variable.as_str().to_string(),
                            value: self.expression(value)?,
                        });
                    } else {
                        statements.push(Statement::Eval {
                            expression: self.expression(content)?,
                        });
                    }
                }
                Ok(Expression::block(statements))
            }
            other => Err(self.error(format!("Unexpected {:?}", other), &inner)),
        }
    }
}

/// Digits of `pair` when it is nothing but an unsigned integer literal
fn bare_integer(pair: &Pair<Rule>) -> Option<String> {
    let mut current = pair.clone();
    loop {
        match current.as_rule() {
            Rule::integer => return Some(current.as_str().to_string()),
            Rule::unary | Rule::postfix | Rule::primary | Rule::literal => {
                let mut inner = current.into_inner();
                let only = inner.next()?;
                if inner.next().is_some() {
                    return None;
                }
                current = only;
            }
            _ => return None,
        }
    }
}
