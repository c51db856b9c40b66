//! Bounded consistency and provability checks
//!
//! This is a heuristic over propositional structure, not a theorem prover.
//! It saturates a set of asserted formulas with a handful of elimination
//! rules for a bounded number of rounds and then looks for the goal or for
//! an explicit contradiction. A `false` answer means "not shown", never
//! "disproved".

use crate::ast::ExpressionId;
use crate::expression::{ExpressionKind, Operator};
use crate::{Expression, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
struct KnowledgeBase {
    facts: BTreeMap<ExpressionId, Expression>,
}

impl KnowledgeBase {
    fn contains(&self, formula: &Expression) -> bool {
        self.facts
            .get(&formula.id())
            .is_some_and(|known| known == formula)
    }

    fn insert(&mut self, formula: Expression) -> bool {
        if self.contains(&formula) {
            return false;
        }
        self.facts.insert(formula.id(), formula);
        true
    }

    fn iter(&self) -> impl Iterator<Item = &Expression> {
        self.facts.values()
    }
}

fn operator(formula: &Expression) -> Option<(Operator, &[Expression])> {
    match formula.kind() {
        ExpressionKind::Operator { op, operands } => Some((*op, operands.as_slice())),
        _ => None,
    }
}

fn is_boolean(formula: &Expression, expected: bool) -> bool {
    matches!(formula.kind(), ExpressionKind::Literal { value: Value::Boolean(b) } if *b == expected)
}

fn negation(formula: &Expression) -> Expression {
    Expression::unary(Operator::Not, formula.clone())
}

fn implication(a: &Expression, b: &Expression) -> Expression {
    Expression::binary(Operator::Implies, a.clone(), b.clone())
}

/// What one elimination rule derives from `fact`, each conclusion paired
/// with the premises it used: conjunction elimination, biconditional
/// elimination, double negation and modus ponens.
fn consequences(fact: &Expression, known: &KnowledgeBase) -> Vec<(Expression, Vec<Expression>)> {
    let from_fact = |conclusion: Expression| (conclusion, vec![fact.clone()]);
    match operator(fact) {
        Some((Operator::And, parts)) => parts.iter().cloned().map(from_fact).collect(),
        Some((Operator::Iff, [a, b])) => {
            vec![from_fact(implication(a, b)), from_fact(implication(b, a))]
        }
        Some((Operator::Not, [inner])) => match operator(inner) {
            Some((Operator::Not, [innermost])) => vec![from_fact(innermost.clone())],
            _ => Vec::new(),
        },
        Some((Operator::Implies, [antecedent, consequent])) if known.contains(antecedent) => {
            vec![(consequent.clone(), vec![antecedent.clone(), fact.clone()])]
        }
        _ => Vec::new(),
    }
}

/// One saturation round. Returns the newly added formulas with their premises.
fn derive_round(known: &mut KnowledgeBase) -> Vec<(Expression, Vec<Expression>)> {
    let snapshot: &KnowledgeBase = known;
    let derived: Vec<_> = snapshot
        .iter()
        .flat_map(|fact| consequences(fact, snapshot))
        .collect();
    derived
        .into_iter()
        .filter(|(formula, _)| known.insert(formula.clone()))
        .collect()
}

fn knowledge(axioms: &[Expression]) -> KnowledgeBase {
    let mut known = KnowledgeBase::default();
    for axiom in axioms {
        known.insert(axiom.clone());
    }
    known
}

/// Saturate `axioms` for at most `max_rounds` rounds
fn saturate(axioms: &[Expression], max_rounds: usize) -> KnowledgeBase {
    let mut known = knowledge(axioms);
    for _ in 0..max_rounds {
        if derive_round(&mut known).is_empty() {
            break;
        }
    }
    known
}

fn contradicts(known: &KnowledgeBase) -> bool {
    known
        .iter()
        .any(|fact| is_boolean(fact, false) || known.contains(&negation(fact)))
}

/// Whether the formulas can be saturated without reaching `false` or a
/// formula together with its negation
pub fn consistency_check(formulas: &[Expression], max_rounds: usize) -> bool {
    !contradicts(&saturate(formulas, max_rounds))
}

/// Whether `goal` can be shown from `axioms` within the step budget
pub fn provability(goal: &Expression, axioms: &[Expression], max_rounds: usize) -> bool {
    let mut fuel = max_rounds;
    prove(goal, axioms, max_rounds, &mut fuel)
}

fn prove(goal: &Expression, axioms: &[Expression], max_rounds: usize, fuel: &mut usize) -> bool {
    if *fuel == 0 {
        return false;
    }
    *fuel -= 1;

    if is_boolean(goal, true) {
        return true;
    }
    let known = saturate(axioms, max_rounds);
    if known.contains(goal) || contradicts(&known) {
        return true;
    }

    match operator(goal) {
        Some((Operator::And, parts)) => parts
            .iter()
            .all(|part| prove(part, axioms, max_rounds, fuel)),
        Some((Operator::Or, parts)) => {
            excluded_middle(parts) || parts.iter().any(|part| prove(part, axioms, max_rounds, fuel))
        }
        Some((Operator::Implies, [antecedent, consequent])) => {
            if antecedent == consequent {
                return true;
            }
            let mut extended = axioms.to_vec();
            extended.push(antecedent.clone());
            prove(consequent, &extended, max_rounds, fuel)
        }
        Some((Operator::Iff, [a, b])) => {
            a == b
                || (prove(
                    &Expression::binary(Operator::Implies, a.clone(), b.clone()),
                    axioms,
                    max_rounds,
                    fuel,
                ) && prove(
                    &Expression::binary(Operator::Implies, b.clone(), a.clone()),
                    axioms,
                    max_rounds,
                    fuel,
                ))
        }
        Some((Operator::Not, [inner])) => {
            // A negated contradiction holds; so does the negation of anything
            // whose assertion makes the axioms inconsistent
            is_boolean(inner, false) || {
                let mut extended = axioms.to_vec();
                extended.push(inner.clone());
                !consistency_check(&extended, max_rounds)
            }
        }
        Some((Operator::Eq, [a, b])) => a == b,
        _ => false,
    }
}

/// Whether the negation of `formula` can be shown from `axioms`
pub fn refutability(formula: &Expression, axioms: &[Expression], max_rounds: usize) -> bool {
    provability(&negation(formula), axioms, max_rounds)
}

/// Whether every step is `true`, an axiom, or follows from the axioms and
/// the earlier steps by one elimination rule. An empty derivation is valid.
pub fn verify_derivation(steps: &[Expression], axioms: &[Expression]) -> bool {
    let mut known = knowledge(axioms);
    for step in steps {
        let justified = is_boolean(step, true)
            || known.contains(step)
            || known
                .iter()
                .any(|fact| consequences(fact, &known).iter().any(|(c, _)| c == step));
        if !justified {
            return false;
        }
        known.insert(step.clone());
    }
    true
}

/// Forward search for `goal` from `axioms`.
///
/// On success returns a derivation ending in the goal, listing each premise
/// before the step that uses it, so it passes [`verify_derivation`].
pub fn search_proof(goal: &Expression, axioms: &[Expression], max_rounds: usize) -> Option<Vec<Expression>> {
    let mut known = knowledge(axioms);
    let mut premises: BTreeMap<ExpressionId, Vec<Expression>> = BTreeMap::new();
    for _ in 0..max_rounds {
        if known.contains(goal) {
            break;
        }
        let added = derive_round(&mut known);
        if added.is_empty() {
            break;
        }
        for (formula, used) in added {
            premises.insert(formula.id(), used);
        }
    }
    known.contains(goal).then(|| derivation(goal, &premises))
}

/// Premises first, each formula once. Premises were known before their
/// conclusion was added, so the walk cannot cycle.
fn derivation(goal: &Expression, premises: &BTreeMap<ExpressionId, Vec<Expression>>) -> Vec<Expression> {
    let mut steps: Vec<Expression> = Vec::new();
    let mut pending = vec![(goal.clone(), false)];
    while let Some((formula, expanded)) = pending.pop() {
        if steps.contains(&formula) {
            continue;
        }
        if expanded {
            steps.push(formula);
            continue;
        }
        let used = premises.get(&formula.id()).cloned().unwrap_or_default();
        pending.push((formula, true));
        pending.extend(used.into_iter().rev().map(|premise| (premise, false)));
    }
    steps
}

/// `A or not A` among the disjuncts
fn excluded_middle(parts: &[Expression]) -> bool {
    parts.iter().any(|part| {
        let negated = negation(part);
        parts.iter().any(|other| other == &negated)
    })
}
