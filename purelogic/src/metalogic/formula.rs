//! Gödel-style numbering of formulas
//!
//! A formula's code is derived from a stable digest of its canonical JSON
//! form. Codes are interned in a table that lives as long as the evaluator,
//! so decoding is a lookup. Entries are never removed or mutated; building a
//! self-referential formula creates a new entry.

use crate::fingerprint;
use crate::{Expression, LogicError, LogicResult};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct FormulaTable {
    formulas: HashMap<i64, Arc<Expression>>,
}

fn initial_code(canonical: &str) -> i64 {
    // Keep codes positive and leave room for probing
    let code = (fingerprint::digest(canonical.as_bytes()) >> 2) as i64;
    code.max(1)
}

impl FormulaTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code of `formula`, interning it on first sight.
    ///
    /// A digest collision with a different formula moves on to the next code, so
    /// distinct formulas always get distinct codes within one table.
    pub fn encode(&mut self, formula: &Expression) -> LogicResult<i64> {
        let canonical = formula.to_canonical_json()?;
        let mut code = initial_code(&canonical);
        loop {
            match self.formulas.get(&code) {
                Some(existing) if existing.as_ref() == formula => return Ok(code),
                Some(_) => code = code.checked_add(1).unwrap_or(1),
                None => {
                    self.formulas.insert(code, Arc::new(formula.clone()));
                    return Ok(code);
                }
            }
        }
    }

    pub fn decode(&self, code: i64) -> LogicResult<Arc<Expression>> {
        self.formulas
            .get(&code)
            .cloned()
            .ok_or_else(|| LogicError::native(format!("no formula has code {}", code)))
    }

    /// Substitute the code of `template` for the free variable `placeholder`
    /// and return the code of the resulting formula
    pub fn diagonalize(&mut self, template: &Expression, placeholder: &str) -> LogicResult<i64> {
        let code = self.encode(template)?;
        let instance = template.substitute(placeholder, &Expression::literal(code));
        self.encode(&instance)
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::Operator;

    fn sample() -> Expression {
        Expression::binary(
            Operator::Lt,
            Expression::variable("x"),
            Expression::literal(10),
        )
    }

    #[test]
    fn encoding_is_stable_across_tables() {
        let mut a = FormulaTable::new();
        let mut b = FormulaTable::new();
        assert_eq!(a.encode(&sample()).unwrap(), b.encode(&sample()).unwrap());
        assert!(a.encode(&sample()).unwrap() > 0);
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn decode_of_unknown_code_fails() {
        let table = FormulaTable::new();
        assert!(table.decode(42).is_err());
    }

    #[test]
    fn diagonalization_embeds_the_template_code() {
        let mut table = FormulaTable::new();
        let template = Expression::binary(
            Operator::Eq,
            Expression::variable("self"),
            Expression::literal(0),
        );
        let template_code = table.encode(&template).unwrap();
        let instance_code = table.diagonalize(&template, "self").unwrap();
        let instance = table.decode(instance_code).unwrap();

        assert_ne!(template_code, instance_code);
        assert!(instance.free_variables().is_empty());
        assert_eq!(
            instance.as_ref(),
            &Expression::binary(
                Operator::Eq,
                Expression::literal(template_code),
                Expression::literal(0),
            )
        );
    }
}
