use crate::parser::parse;
use crate::{Context, Evaluator, Expression, LogicError, Value};

fn eval_in(evaluator: &mut Evaluator, source: &str) -> Result<Value, LogicError> {
    let expression = parse(source)?;
    evaluator.evaluate(&expression, &mut Context::new())
}

fn eval(source: &str) -> Result<Value, LogicError> {
    eval_in(&mut Evaluator::new(), source)
}

#[test]
fn test_encode_decode_round_trip() {
    let result = eval("metalogic.decode_formula(metalogic.encode_formula(quote(forall f in files: f.lines <= 500)))")
        .unwrap();
    let expected = parse("forall f in files: f.lines <= 500").unwrap();
    assert_eq!(Expression::from_value(&result).unwrap(), expected);
}

#[test]
fn test_codes_are_stable_across_evaluators() {
    let first = eval("metalogic.encode_formula(quote(a and b))").unwrap();
    let second = eval("metalogic.encode_formula(quote(a and b))").unwrap();
    assert_eq!(first, second);
    assert!(first.as_integer().unwrap() > 0);

    let other = eval("metalogic.encode_formula(quote(a or b))").unwrap();
    assert_ne!(first, other);
}

#[test]
fn test_decoding_an_unknown_code_fails() {
    match eval("metalogic.decode_formula(12345)") {
        Err(LogicError::FunctionError { function, source }) => {
            assert_eq!(function, "metalogic.decode_formula");
            assert!(matches!(*source, LogicError::Native(_)));
        }
        other => panic!("expected function error, got {:?}", other),
    }
}

#[test]
fn test_self_reference_embeds_the_template_code() {
    let mut evaluator = Evaluator::new();
    let code = eval_in(&mut evaluator, "metalogic.self_reference(quote(self == 0))")
        .unwrap()
        .as_integer()
        .unwrap();

    let template = parse("self == 0").unwrap();
    let template_code = evaluator.formulas_mut().encode(&template).unwrap();
    let instance = evaluator.formulas().decode(code).unwrap();

    assert_eq!(
        *instance,
        template.substitute("self", &Expression::literal(template_code))
    );
    assert_ne!(code, template_code);
}

#[test]
fn test_diagonalization_uses_the_named_placeholder() {
    let mut evaluator = Evaluator::new();
    let code = eval_in(&mut evaluator, r#"metalogic.diagonalization(quote(n > 0), "n")"#)
        .unwrap()
        .as_integer()
        .unwrap();
    let instance = evaluator.formulas().decode(code).unwrap();
    assert!(instance.free_variables().is_empty());

    // The instance asserts that a positive code is positive
    let holds = evaluator.evaluate(&instance, &mut Context::new()).unwrap();
    assert_eq!(holds, Value::Boolean(true));
}

#[test]
fn test_evaluate_sees_only_the_given_bindings() {
    assert_eq!(
        eval("metalogic.evaluate(quote(x * 2), {x: 21})").unwrap(),
        Value::Integer(42)
    );

    let mut evaluator = Evaluator::new();
    let mut context = Context::with_facts([("y", Value::Integer(1))]);
    let expression = parse("metalogic.evaluate(quote(y), {})").unwrap();
    match evaluator.evaluate(&expression, &mut context) {
        Err(LogicError::FunctionError { source, .. }) => {
            assert!(matches!(*source, LogicError::UnboundVariable(_)))
        }
        other => panic!("expected function error, got {:?}", other),
    }
}

#[test]
fn test_function_existence_checks() {
    assert_eq!(eval(r#"logic.has_function("math.add")"#).unwrap(), Value::Boolean(true));
    assert_eq!(eval(r#"logic.has_function("math.nope")"#).unwrap(), Value::Boolean(false));
    assert_eq!(
        eval("logic.all_functions_exist(quote(math.add(1, nope(2))))").unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(
        eval(r#"logic.all_functions_exist(["math.add", "string.length"])"#).unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_well_formedness() {
    assert_eq!(eval("metalogic.is_well_formed(quote(1 + 1))").unwrap(), Value::Boolean(true));
    assert_eq!(eval(r#"metalogic.is_well_formed({kind: "bogus"})"#).unwrap(), Value::Boolean(false));
    assert_eq!(eval("logic.is_well_formed(5)").unwrap(), Value::Boolean(false));
    assert_eq!(
        eval(r#"metalogic.is_well_formed({kind: "operator", op: "not", operands: []})"#).unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_structural_queries() {
    assert_eq!(
        eval("metalogic.free_variables(quote(forall x in xs: x > y))").unwrap(),
        Value::collection(["xs", "y"].map(Value::from))
    );
    assert_eq!(
        eval("metalogic.called_functions(quote(string.length(a) + math.abs(b)))").unwrap(),
        Value::collection(["math.abs", "string.length"].map(Value::from))
    );
    assert_eq!(
        eval(r#"metalogic.evaluate(metalogic.substitute(quote(x + 1), "x", 41), {})"#).unwrap(),
        Value::Integer(42)
    );
}

#[test]
fn test_substitution_respects_binders() {
    let formula = parse("x + (forall x in [1]: x > 0)").unwrap();
    let substituted = formula.substitute("x", &Expression::literal(7));
    assert_eq!(
        substituted,
        parse("7 + (forall x in [1]: x > 0)").unwrap()
    );
}

#[test]
fn test_consistency_check() {
    assert_eq!(
        eval("metalogic.consistency_check([quote(p), quote(p -> q)])").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        eval("metalogic.consistency_check([quote(p), quote(p -> q), quote(not q)])").unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_provability() {
    assert_eq!(
        eval("metalogic.provability(quote(q), [quote(p), quote(p -> q)])").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        eval("metalogic.provability(quote(r), [quote(p), quote(p -> q)])").unwrap(),
        Value::Boolean(false)
    );
    assert_eq!(
        eval("metalogic.provability(quote(a or not a), [])").unwrap(),
        Value::Boolean(true)
    );
}

#[test]
fn test_refutability() {
    assert_eq!(
        eval("metalogic.refutability(quote(p), [quote(p -> q), quote(not q)])").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        eval("metalogic.refutability(quote(p), [quote(p -> q)])").unwrap(),
        Value::Boolean(false)
    );
}

#[test]
fn test_verify_derivation() {
    let axioms = "[quote(p and s), quote(p -> q), quote(q <-> r)]";
    let check = |steps: &str| {
        eval(&format!("metalogic.verify_derivation({}, {})", steps, axioms)).unwrap()
    };
    assert_eq!(
        check("[quote(p), quote(q), quote(q -> r), quote(r)]"),
        Value::Boolean(true)
    );
    assert_eq!(check("[quote(r)]"), Value::Boolean(false));
    assert_eq!(check("[quote(q), quote(p)]"), Value::Boolean(false));
}

#[test]
fn test_search_proof_returns_a_checkable_derivation() {
    let mut evaluator = Evaluator::new();
    let found = eval_in(
        &mut evaluator,
        "metalogic.search_proof(quote(d), [quote(a and b), quote(a -> c), quote(c -> d)])",
    )
    .unwrap();
    assert_eq!(found.get("found"), Some(&Value::Boolean(true)));
    let steps = found.get("steps").unwrap().as_collection().unwrap();
    assert_eq!(
        Expression::from_value(steps.last().unwrap()).unwrap(),
        parse("d").unwrap()
    );

    let verified = eval_in(
        &mut evaluator,
        "{ let r = metalogic.search_proof(quote(d), [quote(a and b), quote(a -> c), quote(c -> d)]); \
         metalogic.verify_derivation(r.steps, [quote(a and b), quote(a -> c), quote(c -> d)]) }",
    )
    .unwrap();
    assert_eq!(verified, Value::Boolean(true));

    let missing = eval("metalogic.search_proof(quote(e), [quote(a)])").unwrap();
    assert_eq!(missing.get("found"), Some(&Value::Boolean(false)));
    assert_eq!(missing.get("steps"), Some(&Value::Collection(vec![])));
}

#[test]
fn test_quoted_formulas_reject_non_formulas() {
    assert!(matches!(
        eval("metalogic.encode_formula({kind: \"literal\"})"),
        Err(LogicError::FunctionError { .. })
    ));
    assert!(matches!(
        eval("metalogic.encode_formula(5)"),
        Err(LogicError::TypeMismatch { .. })
    ));
}
