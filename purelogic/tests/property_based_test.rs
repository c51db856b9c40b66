use proptest::prelude::*;
use purelogic::{parse, Context, Evaluator, LogicError, Value};

fn eval_with(source: &str, a: i64, b: i64) -> Result<Value, LogicError> {
    let expression = parse(source)?;
    let mut context = Context::with_facts([("a", Value::Integer(a)), ("b", Value::Integer(b))]);
    Evaluator::new().evaluate(&expression, &mut context)
}

/// Small formulas over three variables, rendered in the textual syntax
fn formula() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0i64..1000).prop_map(|n| n.to_string()),
        prop::sample::select(vec!["a", "b", "c", "true", "false"]).prop_map(String::from),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!["+", "*", "<", "==", "and", "or", "->"]), inner.clone())
                .prop_map(|(l, op, r)| format!("({} {} {})", l, op, r)),
            inner.clone().prop_map(|e| format!("not ({})", e)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, t, e)| format!("(if {} then {} else {})", c, t, e)),
            inner.clone().prop_map(|e| format!("(forall x in [a, b]: {})", e)),
            prop::collection::vec(inner, 0..3).prop_map(|items| format!("[{}]", items.join(", "))),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_integer_equality_matches_host(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(eval_with("a == b", a, b).unwrap(), Value::Boolean(a == b));
        prop_assert_eq!(eval_with("a != b", a, b).unwrap(), Value::Boolean(a != b));
    }

    #[test]
    fn prop_integer_ordering_matches_host(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(eval_with("a < b", a, b).unwrap(), Value::Boolean(a < b));
        prop_assert_eq!(eval_with("a <= b", a, b).unwrap(), Value::Boolean(a <= b));
        prop_assert_eq!(eval_with("a > b", a, b).unwrap(), Value::Boolean(a > b));
    }

    #[test]
    fn prop_equality_is_reflexive(a in any::<i64>()) {
        prop_assert_eq!(eval_with("a == a", a, 0).unwrap(), Value::Boolean(true));
        prop_assert_eq!(eval_with("not (a < a)", a, 0).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn prop_addition_is_checked(a in any::<i64>(), b in any::<i64>()) {
        match (eval_with("a + b", a, b), a.checked_add(b)) {
            (Ok(value), Some(sum)) => prop_assert_eq!(value, Value::Integer(sum)),
            (Err(LogicError::Arithmetic(_)), None) => {}
            (result, expected) => prop_assert!(false, "got {:?}, expected {:?}", result, expected),
        }
    }

    #[test]
    fn prop_addition_commutes(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        prop_assert_eq!(eval_with("a + b", a, b).unwrap(), eval_with("b + a", a, b).unwrap());
    }

    #[test]
    fn prop_encode_decode_round_trip(source in formula()) {
        let expression = parse(&source).unwrap();
        let mut evaluator = Evaluator::new();
        let code = evaluator.formulas_mut().encode(&expression).unwrap();
        let decoded = evaluator.formulas().decode(code).unwrap();
        prop_assert_eq!(&*decoded, &expression);
        prop_assert_eq!(evaluator.formulas_mut().encode(&decoded).unwrap(), code);
    }

    #[test]
    fn prop_evaluation_is_deterministic(source in formula(), a in -50i64..50, b in -50i64..50) {
        let expression = parse(&source).unwrap();
        let facts = [("a", Value::Integer(a)), ("b", Value::Integer(b)), ("c", Value::Boolean(true))];

        let mut evaluator = Evaluator::new();
        let first = evaluator.evaluate(&expression, &mut Context::with_facts(facts.clone()));
        let second = Evaluator::new().evaluate(&expression, &mut Context::with_facts(facts));
        match (first, second) {
            (Ok(x), Ok(y)) => prop_assert_eq!(x, y),
            (Err(x), Err(y)) => prop_assert_eq!(x.kind(), y.kind()),
            (x, y) => prop_assert!(false, "diverged: {:?} vs {:?}", x, y),
        }
    }

    #[test]
    fn prop_json_form_round_trips(source in formula()) {
        let expression = parse(&source).unwrap();
        let json = expression.to_canonical_json().unwrap();
        let restored = purelogic::Expression::from_json(&json).unwrap();
        prop_assert_eq!(restored.id(), expression.id());
    }
}
