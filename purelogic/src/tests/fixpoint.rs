use crate::parser::parse;
use crate::{Context, Evaluator, Expression, LogicError, Operator, ResourceLimits, Value};

fn run(evaluator: &mut Evaluator, source: &str) -> Result<Value, LogicError> {
    let expression = parse(source)?;
    evaluator.evaluate(&expression, &mut Context::new())
}

#[test]
fn test_constant_step_converges_in_one_iteration() {
    let mut evaluator = Evaluator::new();
    let expression = Expression::fixpoint("x", None, Expression::literal(5));

    let result = evaluator.evaluate(&expression, &mut Context::new()).unwrap();
    assert_eq!(result, Value::Integer(5));
    assert_eq!(evaluator.metrics().fixpoint_iterations, 1);
}

#[test]
fn test_step_without_seed_cannot_reference_its_variable() {
    let mut evaluator = Evaluator::new();
    assert!(matches!(
        run(&mut evaluator, "fixpoint x: x + 1"),
        Err(LogicError::UnboundVariable(name)) if name == "x"
    ));
}

#[test]
fn test_diverging_step_raises_non_convergent() {
    let mut evaluator = Evaluator::new();
    let expression = Expression::fixpoint(
        "x",
        Some(Expression::literal(0)),
        Expression::binary(Operator::Add, Expression::variable("x"), Expression::literal(1)),
    );

    match evaluator.evaluate(&expression, &mut Context::new()) {
        Err(LogicError::NonConvergentFixpoint {
            variable,
            iterations,
        }) => {
            assert_eq!(variable, "x");
            assert_eq!(iterations, ResourceLimits::default().max_fixpoint_iterations);
        }
        other => panic!("expected non-convergence, got {:?}", other),
    }
}

#[test]
fn test_iteration_bound_is_configurable() {
    let limits = ResourceLimits {
        max_fixpoint_iterations: 25,
        ..ResourceLimits::default()
    };
    let mut evaluator = Evaluator::new().with_limits(limits);
    assert!(matches!(
        run(&mut evaluator, "fixpoint x from 0: x + 1"),
        Err(LogicError::NonConvergentFixpoint { iterations: 25, .. })
    ));
    assert_eq!(evaluator.metrics().fixpoint_iterations, 25);
}

fn limit_name(result: Result<Value, LogicError>) -> String {
    match result {
        Err(LogicError::ResourceLimitExceeded { limit_name, .. }) => limit_name,
        other => panic!("expected a resource limit error, got {:?}", other),
    }
}

#[test]
fn test_nesting_step_stops_at_the_value_depth_limit() {
    let mut evaluator = Evaluator::new();
    assert_eq!(
        limit_name(run(&mut evaluator, "fixpoint x from []: [x]")),
        "max_value_depth"
    );
    assert_eq!(
        evaluator.metrics().fixpoint_iterations,
        ResourceLimits::default().max_value_depth as u64 - 1
    );

    let mut evaluator = Evaluator::new();
    evaluator.enable_caching(true);
    evaluator.enable_tracing(true);
    assert_eq!(
        limit_name(run(&mut evaluator, "fixpoint x from {}: {node: x}")),
        "max_value_depth"
    );
}

#[test]
fn test_growing_step_stops_at_the_value_size_limit() {
    let limits = ResourceLimits {
        max_value_size: 1000,
        max_value_depth: 16,
        ..ResourceLimits::default()
    };
    let mut evaluator = Evaluator::new().with_limits(limits);
    assert_eq!(
        limit_name(run(&mut evaluator, "fixpoint x from [1]: x + x")),
        "max_value_size"
    );
    assert_eq!(
        limit_name(run(&mut evaluator, "fixpoint x from []: collection.append([], x)")),
        "max_value_depth"
    );
}

#[test]
fn test_converging_step() {
    let mut evaluator = Evaluator::new();
    let result = run(&mut evaluator, "fixpoint x from 0: if x < 10 then x + 3 else x").unwrap();
    assert_eq!(result, Value::Integer(12));
    // 0→3, 3→6, 6→9, 9→12 and the confirming 12→12
    assert_eq!(evaluator.metrics().fixpoint_iterations, 5);
}

#[test]
fn test_fixpoint_sees_the_surrounding_context() {
    let mut evaluator = Evaluator::new();
    let mut context = Context::with_facts([("cap", Value::Integer(4))]);
    let expression = parse("fixpoint n from 0: math.min(n + 1, cap)").unwrap();
    let result = evaluator.evaluate(&expression, &mut context).unwrap();
    assert_eq!(result, Value::Integer(4));
    assert!(!context.has_variable("n"));
}

#[test]
fn test_transitive_closure_with_least_fixpoint() {
    let mut evaluator = Evaluator::new();
    let mut context = Context::with_facts([(
        "edges",
        Value::collection(
            [[1, 2], [2, 3], [3, 4], [7, 8]]
                .iter()
                .map(|[a, b]| Value::collection([Value::from(*a), Value::from(*b)])),
        ),
    )]);
    let expression = parse(
        "mucalculus.mu(\"reached\", quote(collection.union([1], collection.image(edges, reached))))",
    )
    .unwrap();

    let result = evaluator.evaluate(&expression, &mut context).unwrap();
    let mut reached: Vec<i64> = result
        .as_collection()
        .unwrap()
        .iter()
        .map(|v| v.as_integer().unwrap())
        .collect();
    reached.sort();
    assert_eq!(reached, vec![1, 2, 3, 4]);
}

#[test]
fn test_greatest_fixpoint_starts_from_the_universe() {
    let mut evaluator = Evaluator::new();
    // Keep nodes that some node still in the set points to
    let mut context = Context::with_facts([(
        "edges",
        Value::collection(
            [[1, 2], [2, 3], [4, 4]]
                .iter()
                .map(|[a, b]| Value::collection([Value::from(*a), Value::from(*b)])),
        ),
    )]);
    let source = r#"mucalculus.nu("alive",
        quote(collection.intersection(alive, collection.image(edges, alive))),
        [1, 2, 3, 4])"#;
    let result = evaluator
        .evaluate(&parse(source).unwrap(), &mut context)
        .unwrap();
    assert_eq!(result, Value::collection([Value::Integer(4)]));
}

#[test]
fn test_set_fixpoint_step_must_return_a_collection() {
    let mut evaluator = Evaluator::new();
    match run(&mut evaluator, r#"mucalculus.mu("s", quote(1))"#) {
        Err(LogicError::FunctionError { source, .. }) => {
            assert!(matches!(*source, LogicError::TypeMismatch { .. }))
        }
        other => panic!("expected function error, got {:?}", other),
    }
}
