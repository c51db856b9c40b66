use crate::expression::{ExpressionKind, Operator, QuantifierKind, Statement};
use crate::parser::{parse, parse_expression};
use crate::{Expression, LogicError, ResourceLimits, Value};
use std::collections::BTreeMap;

fn var(name: &str) -> Expression {
    Expression::variable(name)
}

fn int(i: i64) -> Expression {
    Expression::literal(i)
}

#[test]
fn test_precedence_of_arithmetic() {
    let parsed = parse("1 + 2 * 3").unwrap();
    let expected = Expression::binary(
        Operator::Add,
        int(1),
        Expression::binary(Operator::Mul, int(2), int(3)),
    );
    assert_eq!(parsed, expected);
}

#[test]
fn test_power_is_right_associative() {
    let parsed = parse("2 ** 3 ** 2").unwrap();
    let expected = Expression::binary(
        Operator::Pow,
        int(2),
        Expression::binary(Operator::Pow, int(3), int(2)),
    );
    assert_eq!(parsed, expected);
}

#[test]
fn test_connective_spellings_are_equivalent() {
    let words = parse("a and b or not c").unwrap();
    let symbols = parse("a && b || !c").unwrap();
    let unicode = parse("a ∧ b ∨ ¬c").unwrap();
    assert_eq!(words, symbols);
    assert_eq!(words, unicode);

    let expected = Expression::operator(
        Operator::Or,
        vec![
            Expression::operator(Operator::And, vec![var("a"), var("b")]),
            Expression::unary(Operator::Not, var("c")),
        ],
    );
    assert_eq!(words, expected);
}

#[test]
fn test_chained_and_collapses_into_one_node() {
    let parsed = parse("a and b and c").unwrap();
    match parsed.kind() {
        ExpressionKind::Operator {
            op: Operator::And,
            operands,
        } => assert_eq!(operands.len(), 3),
        other => panic!("expected n-ary and, got {:?}", other),
    }
}

#[test]
fn test_implication_is_right_associative() {
    let parsed = parse("a -> b -> c").unwrap();
    let expected = Expression::binary(
        Operator::Implies,
        var("a"),
        Expression::binary(Operator::Implies, var("b"), var("c")),
    );
    assert_eq!(parsed, expected);
    assert_eq!(parse("a implies b").unwrap(), parse("a → b").unwrap());
    assert_eq!(
        parse("a <-> b").unwrap(),
        Expression::binary(Operator::Iff, var("a"), var("b"))
    );
}

#[test]
fn test_quantifiers() {
    let parsed = parse("forall f in files: f.lines <= 500").unwrap();
    let expected = Expression::forall(
        "f",
        var("files"),
        Expression::binary(
            Operator::Le,
            Expression::binary(Operator::Index, var("f"), Expression::literal("lines")),
            int(500),
        ),
    );
    assert_eq!(parsed, expected);

    match parse("∃ x in [1, 2]: x == 2").unwrap().kind() {
        ExpressionKind::Quantifier { quantifier, .. } => {
            assert_eq!(*quantifier, QuantifierKind::Exists)
        }
        other => panic!("expected quantifier, got {:?}", other),
    }
}

#[test]
fn test_membership_and_indexing() {
    let parsed = parse("xs[0] in ys").unwrap();
    let expected = Expression::binary(
        Operator::In,
        Expression::binary(Operator::Index, var("xs"), int(0)),
        var("ys"),
    );
    assert_eq!(parsed, expected);
}

#[test]
fn test_calls_with_qualified_names() {
    let parsed = parse(r#"string.starts_with(f.name, "tmp_")"#).unwrap();
    let expected = Expression::call(
        "string.starts_with",
        vec![
            Expression::binary(Operator::Index, var("f"), Expression::literal("name")),
            Expression::literal("tmp_"),
        ],
    );
    assert_eq!(parsed, expected);
    assert_eq!(parse("logic.has_function()").unwrap(), Expression::call("logic.has_function", vec![]));
}

#[test]
fn test_literals() {
    assert_eq!(parse("42").unwrap(), Expression::literal(42));
    assert_eq!(parse("-42").unwrap(), Expression::literal(-42));
    assert_eq!(parse("2.5").unwrap(), Expression::literal(2.5));
    assert_eq!(parse("1e3").unwrap(), Expression::literal(1000.0));
    assert_eq!(parse("true").unwrap(), Expression::literal(true));
    assert_eq!(parse("null").unwrap(), Expression::literal(Value::Null));
    assert_eq!(
        parse(r#""tab\there \u{e9}""#).unwrap(),
        Expression::literal("tab\there é")
    );
}

#[test]
fn test_identifiers_may_start_with_keywords() {
    assert_eq!(parse("index").unwrap(), var("index"));
    assert_eq!(parse("nullable").unwrap(), var("nullable"));
    assert_eq!(parse("iffy or orange").unwrap(), Expression::operator(Operator::Or, vec![var("iffy"), var("orange")]));
}

#[test]
fn test_conditional() {
    let parsed = parse("if x > 0 then \"positive\" else \"other\"").unwrap();
    let expected = Expression::conditional(
        Expression::binary(Operator::Gt, var("x"), int(0)),
        Expression::literal("positive"),
        Some(Expression::literal("other")),
    );
    assert_eq!(parsed, expected);

    match parse("if ok then 1").unwrap().kind() {
        ExpressionKind::Conditional { otherwise, .. } => assert!(otherwise.is_none()),
        other => panic!("expected conditional, got {:?}", other),
    }
}

#[test]
fn test_fixpoint() {
    let parsed = parse("fixpoint x from 0: x + 1").unwrap();
    let expected = Expression::fixpoint(
        "x",
        Some(int(0)),
        Expression::binary(Operator::Add, var("x"), int(1)),
    );
    assert_eq!(parsed, expected);
    assert_eq!(
        parse("fixpoint x: 5").unwrap(),
        Expression::fixpoint("x", None, int(5))
    );
}

#[test]
fn test_lists_objects_and_blocks() {
    assert_eq!(
        parse("[1, x,]").unwrap(),
        Expression::collection(vec![int(1), var("x")])
    );

    let mut fields = BTreeMap::new();
    fields.insert("lines".to_string(), int(10));
    fields.insert("file name".to_string(), Expression::literal("a.rs"));
    assert_eq!(
        parse(r#"{lines: 10, "file name": "a.rs"}"#).unwrap(),
        Expression::object(fields)
    );
    assert_eq!(parse("{}").unwrap(), Expression::object(BTreeMap::new()));

    let parsed = parse("{ let y = x * 2; y + 1 }").unwrap();
    let expected = Expression::block(vec![
        Statement::Let {
            variable: "y".to_string(),
            value: Expression::binary(Operator::Mul, var("x"), int(2)),
        },
        Statement::Eval {
            expression: Expression::binary(Operator::Add, var("y"), int(1)),
        },
    ]);
    assert_eq!(parsed, expected);
}

#[test]
fn test_quote_embeds_the_tree_as_data() {
    let parsed = parse("quote(x + 1)").unwrap();
    let quoted = parse("x + 1").unwrap().to_value().unwrap();
    assert_eq!(parsed, Expression::literal(quoted.clone()));
    assert_eq!(quoted.get("kind"), Some(&Value::from("operator")));
}

#[test]
fn test_comments_and_whitespace() {
    let parsed = parse("# leading comment\n  1 +\n  2 # trailing").unwrap();
    assert_eq!(parsed, Expression::binary(Operator::Add, int(1), int(2)));
}

#[test]
fn test_duplicate_object_fields_are_rejected() {
    match parse("{a: 1, a: 2}") {
        Err(LogicError::Parse(details)) => assert!(details.message.contains("Duplicate field")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_syntax_errors_carry_a_location() {
    match parse_expression("forall x in xs:", "rule.json", &ResourceLimits::default()) {
        Err(LogicError::Parse(details)) => {
            assert_eq!(details.source_id, "rule.json");
            assert_eq!(details.span.line, 1);
            assert!(details.span.col > 1);
            assert_eq!(&*details.source_text, "forall x in xs:");
        }
        other => panic!("expected parse error, got {:?}", other),
    }
    assert!(parse("").is_err());
    assert!(parse("1 +").is_err());
    assert!(parse("(1").is_err());
}

#[test]
fn test_integer_literal_out_of_range() {
    assert!(matches!(
        parse("99999999999999999999"),
        Err(LogicError::Parse(_))
    ));
}

#[test]
fn test_negative_literals_fold_before_the_range_check() {
    assert_eq!(
        parse("-9223372036854775808").unwrap(),
        Expression::literal(i64::MIN)
    );
    assert!(matches!(parse("9223372036854775808"), Err(LogicError::Parse(_))));
    assert!(matches!(parse("-9223372036854775809"), Err(LogicError::Parse(_))));
    assert_eq!(parse("--5").unwrap(), int(5));
    assert_eq!(parse("- 7").unwrap(), int(-7));
    // Only a bare literal folds; a suffixed operand stays a negation
    assert_eq!(
        parse("-xs[0]").unwrap(),
        Expression::unary(
            Operator::Neg,
            Expression::binary(Operator::Index, var("xs"), int(0))
        )
    );
}

#[test]
fn test_source_size_limit() {
    let limits = ResourceLimits {
        max_source_bytes: 8,
        ..ResourceLimits::default()
    };
    let result = parse_expression("1 + 2 + 3 + 4", "<input>", &limits);
    assert!(matches!(
        result,
        Err(LogicError::ResourceLimitExceeded { limit_name, .. }) if limit_name == "max_source_bytes"
    ));
}

#[test]
fn test_nesting_limit() {
    let limits = ResourceLimits {
        max_expression_depth: 5,
        ..ResourceLimits::default()
    };
    let shallow = "((((1))))";
    assert!(parse_expression(shallow, "<input>", &limits).is_ok());

    let deep = format!("{}1{}", "(".repeat(10), ")".repeat(10));
    assert!(matches!(
        parse_expression(&deep, "<input>", &limits),
        Err(LogicError::ResourceLimitExceeded { limit_name, .. }) if limit_name == "max_expression_depth"
    ));
}

#[test]
fn test_parsed_and_json_trees_share_identity() {
    let parsed = parse("x < 10").unwrap();
    let from_json = Expression::from_json(
        r#"{"kind": "operator", "op": "lt", "operands": [
            {"kind": "variable", "name": "x"},
            {"kind": "literal", "value": 10}
        ]}"#,
    )
    .unwrap();
    assert_eq!(parsed.id(), from_json.id());
    assert_eq!(parsed, from_json);
}
