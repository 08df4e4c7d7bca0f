use tabmap::{
    planner::{
        compiler::compile_where,
        error::SqlError,
        expression::{CompareOp, Expr, FieldOp, Operand},
        types::FieldList,
    },
    types::value::{FieldType, Value},
};

fn cities() -> FieldList {
    FieldList::from_pairs(&[
        ("name", FieldType::String),
        ("pop", FieldType::Integer),
        ("area", FieldType::Float),
        ("capital", FieldType::Boolean),
    ])
}

fn field_op(expr: &Expr) -> &FieldOp {
    match expr {
        Expr::Field(op) => op,
        other => panic!("expected a field comparison, got {:?}", other),
    }
}

#[test]
fn test_compiles_simple_comparisons() {
    let fields = cities();

    let expr = compile_where("pop >= 1000", &fields).unwrap();
    let op = field_op(&expr);
    assert_eq!(op.field_index, 1);
    assert_eq!(op.field_type, FieldType::Integer);
    assert_eq!(op.op, CompareOp::Ge);
    assert_eq!(op.operand, Operand::Value(Value::Integer(1000)));

    let expr = compile_where("AREA < 2.5", &fields).unwrap();
    let op = field_op(&expr);
    assert_eq!(op.field_name, "area");
    assert_eq!(op.operand, Operand::Value(Value::Float(2.5)));

    let expr = compile_where("name = 'Atlanta'", &fields).unwrap();
    assert_eq!(
        field_op(&expr).operand,
        Operand::Value(Value::String("Atlanta".to_string()))
    );

    for (text, op) in [
        ("pop = 1", CompareOp::Eq),
        ("pop == 1", CompareOp::Eq),
        ("pop != 1", CompareOp::Ne),
        ("pop <> 1", CompareOp::Ne),
        ("pop < 1", CompareOp::Lt),
        ("pop <= 1", CompareOp::Le),
        ("pop > 1", CompareOp::Gt),
    ] {
        assert_eq!(field_op(&compile_where(text, &fields).unwrap()).op, op, "{}", text);
    }
}

#[test]
fn test_and_chain_folds_right() {
    let fields = cities();
    let expr = compile_where("pop > 1 AND pop < 10 AND name = \"x\"", &fields).unwrap();
    match expr {
        Expr::And(left, right) => {
            assert_eq!(field_op(&left).op, CompareOp::Gt);
            match *right {
                Expr::And(middle, last) => {
                    assert_eq!(field_op(&middle).op, CompareOp::Lt);
                    assert_eq!(field_op(&last).field_name, "name");
                }
                other => panic!("expected nested AND, got {:?}", other),
            }
        }
        other => panic!("expected AND, got {:?}", other),
    }
}

#[test]
fn test_brackets_allow_mixing_and_or() {
    let fields = cities();
    let expr = compile_where("(pop > 1 AND pop < 10) OR name = 'x'", &fields).unwrap();
    match expr {
        Expr::Or(left, right) => {
            assert!(matches!(*left, Expr::And(..)));
            assert!(matches!(*right, Expr::Field(_)));
        }
        other => panic!("expected OR, got {:?}", other),
    }
    assert_eq!(expr_fields("(pop > 1 AND pop < 10) OR name = 'x'"), vec![1, 0]);
}

fn expr_fields(text: &str) -> Vec<usize> {
    compile_where(text, &cities()).unwrap().referenced_fields()
}

#[test]
fn test_mixed_chain_without_brackets_is_rejected() {
    let fields = cities();
    assert_eq!(
        compile_where("pop > 1 AND pop < 10 OR name = 'x'", &fields),
        Err(SqlError::MixedLogicalChain("OR".to_string()))
    );
}

#[test]
fn test_negated_forms_wrap_in_not() {
    let fields = cities();

    for (text, op) in [
        ("name NOT LIKE 'A%'", CompareOp::Like),
        ("pop NOT IN (1, 2)", CompareOp::In),
        ("name IS NOT NULL", CompareOp::IsNull),
    ] {
        match compile_where(text, &fields).unwrap() {
            Expr::Not(inner) => assert_eq!(field_op(&inner).op, op, "{}", text),
            other => panic!("{}: expected NOT, got {:?}", text, other),
        }
    }

    let expr = compile_where("name IS NULL", &fields).unwrap();
    assert_eq!(field_op(&expr).operand, Operand::None);
}

#[test]
fn test_not_applies_to_rest_of_chain() {
    let fields = cities();
    match compile_where("NOT pop = 1 AND pop = 2", &fields).unwrap() {
        Expr::Not(inner) => assert!(matches!(*inner, Expr::And(..))),
        other => panic!("expected NOT, got {:?}", other),
    }
    match compile_where("pop = 1 AND NOT pop = 2", &fields).unwrap() {
        Expr::And(left, right) => {
            assert!(matches!(*left, Expr::Field(_)));
            assert!(matches!(*right, Expr::Not(_)));
        }
        other => panic!("expected AND, got {:?}", other),
    }
}

#[test]
fn test_in_list_values_are_converted() {
    let fields = cities();
    let expr = compile_where("area IN (1, 2.5, -3)", &fields).unwrap();
    assert_eq!(
        field_op(&expr).operand,
        Operand::List(vec![Value::Float(1.0), Value::Float(2.5), Value::Float(-3.0)])
    );

    let expr = compile_where("name IN ('Boston', \"Albany\")", &fields).unwrap();
    assert_eq!(
        field_op(&expr).operand,
        Operand::List(vec![
            Value::String("Boston".to_string()),
            Value::String("Albany".to_string())
        ])
    );
}

#[test]
fn test_malformed_in_lists() {
    let fields = cities();
    for text in [
        "pop IN 1, 2",
        "pop IN ()",
        "pop IN (1, )",
        "pop IN (1 2)",
        "pop IN (1, 2",
    ] {
        assert!(
            matches!(compile_where(text, &fields), Err(SqlError::InList(_))),
            "{} should fail",
            text
        );
    }
}

#[test]
fn test_type_checks() {
    let fields = cities();
    assert!(matches!(
        compile_where("name > 'a'", &fields),
        Err(SqlError::TypeMismatch { ref operation, field_type: FieldType::String, .. }) if operation == ">"
    ));
    assert!(matches!(
        compile_where("pop LIKE '1%'", &fields),
        Err(SqlError::TypeMismatch { field_type: FieldType::Integer, .. })
    ));
    assert_eq!(
        compile_where("pop = abc", &fields),
        Err(SqlError::NonNumericLiteral {
            field: "pop".to_string(),
            literal: "abc".to_string()
        })
    );
    assert!(matches!(
        compile_where("area IN (1, x)", &fields),
        Err(SqlError::NonNumericLiteral { .. })
    ));
    // Booleans compare as text
    assert!(compile_where("capital = 'T'", &fields).is_ok());
}

#[test]
fn test_structural_errors() {
    let fields = cities();
    assert_eq!(compile_where("", &fields), Err(SqlError::EmptyExpression));
    assert_eq!(
        compile_where("height = 3", &fields),
        Err(SqlError::UnknownField("height".to_string()))
    );
    assert_eq!(compile_where("pop =", &fields), Err(SqlError::NotEnoughTokens));
    assert_eq!(compile_where("(pop = 1", &fields), Err(SqlError::UnclosedBrackets));
    assert_eq!(compile_where("pop = 1)", &fields), Err(SqlError::ExtraTokens(1)));
    assert_eq!(
        compile_where("pop = 1 pop = 2", &fields),
        Err(SqlError::UnknownOperation("pop".to_string()))
    );
    assert_eq!(
        compile_where("pop = 1 = 2", &fields),
        Err(SqlError::LogicalWithNonLogicalOperand)
    );
    assert_eq!(
        compile_where("pop ~ 2", &fields),
        Err(SqlError::UnknownOperation("~".to_string()))
    );
    assert_eq!(
        compile_where("name IS 'x'", &fields),
        Err(SqlError::UnknownOperation("IS x".to_string()))
    );
    assert_eq!(
        compile_where("name = 'open", &fields),
        Err(SqlError::UnterminatedString(7))
    );
}

#[test]
fn test_dump_shows_tree() {
    let fields = cities();
    let expr = compile_where("pop > 1 OR name IN ('a', 'b')", &fields).unwrap();
    let dump = expr.to_string();
    assert!(dump.starts_with("OR\n"));
    assert!(dump.contains("  Field 1 (pop, INTEGER) > 1"));
    assert!(dump.contains("  Field 0 (name, STRING) IN (\"a\", \"b\")"));
}
