use tabmap::{
    executor::summary::ColumnSummary,
    planner::{
        error::SqlError,
        select::SelectStatement,
        types::{FieldList, ParseFlags},
    },
    types::value::{FieldType, Value},
};

fn fields() -> FieldList {
    FieldList::from_pairs(&[
        ("name", FieldType::String),
        ("pop", FieldType::Integer),
        ("area", FieldType::Float),
    ])
}

fn parsed(sql: &str) -> SelectStatement {
    let mut statement = SelectStatement::preparse(sql).unwrap();
    statement
        .parse(&fields(), ParseFlags::ALLOW_UNDEFINED_COL_FUNCS)
        .unwrap();
    statement
}

fn distinct(statement: &SelectStatement) -> Vec<Option<&str>> {
    statement
        .column_summary(0)
        .map(|s| s.distinct_values().iter().map(|v| v.as_deref()).collect())
        .unwrap_or_default()
}

#[test]
fn test_fresh_summary_uses_infinite_sentinels() {
    let summary = ColumnSummary::new();
    assert_eq!(summary.min, f64::INFINITY);
    assert_eq!(summary.max, f64::NEG_INFINITY);
    assert_eq!(summary.count, 0);
    assert_eq!(summary.average(), None);
    assert!(summary.distinct_values().is_empty());
}

#[test]
fn test_min_max_avg_sum() {
    let mut statement = parsed("SELECT MIN(area), MAX(area), AVG(pop), SUM(pop) FROM t");
    for value in ["3.5", "-1.25", "10"] {
        for column in 0..4 {
            statement.summarize(column, Some(value)).unwrap();
        }
    }
    // NULL and empty values are skipped
    for column in 0..4 {
        statement.summarize(column, None).unwrap();
        statement.summarize(column, Some("")).unwrap();
    }

    assert_eq!(statement.column_summary(0).unwrap().min, -1.25);
    assert_eq!(statement.column_summary(1).unwrap().max, 10.0);
    let avg = statement.column_summary(2).unwrap();
    assert_eq!(avg.count, 3);
    assert_eq!(avg.sum, 12.25);
    assert_eq!(avg.average(), Some(12.25 / 3.0));
    assert_eq!(statement.column_summary(3).unwrap().sum, 12.25);
}

#[test]
fn test_count_skips_nulls() {
    let mut statement = parsed("SELECT COUNT(name), COUNT(*) FROM t");
    statement.summarize(0, Some("a")).unwrap();
    statement.summarize(0, None).unwrap();
    statement.summarize(0, Some("")).unwrap();
    statement.summarize(1, Some("*")).unwrap();
    assert_eq!(statement.column_summary(0).unwrap().count, 2);
    assert_eq!(statement.column_summary(1).unwrap().count, 1);
}

#[test]
fn test_count_distinct_counts_unique_values() {
    let mut statement = parsed("SELECT COUNT(DISTINCT name) FROM t");
    for value in [Some("a"), Some("b"), Some("a"), None, None, Some("B")] {
        statement.summarize(0, value).unwrap();
    }
    let summary = statement.column_summary(0).unwrap();
    // NULL is listed but not counted
    assert_eq!(summary.count, 3);
    assert_eq!(summary.distinct_values().len(), 4);
}

#[test]
fn test_avg_and_sum_distinct_fold_each_value_once() {
    let mut statement = parsed("SELECT AVG(DISTINCT pop), SUM(DISTINCT pop), SUM(pop) FROM t");
    for value in [Some("10"), Some("20"), Some("10"), None, Some("30"), Some("20")] {
        for column in 0..3 {
            statement.summarize(column, value).unwrap();
        }
    }
    let avg = statement.column_summary(0).unwrap();
    assert_eq!(avg.count, 3);
    assert_eq!(avg.average(), Some(20.0));
    assert_eq!(statement.column_summary(1).unwrap().sum, 60.0);
    assert_eq!(statement.column_summary(2).unwrap().sum, 90.0);
}

#[test]
fn test_distinct_list_keeps_first_seen_order() {
    let mut statement = parsed("SELECT DISTINCT name FROM t");
    for value in ["b", "a", "b", "c", "a"] {
        statement.summarize(0, Some(value)).unwrap();
    }
    statement.finish_summarize().unwrap();
    assert_eq!(distinct(&statement), vec![Some("b"), Some("a"), Some("c")]);
}

#[test]
fn test_distinct_list_sorts_by_field_type() {
    let mut statement = parsed("SELECT DISTINCT pop FROM t ORDER BY pop");
    for value in [Some("100"), Some("9"), None, Some("25"), Some("9")] {
        statement.summarize(0, value).unwrap();
    }
    statement.finish_summarize().unwrap();
    assert_eq!(distinct(&statement), vec![None, Some("9"), Some("25"), Some("100")]);

    let mut statement = parsed("SELECT DISTINCT name FROM t ORDER BY name DESC");
    for value in ["Boston", "Atlanta", "Savannah", "albany"] {
        statement.summarize(0, Some(value)).unwrap();
    }
    statement.finish_summarize().unwrap();
    // Byte order: lowercase sorts after uppercase
    assert_eq!(
        distinct(&statement),
        vec![Some("albany"), Some("Savannah"), Some("Boston"), Some("Atlanta")]
    );

    let mut statement = parsed("SELECT DISTINCT area FROM t ORDER BY area ASC");
    for value in ["2.5", "-0.5", "10.25"] {
        statement.summarize_value(0, &Value::Float(value.parse().unwrap())).unwrap();
    }
    statement.finish_summarize().unwrap();
    assert_eq!(distinct(&statement), vec![Some("-0.5"), Some("2.5"), Some("10.25")]);
}

#[test]
fn test_plain_columns_are_ignored() {
    let mut statement = parsed("SELECT name, pop FROM t");
    statement.summarize(0, Some("x")).unwrap();
    assert!(statement.column_summary(0).is_none());
}

#[test]
fn test_summarize_errors() {
    let mut statement = parsed("SELECT MAX(pop) FROM t");
    assert_eq!(statement.summarize(3, Some("1")), Err(SqlError::ColumnOutOfRange(3)));

    let mut statement = parsed("SELECT upper(name), MAX(pop) FROM t");
    assert_eq!(
        statement.summarize(0, Some("x")),
        Err(SqlError::CustomFunctionSummary("upper".to_string()))
    );
}

#[test]
fn test_finish_summarize_rechecks_distinct_order() {
    let mut statement = parsed("SELECT DISTINCT name FROM t ORDER BY name");
    statement.order_defs[0].field_index = Some(1);
    assert_eq!(statement.finish_summarize(), Err(SqlError::DistinctOrderByField));

    let extra = statement.order_defs[0].clone();
    statement.order_defs.push(extra);
    assert_eq!(
        statement.finish_summarize(),
        Err(SqlError::DistinctOrderByMultipleKeys)
    );
}

#[test]
fn test_reset_clears_state() {
    let mut statement = parsed("SELECT SUM(pop) FROM t");
    statement.summarize(0, Some("5")).unwrap();
    statement.reset_summaries();
    assert!(statement.column_summary(0).is_none());
    statement.summarize(0, Some("2")).unwrap();
    assert_eq!(statement.column_summary(0).unwrap().sum, 2.0);
}
