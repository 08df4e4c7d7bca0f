use std::cmp::Ordering;

use log::debug;

use crate::{
    planner::{
        error::{Result, SqlError},
        select::SelectStatement,
        types::{ColumnFunc, QueryMode},
    },
    types::{row::Row, value::Value},
};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Records(Vec<Row>),
    Summary(Row),
    Distinct(Vec<Value>),
}

/// Runs a parsed SELECT over in-memory records.
pub struct QueryExecutor {
    statement: SelectStatement,
}

impl QueryExecutor {
    pub fn new(statement: SelectStatement) -> Result<Self> {
        if !statement.is_parsed() {
            return Err(SqlError::NotParsed);
        }
        Ok(Self { statement })
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.statement
    }

    pub fn into_statement(self) -> SelectStatement {
        self.statement
    }

    fn matches(&self, row: &Row) -> bool {
        self.statement
            .where_expr
            .as_ref()
            .is_none_or(|expr| expr.evaluate_row(row))
    }

    pub fn execute<'r, I>(&mut self, rows: I) -> Result<QueryResult>
    where
        I: IntoIterator<Item = &'r Row>,
    {
        let matching: Vec<&Row> = rows.into_iter().filter(|row| self.matches(row)).collect();
        debug!(
            "{} records match WHERE in {} mode",
            matching.len(),
            self.statement.query_mode
        );

        match self.statement.query_mode {
            QueryMode::Recordset => Ok(QueryResult::Records(self.project(matching))),
            QueryMode::Summary => self.summarize(&matching).map(QueryResult::Summary),
            QueryMode::DistinctList => self.distinct(&matching).map(QueryResult::Distinct),
        }
    }

    fn project(&self, mut rows: Vec<&Row>) -> Vec<Row> {
        let order_defs = &self.statement.order_defs;
        if !order_defs.is_empty() {
            rows.sort_by(|a, b| {
                for order in order_defs {
                    let Some(index) = order.field_index else {
                        continue;
                    };
                    let left = a.get_value(index).unwrap_or(&Value::Null);
                    let right = b.get_value(index).unwrap_or(&Value::Null);
                    let ordering = left.partial_cmp(right).unwrap_or(Ordering::Equal);
                    let ordering = if order.ascending { ordering } else { ordering.reverse() };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                Ordering::Equal
            });
        }

        rows.into_iter()
            .map(|row| {
                let values = self
                    .statement
                    .columns
                    .iter()
                    .map(|column| {
                        column
                            .field_index
                            .and_then(|i| row.get_value(i))
                            .cloned()
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                Row {
                    feature_id: row.feature_id,
                    values,
                }
            })
            .collect()
    }

    fn accumulate(&mut self, rows: &[&Row]) -> Result<()> {
        self.statement.reset_summaries();
        for row in rows {
            for column in 0..self.statement.column_count() {
                let field_index = self.statement.columns[column].field_index;
                match field_index {
                    Some(index) => {
                        let value = row.get_value(index).unwrap_or(&Value::Null);
                        self.statement.summarize_value(column, value)?;
                    }
                    // COUNT(*) counts every record
                    None => self.statement.summarize(column, Some("*"))?,
                }
            }
        }
        Ok(())
    }

    fn summarize(&mut self, rows: &[&Row]) -> Result<Row> {
        self.accumulate(rows)?;

        let values = self
            .statement
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let summary = self.statement.column_summary(i);
                match (&column.func, summary) {
                    (Some(ColumnFunc::Count), Some(s)) => Value::Integer(s.count),
                    (Some(ColumnFunc::Count), None) => Value::Integer(0),
                    (Some(ColumnFunc::Min), Some(s)) if s.min.is_finite() => Value::Float(s.min),
                    (Some(ColumnFunc::Max), Some(s)) if s.max.is_finite() => Value::Float(s.max),
                    (Some(ColumnFunc::Avg), Some(s)) => s.average().map_or(Value::Null, Value::Float),
                    (Some(ColumnFunc::Sum), Some(s)) => Value::Float(s.sum),
                    (Some(ColumnFunc::Sum), None) => Value::Float(0.0),
                    _ => Value::Null,
                }
            })
            .collect();
        Ok(Row::new(values))
    }

    fn distinct(&mut self, rows: &[&Row]) -> Result<Vec<Value>> {
        self.accumulate(rows)?;
        self.statement.finish_summarize()?;

        let field_type = self.statement.columns[0].field_type;
        Ok(self
            .statement
            .column_summary(0)
            .map(|summary| {
                summary
                    .distinct_values()
                    .iter()
                    .map(|v| match v {
                        Some(text) => Value::from_literal(text, field_type),
                        None => Value::Null,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
