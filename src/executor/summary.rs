use std::{cmp::Ordering, collections::HashSet};

use log::trace;

use crate::{
    planner::{
        error::{Result, SqlError},
        select::SelectStatement,
        types::{ColumnFunc, QueryMode},
    },
    types::value::{FieldType, Value, parse_float_prefix, parse_int_prefix},
};

/// Running state of one result column.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    /// Values counted; for DISTINCT columns the number of distinct
    /// non-NULL values.
    pub count: i64,
    distinct_list: Vec<Option<String>>,
    distinct_seen: HashSet<Option<String>>,
}

impl Default for ColumnSummary {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            sum: 0.0,
            count: 0,
            distinct_list: Vec::new(),
            distinct_seen: HashSet::new(),
        }
    }
}

impl ColumnSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn average(&self) -> Option<f64> {
        if self.count > 0 {
            Some(self.sum / self.count as f64)
        } else {
            None
        }
    }

    /// Distinct values in first-seen order, or sorted once finished.
    pub fn distinct_values(&self) -> &[Option<String>] {
        &self.distinct_list
    }

    fn insert_distinct(&mut self, value: Option<&str>) -> bool {
        let key = value.map(str::to_string);
        if self.distinct_seen.contains(&key) {
            return false;
        }
        self.distinct_seen.insert(key.clone());
        self.distinct_list.push(key);
        true
    }

    fn sort_distinct(&mut self, field_type: FieldType, ascending: bool) {
        self.distinct_list
            .sort_by(|a, b| compare_distinct(b, a, field_type));
        if ascending {
            self.distinct_list.reverse();
        }
    }
}

/// Type-aware comparison of distinct entries; NULL sorts lowest.
fn compare_distinct(a: &Option<String>, b: &Option<String>, field_type: FieldType) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match field_type {
            FieldType::Integer => parse_int_prefix(a).cmp(&parse_int_prefix(b)),
            FieldType::Float => parse_float_prefix(a)
                .partial_cmp(&parse_float_prefix(b))
                .unwrap_or(Ordering::Equal),
            _ => a.as_bytes().cmp(b.as_bytes()),
        },
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl SelectStatement {
    /// Folds one record's value for `column` into that column's summary.
    /// `None` is a NULL value.
    pub fn summarize(&mut self, column: usize, value: Option<&str>) -> Result<()> {
        let def = self
            .columns
            .get(column)
            .ok_or(SqlError::ColumnOutOfRange(column))?;
        if def.func.is_none() && !def.distinct {
            return Ok(());
        }
        if let Some(ColumnFunc::Custom(name)) = &def.func {
            return Err(SqlError::CustomFunctionSummary(name.clone()));
        }
        let func = def.func.clone();
        let distinct = def.distinct;

        if self.summaries.is_empty() {
            self.summaries = vec![ColumnSummary::new(); self.columns.len()];
        }
        let summary = &mut self.summaries[column];

        // DISTINCT columns only fold each value the first time it is seen
        let fresh = !distinct || summary.insert_distinct(value);

        match func {
            Some(ColumnFunc::Min) => {
                if let Some(v) = non_empty(value) {
                    summary.min = summary.min.min(parse_float_prefix(v));
                }
            }
            Some(ColumnFunc::Max) => {
                if let Some(v) = non_empty(value) {
                    summary.max = summary.max.max(parse_float_prefix(v));
                }
            }
            Some(ColumnFunc::Avg) | Some(ColumnFunc::Sum) => {
                if let Some(v) = non_empty(value).filter(|_| fresh) {
                    summary.count += 1;
                    summary.sum += parse_float_prefix(v);
                }
            }
            Some(ColumnFunc::Count) | None => {
                if fresh && value.is_some() {
                    summary.count += 1;
                }
            }
            Some(ColumnFunc::Custom(_)) => {}
        }
        trace!("Summarized column {} value {:?}", column, value);
        Ok(())
    }

    pub fn summarize_value(&mut self, column: usize, value: &Value) -> Result<()> {
        let text = value.to_text();
        self.summarize(column, text.as_deref())
    }

    /// Orders the DISTINCT list by its ORDER BY key, if any.
    pub fn finish_summarize(&mut self) -> Result<()> {
        if self.query_mode != QueryMode::DistinctList || self.order_defs.is_empty() {
            return Ok(());
        }
        self.check_distinct_order()?;

        let field_type = self.columns[0].field_type;
        let ascending = self.order_defs[0].ascending;
        if let Some(summary) = self.summaries.first_mut() {
            summary.sort_distinct(field_type, ascending);
        }
        Ok(())
    }

    pub fn column_summary(&self, column: usize) -> Option<&ColumnSummary> {
        self.summaries.get(column)
    }

    pub fn reset_summaries(&mut self) {
        self.summaries.clear();
    }
}
