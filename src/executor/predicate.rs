use std::{cmp::Ordering, convert::Infallible};

use crate::{
    planner::expression::{CompareOp, Expr, FieldOp, Operand},
    types::{
        row::Row,
        value::{FieldType, Value},
    },
};

impl Expr {
    /// Walks the tree, handing every field comparison to `field_test`.
    /// AND and OR short-circuit on their left operand.
    pub fn evaluate<E, F>(&self, field_test: &mut F) -> Result<bool, E>
    where
        F: FnMut(&FieldOp) -> Result<bool, E>,
    {
        match self {
            Expr::And(left, right) => {
                if !left.evaluate(field_test)? {
                    return Ok(false); // Short-circuit evaluation
                }
                right.evaluate(field_test)
            }
            Expr::Or(left, right) => {
                if left.evaluate(field_test)? {
                    return Ok(true); // Short-circuit evaluation
                }
                right.evaluate(field_test)
            }
            Expr::Not(inner) => Ok(!inner.evaluate(field_test)?),
            Expr::Field(op) => field_test(op),
        }
    }

    /// Evaluates against a record using `FieldOp::test`. Missing fields
    /// read as NULL.
    pub fn evaluate_row(&self, row: &Row) -> bool {
        let result: Result<bool, Infallible> = self.evaluate(&mut |op: &FieldOp| {
            Ok(op.test(row.get_value(op.field_index).unwrap_or(&Value::Null)))
        });
        result.unwrap_or_else(|never| match never {})
    }
}

impl FieldOp {
    /// Default record semantics: numeric comparison for numeric fields,
    /// case-insensitive equality for strings, NULL fails everything but
    /// IS NULL.
    pub fn test(&self, value: &Value) -> bool {
        if self.op == CompareOp::IsNull {
            return value.is_null();
        }
        if value.is_null() {
            return false;
        }

        match (&self.op, &self.operand) {
            (CompareOp::Like, Operand::Value(pattern)) => test_like(&value.to_string(), &pattern.to_string()),
            (CompareOp::In, Operand::List(items)) => items
                .iter()
                .any(|item| values_equal(value, item, self.field_type)),
            (CompareOp::Eq, Operand::Value(literal)) => values_equal(value, literal, self.field_type),
            (CompareOp::Ne, Operand::Value(literal)) => {
                matches!(compare(value, literal, self.field_type), Some(o) if o != Ordering::Equal)
            }
            (CompareOp::Lt, Operand::Value(literal)) => {
                matches!(compare(value, literal, self.field_type), Some(Ordering::Less))
            }
            (CompareOp::Le, Operand::Value(literal)) => matches!(
                compare(value, literal, self.field_type),
                Some(Ordering::Less | Ordering::Equal)
            ),
            (CompareOp::Gt, Operand::Value(literal)) => {
                matches!(compare(value, literal, self.field_type), Some(Ordering::Greater))
            }
            (CompareOp::Ge, Operand::Value(literal)) => matches!(
                compare(value, literal, self.field_type),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            _ => false,
        }
    }
}

fn values_equal(value: &Value, literal: &Value, field_type: FieldType) -> bool {
    compare(value, literal, field_type) == Some(Ordering::Equal)
}

/// Orders a record value against a compiled literal. Strings compare
/// case-insensitively.
fn compare(value: &Value, literal: &Value, field_type: FieldType) -> Option<Ordering> {
    match field_type {
        FieldType::Integer | FieldType::Float => match (value, literal) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            _ => value
                .coerce_to_number()?
                .partial_cmp(&literal.coerce_to_number()?),
        },
        _ => {
            let a = value.to_string().to_lowercase();
            let b = literal.to_string().to_lowercase();
            Some(a.cmp(&b))
        }
    }
}

/// SQL LIKE: `%` matches any run of characters, `_` exactly one.
/// Characters compare case-insensitively.
pub fn test_like(input: &str, pattern: &str) -> bool {
    let input: Vec<char> = input.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();
    like_match(&input, &pattern)
}

fn like_match(input: &[char], pattern: &[char]) -> bool {
    match pattern.split_first() {
        None => input.is_empty(),
        Some(('%', rest)) => {
            if rest.is_empty() {
                return true;
            }
            (0..=input.len()).any(|skip| like_match(&input[skip..], rest))
        }
        Some(('_', rest)) => !input.is_empty() && like_match(&input[1..], rest),
        Some((c, rest)) => match input.split_first() {
            Some((i, input_rest)) => chars_match(*i, *c) && like_match(input_rest, rest),
            None => false,
        },
    }
}

fn chars_match(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
