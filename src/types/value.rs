use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// Field types known to the SQL engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Integer,
    Float,
    String,
    Boolean,
    Other,
}

impl FieldType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Float)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "integer" | "int" => Some(FieldType::Integer),
            "float" | "real" | "double" => Some(FieldType::Float),
            "string" | "text" | "char" => Some(FieldType::String),
            "boolean" | "bool" | "logical" => Some(FieldType::Boolean),
            "other" => Some(FieldType::Other),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "INTEGER",
            FieldType::Float => "FLOAT",
            FieldType::String => "STRING",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Other => "OTHER",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Builds a value of `field_type` from literal text, the way C's
    /// `atoi`/`atof` read a leading numeric prefix.
    pub fn from_literal(text: &str, field_type: FieldType) -> Self {
        match field_type {
            FieldType::Integer => Value::Integer(parse_int_prefix(text)),
            FieldType::Float => Value::Float(parse_float_prefix(text)),
            _ => Value::String(text.to_string()),
        }
    }

    pub fn coerce_to_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(r) => Some(*r),
            Value::String(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    pub fn coerce_to_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(r) => Some(*r as i64),
            Value::String(s) => Some(parse_int_prefix(s)),
            Value::Null => None,
        }
    }

    /// Text form used by summaries and DISTINCT lists; `None` for NULL.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(r) => write!(f, "{}", r),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, Value::Null) => Some(Ordering::Equal),
            (Value::Null, _) => Some(Ordering::Less),
            (_, Value::Null) => Some(Ordering::Greater),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::String(a), Value::String(b)) => a.partial_cmp(b),
            _ => None, // Mixed types
        }
    }
}

/// Leading-integer parse with `atoi` semantics: optional sign, digits,
/// anything after is ignored, no digits gives 0.
pub fn parse_int_prefix(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    trimmed[..end].parse::<i64>().unwrap_or_else(|_| {
        if bytes[0] == b'-' { i64::MIN } else { i64::MAX }
    })
}

/// Leading-float parse with `atof` semantics. Takes the longest prefix
/// that parses as a float.
pub fn parse_float_prefix(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'-' || bytes[exp_end] == b'+') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }
    (1..=end)
        .rev()
        .find_map(|len| trimmed[..len].parse::<f64>().ok())
        .unwrap_or(0.0)
}
