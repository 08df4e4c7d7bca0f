use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::types::{FieldIndex, value::FieldType};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ParseFlags: u32 {
        /// Accept unknown column functions as custom functions.
        const ALLOW_UNDEFINED_COL_FUNCS = 0x01;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Schema the compiler resolves names against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldList {
    fields: Vec<FieldDef>,
}

impl FieldList {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Self { fields }
    }

    pub fn from_pairs(pairs: &[(&str, FieldType)]) -> Self {
        Self {
            fields: pairs
                .iter()
                .map(|(name, field_type)| FieldDef::new(*name, *field_type))
                .collect(),
        }
    }

    /// Case-insensitive lookup.
    pub fn find(&self, name: &str) -> Option<FieldIndex> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, index: FieldIndex) -> Option<&FieldDef> {
        self.fields.get(index)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnFunc {
    Avg,
    Min,
    Max,
    Sum,
    Count,
    Custom(String),
}

impl ColumnFunc {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "AVG" => ColumnFunc::Avg,
            "MIN" => ColumnFunc::Min,
            "MAX" => ColumnFunc::Max,
            "SUM" => ColumnFunc::Sum,
            "COUNT" => ColumnFunc::Count,
            _ => ColumnFunc::Custom(name.to_string()),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ColumnFunc::Custom(_))
    }

    /// Functions that need a numeric field.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, ColumnFunc::Avg | ColumnFunc::Min | ColumnFunc::Max | ColumnFunc::Sum)
    }
}

impl fmt::Display for ColumnFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnFunc::Avg => f.write_str("AVG"),
            ColumnFunc::Min => f.write_str("MIN"),
            ColumnFunc::Max => f.write_str("MAX"),
            ColumnFunc::Sum => f.write_str("SUM"),
            ColumnFunc::Count => f.write_str("COUNT"),
            ColumnFunc::Custom(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Recordset,
    Summary,
    DistinctList,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryMode::Recordset => "RECORDSET",
            QueryMode::Summary => "SUMMARY",
            QueryMode::DistinctList => "DISTINCT_LIST",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub field_name: String,
    pub func_name: Option<String>,
    pub func: Option<ColumnFunc>,
    pub distinct: bool,
    /// `None` only for `COUNT(*)` style columns.
    pub field_index: Option<FieldIndex>,
    pub field_type: FieldType,
}

impl ColumnDef {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            func_name: None,
            func: None,
            distinct: false,
            field_index: None,
            field_type: FieldType::Other,
        }
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        match &self.func_name {
            Some(func) => write!(f, "{}({}{})", func, distinct, self.field_name),
            None => write!(f, "{}{}", distinct, self.field_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDef {
    pub field_name: String,
    pub field_index: Option<FieldIndex>,
    pub ascending: bool,
}
