use serde::{Deserialize, Serialize};

use crate::types::value::Value;

/// One feature's attribute record, fields in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub feature_id: Option<i64>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            feature_id: None,
            values,
        }
    }

    pub fn with_feature_id(feature_id: i64, values: Vec<Value>) -> Self {
        Self {
            feature_id: Some(feature_id),
            values,
        }
    }

    pub fn get_value(&self, field_index: usize) -> Option<&Value> {
        self.values.get(field_index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
