use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{storage::header::ProjInfo, types::error::Result};

/// Settings applied to the header of a newly created MAP file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub coord_precision: u8,
    pub dist_units_code: u8,
    pub coordsys2dist_units: f64,
    pub proj: ProjInfo,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            coord_precision: 3,
            dist_units_code: 7,
            coordsys2dist_units: 1.0,
            proj: ProjInfo::default(),
        }
    }
}

impl MapConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
