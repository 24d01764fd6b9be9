//! Settings file for directories and run defaults
//!
//! Settings are read from a JSON file; every key is optional and anything
//! given on the command line takes precedence.
//!
//! ```json
//! {
//!   "eobs_dir": "/data/EObs_v17/Monthly",
//!   "anchor_date": "31/12/2000",
//!   "audit_csv": "/tmp/results.csv",
//!   "cutoff_year": 2000,
//!   "excluded_countries": ["China"]
//! }
//! ```

use crate::errors::{GridSpliceError, Result};
use crate::observations::parse_date;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Optional settings loaded from JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub eobs_dir: Option<PathBuf>,
    pub anchor_date: Option<String>,
    pub audit_csv: Option<PathBuf>,
    pub cutoff_year: Option<i32>,
    pub excluded_countries: Option<Vec<String>>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load `path` if given, else defaults
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// Configured anchor date, validated
    pub fn anchor_date(&self) -> Result<Option<NaiveDate>> {
        self.anchor_date
            .as_deref()
            .map(|text| {
                parse_date(text).ok_or_else(|| {
                    GridSpliceError::Generic(format!("anchor_date '{}' is not a valid date", text))
                })
            })
            .transpose()
    }

    pub fn cutoff_year(&self) -> i32 {
        self.cutoff_year.unwrap_or(2000)
    }

    pub fn excluded_countries(&self) -> Vec<String> {
        self.excluded_countries
            .clone()
            .unwrap_or_else(|| vec!["China".to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fall_back_to_defaults() {
        let settings = Settings::from_json(r#"{"eobs_dir": "/data/eobs", "anchor_date": "31/12/2000"}"#).unwrap();
        assert_eq!(settings.eobs_dir, Some(PathBuf::from("/data/eobs")));
        assert_eq!(settings.anchor_date().unwrap(), NaiveDate::from_ymd_opt(2000, 12, 31));
        assert_eq!(settings.cutoff_year(), 2000);
        assert_eq!(settings.excluded_countries(), vec!["China".to_string()]);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(Settings::from_json("{not json").is_err());
        let settings = Settings::from_json(r#"{"anchor_date": "yesterday"}"#).unwrap();
        assert!(settings.anchor_date().is_err());
    }
}
