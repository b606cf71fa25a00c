use crate::domain::models::Value;
use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Which cleaning steps to run. Every field is optional and a step is skipped
/// when its field is empty. See [`crate::domain::cleaning::clean`] for the order
/// the steps run in.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CleanOptions {
    pub drop_duplicates: bool,
    pub drop_na: bool,
    pub fill_na: BTreeMap<String, Value>,
    pub convert_to_datetime: Vec<String>,
    pub uppercase_columns: Vec<String>,
    pub lowercase_columns: Vec<String>,
    pub titlecase_columns: Vec<String>,
    pub strip_spaces: bool,
    pub rename_columns: BTreeMap<String, String>,
    pub drop_columns: Vec<String>,
    pub categorize_columns: Vec<String>,
    pub replace_values: BTreeMap<String, Vec<(Value, Value)>>,
    /// Added in the order written.
    pub new_columns: IndexMap<String, Value>,
    /// Column name to expression, e.g. `"total": "price * qty"`. Evaluated in the
    /// order written, so a later expression may use an earlier column.
    pub computed_columns: IndexMap<String, String>,
    /// Column name to chrono format string.
    pub convert_date_columns: BTreeMap<String, String>,
    pub convert_to_int_columns: Vec<String>,
    pub convert_to_float: Vec<String>,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            drop_duplicates: false,
            drop_na: false,
            fill_na: BTreeMap::new(),
            convert_to_datetime: Vec::new(),
            uppercase_columns: Vec::new(),
            lowercase_columns: Vec::new(),
            titlecase_columns: Vec::new(),
            strip_spaces: true,
            rename_columns: BTreeMap::new(),
            drop_columns: Vec::new(),
            categorize_columns: Vec::new(),
            replace_values: BTreeMap::new(),
            new_columns: IndexMap::new(),
            computed_columns: IndexMap::new(),
            convert_date_columns: BTreeMap::new(),
            convert_to_int_columns: Vec::new(),
            convert_to_float: Vec::new(),
        }
    }
}

impl CleanOptions {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read cleaning options: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse cleaning options: {}", path.display()))
    }
}
