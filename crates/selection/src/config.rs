use serde::{Deserialize, Serialize};
use shared::{
    domain::{Record, StateKey},
    error::{Result, SelectionError},
};

use crate::{binding::SelectionBinding, column::CheckboxColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderEdge {
    First,
    Last,
}

/// Where the checkbox column is inserted: `"first"`, `"last"` or an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderPosition {
    Index(usize),
    Edge(HeaderEdge),
}

impl Default for HeaderPosition {
    fn default() -> Self {
        HeaderPosition::Index(0)
    }
}

impl HeaderPosition {
    /// Column index for a header with `column_count` existing columns.
    pub fn resolve(self, column_count: usize) -> usize {
        match self {
            HeaderPosition::Edge(HeaderEdge::First) => 0,
            HeaderPosition::Edge(HeaderEdge::Last) => column_count,
            HeaderPosition::Index(index) => index.min(column_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOptions {
    #[serde(default)]
    pub state_key: String,

    #[serde(default)]
    pub record_index_field: String,

    #[serde(default)]
    pub header_position: HeaderPosition,

    #[serde(default = "default_header_width")]
    pub header_width: u32,

    #[serde(default)]
    pub header_style: Option<String>,

    #[serde(default)]
    pub additional_classes: Vec<String>,
}

fn default_header_width() -> u32 {
    50
}

impl SelectionOptions {
    pub fn new(state_key: impl Into<String>, record_index_field: impl Into<String>) -> Self {
        Self {
            state_key: state_key.into(),
            record_index_field: record_index_field.into(),
            header_position: HeaderPosition::default(),
            header_width: default_header_width(),
            header_style: None,
            additional_classes: Vec::new(),
        }
    }

    /// Checks the required options and returns the parsed state key.
    pub fn validate(&self) -> Result<StateKey> {
        if self.record_index_field.trim().is_empty() {
            return Err(SelectionError::Configuration(
                "record_index_field is required".to_string(),
            ));
        }
        StateKey::new(self.state_key.as_str()).map_err(|_| {
            SelectionError::Configuration("state_key is required".to_string())
        })
    }

    pub fn binding<R: Record + 'static>(&self) -> Result<SelectionBinding<R>> {
        let state_key = self.validate()?;
        SelectionBinding::for_field(state_key, self.record_index_field.as_str())
    }

    pub fn column(&self) -> CheckboxColumn {
        CheckboxColumn::from_options(self)
    }
}
