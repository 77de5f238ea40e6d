use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Identifier, StateKey};

/// Notifications emitted by a selection controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SelectionEvent {
    SelectionChanged {
        state_key: StateKey,
        selection: Vec<Identifier>,
        changed_at: DateTime<Utc>,
    },
    /// Every rendered row may have changed; the view should re-render.
    RefreshRequested { state_key: StateKey },
}

impl SelectionEvent {
    pub fn state_key(&self) -> &StateKey {
        match self {
            SelectionEvent::SelectionChanged { state_key, .. }
            | SelectionEvent::RefreshRequested { state_key } => state_key,
        }
    }

    pub fn selection(&self) -> Option<&[Identifier]> {
        match self {
            SelectionEvent::SelectionChanged { selection, .. } => Some(selection),
            SelectionEvent::RefreshRequested { .. } => None,
        }
    }
}

/// View interactions consumed by the checkbox column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    HeaderClicked,
    RowClicked { row: usize, on_checkbox: bool },
    Refreshed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckMarker {
    Checked,
    Unchecked,
}

impl CheckMarker {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            CheckMarker::Checked
        } else {
            CheckMarker::Unchecked
        }
    }

    pub fn is_checked(self) -> bool {
        self == CheckMarker::Checked
    }
}

/// How much of a record collection is selected. An empty collection is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    All,
    Partial,
    None,
}

impl Coverage {
    pub fn is_all(self) -> bool {
        self == Coverage::All
    }
}
