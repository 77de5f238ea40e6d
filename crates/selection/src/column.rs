use shared::protocol::CheckMarker;

use crate::config::{HeaderPosition, SelectionOptions};

pub const BASE_HEADER_STYLE: &str = "padding-left: 13px;";
pub const HEADER_CLASS: &str = "x-column-header-checkbox";
pub const HEADER_CHECKED_CLASS: &str = "x-grid-hd-checker-on";
pub const CELL_CLASS: &str = "x-grid-cell-special";
pub const CHECKBOX_INPUT_CLASS: &str = "ux-grid-cell-checker";

/// Header definition handed to the view when the column is injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderConfig {
    pub is_checker_header: bool,
    pub text: String,
    pub width: u32,
    pub style: String,
    pub class: String,
    /// Class to add to the header while every visible record is selected.
    pub checked_class: &'static str,
    pub sortable: bool,
    pub draggable: bool,
    pub resizable: bool,
    pub hideable: bool,
    pub menu_disabled: bool,
}

/// Markup for one checkbox cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCell {
    pub cell_class: &'static str,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckboxColumn {
    position: HeaderPosition,
    width: u32,
    header_style: Option<String>,
    wrapper_class: String,
}

impl CheckboxColumn {
    pub fn from_options(options: &SelectionOptions) -> Self {
        Self {
            position: options.header_position,
            width: options.header_width,
            header_style: options
                .header_style
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            wrapper_class: options.additional_classes.join(" "),
        }
    }

    pub fn position(&self, column_count: usize) -> usize {
        self.position.resolve(column_count)
    }

    pub fn header_config(&self) -> HeaderConfig {
        let style = match &self.header_style {
            Some(extra) => format!("{extra} {BASE_HEADER_STYLE}"),
            None => BASE_HEADER_STYLE.to_string(),
        };

        HeaderConfig {
            is_checker_header: true,
            text: "&#160;".to_string(),
            width: self.width,
            style,
            class: HEADER_CLASS.to_string(),
            checked_class: HEADER_CHECKED_CLASS,
            sortable: false,
            draggable: false,
            resizable: false,
            hideable: false,
            menu_disabled: true,
        }
    }

    pub fn render_cell(&self, marker: CheckMarker) -> RenderedCell {
        let checked = if marker.is_checked() { " checked" } else { "" };
        RenderedCell {
            cell_class: CELL_CLASS,
            html: format!(
                r#"<div class="{}"><input class="{CHECKBOX_INPUT_CLASS}" type="checkbox"{checked}/></div>"#,
                self.wrapper_class
            ),
        }
    }
}
