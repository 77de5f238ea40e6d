//! Glue between a grid-like view and a [`SelectionController`].

use shared::{
    error::Result,
    protocol::{SelectionEvent, ViewEvent},
};
use storage::SelectionStateStore;
use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    binding::SelectionBinding,
    column::{CheckboxColumn, HeaderConfig, RenderedCell},
    SelectionController, Toggled,
};

/// What the checkbox column needs from the hosting view.
pub trait GridView<R> {
    /// The whole logical collection, including records on other pages.
    fn records(&self) -> &[R];

    /// Record shown at rendered row `row`.
    fn rendered_record(&self, row: usize) -> Option<&R>;

    /// Rendered row to index into [`records`](Self::records), when the view
    /// renders records in an order of its own.
    fn sorted_row_map(&self) -> Option<&[usize]> {
        None
    }

    fn column_count(&self) -> usize;
    fn insert_column(&mut self, position: usize, header: HeaderConfig);
    fn set_header_checked(&mut self, checked: bool);
    fn refresh(&mut self);
}

pub struct CheckboxSelectionPlugin<R> {
    controller: SelectionController<R>,
    column: CheckboxColumn,
}

impl<R> CheckboxSelectionPlugin<R> {
    pub fn new(store: SelectionStateStore, column: CheckboxColumn) -> Self {
        Self {
            controller: SelectionController::new(store),
            column,
        }
    }

    pub fn controller(&self) -> &SelectionController<R> {
        &self.controller
    }

    pub fn column(&self) -> &CheckboxColumn {
        &self.column
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.controller.subscribe()
    }

    /// Injects the checkbox column and binds the controller.
    pub async fn attach<V>(&mut self, view: &mut V, binding: SelectionBinding<R>) -> Result<()>
    where
        V: GridView<R>,
    {
        let all_selected = self.controller.initialize(binding, view.records()).await?;
        let position = self.column.position(view.column_count());
        view.insert_column(position, self.column.header_config());
        view.set_header_checked(all_selected);
        debug!(position, "checkbox column attached");
        Ok(())
    }

    pub async fn handle<V>(&mut self, view: &mut V, event: ViewEvent) -> Result<()>
    where
        V: GridView<R>,
    {
        match event {
            ViewEvent::HeaderClicked => self.on_header_clicked(view).await,
            ViewEvent::RowClicked { row, on_checkbox } => {
                if on_checkbox {
                    self.on_row_clicked(view, row).await
                } else {
                    Ok(())
                }
            }
            ViewEvent::Refreshed => {
                let all_selected = self.controller.recompute_aggregate(view.records()).await?;
                view.set_header_checked(all_selected);
                Ok(())
            }
        }
    }

    /// Checkbox markup for rendered row `row`.
    pub async fn render_row<V>(&self, view: &V, row: usize) -> Result<Option<RenderedCell>>
    where
        V: GridView<R>,
    {
        let Some(record) = resolve_row(view, row) else {
            return Ok(None);
        };
        let marker = self.controller.render_marker(record).await?;
        Ok(Some(self.column.render_cell(marker)))
    }

    /// Tears the controller down, dropping the persisted selection.
    pub async fn detach(self) -> Result<()> {
        self.controller.teardown().await
    }

    async fn on_header_clicked<V>(&mut self, view: &mut V) -> Result<()>
    where
        V: GridView<R>,
    {
        if self.controller.all_selected() {
            self.controller.deselect_all(view.records()).await?;
        } else {
            self.controller.select_all(view.records()).await?;
        }
        view.refresh();
        view.set_header_checked(self.controller.all_selected());
        Ok(())
    }

    async fn on_row_clicked<V>(&mut self, view: &mut V, row: usize) -> Result<()>
    where
        V: GridView<R>,
    {
        let outcome = match resolve_row(view, row) {
            Some(record) => self.controller.toggle(record, view.records()).await?,
            None => {
                debug!(row, "row click outside the loaded records");
                return Ok(());
            }
        };

        if outcome != Toggled::Ignored {
            view.set_header_checked(self.controller.all_selected());
        }
        Ok(())
    }
}

fn resolve_row<R, V>(view: &V, row: usize) -> Option<&R>
where
    V: GridView<R>,
{
    match view.sorted_row_map() {
        Some(map) => map.get(row).and_then(|&index| view.records().get(index)),
        None => view.rendered_record(row),
    }
}

#[cfg(test)]
#[path = "tests/plugin_tests.rs"]
mod tests;
