use std::sync::Arc;

use serde_json::{json, Value};
use shared::domain::{Identifier, StateKey};
use storage::{MemoryStateProvider, StateProvider};

use super::*;
use crate::config::{HeaderEdge, HeaderPosition, SelectionOptions};

struct FakeGrid {
    records: Vec<Value>,
    page: std::ops::Range<usize>,
    sorted: Option<Vec<usize>>,
    columns: Vec<String>,
    header_checked: bool,
    refreshes: usize,
}

impl FakeGrid {
    fn new(ids: &[i64]) -> Self {
        Self {
            records: ids.iter().map(|id| json!({ "id": id })).collect(),
            page: 0..ids.len(),
            sorted: None,
            columns: vec!["name".to_string(), "price".to_string()],
            header_checked: false,
            refreshes: 0,
        }
    }
}

impl GridView<Value> for FakeGrid {
    fn records(&self) -> &[Value] {
        &self.records
    }

    fn rendered_record(&self, row: usize) -> Option<&Value> {
        let index = self.page.start + row;
        if index < self.page.end {
            self.records.get(index)
        } else {
            None
        }
    }

    fn sorted_row_map(&self) -> Option<&[usize]> {
        self.sorted.as_deref()
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn insert_column(&mut self, position: usize, header: HeaderConfig) {
        assert!(header.is_checker_header);
        self.columns.insert(position, "checker".to_string());
    }

    fn set_header_checked(&mut self, checked: bool) {
        self.header_checked = checked;
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

fn key() -> StateKey {
    StateKey::new("grid1").expect("state key")
}

fn ids(values: &[i64]) -> Vec<Identifier> {
    values.iter().copied().map(Identifier::Int).collect()
}

async fn attached(
    provider: Arc<MemoryStateProvider>,
    grid: &mut FakeGrid,
    options: &SelectionOptions,
) -> CheckboxSelectionPlugin<Value> {
    let mut plugin = CheckboxSelectionPlugin::new(
        SelectionStateStore::new(provider),
        options.column(),
    );
    plugin
        .attach(grid, options.binding().expect("binding"))
        .await
        .expect("attach");
    plugin
}

#[tokio::test]
async fn attach_injects_column_and_restores_header_state() {
    let provider = Arc::new(MemoryStateProvider::new());
    provider.set(&key(), &ids(&[1, 2])).await.expect("seed");
    let mut grid = FakeGrid::new(&[1, 2]);
    let mut options = SelectionOptions::new("grid1", "id");
    options.header_position = HeaderPosition::Edge(HeaderEdge::Last);

    let plugin = attached(provider, &mut grid, &options).await;

    assert_eq!(grid.columns, vec!["name", "price", "checker"]);
    assert!(grid.header_checked);
    assert!(plugin.controller().is_initialized());
}

#[tokio::test]
async fn header_click_selects_then_deselects_everything() {
    let provider = Arc::new(MemoryStateProvider::new());
    let mut grid = FakeGrid::new(&[1, 2, 3]);
    let options = SelectionOptions::new("grid1", "id");
    let mut plugin = attached(provider.clone(), &mut grid, &options).await;
    assert_eq!(grid.columns[0], "checker");

    plugin
        .handle(&mut grid, ViewEvent::HeaderClicked)
        .await
        .expect("select all");
    assert!(grid.header_checked);
    assert_eq!(grid.refreshes, 1);
    assert_eq!(provider.get(&key()).await.unwrap(), Some(ids(&[1, 2, 3])));

    plugin
        .handle(&mut grid, ViewEvent::HeaderClicked)
        .await
        .expect("deselect all");
    assert!(!grid.header_checked);
    assert_eq!(grid.refreshes, 2);
    assert_eq!(provider.get(&key()).await.unwrap(), Some(Vec::new()));
}

#[tokio::test]
async fn selecting_last_row_checks_header() {
    let provider = Arc::new(MemoryStateProvider::new());
    let mut grid = FakeGrid::new(&[1, 2]);
    let options = SelectionOptions::new("grid1", "id");
    let mut plugin = attached(provider, &mut grid, &options).await;

    for row in 0..2 {
        plugin
            .handle(
                &mut grid,
                ViewEvent::RowClicked {
                    row,
                    on_checkbox: true,
                },
            )
            .await
            .expect("row click");
    }
    assert!(grid.header_checked);

    plugin
        .handle(
            &mut grid,
            ViewEvent::RowClicked {
                row: 0,
                on_checkbox: true,
            },
        )
        .await
        .expect("row click");
    assert!(!grid.header_checked);
}

#[tokio::test]
async fn row_click_outside_checkbox_is_ignored() {
    let provider = Arc::new(MemoryStateProvider::new());
    let mut grid = FakeGrid::new(&[1, 2]);
    let options = SelectionOptions::new("grid1", "id");
    let mut plugin = attached(provider.clone(), &mut grid, &options).await;

    plugin
        .handle(
            &mut grid,
            ViewEvent::RowClicked {
                row: 0,
                on_checkbox: false,
            },
        )
        .await
        .expect("row click");

    assert_eq!(provider.get(&key()).await.unwrap(), Some(Vec::new()));
}

#[tokio::test]
async fn row_click_follows_sorted_row_map() {
    let provider = Arc::new(MemoryStateProvider::new());
    let mut grid = FakeGrid::new(&[10, 20, 30]);
    grid.sorted = Some(vec![2, 0, 1]);
    let options = SelectionOptions::new("grid1", "id");
    let mut plugin = attached(provider.clone(), &mut grid, &options).await;

    plugin
        .handle(
            &mut grid,
            ViewEvent::RowClicked {
                row: 0,
                on_checkbox: true,
            },
        )
        .await
        .expect("row click");

    assert_eq!(provider.get(&key()).await.unwrap(), Some(ids(&[30])));
    let cell = plugin
        .render_row(&grid, 0)
        .await
        .expect("render")
        .expect("cell");
    assert!(cell.html.contains(" checked/"));
}

#[tokio::test]
async fn refresh_recomputes_header_for_new_page() {
    let provider = Arc::new(MemoryStateProvider::new());
    provider.set(&key(), &ids(&[1, 2])).await.expect("seed");
    let mut grid = FakeGrid::new(&[1, 2]);
    let options = SelectionOptions::new("grid1", "id");
    let mut plugin = attached(provider, &mut grid, &options).await;
    assert!(grid.header_checked);

    grid.records = vec![json!({ "id": 3 }), json!({ "id": 4 })];
    grid.page = 0..2;
    plugin
        .handle(&mut grid, ViewEvent::Refreshed)
        .await
        .expect("refresh");
    assert!(!grid.header_checked);

    grid.records = Vec::new();
    grid.page = 0..0;
    plugin
        .handle(&mut grid, ViewEvent::Refreshed)
        .await
        .expect("refresh");
    assert!(!grid.header_checked);
}

#[tokio::test]
async fn render_row_outside_page_is_none() {
    let provider = Arc::new(MemoryStateProvider::new());
    let mut grid = FakeGrid::new(&[1]);
    let options = SelectionOptions::new("grid1", "id");
    let plugin = attached(provider, &mut grid, &options).await;

    assert!(plugin.render_row(&grid, 5).await.expect("render").is_none());
    let cell = plugin
        .render_row(&grid, 0)
        .await
        .expect("render")
        .expect("cell");
    assert!(!cell.html.contains(" checked/"));
}

#[tokio::test]
async fn detach_drops_persisted_selection() {
    let provider = Arc::new(MemoryStateProvider::new());
    let mut grid = FakeGrid::new(&[1]);
    let options = SelectionOptions::new("grid1", "id");
    let mut plugin = attached(provider.clone(), &mut grid, &options).await;
    let mut rx = plugin.subscribe();
    plugin
        .handle(&mut grid, ViewEvent::HeaderClicked)
        .await
        .expect("select all");
    assert!(rx.try_recv().is_ok());

    plugin.detach().await.expect("detach");
    assert!(!provider.contains_key(&key()).await);
}
