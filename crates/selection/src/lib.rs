//! Persistent checkbox selection over paged or virtualized record views.
//!
//! [`SelectionController`] owns the selection semantics and round-trips every
//! mutation through a [`SelectionStateStore`]. [`plugin::CheckboxSelectionPlugin`]
//! wires it to a [`plugin::GridView`].

use chrono::Utc;
use shared::{
    domain::{Identifier, SelectionSet, StateKey},
    error::{Result, SelectionError},
    protocol::{CheckMarker, Coverage, SelectionEvent},
};
use storage::SelectionStateStore;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod binding;
pub mod column;
pub mod config;
pub mod plugin;

pub use binding::SelectionBinding;
pub use column::{CheckboxColumn, HeaderConfig};
pub use config::{HeaderEdge, HeaderPosition, SelectionOptions};
pub use plugin::{CheckboxSelectionPlugin, GridView};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of toggling one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Selected(Identifier),
    Deselected(Identifier),
    /// The record has no identity; nothing was read or written.
    Ignored,
}

pub struct SelectionController<R> {
    store: SelectionStateStore,
    binding: Option<SelectionBinding<R>>,
    all_selected: bool,
    events: broadcast::Sender<SelectionEvent>,
}

impl<R> SelectionController<R> {
    pub fn new(store: SelectionStateStore) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            binding: None,
            all_selected: false,
            events,
        }
    }

    /// Subscribe before [`initialize`](Self::initialize) to also receive the
    /// initial notification.
    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.events.subscribe()
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.is_some()
    }

    pub fn state_key(&self) -> Option<&StateKey> {
        self.binding.as_ref().map(SelectionBinding::state_key)
    }

    /// Header state from the most recent aggregate computation.
    pub fn all_selected(&self) -> bool {
        self.all_selected
    }

    /// Binds the controller, computes the initial header state over `visible`
    /// and announces the current selection.
    pub async fn initialize(&mut self, binding: SelectionBinding<R>, visible: &[R]) -> Result<bool> {
        if let Some(existing) = &self.binding {
            return Err(SelectionError::Configuration(format!(
                "selection controller is already bound to state key '{}'",
                existing.state_key()
            )));
        }

        let selection = self.store.get(binding.state_key()).await?;
        let all_selected = aggregate(&binding, &selection, visible);
        info!(
            state_key = %binding.state_key(),
            selected = selection.len(),
            visible = visible.len(),
            all_selected,
            "selection controller initialized"
        );

        self.emit_changed(binding.state_key(), &selection);
        self.all_selected = all_selected;
        self.binding = Some(binding);
        Ok(all_selected)
    }

    pub async fn selection(&self) -> Result<SelectionSet> {
        let binding = self.binding()?;
        self.store.get(binding.state_key()).await
    }

    /// Flips membership of `record`, then recomputes the header state over
    /// `visible`.
    pub async fn toggle(&mut self, record: &R, visible: &[R]) -> Result<Toggled> {
        let binding = self.binding()?.clone();
        let Some(id) = binding.identify(record) else {
            warn!(state_key = %binding.state_key(), "ignoring toggle for record without identity");
            return Ok(Toggled::Ignored);
        };

        let mut selection = self.store.get(binding.state_key()).await?;
        let selected = selection.toggle(id.clone());
        self.store.set(binding.state_key(), Some(&selection)).await?;
        debug!(state_key = %binding.state_key(), %id, selected, "toggled record");

        self.emit_changed(binding.state_key(), &selection);
        self.all_selected = aggregate(&binding, &selection, visible);

        Ok(if selected {
            Toggled::Selected(id)
        } else {
            Toggled::Deselected(id)
        })
    }

    /// Adds every identifier of `visible` that is not selected yet, in
    /// collection order. Identifiers of records outside `visible` stay.
    pub async fn select_all(&mut self, visible: &[R]) -> Result<SelectionSet> {
        self.apply_to_all(visible, |selection, id| selection.insert(id))
            .await
    }

    /// Removes every identifier of `visible`. Identifiers of records outside
    /// `visible` stay.
    pub async fn deselect_all(&mut self, visible: &[R]) -> Result<SelectionSet> {
        self.apply_to_all(visible, |selection, id| selection.remove(&id))
            .await
    }

    /// `true` iff `visible` is non-empty and every record in it is selected.
    pub async fn recompute_aggregate(&mut self, visible: &[R]) -> Result<bool> {
        let binding = self.binding()?.clone();
        let selection = self.store.get(binding.state_key()).await?;
        self.all_selected = aggregate(&binding, &selection, visible);
        Ok(self.all_selected)
    }

    pub async fn coverage(&self, visible: &[R]) -> Result<Coverage> {
        let binding = self.binding()?;
        let selection = self.store.get(binding.state_key()).await?;
        Ok(selection.coverage(visible.iter().map(|record| binding.identify(record))))
    }

    pub async fn render_marker(&self, record: &R) -> Result<CheckMarker> {
        let binding = self.binding()?;
        let selection = self.store.get(binding.state_key()).await?;
        Ok(marker_for(binding, &selection, record))
    }

    /// Markers for a batch of rows, reading the selection once.
    pub async fn render_markers(&self, records: &[R]) -> Result<Vec<CheckMarker>> {
        let binding = self.binding()?;
        let selection = self.store.get(binding.state_key()).await?;
        Ok(records
            .iter()
            .map(|record| marker_for(binding, &selection, record))
            .collect())
    }

    /// Removes the persisted selection. The key can be bound again later and
    /// starts out empty.
    pub async fn teardown(self) -> Result<()> {
        let binding = self.binding()?;
        self.store.clear(binding.state_key()).await?;
        info!(state_key = %binding.state_key(), "selection controller torn down");
        Ok(())
    }

    async fn apply_to_all<F>(&mut self, visible: &[R], mut apply: F) -> Result<SelectionSet>
    where
        F: FnMut(&mut SelectionSet, Identifier) -> bool,
    {
        let binding = self.binding()?.clone();
        let mut selection = self.store.get(binding.state_key()).await?;

        let mut changed = 0usize;
        let mut skipped = 0usize;
        for record in visible {
            match binding.identify(record) {
                Some(id) => {
                    if apply(&mut selection, id) {
                        changed += 1;
                    }
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(state_key = %binding.state_key(), skipped, "records without identity were skipped");
        }

        self.store.set(binding.state_key(), Some(&selection)).await?;
        debug!(
            state_key = %binding.state_key(),
            changed,
            selected = selection.len(),
            "applied bulk selection change"
        );

        self.emit_changed(binding.state_key(), &selection);
        let _ = self.events.send(SelectionEvent::RefreshRequested {
            state_key: binding.state_key().clone(),
        });
        self.all_selected = aggregate(&binding, &selection, visible);
        Ok(selection)
    }

    fn binding(&self) -> Result<&SelectionBinding<R>> {
        self.binding.as_ref().ok_or_else(|| {
            SelectionError::Configuration("selection controller is not initialized".to_string())
        })
    }

    fn emit_changed(&self, state_key: &StateKey, selection: &SelectionSet) {
        let _ = self.events.send(SelectionEvent::SelectionChanged {
            state_key: state_key.clone(),
            selection: selection.as_slice().to_vec(),
            changed_at: Utc::now(),
        });
    }
}

fn aggregate<R>(binding: &SelectionBinding<R>, selection: &SelectionSet, visible: &[R]) -> bool {
    selection.contains_all(visible.iter().map(|record| binding.identify(record)))
}

fn marker_for<R>(binding: &SelectionBinding<R>, selection: &SelectionSet, record: &R) -> CheckMarker {
    let checked = binding
        .identify(record)
        .is_some_and(|id| selection.contains(&id));
    CheckMarker::from_checked(checked)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
