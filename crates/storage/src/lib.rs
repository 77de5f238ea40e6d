use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{Identifier, SelectionSet, StateKey},
    error::SelectionError,
};
use tracing::debug;

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStateProvider;
pub use memory::MemoryStateProvider;
pub use sqlite::SqliteStateProvider;

/// Key-value durability contract behind a selection store.
///
/// Values are opaque identifier sequences; how they are encoded is up to the
/// provider. Errors are reported as-is and never retried by callers.
#[async_trait]
pub trait StateProvider: Send + Sync {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<Identifier>>>;
    async fn set(&self, key: &StateKey, value: &[Identifier]) -> Result<()>;
    async fn clear(&self, key: &StateKey) -> Result<()>;
}

/// Typed adapter reading and writing selection sets through a provider.
#[derive(Clone)]
pub struct SelectionStateStore {
    provider: Arc<dyn StateProvider>,
}

impl SelectionStateStore {
    pub fn new(provider: Arc<dyn StateProvider>) -> Self {
        Self { provider }
    }

    /// Returns the persisted selection, writing an empty one first when the
    /// key has never been set.
    pub async fn get(&self, key: &StateKey) -> shared::Result<SelectionSet> {
        let stored = self
            .provider
            .get(key)
            .await
            .map_err(|source| SelectionError::persistence(key.as_str(), source))?;

        if let Some(identifiers) = stored {
            return Ok(SelectionSet::from(identifiers));
        }

        debug!(state_key = %key, "initializing empty selection state");
        self.provider
            .set(key, &[])
            .await
            .map_err(|source| SelectionError::persistence(key.as_str(), source))?;
        Ok(SelectionSet::new())
    }

    /// Persists `selection`. `None` leaves the stored value untouched.
    pub async fn set(&self, key: &StateKey, selection: Option<&SelectionSet>) -> shared::Result<()> {
        let Some(selection) = selection else {
            debug!(state_key = %key, "ignoring write without a selection");
            return Ok(());
        };

        self.provider
            .set(key, selection.as_slice())
            .await
            .map_err(|source| SelectionError::persistence(key.as_str(), source))?;
        debug!(state_key = %key, selected = selection.len(), "persisted selection state");
        Ok(())
    }

    pub async fn clear(&self, key: &StateKey) -> shared::Result<()> {
        self.provider
            .clear(key)
            .await
            .map_err(|source| SelectionError::persistence(key.as_str(), source))?;
        debug!(state_key = %key, "cleared selection state");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
