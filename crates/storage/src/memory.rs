use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{Identifier, StateKey};
use tokio::sync::RwLock;

use crate::StateProvider;

/// Process-local provider; selections last as long as the value does.
#[derive(Default)]
pub struct MemoryStateProvider {
    entries: RwLock<HashMap<StateKey, Vec<Identifier>>>,
}

impl MemoryStateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains_key(&self, key: &StateKey) -> bool {
        self.entries.read().await.contains_key(key)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StateProvider for MemoryStateProvider {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<Identifier>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &StateKey, value: &[Identifier]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.clone(), value.to_vec());
        Ok(())
    }

    async fn clear(&self, key: &StateKey) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
