use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::domain::{Identifier, StateKey};
use tokio::sync::Mutex;

use crate::StateProvider;

type Entries = BTreeMap<String, Vec<Identifier>>;

/// Stores every selection of an application in one JSON object file, keyed by
/// state key. Each write replaces the whole file through a sibling
/// `<name>.tmp` file.
pub struct JsonFileStateProvider {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStateProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Entries> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) if raw.trim().is_empty() => Ok(Entries::new()),
            Ok(raw) => serde_json::from_str(&raw).with_context(|| {
                format!("failed to parse selection state file '{}'", self.path.display())
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(err) => Err(err).with_context(|| {
                format!("failed to read selection state file '{}'", self.path.display())
            }),
        }
    }

    async fn write_entries(&self, entries: &Entries) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create directory '{}'", parent.display())
            })?;
        }

        // Readers only ever see a complete file: write aside, then rename over.
        let json = serde_json::to_string_pretty(entries)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await.with_context(|| {
            format!("failed to write selection state file '{}'", staging.display())
        })?;
        tokio::fs::rename(&staging, &self.path).await.with_context(|| {
            format!("failed to replace selection state file '{}'", self.path.display())
        })?;
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateProvider for JsonFileStateProvider {
    async fn get(&self, key: &StateKey) -> Result<Option<Vec<Identifier>>> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        Ok(entries.remove(key.as_str()))
    }

    async fn set(&self, key: &StateKey, value: &[Identifier]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.as_str().to_string(), value.to_vec());
        self.write_entries(&entries).await
    }

    async fn clear(&self, key: &StateKey) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key.as_str()).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}
