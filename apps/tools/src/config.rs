use std::{fs, path::Path, path::PathBuf, str::FromStr};

use anyhow::{bail, Context};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Sqlite,
    Json,
    Memory,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(ProviderKind::Sqlite),
            "json" => Ok(ProviderKind::Json),
            "memory" => Ok(ProviderKind::Memory),
            other => bail!("unknown selection provider '{other}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub provider: ProviderKind,
    pub database_url: String,
    pub json_path: PathBuf,
    pub state_key: String,
    pub record_index_field: String,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Sqlite,
            database_url: "sqlite://./data/selection.db".into(),
            json_path: PathBuf::from("./data/selection.json"),
            state_key: "default".into(),
            record_index_field: "id".into(),
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    provider: Option<ProviderKind>,
    database_url: Option<String>,
    json_path: Option<PathBuf>,
    state_key: Option<String>,
    record_index_field: Option<String>,
    log_filter: Option<String>,
}

/// Defaults, then `path` if it exists, then environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |name| std::env::var(name).ok())
}

pub fn load_settings_with<F>(path: &Path, env: F) -> anyhow::Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        let file_cfg: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        if let Some(v) = file_cfg.provider {
            settings.provider = v;
        }
        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file_cfg.json_path {
            settings.json_path = v;
        }
        if let Some(v) = file_cfg.state_key {
            settings.state_key = v;
        }
        if let Some(v) = file_cfg.record_index_field {
            settings.record_index_field = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("APP__PROVIDER") {
        settings.provider = v.parse()?;
    }

    if let Some(v) = env("SELECTION_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__JSON_PATH") {
        settings.json_path = PathBuf::from(v);
    }
    if let Some(v) = env("APP__STATE_KEY") {
        settings.state_key = v;
    }
    if let Some(v) = env("APP__RECORD_INDEX_FIELD") {
        settings.record_index_field = v;
    }
    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings =
            load_settings_with(&dir.path().join("absent.toml"), env_from(&[])).expect("settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("selection.toml");
        fs::write(
            &path,
            r#"
            provider = "json"
            json_path = "/tmp/grid.json"
            state_key = "orders"
            "#,
        )
        .expect("write settings");

        let settings = load_settings_with(&path, env_from(&[])).expect("settings");
        assert_eq!(settings.provider, ProviderKind::Json);
        assert_eq!(settings.json_path, PathBuf::from("/tmp/grid.json"));
        assert_eq!(settings.state_key, "orders");
        assert_eq!(settings.record_index_field, "id");
    }

    #[test]
    fn environment_overrides_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("selection.toml");
        fs::write(&path, "state_key = \"orders\"\n").expect("write settings");

        let settings = load_settings_with(
            &path,
            env_from(&[
                ("APP__STATE_KEY", "invoices"),
                ("SELECTION_DATABASE_URL", "sqlite://a.db"),
                ("APP__DATABASE_URL", "sqlite://b.db"),
                ("APP__PROVIDER", "Memory"),
            ]),
        )
        .expect("settings");
        assert_eq!(settings.state_key, "invoices");
        assert_eq!(settings.database_url, "sqlite://b.db");
        assert_eq!(settings.provider, ProviderKind::Memory);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("selection.toml");
        fs::write(&path, "provider = \"carrier-pigeon\"\n").expect("write settings");

        assert!(load_settings_with(&path, env_from(&[])).is_err());
    }

    #[test]
    fn unknown_provider_in_environment_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_settings_with(
            &dir.path().join("absent.toml"),
            env_from(&[("APP__PROVIDER", "redis")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("redis"));
    }
}
