use std::{convert::Infallible, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use selection::{SelectionController, SelectionOptions, Toggled};
use serde_json::{json, Map, Value};
use shared::domain::Identifier;
use storage::{
    JsonFileStateProvider, MemoryStateProvider, SelectionStateStore, SqliteStateProvider,
    StateProvider,
};
use tracing::info;

mod config;

use config::{load_settings, ProviderKind, Settings};

#[derive(Parser, Debug)]
#[command(name = "selection-tools", about = "Inspect and edit persisted record selections")]
struct Cli {
    #[arg(long, default_value = "selection.toml")]
    config: PathBuf,
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long)]
    json_path: Option<PathBuf>,
    #[arg(long)]
    state_key: Option<String>,
    #[arg(long)]
    record_index_field: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the persisted selection.
    Show,
    /// Select the identifier if absent, deselect it otherwise.
    Toggle {
        #[arg(value_parser = parse_identifier)]
        id: Identifier,
    },
    SelectAll {
        #[arg(required = true, value_parser = parse_identifier)]
        ids: Vec<Identifier>,
    },
    DeselectAll {
        #[arg(required = true, value_parser = parse_identifier)]
        ids: Vec<Identifier>,
    },
    /// Report whether the given identifiers are all selected.
    Aggregate {
        #[arg(value_parser = parse_identifier)]
        ids: Vec<Identifier>,
    },
    /// Drop the persisted selection.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = apply_cli_overrides(load_settings(&cli.config)?, &cli);

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(std::io::stderr)
        .init();

    let provider = open_provider(&settings).await?;
    let options = SelectionOptions::new(
        settings.state_key.as_str(),
        settings.record_index_field.as_str(),
    );
    let binding = options.binding::<Value>()?;
    let mut controller = SelectionController::new(SelectionStateStore::new(provider));

    match cli.command {
        Command::Show => {
            controller.initialize(binding, &[]).await?;
            print_selection(&controller).await?;
        }
        Command::Toggle { id } => {
            let records = records_for(&settings, vec![id]);
            controller.initialize(binding, &records).await?;
            match controller.toggle(&records[0], &records).await? {
                Toggled::Selected(id) => println!("selected {id}"),
                Toggled::Deselected(id) => println!("deselected {id}"),
                Toggled::Ignored => println!("ignored record without identity"),
            }
            print_selection(&controller).await?;
        }
        Command::SelectAll { ids } => {
            let records = records_for(&settings, ids);
            controller.initialize(binding, &records).await?;
            controller.select_all(&records).await?;
            print_selection(&controller).await?;
        }
        Command::DeselectAll { ids } => {
            let records = records_for(&settings, ids);
            controller.initialize(binding, &records).await?;
            controller.deselect_all(&records).await?;
            print_selection(&controller).await?;
        }
        Command::Aggregate { ids } => {
            let records = records_for(&settings, ids);
            let all_selected = controller.initialize(binding, &records).await?;
            let coverage = controller.coverage(&records).await?;
            println!(
                "{}",
                json!({ "all_selected": all_selected, "coverage": coverage })
            );
        }
        Command::Clear => {
            controller.initialize(binding, &[]).await?;
            controller.teardown().await?;
            info!(state_key = %settings.state_key, "selection cleared");
        }
    }

    Ok(())
}

/// Numeric arguments become integer identifiers, anything else stays text.
fn parse_identifier(raw: &str) -> Result<Identifier, Infallible> {
    raw.parse()
}

fn apply_cli_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(v) = cli.provider {
        settings.provider = v;
    }
    if let Some(v) = &cli.database_url {
        settings.database_url = v.clone();
    }
    if let Some(v) = &cli.json_path {
        settings.json_path = v.clone();
    }
    if let Some(v) = &cli.state_key {
        settings.state_key = v.clone();
    }
    if let Some(v) = &cli.record_index_field {
        settings.record_index_field = v.clone();
    }
    settings
}

async fn open_provider(settings: &Settings) -> Result<Arc<dyn StateProvider>> {
    let provider: Arc<dyn StateProvider> = match settings.provider {
        ProviderKind::Sqlite => {
            let provider = SqliteStateProvider::new(&settings.database_url)
                .await
                .with_context(|| {
                    format!(
                        "failed to open selection database '{}'",
                        settings.database_url
                    )
                })?;
            Arc::new(provider)
        }
        ProviderKind::Json => Arc::new(JsonFileStateProvider::new(&settings.json_path)),
        ProviderKind::Memory => Arc::new(MemoryStateProvider::new()),
    };
    info!(provider = ?settings.provider, "selection provider ready");
    Ok(provider)
}

fn records_for(settings: &Settings, ids: Vec<Identifier>) -> Vec<Value> {
    ids.into_iter()
        .map(|id| {
            let mut record = Map::new();
            record.insert(settings.record_index_field.trim().to_string(), id.to_json());
            Value::Object(record)
        })
        .collect()
}

async fn print_selection(controller: &SelectionController<Value>) -> Result<()> {
    let selection = controller.selection().await?;
    println!("{}", serde_json::to_string(&selection)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_parse_as_integers() {
        let cli = Cli::try_parse_from(["selection-tools", "toggle", "5"]).expect("cli");
        match cli.command {
            Command::Toggle { id } => assert_eq!(id, Identifier::Int(5)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bulk_ids_keep_text_and_integers_apart() {
        let cli = Cli::try_parse_from(["selection-tools", "select-all", "7", "A-1"])
            .expect("cli");
        match cli.command {
            Command::SelectAll { ids } => assert_eq!(
                ids,
                vec![
                    Identifier::Int(7),
                    Identifier::Text("A-1".to_string()),
                ]
            ),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[tokio::test]
    async fn toggling_a_persisted_integer_id_deselects_it() {
        let settings = Settings::default();
        let provider = Arc::new(MemoryStateProvider::new());
        let key = shared::domain::StateKey::new(settings.state_key.as_str()).expect("key");
        provider.set(&key, &[Identifier::Int(5)]).await.expect("seed");

        let cli = Cli::try_parse_from(["selection-tools", "toggle", "5"]).expect("cli");
        let Command::Toggle { id } = cli.command else {
            panic!("expected toggle");
        };
        let records = records_for(&settings, vec![id]);
        assert_eq!(records[0], json!({ "id": 5 }));

        let binding = SelectionOptions::new("default", "id")
            .binding::<Value>()
            .expect("binding");
        let mut controller = SelectionController::new(SelectionStateStore::new(provider.clone()));
        controller.initialize(binding, &records).await.expect("init");
        let outcome = controller.toggle(&records[0], &records).await.expect("toggle");

        assert_eq!(outcome, Toggled::Deselected(Identifier::Int(5)));
        assert_eq!(provider.get(&key).await.expect("get"), Some(Vec::new()));
    }
}
