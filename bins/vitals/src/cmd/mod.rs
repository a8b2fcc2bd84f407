pub mod aggregate;
pub mod compact;
pub mod get;
pub mod load;
pub mod locate;
pub mod stress;

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use vitals_api::{StoreFactory, TelemetryStore};
use vitals_engine::{StoreBackend, VitalsConfig};
use vitals_storage_file::FileStoreFactory;
use vitals_storage_memory::MemoryStoreFactory;

use crate::config::{Commands, load_config};
use crate::error::CliError;

/// Build the configured store and get it ready for use.
pub async fn open_store(config: &VitalsConfig) -> Result<Arc<dyn TelemetryStore>, CliError> {
    let config_json = config.store.config_json()?;
    let store = match config.store.backend {
        StoreBackend::Memory => MemoryStoreFactory.create(&config_json)?,
        StoreBackend::File => FileStoreFactory.create(&config_json)?,
    };
    store.init().await?;
    tracing::debug!(backend = %config.store.backend, "store ready");
    Ok(store)
}

/// Run a command that needs the configured store.
pub async fn run_with_store(
    config_path: Option<&str>,
    seed: Option<&Path>,
    command: Commands,
) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;

    if let Some(seed) = seed {
        let report = vitals_engine::load_file(store.as_ref(), seed).await?;
        tracing::info!(seed = %seed.display(), stored = report.stored, "seeded store");
    }

    match command {
        Commands::Load(args) => load::run(store.as_ref(), args).await,
        Commands::Get(args) => get::run(store.as_ref(), args).await,
        Commands::Locate(args) => locate::run(&config, store, args).await,
        Commands::Aggregate(args) => aggregate::run(&config, store, args).await,
        Commands::Compact => compact::run(&config),
        Commands::Stress(args) => stress::run(args),
    }
}

/// Pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
