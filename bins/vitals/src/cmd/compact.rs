use serde_json::json;

use vitals_engine::{StoreBackend, VitalsConfig};
use vitals_storage_file::FileStoreFactory;

use crate::cmd::print_json;
use crate::error::CliError;

pub fn run(config: &VitalsConfig) -> Result<(), CliError> {
    if config.store.backend != StoreBackend::File {
        return Err(CliError::Unsupported {
            command: "compact",
            backend: config.store.backend.to_string(),
        });
    }
    let store = FileStoreFactory::open(&config.store.config_json()?)?;
    let dropped = store.compact()?;
    print_json(&json!({ "path": store.path().display().to_string(), "dropped": dropped }))
}
