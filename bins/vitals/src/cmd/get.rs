use serde_json::json;

use vitals_api::TelemetryStore;

use crate::cmd::print_json;
use crate::config::GetArgs;
use crate::error::CliError;

pub async fn run(store: &dyn TelemetryStore, args: GetArgs) -> Result<(), CliError> {
    match store.get(&args.key).await? {
        Some(record) => print_json(&record),
        None => {
            tracing::info!(key = %args.key, "no record under key");
            print_json(&json!({ "status": "not_found", "key": args.key }))
        }
    }
}
