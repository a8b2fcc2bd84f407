use vitals_api::TelemetryStore;

use crate::cmd::print_json;
use crate::config::LoadArgs;
use crate::error::CliError;

pub async fn run(store: &dyn TelemetryStore, args: LoadArgs) -> Result<(), CliError> {
    let report = vitals_engine::load_file(store, &args.file).await?;
    print_json(&report)
}
