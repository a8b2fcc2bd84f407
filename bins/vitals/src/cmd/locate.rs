use std::sync::Arc;

use serde_json::json;

use vitals_api::{TelemetryStore, now_key};
use vitals_engine::{DistanceMetric, Locator, VitalsConfig};

use crate::cmd::print_json;
use crate::config::LocateArgs;
use crate::error::CliError;

pub async fn run(
    config: &VitalsConfig,
    store: Arc<dyn TelemetryStore>,
    args: LocateArgs,
) -> Result<(), CliError> {
    let metric: DistanceMetric = args.metric.map(Into::into).unwrap_or(config.locator.metric);
    let target = args.target.unwrap_or_else(now_key);
    let locator = Locator::new(store, metric);

    match locator.locate(&target).await? {
        Some(record) => print_json(&record),
        None => print_json(&json!({ "status": "not_found", "target": target })),
    }
}
