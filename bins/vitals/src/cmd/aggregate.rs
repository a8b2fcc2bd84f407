use std::sync::Arc;

use vitals_api::TelemetryStore;
use vitals_engine::{Aggregator, TimestampPolicy, VitalsConfig};

use crate::cmd::print_json;
use crate::config::AggregateArgs;
use crate::error::CliError;

pub async fn run(
    config: &VitalsConfig,
    store: Arc<dyn TelemetryStore>,
    args: AggregateArgs,
) -> Result<(), CliError> {
    let window = args.window.unwrap_or(config.heart_rate.window_seconds);
    let policy: TimestampPolicy = args
        .on_bad_timestamp
        .map(Into::into)
        .unwrap_or(config.heart_rate.on_bad_timestamp);

    let aggregator = Aggregator::new(store, policy);
    let outcome = aggregator.aggregate(window, args.as_of.as_deref()).await?;
    print_json(&outcome)
}
