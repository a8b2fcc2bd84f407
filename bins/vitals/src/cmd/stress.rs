use serde_json::json;

use vitals_engine::StressLevel;

use crate::cmd::print_json;
use crate::config::StressArgs;
use crate::error::CliError;

pub fn run(args: StressArgs) -> Result<(), CliError> {
    if !args.bpm.is_finite() || args.bpm < 0.0 {
        return Err(CliError::InvalidBpm(args.bpm));
    }
    let level = StressLevel::from_bpm(args.bpm);
    print_json(&json!({
        "bpm": args.bpm,
        "stress_label": level,
        "description": level.describe(),
    }))
}
