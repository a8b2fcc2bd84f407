use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use vitals_engine::{DistanceMetric, TimestampPolicy, VitalsConfig};

use crate::error::CliError;

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG: &str = "vitals.toml";

#[derive(Parser)]
#[command(name = "vitals", about = "Heart-rate telemetry lookup and stress summaries")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, env = "VITALS_CONFIG")]
    pub config: Option<String>,

    /// JSON document to load into the store before running the command
    #[arg(long, global = true)]
    pub seed: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a JSON object or array of records into the store
    Load(LoadArgs),
    /// Fetch the record stored under an exact key
    Get(GetArgs),
    /// Find the record whose key is nearest to a target key
    Locate(LocateArgs),
    /// Average heart rate over the most recent window
    Aggregate(AggregateArgs),
    /// Classify a heart rate into a stress level
    Stress(StressArgs),
    /// Rewrite the file store keeping one line per key
    Compact,
}

#[derive(Args, Clone, Debug)]
pub struct LoadArgs {
    pub file: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct GetArgs {
    pub key: String,
}

#[derive(Args, Clone, Debug)]
pub struct LocateArgs {
    /// Target key (MM/DD/YY HH:MM:SS); defaults to the current local time
    pub target: Option<String>,

    /// Overrides `[locator] metric`
    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,
}

#[derive(Args, Clone, Debug)]
pub struct AggregateArgs {
    /// Window length in seconds; overrides `[heart_rate] window_seconds`
    #[arg(long)]
    pub window: Option<u64>,

    /// End the window at this key instead of at the latest record
    #[arg(long)]
    pub as_of: Option<String>,

    /// Overrides `[heart_rate] on_bad_timestamp`
    #[arg(long, value_enum)]
    pub on_bad_timestamp: Option<PolicyArg>,
}

#[derive(Args, Clone, Debug)]
pub struct StressArgs {
    pub bpm: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MetricArg {
    FirstChar,
    Instant,
}

impl From<MetricArg> for DistanceMetric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::FirstChar => DistanceMetric::FirstChar,
            MetricArg::Instant => DistanceMetric::Instant,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PolicyArg {
    Abort,
    Skip,
}

impl From<PolicyArg> for TimestampPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Abort => TimestampPolicy::Abort,
            PolicyArg::Skip => TimestampPolicy::Skip,
        }
    }
}

/// Explicit path must exist; the default path is optional.
pub fn load_config(path: Option<&str>) -> Result<VitalsConfig, CliError> {
    match path {
        Some(p) => Ok(VitalsConfig::load(p)?),
        None if std::path::Path::new(DEFAULT_CONFIG).exists() => Ok(VitalsConfig::load(DEFAULT_CONFIG)?),
        None => {
            tracing::debug!("no {DEFAULT_CONFIG} found, using built-in defaults");
            Ok(VitalsConfig::default())
        }
    }
}
