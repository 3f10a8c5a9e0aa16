//! Command-line parsing for the premium estimator.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! encoding and model code. Every numeric record flag carries the same range
//! the interactive form enforces.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ENV_ARTIFACTS_DIR, ENV_LOG, ENV_UNSEEN_POLICY, ENV_UNSEEN_SEED};
use crate::domain::{Record, Tobacco, UnseenPolicy};

pub mod prompt;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "premium",
    version,
    about = "Health insurance premium prediction using KNN regression"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive form (default).
    Tui(TuiArgs),
    /// Predict one premium from flags.
    Predict(PredictArgs),
    /// Fill in the form line by line on stdin.
    Prompt(ArtifactArgs),
    /// Predict every row of a CSV file and print `row,premium` CSV.
    Batch(BatchArgs),
    /// Summarize the loaded artifacts.
    Inspect(ArtifactArgs),
    /// Write a synthetic artifact set for trying the tool out.
    DemoArtifacts(DemoArgs),
}

/// Logging options.
#[derive(Debug, Clone, Default, Args)]
pub struct LogArgs {
    /// Log debug detail (artifact loading, substitutions, predictions).
    #[arg(short, long)]
    pub verbose: bool,

    /// Tracing filter directive, e.g. `premium_knn=debug`.
    #[arg(long, env = ENV_LOG)]
    pub log: Option<String>,
}

/// Options shared by every command that loads artifacts.
#[derive(Debug, Clone, Args)]
pub struct ArtifactArgs {
    /// Directory holding the model and encoder JSON files.
    #[arg(short = 'a', long = "artifacts", env = ENV_ARTIFACTS_DIR, default_value = ".")]
    pub artifacts_dir: PathBuf,

    /// What to do with categorical values the encoders never saw.
    #[arg(long, value_enum, env = ENV_UNSEEN_POLICY, default_value_t = UnseenPolicy::Substitute)]
    pub unseen: UnseenPolicy,

    /// Seed for `--unseen random`.
    #[arg(long, env = ENV_UNSEEN_SEED, default_value_t = 0)]
    pub unseen_seed: u64,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Debug, Clone, Args)]
pub struct TuiArgs {
    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// Append logs to this file (the TUI does not log otherwise).
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Initial form values.
    #[command(flatten)]
    pub record: RecordArgs,
}

#[derive(Debug, Clone, Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    #[command(flatten)]
    pub record: RecordArgs,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also print the neighbors and the encoded row.
    #[arg(long)]
    pub explain: bool,
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    #[command(flatten)]
    pub artifacts: ArtifactArgs,

    /// CSV with the 12 record columns (header names, any order).
    #[arg(short = 'i', long, value_name = "CSV")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct DemoArgs {
    /// Directory to write the artifacts into.
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Number of synthetic reference rows.
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    pub rows: u64,

    /// Neighbors used by the written model.
    #[arg(short = 'k', long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    pub neighbors: u64,

    /// Random seed for the synthetic rows.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[command(flatten)]
    pub log: LogArgs,
}

/// Record fields as flags, with the form's defaults and ranges.
#[derive(Debug, Clone, Args)]
pub struct RecordArgs {
    #[arg(long, default_value_t = 2023, value_parser = clap::value_parser!(i64).range(2000..=2100))]
    pub business_year: i64,

    #[arg(long, default_value = "")]
    pub state_code: String,

    #[arg(long, default_value = "")]
    pub issuer_id: String,

    #[arg(long, default_value = "")]
    pub source_name: String,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
    pub version_num: i64,

    #[arg(long, default_value = "")]
    pub issuer_id2: String,

    #[arg(long, default_value = "")]
    pub plan_id: String,

    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(i64).range(0..))]
    pub rating_area_id: i64,

    #[arg(long, value_enum, default_value_t = Tobacco::Yes)]
    pub tobacco: Tobacco,

    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(0..))]
    pub age: i64,

    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(0..))]
    pub row_number: i64,

    /// Rate duration in days.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(i64).range(0..))]
    pub rate_duration: i64,
}

impl From<RecordArgs> for Record {
    fn from(args: RecordArgs) -> Self {
        Record {
            business_year: args.business_year,
            state_code: args.state_code.trim().to_string(),
            issuer_id: args.issuer_id.trim().to_string(),
            source_name: args.source_name.trim().to_string(),
            version_num: args.version_num,
            issuer_id2: args.issuer_id2.trim().to_string(),
            plan_id: args.plan_id.trim().to_string(),
            rating_area_id: args.rating_area_id,
            tobacco: args.tobacco,
            age: args.age,
            row_number: args.row_number,
            rate_duration: args.rate_duration,
        }
    }
}
