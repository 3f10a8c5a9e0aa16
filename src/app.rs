//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs logging
//! - loads the artifacts once
//! - hands a `Pipeline` to the chosen front-end

use std::io;

use clap::Parser;
use tracing::info;

use crate::cli::{ArtifactArgs, BatchArgs, Command, DemoArgs, LogArgs, PredictArgs, TuiArgs};
use crate::config::{Settings, load_dotenv};
use crate::data::{DemoConfig, demo_record, generate_demo_artifacts};
use crate::domain::{FormState, Record};
use crate::error::AppError;
use crate::io::{load_artifacts, read_records, write_artifacts, write_predictions};
use crate::logging::{self, LogTarget};
use crate::report::{
    format_encoded, format_inspect, format_neighbors, format_predict_command, format_prediction, format_substitutions,
    prediction_json,
};

use self::pipeline::Pipeline;

pub mod pipeline;

/// Entry point for the `premium` binary.
pub fn run() -> Result<(), AppError> {
    load_dotenv();

    // `premium` and `premium -a DIR` behave like `premium tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Predict(args) => handle_predict(args),
        Command::Prompt(args) => handle_prompt(args),
        Command::Batch(args) => handle_batch(args),
        Command::Inspect(args) => handle_inspect(args),
        Command::DemoArtifacts(args) => handle_demo(args),
    }
}

/// Resolve settings, load artifacts, and build the pipeline.
fn build_pipeline(args: &ArtifactArgs) -> Result<(Settings, Pipeline), AppError> {
    let settings = Settings::from_args(args)?;
    let artifacts = load_artifacts(&settings.artifact_paths())?;
    let pipeline = Pipeline::new(artifacts, settings.handling);
    Ok((settings, pipeline))
}

fn init_stderr_logging(args: &LogArgs) -> Result<(), AppError> {
    logging::init(args, LogTarget::Stderr)
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    if let Some(path) = &args.log_file {
        logging::init(&args.artifacts.log, LogTarget::File(path))?;
    }
    let (_, pipeline) = build_pipeline(&args.artifacts)?;
    let form = FormState::from_record(&Record::from(args.record));
    crate::tui::run(pipeline, form)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    init_stderr_logging(&args.artifacts.log)?;
    let (_, pipeline) = build_pipeline(&args.artifacts)?;

    let record = Record::from(args.record);
    let output = pipeline.predict(&record)?;

    if args.json {
        let text = serde_json::to_string_pretty(&prediction_json(&output)?)
            .map_err(|e| AppError::runtime(format!("Failed to render JSON: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    for note in format_substitutions(&output.substitutions) {
        eprintln!("{note}");
    }
    println!("{}", format_prediction(output.premium()));
    if args.explain {
        println!();
        println!("{}", format_encoded(&output, &pipeline.artifacts().encoders));
        println!();
        print!("{}", format_neighbors(&output.prediction.neighbors));
    }
    Ok(())
}

fn handle_prompt(args: ArtifactArgs) -> Result<(), AppError> {
    init_stderr_logging(&args.log)?;
    let (_, pipeline) = build_pipeline(&args)?;

    let record = crate::cli::prompt::prompt_for_record()?;
    let output = pipeline.predict(&record)?;

    for note in format_substitutions(&output.substitutions) {
        eprintln!("{note}");
    }
    println!("{}", format_prediction(output.premium()));
    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    init_stderr_logging(&args.artifacts.log)?;
    let (_, pipeline) = build_pipeline(&args.artifacts)?;

    let records = read_records(&args.input)?;
    let premiums = pipeline.predict_batch(&records)?;
    info!(rows = premiums.len(), input = %args.input.display(), "batch predicted");

    write_predictions(io::stdout().lock(), &premiums)
}

fn handle_inspect(args: ArtifactArgs) -> Result<(), AppError> {
    init_stderr_logging(&args.log)?;
    let (settings, pipeline) = build_pipeline(&args)?;
    println!("{}", format_inspect(pipeline.artifacts(), &settings.artifact_paths()));
    println!("unseen policy: {:?} (seed {})", settings.handling.policy, settings.handling.seed);
    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    init_stderr_logging(&args.log)?;

    let config = DemoConfig {
        rows: usize::try_from(args.rows).map_err(|_| AppError::input("Demo row count is too large."))?,
        neighbors: usize::try_from(args.neighbors).map_err(|_| AppError::input("Demo neighbors is too large."))?,
        seed: args.seed,
    };
    let artifacts = generate_demo_artifacts(&config)?;
    let paths = write_artifacts(&args.out, &artifacts)?;

    for path in paths.all() {
        println!("wrote {}", path.display());
    }
    println!();
    println!("Try it:");
    println!("  {}", format_predict_command(&args.out, &demo_record()));
    Ok(())
}

/// Rewrite argv so `premium` defaults to `premium tui`.
///
/// Rules:
/// - `premium`                     -> `premium tui`
/// - `premium -a DIR ...`          -> `premium tui -a DIR ...`
/// - `premium --help/--version/-h` -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "tui" | "predict" | "prompt" | "batch" | "inspect" | "demo-artifacts"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_tui() {
        assert_eq!(rewrite_args(argv(&["premium"])), argv(&["premium", "tui"]));
    }

    #[test]
    fn leading_flags_go_to_the_tui() {
        assert_eq!(
            rewrite_args(argv(&["premium", "-a", "artifacts"])),
            argv(&["premium", "tui", "-a", "artifacts"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        for args in [
            &["premium", "predict", "--age", "40"][..],
            &["premium", "demo-artifacts"][..],
            &["premium", "--help"][..],
            &["premium", "-V"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }
}
