//! Tracing subscriber setup.
//!
//! Line-oriented commands log to stderr. The TUI owns the terminal, so it only
//! logs when a file is given.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::cli::LogArgs;
use crate::error::AppError;

const DEFAULT_FILTER: &str = "premium_knn=warn";
const VERBOSE_FILTER: &str = "premium_knn=debug";

/// Where log lines go.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
}

/// Filter directive from `--log`/`PREMIUM_LOG`, else from `--verbose`.
pub fn filter_directive(args: &LogArgs) -> String {
    match &args.log {
        Some(directive) => directive.clone(),
        None if args.verbose => VERBOSE_FILTER.to_string(),
        None => DEFAULT_FILTER.to_string(),
    }
}

/// Install the global subscriber.
pub fn init(args: &LogArgs, target: LogTarget<'_>) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(filter_directive(args))
        .map_err(|e| AppError::input(format!("Invalid log filter: {e}")))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| AppError::input(format!("Failed to open log file '{}': {e}", path.display())))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };

    result.map_err(|e| AppError::runtime(format!("Failed to initialize logging: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_filter_wins_over_verbose() {
        let args = LogArgs {
            verbose: true,
            log: Some("premium_knn=trace".into()),
        };
        assert_eq!(filter_directive(&args), "premium_knn=trace");
    }

    #[test]
    fn verbose_raises_default_level() {
        let quiet = LogArgs::default();
        assert_eq!(filter_directive(&quiet), DEFAULT_FILTER);
        let verbose = LogArgs {
            verbose: true,
            log: None,
        };
        assert_eq!(filter_directive(&verbose), VERBOSE_FILTER);
    }
}
