//! Run settings resolved from CLI flags, environment, and defaults.
//!
//! `.env` is loaded (if present) before argument parsing, so clap's `env`
//! fallbacks see it. Precedence: flag > environment > default.

use std::path::PathBuf;

use crate::cli::ArtifactArgs;
use crate::domain::UnseenHandling;
use crate::error::AppError;
use crate::io::ArtifactPaths;

pub const ENV_ARTIFACTS_DIR: &str = "PREMIUM_ARTIFACTS_DIR";
pub const ENV_UNSEEN_POLICY: &str = "PREMIUM_UNSEEN_POLICY";
pub const ENV_UNSEEN_SEED: &str = "PREMIUM_UNSEEN_SEED";
pub const ENV_LOG: &str = "PREMIUM_LOG";

/// Load `.env` from the working directory, if there is one.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Settings every prediction command needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub artifacts_dir: PathBuf,
    pub handling: UnseenHandling,
}

impl Settings {
    pub fn from_args(args: &ArtifactArgs) -> Result<Self, AppError> {
        let dir = &args.artifacts_dir;
        if dir.exists() && !dir.is_dir() {
            return Err(AppError::input(format!(
                "Artifact path is not a directory: {}",
                dir.display()
            )));
        }
        Ok(Self {
            artifacts_dir: dir.clone(),
            handling: UnseenHandling::new(args.unseen, args.unseen_seed),
        })
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.artifacts_dir)
    }
}
