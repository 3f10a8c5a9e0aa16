//! Load and write the five prediction artifacts.
//!
//! The artifact directory holds one KNN model and four label encoders as JSON.
//! Loading happens once at startup; any missing, unreadable, or inconsistent
//! file is fatal (exit code 2). There is no retry and no fallback.

use std::fs::{File, create_dir_all};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::encoding::{Encoders, LabelEncoder};
use crate::error::AppError;
use crate::models::KnnRegressor;

pub const MODEL_FILE: &str = "knn_regression_model.json";
pub const STATE_CODE_ENCODER_FILE: &str = "label_encoder_state.json";
pub const SOURCE_NAME_ENCODER_FILE: &str = "label_encoder_source.json";
pub const TOBACCO_ENCODER_FILE: &str = "label_encoder_tobacco.json";
pub const PLAN_ID_ENCODER_FILE: &str = "label_encoder_planid.json";

/// Fixed artifact file locations inside one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub state_code: PathBuf,
    pub source_name: PathBuf,
    pub tobacco: PathBuf,
    pub plan_id: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILE),
            state_code: dir.join(STATE_CODE_ENCODER_FILE),
            source_name: dir.join(SOURCE_NAME_ENCODER_FILE),
            tobacco: dir.join(TOBACCO_ENCODER_FILE),
            plan_id: dir.join(PLAN_ID_ENCODER_FILE),
        }
    }

    /// All five paths, model first.
    pub fn all(&self) -> [&Path; 5] {
        [
            self.model.as_path(),
            self.state_code.as_path(),
            self.source_name.as_path(),
            self.tobacco.as_path(),
            self.plan_id.as_path(),
        ]
    }
}

/// Everything a prediction needs, loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub model: KnnRegressor,
    pub encoders: Encoders,
}

/// Load all artifacts.
pub fn load_artifacts(paths: &ArtifactPaths) -> Result<Artifacts, AppError> {
    let model: KnnRegressor = read_json(&paths.model)?;
    let encoders = Encoders {
        state_code: read_encoder(&paths.state_code)?,
        source_name: read_encoder(&paths.source_name)?,
        tobacco: read_encoder(&paths.tobacco)?,
        plan_id: read_encoder(&paths.plan_id)?,
    };

    info!(
        model = %paths.model.display(),
        k = model.k(),
        samples = model.n_samples(),
        "artifacts loaded"
    );
    Ok(Artifacts { model, encoders })
}

/// Write an artifact set into `dir` (created if missing).
pub fn write_artifacts(dir: &Path, artifacts: &Artifacts) -> Result<ArtifactPaths, AppError> {
    create_dir_all(dir).map_err(|e| {
        AppError::input(format!("Failed to create artifact dir '{}': {e}", dir.display()))
    })?;
    let paths = ArtifactPaths::in_dir(dir);

    write_json(&paths.model, &artifacts.model)?;
    write_json(&paths.state_code, &artifacts.encoders.state_code)?;
    write_json(&paths.source_name, &artifacts.encoders.source_name)?;
    write_json(&paths.tobacco, &artifacts.encoders.tobacco)?;
    write_json(&paths.plan_id, &artifacts.encoders.plan_id)?;

    Ok(paths)
}

fn read_encoder(path: &Path) -> Result<LabelEncoder, AppError> {
    let encoder: LabelEncoder = read_json(path)?;
    encoder
        .validate()
        .map_err(|e| AppError::input(format!("Invalid encoder '{}': {e}", path.display())))?;
    debug!(path = %path.display(), classes = encoder.len(), "encoder loaded");
    Ok(encoder)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open artifact '{}': {e}", path.display())))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid artifact '{}': {e}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create artifact '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, value)
        .map_err(|e| AppError::input(format!("Failed to write artifact '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::small_artifacts;

    #[test]
    fn artifacts_round_trip_through_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = small_artifacts();
        let paths = write_artifacts(dir.path(), &artifacts).unwrap();
        assert!(paths.all().iter().all(|p| p.exists()));

        let loaded = load_artifacts(&paths).unwrap();
        assert_eq!(loaded, artifacts);
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path(), &small_artifacts()).unwrap();
        std::fs::remove_file(&paths.tobacco).unwrap();

        let err = load_artifacts(&paths).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains(TOBACCO_ENCODER_FILE));
    }

    #[test]
    fn corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path(), &small_artifacts()).unwrap();
        std::fs::write(&paths.model, "{ not json").unwrap();

        let err = load_artifacts(&paths).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("Invalid artifact"));
    }

    #[test]
    fn unsorted_encoder_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path(), &small_artifacts()).unwrap();
        std::fs::write(&paths.state_code, r#"{"classes":["TX","CA"]}"#).unwrap();

        let err = load_artifacts(&paths).unwrap_err();
        assert!(err.message().contains("Invalid encoder"));
    }

    #[test]
    fn permuted_model_columns_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_artifacts(dir.path(), &small_artifacts()).unwrap();
        let text = std::fs::read_to_string(&paths.model).unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
        let names = json["feature_names"].as_array_mut().unwrap();
        names.swap(0, 11);
        std::fs::write(&paths.model, json.to_string()).unwrap();

        let err = load_artifacts(&paths).unwrap_err();
        assert!(err.message().contains("column order"));
    }
}
