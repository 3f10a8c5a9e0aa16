//! Shared prediction pipeline used by every front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! record -> encode (unseen-label policy) -> KNN predict
//!
//! The CLI, prompt, batch, and TUI front-ends then only differ in how they
//! collect input and present output.

use std::ops::RangeInclusive;

use thiserror::Error;
use tracing::debug;

use crate::domain::{Column, EncodedRow, Record, UnseenHandling};
use crate::encoding::{EncodeError, Substitution, encode_batch, encode_record};
use crate::error::{AppError, EXIT_REQUEST};
use crate::io::Artifacts;
use crate::models::Prediction;

/// Why a single request failed.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The request could not be encoded; only this request is abandoned.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("{0}")]
    Model(AppError),
}

impl PipelineError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::Encode(_))
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Encode(e) => AppError::new(EXIT_REQUEST, format!("Error: {e}")),
            PipelineError::Model(e) => e,
        }
    }
}

/// Everything produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub record: Record,
    pub encoded: EncodedRow,
    pub substitutions: Vec<Substitution>,
    pub prediction: Prediction,
}

impl PipelineOutput {
    pub fn premium(&self) -> f64 {
        self.prediction.value
    }
}

/// Loaded artifacts plus the unseen-label policy, built once at startup.
#[derive(Debug, Clone)]
pub struct Pipeline {
    artifacts: Artifacts,
    handling: UnseenHandling,
}

impl Pipeline {
    pub fn new(artifacts: Artifacts, handling: UnseenHandling) -> Self {
        Self { artifacts, handling }
    }

    pub fn artifacts(&self) -> &Artifacts {
        &self.artifacts
    }

    pub fn handling(&self) -> UnseenHandling {
        self.handling
    }

    /// Encode and predict one record.
    pub fn predict(&self, record: &Record) -> Result<PipelineOutput, PipelineError> {
        let encoded = encode_record(record, &self.artifacts.encoders, self.handling)?;
        let prediction = self
            .artifacts
            .model
            .predict(&encoded.row)
            .map_err(PipelineError::Model)?;

        debug!(premium = prediction.value, substitutions = encoded.substitutions.len(), "prediction");
        Ok(PipelineOutput {
            record: record.clone(),
            encoded: encoded.row,
            substitutions: encoded.substitutions,
            prediction,
        })
    }

    /// Encode a batch column-wise and predict every row.
    pub fn predict_batch(&self, records: &[Record]) -> Result<Vec<f64>, PipelineError> {
        let batch = encode_batch(records, &self.artifacts.encoders, self.handling)?;
        let predictions = self
            .artifacts
            .model
            .predict_batch(&batch.rows)
            .map_err(PipelineError::Model)?;
        Ok(predictions.into_iter().map(|p| p.value).collect())
    }

    /// Premium as a function of age with every other field held fixed.
    pub fn age_sweep(&self, record: &Record, ages: RangeInclusive<i64>) -> Result<Vec<(f64, f64)>, PipelineError> {
        let encoded = encode_record(record, &self.artifacts.encoders, self.handling)?;
        let rows: Vec<EncodedRow> = ages.map(|age| encoded.row.with(Column::Age, age as f64)).collect();
        let predictions = self
            .artifacts
            .model
            .predict_batch(&rows)
            .map_err(PipelineError::Model)?;
        Ok(rows
            .iter()
            .zip(predictions)
            .map(|(row, p)| (row.get(Column::Age), p.value))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UnseenPolicy;
    use crate::encoding::LabelEncoder;
    use crate::testing::{known_record, small_artifacts};

    fn pipeline() -> Pipeline {
        Pipeline::new(small_artifacts(), UnseenHandling::default())
    }

    #[test]
    fn known_input_gives_finite_premium() {
        let record = Record {
            business_year: 2023,
            age: 40,
            ..known_record()
        };
        let out = pipeline().predict(&record).unwrap();
        assert!(out.premium().is_finite());
        assert!(out.substitutions.is_empty());
        assert_eq!(out.prediction.neighbors.len(), 3);
    }

    #[test]
    fn identical_input_is_idempotent() {
        let p = pipeline();
        let a = p.predict(&known_record()).unwrap();
        let b = p.predict(&known_record()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unseen_plan_still_predicts() {
        let record = Record {
            plan_id: "UNSEEN_PLAN_XYZ".into(),
            ..known_record()
        };
        let out = pipeline().predict(&record).unwrap();
        assert!(out.premium().is_finite());
        assert_eq!(out.substitutions.len(), 1);
        assert_eq!(out.substitutions[0].column, Column::PlanId);
        assert_eq!(out.substitutions[0].from, "UNSEEN_PLAN_XYZ");
    }

    #[test]
    fn exhausted_encoder_is_recoverable() {
        let mut artifacts = small_artifacts();
        artifacts.encoders.source_name = LabelEncoder::from_labels(Vec::<String>::new());
        let p = Pipeline::new(artifacts, UnseenHandling::default());

        let err = p.predict(&known_record()).unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(err, PipelineError::Encode(EncodeError::Exhausted { column: "SourceName", .. })));

        // The pipeline keeps serving after a failed request.
        let mut ok = known_record();
        ok.source_name = "anything".into();
        let app_err = AppError::from(p.predict(&ok).unwrap_err());
        assert_eq!(app_err.exit_code(), EXIT_REQUEST);
        assert!(p.artifacts().encoders.state_code.contains("CA"));
    }

    #[test]
    fn reject_policy_surfaces_unseen_labels() {
        let p = Pipeline::new(small_artifacts(), UnseenHandling::new(UnseenPolicy::Reject, 0));
        let record = Record {
            state_code: "ZZ".into(),
            ..known_record()
        };
        let err = p.predict(&record).unwrap_err();
        assert_eq!(err.to_string(), "StateCode: unseen label 'ZZ'");
    }

    #[test]
    fn batch_matches_single_predictions_for_known_rows() {
        let p = pipeline();
        let records = vec![
            known_record(),
            Record {
                age: 60,
                state_code: "TX".into(),
                ..known_record()
            },
        ];
        let batch = p.predict_batch(&records).unwrap();
        for (record, premium) in records.iter().zip(batch) {
            assert_eq!(p.predict(record).unwrap().premium(), premium);
        }
    }

    #[test]
    fn age_sweep_covers_the_range() {
        let sweep = pipeline().age_sweep(&known_record(), 0..=64).unwrap();
        assert_eq!(sweep.len(), 65);
        assert_eq!(sweep[0].0, 0.0);
        assert_eq!(sweep[64].0, 64.0);
        assert!(sweep.iter().all(|(_, y)| y.is_finite()));
    }
}
