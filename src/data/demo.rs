//! Synthetic artifact set for trying the tool without real artifacts.
//!
//! Reference rows are drawn from a small fixed vocabulary of states, sources,
//! and plans. Premiums follow a simple age curve with state and tobacco
//! loadings plus Gaussian noise, so the KNN output moves sensibly with the form.

use chrono::Utc;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::{Record, Tobacco, UnseenHandling};
use crate::encoding::{Encoders, LabelEncoder, encode_batch};
use crate::error::AppError;
use crate::io::Artifacts;
use crate::models::{KnnRegressor, Weights};

const STATES: &[(&str, f64)] = &[
    ("AK", 1.35),
    ("AZ", 0.95),
    ("FL", 1.05),
    ("GA", 1.00),
    ("IL", 0.98),
    ("NC", 1.10),
    ("OH", 0.90),
    ("TX", 0.97),
    ("WI", 1.08),
    ("WY", 1.25),
];

const SOURCES: &[&str] = &["HIOS", "OPM", "SERFF"];

const PLANS_PER_STATE: usize = 4;

/// Noise standard deviation (premium units).
const NOISE_SIGMA: f64 = 12.0;

#[derive(Debug, Clone, Copy)]
pub struct DemoConfig {
    pub rows: usize,
    pub neighbors: usize,
    pub seed: u64,
}

/// Plan ids look like `<issuer><state><4-digit plan><4-digit variant>`.
fn plan_id(issuer: u32, state: &str, plan: usize) -> String {
    format!("{issuer}{state}{:04}0001", plan + 1)
}

fn issuer_for(state_idx: usize) -> u32 {
    10_000 + 7_919 * state_idx as u32
}

/// Base monthly premium for an age.
fn age_curve(age: i64) -> f64 {
    let a = age.clamp(0, 64) as f64;
    if a < 21.0 {
        180.0
    } else {
        210.0 + 0.12 * (a - 21.0).powf(2.0)
    }
}

/// Generate a demo artifact set.
pub fn generate_demo_artifacts(config: &DemoConfig) -> Result<Artifacts, AppError> {
    if config.rows == 0 {
        return Err(AppError::input("Demo row count must be > 0."));
    }
    if config.neighbors == 0 || config.neighbors > config.rows {
        return Err(AppError::input(format!(
            "Demo neighbors must be in 1..={} (got {}).",
            config.rows, config.neighbors
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, NOISE_SIGMA).map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;

    let mut plans = Vec::with_capacity(STATES.len() * PLANS_PER_STATE);
    for (i, (state, _)) in STATES.iter().enumerate() {
        for p in 0..PLANS_PER_STATE {
            plans.push(plan_id(issuer_for(i), state, p));
        }
    }

    let encoders = Encoders {
        state_code: LabelEncoder::from_labels(STATES.iter().map(|(s, _)| *s)),
        source_name: LabelEncoder::from_labels(SOURCES.iter().copied()),
        tobacco: LabelEncoder::from_labels(Tobacco::ALL.iter().map(|t| t.as_str())),
        plan_id: LabelEncoder::from_labels(plans.iter().cloned()),
    };

    let mut records = Vec::with_capacity(config.rows);
    let mut targets = Vec::with_capacity(config.rows);
    for row in 0..config.rows {
        let state_idx = rng.gen_range(0..STATES.len());
        let (state, loading) = STATES[state_idx];
        let issuer = issuer_for(state_idx).to_string();
        let tobacco = if rng.gen_bool(0.2) { Tobacco::Yes } else { Tobacco::No };
        let age = rng.gen_range(0..=64);

        let mut premium = age_curve(age) * loading;
        if tobacco == Tobacco::Yes && age >= 21 {
            premium *= 1.3;
        }
        premium = (premium + noise.sample(&mut rng)).max(1.0);

        records.push(Record {
            business_year: rng.gen_range(2014..=2016),
            state_code: state.to_string(),
            issuer_id: issuer.clone(),
            source_name: SOURCES[rng.gen_range(0..SOURCES.len())].to_string(),
            version_num: rng.gen_range(1..=12),
            issuer_id2: issuer,
            plan_id: plan_id(issuer_for(state_idx), state, rng.gen_range(0..PLANS_PER_STATE)),
            rating_area_id: rng.gen_range(1..=10),
            tobacco,
            age,
            row_number: row as i64 + 1,
            rate_duration: 365,
        });
        targets.push(premium);
    }

    let batch = encode_batch(&records, &encoders, UnseenHandling::default())
        .map_err(|e| AppError::runtime(format!("Demo rows failed to encode: {e}")))?;
    let rows: Vec<_> = batch.rows.iter().map(|r| *r.values()).collect();
    let model = KnnRegressor::new(config.neighbors, Weights::Uniform, 2.0, &rows, &targets)?.with_created_at(Utc::now());

    info!(rows = config.rows, k = config.neighbors, seed = config.seed, "generated demo artifacts");
    Ok(Artifacts { model, encoders })
}

/// A record that matches the demo vocabulary, shown as a sample `predict` call.
pub fn demo_record() -> Record {
    Record {
        state_code: "TX".to_string(),
        issuer_id: issuer_for(7).to_string(),
        source_name: "HIOS".to_string(),
        issuer_id2: issuer_for(7).to_string(),
        plan_id: plan_id(issuer_for(7), "TX", 0),
        tobacco: Tobacco::No,
        age: 40,
        ..Record::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::Pipeline;

    fn config() -> DemoConfig {
        DemoConfig {
            rows: 200,
            neighbors: 5,
            seed: 42,
        }
    }

    #[test]
    fn same_seed_same_artifacts() {
        let a = generate_demo_artifacts(&config()).unwrap();
        let b = generate_demo_artifacts(&config()).unwrap();
        assert_eq!(a.encoders, b.encoders);
        assert_eq!(a.model.n_samples(), 200);

        let pa = Pipeline::new(a, UnseenHandling::default());
        let pb = Pipeline::new(b, UnseenHandling::default());
        assert_eq!(
            pa.predict(&demo_record()).unwrap().premium(),
            pb.predict(&demo_record()).unwrap().premium()
        );
    }

    #[test]
    fn demo_record_is_fully_known() {
        let artifacts = generate_demo_artifacts(&config()).unwrap();
        let out = Pipeline::new(artifacts, UnseenHandling::default())
            .predict(&demo_record())
            .unwrap();
        assert!(out.substitutions.is_empty());
        assert!(out.premium() > 0.0);
    }

    #[test]
    fn sample_command_uses_demo_vocabulary() {
        let command = crate::report::format_predict_command(std::path::Path::new("demo"), &demo_record());
        assert!(command.contains("--state-code TX"));
        assert!(command.contains(&format!("--plan-id {}", plan_id(issuer_for(7), "TX", 0))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = DemoConfig {
            rows: 3,
            neighbors: 5,
            seed: 1,
        };
        assert!(generate_demo_artifacts(&bad).is_err());
    }

    #[test]
    fn age_curve_is_monotone_after_21() {
        assert!(age_curve(64) > age_curve(40));
        assert!(age_curve(40) > age_curve(21));
        assert_eq!(age_curve(5), age_curve(20));
    }
}
