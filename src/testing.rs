//! Small hand-built fixtures shared by unit tests.

use crate::domain::{Record, Tobacco, UnseenHandling};
use crate::encoding::{Encoders, LabelEncoder, encode_batch};
use crate::io::Artifacts;
use crate::models::{KnnRegressor, Weights};

pub fn small_encoders() -> Encoders {
    Encoders {
        state_code: LabelEncoder::from_labels(["CA", "NY", "TX"]),
        source_name: LabelEncoder::from_labels(["HIOS", "SERFF"]),
        tobacco: LabelEncoder::from_labels(["No", "Yes"]),
        plan_id: LabelEncoder::from_labels(["21989AK0010001", "P1", "P2"]),
    }
}

/// A record whose categorical values are all known to `small_encoders`.
pub fn known_record() -> Record {
    Record {
        business_year: 2023,
        state_code: "CA".into(),
        issuer_id: "21989".into(),
        source_name: "HIOS".into(),
        version_num: 1,
        issuer_id2: "21989".into(),
        plan_id: "P1".into(),
        rating_area_id: 1,
        tobacco: Tobacco::No,
        age: 40,
        row_number: 1,
        rate_duration: 30,
    }
}

pub fn small_artifacts() -> Artifacts {
    let encoders = small_encoders();
    let reference = [
        ("CA", "P1", Tobacco::No, 21, 210.0),
        ("CA", "P1", Tobacco::Yes, 21, 315.0),
        ("CA", "P2", Tobacco::No, 40, 380.0),
        ("NY", "P1", Tobacco::No, 40, 450.0),
        ("TX", "P2", Tobacco::Yes, 55, 720.0),
        ("TX", "21989AK0010001", Tobacco::No, 64, 810.0),
    ];

    let records: Vec<Record> = reference
        .iter()
        .map(|&(state, plan, tobacco, age, _)| Record {
            state_code: state.into(),
            plan_id: plan.into(),
            tobacco,
            age,
            ..known_record()
        })
        .collect();
    let targets: Vec<f64> = reference.iter().map(|r| r.4).collect();

    let batch = encode_batch(&records, &encoders, UnseenHandling::default()).expect("fixture encodes");
    let rows: Vec<_> = batch.rows.iter().map(|r| *r.values()).collect();
    let model = KnnRegressor::new(3, Weights::Uniform, 2.0, &rows, &targets).expect("fixture model");

    Artifacts { model, encoders }
}
