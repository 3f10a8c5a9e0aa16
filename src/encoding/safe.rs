//! Encoding with an explicit unseen-label policy.
//!
//! `safe_transform` works on a whole column batch. Under the substituting
//! policies each known label is handed out at most once per batch, so a batch
//! with more unseen values than known labels fails with `EncodeError::Exhausted`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::domain::{COLUMNS, Categorical, Column, EncodedRow, N_FEATURES, Record, UnseenHandling, UnseenPolicy};
use crate::encoding::{EncodeError, Encoders, LabelEncoder};

/// An unseen value that was replaced by a known label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub column: Column,
    /// Row within the batch.
    pub row: usize,
    pub from: String,
    pub to: String,
}

/// Codes for one column plus the substitutions made to get them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub codes: Vec<i64>,
    pub substitutions: Vec<Substitution>,
}

/// Encode one column of raw values, applying `handling` to unseen values.
pub fn safe_transform<S: AsRef<str>>(
    column: Column,
    values: &[S],
    encoder: &LabelEncoder,
    handling: UnseenHandling,
) -> Result<Transformed, EncodeError> {
    let name = column.name();
    let mut remaining: Vec<&str> = encoder.classes().iter().map(String::as_str).collect();
    let mut rng = StdRng::seed_from_u64(column_seed(handling.seed, column));
    let mut labels: Vec<&str> = Vec::with_capacity(values.len());
    let mut substitutions = Vec::new();

    for (row, value) in values.iter().enumerate() {
        let value = value.as_ref();
        if encoder.contains(value) {
            labels.push(value);
            continue;
        }

        let replacement = match handling.policy {
            UnseenPolicy::Reject => {
                return Err(EncodeError::Unseen {
                    column: name,
                    label: value.to_string(),
                });
            }
            UnseenPolicy::Sentinel => encoder.unknown_label().ok_or_else(|| EncodeError::NoSentinel {
                column: name,
                label: value.to_string(),
            })?,
            UnseenPolicy::Substitute | UnseenPolicy::Random => {
                if remaining.is_empty() {
                    return Err(EncodeError::Exhausted {
                        column: name,
                        label: value.to_string(),
                    });
                }
                let idx = match handling.policy {
                    UnseenPolicy::Random => rng.gen_range(0..remaining.len()),
                    _ => 0,
                };
                remaining.remove(idx)
            }
        };

        warn!(column = name, row, unseen = value, replacement, "unseen label replaced");
        substitutions.push(Substitution {
            column,
            row,
            from: value.to_string(),
            to: replacement.to_string(),
        });
        labels.push(replacement);
    }

    let codes = encoder.transform(name, &labels)?;
    Ok(Transformed { codes, substitutions })
}

fn column_seed(seed: u64, column: Column) -> u64 {
    seed ^ (column.index() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Parse a free-text identifier column the model consumes as a number.
pub fn parse_identifier(column: Column, raw: &str) -> Result<f64, EncodeError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| EncodeError::InvalidNumber {
            column: column.name(),
            value: raw.to_string(),
        })
}

/// Encoded rows for a batch of records.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedBatch {
    pub rows: Vec<EncodedRow>,
    pub substitutions: Vec<Substitution>,
}

/// Encode a batch of records into canonical model rows.
///
/// Categorical columns are encoded column-wise so substitutions are shared
/// across the whole batch.
pub fn encode_batch(
    records: &[Record],
    encoders: &Encoders,
    handling: UnseenHandling,
) -> Result<EncodedBatch, EncodeError> {
    let mut rows = records.iter().map(numeric_row).collect::<Result<Vec<_>, _>>()?;
    let mut substitutions = Vec::new();

    for cat in Categorical::ALL {
        let values: Vec<&str> = records.iter().map(|r| r.categorical(cat)).collect();
        let transformed = safe_transform(cat.column(), &values, encoders.get(cat), handling)?;
        for (row, code) in rows.iter_mut().zip(&transformed.codes) {
            row.set(cat.column(), *code as f64);
        }
        substitutions.extend(transformed.substitutions);
    }

    debug!(rows = rows.len(), substitutions = substitutions.len(), "encoded batch");
    Ok(EncodedBatch { rows, substitutions })
}

/// Encoded row for a single record.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub row: EncodedRow,
    pub substitutions: Vec<Substitution>,
}

pub fn encode_record(
    record: &Record,
    encoders: &Encoders,
    handling: UnseenHandling,
) -> Result<EncodedRecord, EncodeError> {
    let EncodedBatch { rows, substitutions } = encode_batch(std::slice::from_ref(record), encoders, handling)?;
    let row = rows
        .into_iter()
        .next()
        .unwrap_or_else(|| EncodedRow::new([0.0; N_FEATURES]));
    Ok(EncodedRecord { row, substitutions })
}

/// Numeric and identifier columns; categorical slots are filled in later.
fn numeric_row(record: &Record) -> Result<EncodedRow, EncodeError> {
    let mut row = EncodedRow::new([0.0; N_FEATURES]);
    for column in COLUMNS {
        if let Some(v) = record.integer(column) {
            row.set(column, v as f64);
        }
    }
    row.set(Column::IssuerId, parse_identifier(Column::IssuerId, &record.issuer_id)?);
    row.set(Column::IssuerId2, parse_identifier(Column::IssuerId2, &record.issuer_id2)?);
    Ok(row)
}
