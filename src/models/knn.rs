//! k-nearest-neighbors regressor.
//!
//! The model is a reference matrix of encoded training rows (one row per
//! sample, columns in canonical order) plus the target premium for each row.
//! Prediction averages the targets of the `k` closest reference rows.
//!
//! Numeric behavior on out-of-range input is accepted as-is: nearest neighbors
//! always exist, so extrapolation just returns the nearest known premiums.

use chrono::{DateTime, Utc};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{COLUMNS, EncodedRow, N_FEATURES};
use crate::error::AppError;
use crate::math::minkowski;

/// How neighbor targets are averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weights {
    /// Plain mean of the `k` targets.
    #[default]
    Uniform,
    /// Inverse-distance weighted mean.
    Distance,
}

/// One neighbor that contributed to a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Row index in the reference matrix.
    pub index: usize,
    pub distance: f64,
    pub target: f64,
}

/// A single model output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub value: f64,
    pub neighbors: Vec<Neighbor>,
}

/// On-disk representation (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnModelFile {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Column names in the order the reference rows are laid out.
    pub feature_names: Vec<String>,
    pub n_neighbors: usize,
    #[serde(default)]
    pub weights: Weights,
    #[serde(default = "default_p")]
    pub p: f64,
    pub fit_x: Vec<Vec<f64>>,
    pub fit_y: Vec<f64>,
}

fn default_p() -> f64 {
    2.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KnnModelFile", into = "KnnModelFile")]
pub struct KnnRegressor {
    k: usize,
    weights: Weights,
    p: f64,
    x: DMatrix<f64>,
    y: DVector<f64>,
    created_at: Option<DateTime<Utc>>,
}

impl KnnRegressor {
    /// Build a regressor over canonical-order reference rows.
    pub fn new(
        k: usize,
        weights: Weights,
        p: f64,
        rows: &[[f64; N_FEATURES]],
        targets: &[f64],
    ) -> Result<Self, AppError> {
        if rows.is_empty() {
            return Err(AppError::input("Model has no reference rows."));
        }
        if rows.len() != targets.len() {
            return Err(AppError::input(format!(
                "Model has {} reference rows but {} targets.",
                rows.len(),
                targets.len()
            )));
        }
        if k == 0 || k > rows.len() {
            return Err(AppError::input(format!(
                "Model n_neighbors must be in 1..={} (got {k}).",
                rows.len()
            )));
        }
        if !(p.is_finite() && p >= 1.0) {
            return Err(AppError::input(format!("Model p must be >= 1 (got {p}).")));
        }
        let finite = rows.iter().flatten().chain(targets).all(|v| v.is_finite());
        if !finite {
            return Err(AppError::input("Model contains non-finite values."));
        }

        let x = DMatrix::from_row_iterator(rows.len(), N_FEATURES, rows.iter().flatten().copied());
        let y = DVector::from_column_slice(targets);

        Ok(Self {
            k,
            weights,
            p,
            x,
            y,
            created_at: None,
        })
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn weights(&self) -> Weights {
        self.weights
    }

    pub fn p(&self) -> f64 {
        self.p
    }

    pub fn n_samples(&self) -> usize {
        self.x.nrows()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Predict the premium for one encoded row.
    pub fn predict(&self, row: &EncodedRow) -> Result<Prediction, AppError> {
        let neighbors = self.nearest(row);
        let value = match self.weights {
            Weights::Uniform => mean(neighbors.iter().map(|n| n.target)),
            Weights::Distance => {
                // Exact matches dominate: average them and ignore the rest.
                if neighbors.iter().any(|n| n.distance == 0.0) {
                    mean(neighbors.iter().filter(|n| n.distance == 0.0).map(|n| n.target))
                } else {
                    let (num, den) = neighbors.iter().fold((0.0, 0.0), |(num, den), n| {
                        let w = 1.0 / n.distance;
                        (num + w * n.target, den + w)
                    });
                    // Overflowed distances leave no usable weights.
                    if den > 0.0 && den.is_finite() {
                        num / den
                    } else {
                        mean(neighbors.iter().map(|n| n.target))
                    }
                }
            }
        };

        if !value.is_finite() {
            return Err(AppError::runtime("Non-finite model prediction."));
        }
        Ok(Prediction { value, neighbors })
    }

    /// Predict many rows in parallel, preserving order.
    pub fn predict_batch(&self, rows: &[EncodedRow]) -> Result<Vec<Prediction>, AppError> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }

    /// The `k` closest reference rows, nearest first (ties by index).
    fn nearest(&self, row: &EncodedRow) -> Vec<Neighbor> {
        let mut all: Vec<Neighbor> = (0..self.x.nrows())
            .map(|i| Neighbor {
                index: i,
                distance: minkowski(self.x.row(i).iter(), row.values(), self.p),
                target: self.y[i],
            })
            .collect();

        all.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        all.truncate(self.k);
        all
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

impl TryFrom<KnnModelFile> for KnnRegressor {
    type Error = AppError;

    fn try_from(file: KnnModelFile) -> Result<Self, Self::Error> {
        let expected: Vec<&str> = COLUMNS.iter().map(|c| c.name()).collect();
        if file.feature_names != expected {
            return Err(AppError::input(format!(
                "Model feature order [{}] does not match the required column order [{}].",
                file.feature_names.join(", "),
                expected.join(", ")
            )));
        }

        let mut rows = Vec::with_capacity(file.fit_x.len());
        for (i, row) in file.fit_x.iter().enumerate() {
            let row: [f64; N_FEATURES] = row.as_slice().try_into().map_err(|_| {
                AppError::input(format!(
                    "Model reference row {i} has {} values (expected {N_FEATURES}).",
                    row.len()
                ))
            })?;
            rows.push(row);
        }

        let model = KnnRegressor::new(file.n_neighbors, file.weights, file.p, &rows, &file.fit_y)?;
        Ok(match file.created_at {
            Some(ts) => model.with_created_at(ts),
            None => model,
        })
    }
}

impl From<KnnRegressor> for KnnModelFile {
    fn from(model: KnnRegressor) -> Self {
        KnnModelFile {
            created_at: model.created_at,
            feature_names: COLUMNS.iter().map(|c| c.name().to_string()).collect(),
            n_neighbors: model.k,
            weights: model.weights,
            p: model.p,
            fit_x: model
                .x
                .row_iter()
                .map(|r| r.iter().copied().collect())
                .collect(),
            fit_y: model.y.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Column;

    fn row_with_age(age: f64) -> [f64; N_FEATURES] {
        let mut r = [0.0; N_FEATURES];
        r[Column::Age.index()] = age;
        r
    }

    fn model(k: usize, weights: Weights) -> KnnRegressor {
        let rows = [row_with_age(20.0), row_with_age(30.0), row_with_age(40.0), row_with_age(60.0)];
        let targets = [200.0, 300.0, 400.0, 600.0];
        KnnRegressor::new(k, weights, 2.0, &rows, &targets).unwrap()
    }

    #[test]
    fn uniform_averages_k_nearest() {
        let m = model(2, Weights::Uniform);
        let p = m.predict(&EncodedRow::new(row_with_age(33.0))).unwrap();
        assert!((p.value - 350.0).abs() < 1e-9);
        assert_eq!(p.neighbors.iter().map(|n| n.index).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn distance_weighting_favors_closer_rows() {
        let m = model(2, Weights::Distance);
        let p = m.predict(&EncodedRow::new(row_with_age(32.0))).unwrap();
        // weights 1/2 and 1/8
        let expected = (300.0 / 2.0 + 400.0 / 8.0) / (1.0 / 2.0 + 1.0 / 8.0);
        assert!((p.value - expected).abs() < 1e-9);

        let exact = m.predict(&EncodedRow::new(row_with_age(40.0))).unwrap();
        assert_eq!(exact.value, 400.0);
    }

    #[test]
    fn overflowing_distances_fall_back_to_the_mean() {
        let m = model(2, Weights::Distance);
        let mut row = row_with_age(30.0);
        row[Column::IssuerId.index()] = 1e300;
        let p = m.predict(&EncodedRow::new(row)).unwrap();
        assert!(p.neighbors.iter().all(|n| n.distance.is_infinite()));
        assert_eq!(p.value, 250.0);
    }

    #[test]
    fn extrapolation_returns_nearest_targets() {
        let m = model(1, Weights::Uniform);
        let p = m.predict(&EncodedRow::new(row_with_age(500.0))).unwrap();
        assert_eq!(p.value, 600.0);
    }

    #[test]
    fn ties_break_by_index() {
        let m = model(1, Weights::Uniform);
        let p = m.predict(&EncodedRow::new(row_with_age(25.0))).unwrap();
        assert_eq!(p.neighbors[0].index, 0);
    }

    #[test]
    fn batch_matches_single_predictions() {
        let m = model(3, Weights::Uniform);
        let rows: Vec<EncodedRow> = [10.0, 35.0, 70.0].iter().map(|&a| EncodedRow::new(row_with_age(a))).collect();
        let batch = m.predict_batch(&rows).unwrap();
        for (row, pred) in rows.iter().zip(&batch) {
            assert_eq!(m.predict(row).unwrap(), *pred);
        }
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        let rows = [row_with_age(1.0)];
        assert!(KnnRegressor::new(2, Weights::Uniform, 2.0, &rows, &[1.0]).is_err());
        assert!(KnnRegressor::new(1, Weights::Uniform, 2.0, &rows, &[1.0, 2.0]).is_err());
        assert!(KnnRegressor::new(1, Weights::Uniform, 0.5, &rows, &[1.0]).is_err());
        assert!(KnnRegressor::new(1, Weights::Uniform, 2.0, &[], &[]).is_err());
    }

    #[test]
    fn json_round_trip_keeps_predictions() {
        let m = model(2, Weights::Distance);
        let json = serde_json::to_string(&m).unwrap();
        let back: KnnRegressor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn permuted_feature_names_are_rejected() {
        let mut file = KnnModelFile::from(model(1, Weights::Uniform));
        file.feature_names.swap(0, 1);
        let err = KnnRegressor::try_from(file).unwrap_err();
        assert!(err.message().contains("does not match the required column order"));
    }

    #[test]
    fn short_reference_rows_are_rejected() {
        let mut file = KnnModelFile::from(model(1, Weights::Uniform));
        file.fit_x[2].pop();
        let err = KnnRegressor::try_from(file).unwrap_err();
        assert!(err.message().contains("row 2"));
    }
}
