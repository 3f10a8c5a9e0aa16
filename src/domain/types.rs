//! Shared domain types.
//!
//! The model was trained on positionally ordered input, so the column schema is
//! a single canonical list (`COLUMNS`). Everything that builds model input goes
//! through `EncodedRow`, which is indexed by `Column` and never by raw position.

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One column of the rate record, declared in canonical (trained) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    BusinessYear,
    StateCode,
    IssuerId,
    SourceName,
    VersionNum,
    IssuerId2,
    PlanId,
    RatingAreaId,
    Tobacco,
    Age,
    RowNumber,
    RateDuration,
}

/// Canonical column order the model was trained on.
pub const COLUMNS: [Column; 12] = [
    Column::BusinessYear,
    Column::StateCode,
    Column::IssuerId,
    Column::SourceName,
    Column::VersionNum,
    Column::IssuerId2,
    Column::PlanId,
    Column::RatingAreaId,
    Column::Tobacco,
    Column::Age,
    Column::RowNumber,
    Column::RateDuration,
];

/// Number of model features.
pub const N_FEATURES: usize = COLUMNS.len();

impl Column {
    /// Column name as it appears in artifacts and CSV headers.
    pub fn name(self) -> &'static str {
        match self {
            Column::BusinessYear => "BusinessYear",
            Column::StateCode => "StateCode",
            Column::IssuerId => "IssuerId",
            Column::SourceName => "SourceName",
            Column::VersionNum => "VersionNum",
            Column::IssuerId2 => "IssuerId2",
            Column::PlanId => "PlanId",
            Column::RatingAreaId => "RatingAreaId",
            Column::Tobacco => "Tobacco",
            Column::Age => "Age",
            Column::RowNumber => "RowNumber",
            Column::RateDuration => "RateDuration",
        }
    }

    /// Human-readable label for forms and reports.
    pub fn label(self) -> &'static str {
        match self {
            Column::BusinessYear => "Business Year",
            Column::StateCode => "State Code",
            Column::IssuerId => "Issuer ID",
            Column::SourceName => "Source Name",
            Column::VersionNum => "Version Number",
            Column::IssuerId2 => "Issuer ID2",
            Column::PlanId => "Plan ID",
            Column::RatingAreaId => "Rating Area ID",
            Column::Tobacco => "Tobacco",
            Column::Age => "Age",
            Column::RowNumber => "Row Number",
            Column::RateDuration => "Rate Duration (in days)",
        }
    }

    /// Long CLI flag carrying this column (without the leading `--`).
    pub fn flag(self) -> &'static str {
        match self {
            Column::BusinessYear => "business-year",
            Column::StateCode => "state-code",
            Column::IssuerId => "issuer-id",
            Column::SourceName => "source-name",
            Column::VersionNum => "version-num",
            Column::IssuerId2 => "issuer-id2",
            Column::PlanId => "plan-id",
            Column::RatingAreaId => "rating-area-id",
            Column::Tobacco => "tobacco",
            Column::Age => "age",
            Column::RowNumber => "row-number",
            Column::RateDuration => "rate-duration",
        }
    }

    /// Position in the canonical order.
    pub fn index(self) -> usize {
        // Variants are declared in canonical order.
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Column> {
        COLUMNS.iter().copied().find(|c| c.name() == name)
    }
}

/// Columns that go through a label encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Categorical {
    StateCode,
    Tobacco,
    PlanId,
    SourceName,
}

impl Categorical {
    /// Encoding order used by the pipeline.
    pub const ALL: [Categorical; 4] = [
        Categorical::StateCode,
        Categorical::Tobacco,
        Categorical::PlanId,
        Categorical::SourceName,
    ];

    pub fn column(self) -> Column {
        match self {
            Categorical::StateCode => Column::StateCode,
            Categorical::Tobacco => Column::Tobacco,
            Categorical::PlanId => Column::PlanId,
            Categorical::SourceName => Column::SourceName,
        }
    }
}

/// Tobacco use, the single enumerated form choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Tobacco {
    #[default]
    Yes,
    No,
}

impl Tobacco {
    pub const ALL: [Tobacco; 2] = [Tobacco::Yes, Tobacco::No];

    pub fn as_str(self) -> &'static str {
        match self {
            Tobacco::Yes => "Yes",
            Tobacco::No => "No",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Tobacco::Yes => Tobacco::No,
            Tobacco::No => Tobacco::Yes,
        }
    }
}

impl FromStr for Tobacco {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            v if v.eq_ignore_ascii_case("yes") => Ok(Tobacco::Yes),
            v if v.eq_ignore_ascii_case("no") => Ok(Tobacco::No),
            other => Err(format!("Tobacco must be Yes or No (got '{other}')")),
        }
    }
}

/// One rate record as entered by the user, before encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    pub business_year: i64,
    pub state_code: String,
    pub issuer_id: String,
    pub source_name: String,
    pub version_num: i64,
    pub issuer_id2: String,
    pub plan_id: String,
    pub rating_area_id: i64,
    pub tobacco: Tobacco,
    pub age: i64,
    pub row_number: i64,
    pub rate_duration: i64,
}

impl Default for Record {
    fn default() -> Self {
        Self {
            business_year: 2023,
            state_code: String::new(),
            issuer_id: String::new(),
            source_name: String::new(),
            version_num: 1,
            issuer_id2: String::new(),
            plan_id: String::new(),
            rating_area_id: 0,
            tobacco: Tobacco::Yes,
            age: 30,
            row_number: 1,
            rate_duration: 30,
        }
    }
}

impl Record {
    /// Raw string value of a categorical column.
    pub fn categorical(&self, cat: Categorical) -> &str {
        match cat {
            Categorical::StateCode => &self.state_code,
            Categorical::Tobacco => self.tobacco.as_str(),
            Categorical::PlanId => &self.plan_id,
            Categorical::SourceName => &self.source_name,
        }
    }

    /// Integer value of a plain numeric column (`None` for text/categorical columns).
    pub fn integer(&self, column: Column) -> Option<i64> {
        match column {
            Column::BusinessYear => Some(self.business_year),
            Column::VersionNum => Some(self.version_num),
            Column::RatingAreaId => Some(self.rating_area_id),
            Column::Age => Some(self.age),
            Column::RowNumber => Some(self.row_number),
            Column::RateDuration => Some(self.rate_duration),
            _ => None,
        }
    }
}

/// A fully numeric model input row in canonical column order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodedRow([f64; N_FEATURES]);

impl EncodedRow {
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    pub fn get(&self, column: Column) -> f64 {
        self.0[column.index()]
    }

    pub fn set(&mut self, column: Column, value: f64) {
        self.0[column.index()] = value;
    }

    pub fn values(&self) -> &[f64; N_FEATURES] {
        &self.0
    }

    /// Copy of this row with one column replaced.
    pub fn with(mut self, column: Column, value: f64) -> Self {
        self.set(column, value);
        self
    }
}

/// What to do with a categorical value its encoder never saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnseenPolicy {
    /// Replace with the smallest remaining known label; each label is used at
    /// most once per batch.
    #[default]
    Substitute,
    /// Like `substitute`, but the remaining label is picked by a seeded RNG.
    Random,
    /// Replace with the encoder's trained "unknown" label.
    Sentinel,
    /// Fail the request.
    Reject,
}

/// Resolved unseen-label handling for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnseenHandling {
    pub policy: UnseenPolicy,
    /// Seed for `UnseenPolicy::Random` (ignored otherwise).
    pub seed: u64,
}

impl UnseenHandling {
    pub fn new(policy: UnseenPolicy, seed: u64) -> Self {
        Self { policy, seed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_index_matches_canonical_order() {
        for (i, col) in COLUMNS.iter().enumerate() {
            assert_eq!(col.index(), i, "{} out of place", col.name());
            assert_eq!(Column::from_name(col.name()), Some(*col));
        }
        assert_eq!(Column::from_name("Premium"), None);
    }

    #[test]
    fn record_defaults_follow_form_defaults() {
        let r = Record::default();
        assert_eq!(r.business_year, 2023);
        assert_eq!(r.version_num, 1);
        assert_eq!(r.rating_area_id, 0);
        assert_eq!(r.age, 30);
        assert_eq!(r.row_number, 1);
        assert_eq!(r.rate_duration, 30);
        assert_eq!(r.tobacco, Tobacco::Yes);
    }

    #[test]
    fn tobacco_parses_case_insensitively() {
        assert_eq!("yes".parse::<Tobacco>().unwrap(), Tobacco::Yes);
        assert_eq!(" No ".parse::<Tobacco>().unwrap(), Tobacco::No);
        assert!("maybe".parse::<Tobacco>().is_err());
    }

    #[test]
    fn encoded_row_is_indexed_by_column() {
        let row = EncodedRow::new([0.0; N_FEATURES]).with(Column::Age, 40.0);
        assert_eq!(row.get(Column::Age), 40.0);
        assert_eq!(row.values()[9], 40.0);
    }
}
