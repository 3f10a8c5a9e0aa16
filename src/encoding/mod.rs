//! Categorical encoding of user input.
//!
//! - `label`: the fitted label encoders
//! - `safe`: encoding with an explicit unseen-label policy, plus record/batch
//!   encoding into canonical model rows

use thiserror::Error;

use crate::domain::Categorical;

pub mod label;
pub mod safe;

pub use label::*;
pub use safe::*;

/// Recoverable failure while encoding a request.
///
/// These abandon the current request only; the caller reports them and keeps
/// serving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{column}: unseen label '{label}'")]
    Unseen { column: &'static str, label: String },
    #[error("{column}: no known labels left to substitute for unseen label '{label}'")]
    Exhausted { column: &'static str, label: String },
    #[error("{column}: encoder has no unknown-label sentinel for unseen label '{label}'")]
    NoSentinel { column: &'static str, label: String },
    #[error("{column}: expected a numeric identifier, got '{value}'")]
    InvalidNumber { column: &'static str, value: String },
}

/// The four categorical encoders, one per encoded column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoders {
    pub state_code: LabelEncoder,
    pub source_name: LabelEncoder,
    pub tobacco: LabelEncoder,
    pub plan_id: LabelEncoder,
}

impl Encoders {
    pub fn get(&self, cat: Categorical) -> &LabelEncoder {
        match cat {
            Categorical::StateCode => &self.state_code,
            Categorical::SourceName => &self.source_name,
            Categorical::Tobacco => &self.tobacco,
            Categorical::PlanId => &self.plan_id,
        }
    }
}
