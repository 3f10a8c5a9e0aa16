//! Form field definitions shared by the TUI, the line prompt, and tests.
//!
//! Fields are listed in canonical column order, which is also the order the
//! user sees them in. Text input is kept as strings until `FormState::to_record`
//! validates everything at once.

use thiserror::Error;

use crate::domain::{COLUMNS, Column, N_FEATURES, Record, Tobacco};

/// Input widget kind and constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Whole number with an inclusive lower bound and optional upper bound.
    Integer {
        min: i64,
        max: Option<i64>,
        default: i64,
    },
    /// Free text (empty allowed).
    Text,
    /// Single choice among fixed options; the first is the default.
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub column: Column,
    pub kind: FieldKind,
}

const TOBACCO_CHOICES: &[&str] = &["Yes", "No"];

/// All form fields in display (and canonical) order.
pub static FIELDS: [FieldSpec; N_FEATURES] = [
    FieldSpec {
        column: Column::BusinessYear,
        kind: FieldKind::Integer {
            min: 2000,
            max: Some(2100),
            default: 2023,
        },
    },
    FieldSpec {
        column: Column::StateCode,
        kind: FieldKind::Text,
    },
    FieldSpec {
        column: Column::IssuerId,
        kind: FieldKind::Text,
    },
    FieldSpec {
        column: Column::SourceName,
        kind: FieldKind::Text,
    },
    FieldSpec {
        column: Column::VersionNum,
        kind: FieldKind::Integer {
            min: 1,
            max: None,
            default: 1,
        },
    },
    FieldSpec {
        column: Column::IssuerId2,
        kind: FieldKind::Text,
    },
    FieldSpec {
        column: Column::PlanId,
        kind: FieldKind::Text,
    },
    FieldSpec {
        column: Column::RatingAreaId,
        kind: FieldKind::Integer {
            min: 0,
            max: None,
            default: 0,
        },
    },
    FieldSpec {
        column: Column::Tobacco,
        kind: FieldKind::Choice(TOBACCO_CHOICES),
    },
    FieldSpec {
        column: Column::Age,
        kind: FieldKind::Integer {
            min: 0,
            max: None,
            default: 30,
        },
    },
    FieldSpec {
        column: Column::RowNumber,
        kind: FieldKind::Integer {
            min: 0,
            max: None,
            default: 1,
        },
    },
    FieldSpec {
        column: Column::RateDuration,
        kind: FieldKind::Integer {
            min: 0,
            max: None,
            default: 30,
        },
    },
];

/// A field value that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{label}: {message}")]
pub struct FieldError {
    pub label: &'static str,
    pub message: String,
}

impl FieldSpec {
    pub fn for_column(column: Column) -> &'static FieldSpec {
        &FIELDS[column.index()]
    }

    pub fn label(&self) -> &'static str {
        self.column.label()
    }

    /// Default value as the form would show it.
    pub fn default_text(&self) -> String {
        match self.kind {
            FieldKind::Integer { default, .. } => default.to_string(),
            FieldKind::Text => String::new(),
            FieldKind::Choice(options) => options.first().copied().unwrap_or_default().to_string(),
        }
    }

    /// Short description of the accepted range.
    pub fn hint(&self) -> String {
        match self.kind {
            FieldKind::Integer { min, max: Some(max), .. } => format!("{min}-{max}"),
            FieldKind::Integer { min, max: None, .. } => format!(">= {min}"),
            FieldKind::Text => "text".to_string(),
            FieldKind::Choice(options) => options.join("/"),
        }
    }

    /// Validate an integer field.
    pub fn parse_integer(&self, raw: &str) -> Result<i64, FieldError> {
        let FieldKind::Integer { min, max, .. } = self.kind else {
            return Err(self.error("not a numeric field"));
        };
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| self.error(format!("expected a whole number, got '{}'", raw.trim())))?;
        if value < min || max.is_some_and(|max| value > max) {
            return Err(self.error(format!("must be {}", self.hint())));
        }
        Ok(value)
    }

    /// Validate a choice field, returning the canonical option spelling.
    pub fn parse_choice(&self, raw: &str) -> Result<&'static str, FieldError> {
        let FieldKind::Choice(options) = self.kind else {
            return Err(self.error("not a choice field"));
        };
        options
            .iter()
            .copied()
            .find(|opt| opt.eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| self.error(format!("must be one of {}", self.hint())))
    }

    /// Validate any field kind, returning the normalized text.
    pub fn normalize(&self, raw: &str) -> Result<String, FieldError> {
        match self.kind {
            FieldKind::Integer { .. } => self.parse_integer(raw).map(|v| v.to_string()),
            FieldKind::Text => Ok(raw.trim().to_string()),
            FieldKind::Choice(_) => self.parse_choice(raw).map(str::to_string),
        }
    }

    fn error(&self, message: impl Into<String>) -> FieldError {
        FieldError {
            label: self.label(),
            message: message.into(),
        }
    }
}

/// Editable form contents, one string per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    values: [String; N_FEATURES],
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            values: FIELDS.map(|f| f.default_text()),
        }
    }
}

impl FormState {
    pub fn value(&self, column: Column) -> &str {
        &self.values[column.index()]
    }

    pub fn set(&mut self, column: Column, value: impl Into<String>) {
        self.values[column.index()] = value.into();
    }

    /// Type a character into a field. Integer fields only accept digits and
    /// choice fields ignore typing.
    pub fn push_char(&mut self, column: Column, c: char) {
        let accept = match FieldSpec::for_column(column).kind {
            FieldKind::Integer { .. } => c.is_ascii_digit(),
            FieldKind::Text => !c.is_control(),
            FieldKind::Choice(_) => false,
        };
        if accept {
            self.values[column.index()].push(c);
        }
    }

    pub fn pop_char(&mut self, column: Column) {
        if !matches!(FieldSpec::for_column(column).kind, FieldKind::Choice(_)) {
            self.values[column.index()].pop();
        }
    }

    /// Step an integer field by `delta` (clamped to its range) or cycle a choice.
    pub fn step(&mut self, column: Column, delta: i64) {
        let spec = FieldSpec::for_column(column);
        let slot = &mut self.values[column.index()];
        match spec.kind {
            FieldKind::Integer { min, max, default } => {
                let current = slot.trim().parse::<i64>().unwrap_or(default);
                let mut next = current.saturating_add(delta).max(min);
                if let Some(max) = max {
                    next = next.min(max);
                }
                *slot = next.to_string();
            }
            FieldKind::Choice(options) if !options.is_empty() => {
                let idx = options
                    .iter()
                    .position(|o| o.eq_ignore_ascii_case(slot.as_str()))
                    .unwrap_or(0);
                let len = options.len() as i64;
                let next = (idx as i64 + delta).rem_euclid(len) as usize;
                *slot = options[next].to_string();
            }
            _ => {}
        }
    }

    /// Validate every field and build a record.
    pub fn to_record(&self) -> Result<Record, FieldError> {
        let int = |column: Column| FieldSpec::for_column(column).parse_integer(self.value(column));
        let text = |column: Column| self.value(column).trim().to_string();

        let tobacco_spec = FieldSpec::for_column(Column::Tobacco);
        let tobacco = tobacco_spec
            .parse_choice(self.value(Column::Tobacco))?
            .parse::<Tobacco>()
            .map_err(|message| FieldError {
                label: tobacco_spec.label(),
                message,
            })?;

        Ok(Record {
            business_year: int(Column::BusinessYear)?,
            state_code: text(Column::StateCode),
            issuer_id: text(Column::IssuerId),
            source_name: text(Column::SourceName),
            version_num: int(Column::VersionNum)?,
            issuer_id2: text(Column::IssuerId2),
            plan_id: text(Column::PlanId),
            rating_area_id: int(Column::RatingAreaId)?,
            tobacco,
            age: int(Column::Age)?,
            row_number: int(Column::RowNumber)?,
            rate_duration: int(Column::RateDuration)?,
        })
    }

    /// Form pre-filled from an existing record.
    pub fn from_record(record: &Record) -> Self {
        let mut form = Self::default();
        for column in COLUMNS {
            let text = match column {
                Column::StateCode => record.state_code.clone(),
                Column::IssuerId => record.issuer_id.clone(),
                Column::SourceName => record.source_name.clone(),
                Column::IssuerId2 => record.issuer_id2.clone(),
                Column::PlanId => record.plan_id.clone(),
                Column::Tobacco => record.tobacco.as_str().to_string(),
                other => record.integer(other).unwrap_or_default().to_string(),
            };
            form.set(column, text);
        }
        form
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_follow_canonical_order() {
        for (field, column) in FIELDS.iter().zip(COLUMNS) {
            assert_eq!(field.column, column);
        }
    }

    #[test]
    fn default_form_builds_default_record() {
        let record = FormState::default().to_record().unwrap();
        assert_eq!(record, Record::default());
    }

    #[test]
    fn business_year_range_is_enforced() {
        let mut form = FormState::default();
        form.set(Column::BusinessYear, "1999");
        let err = form.to_record().unwrap_err();
        assert_eq!(err.label, "Business Year");
        assert!(err.message.contains("2000-2100"));

        form.set(Column::BusinessYear, "2100");
        assert_eq!(form.to_record().unwrap().business_year, 2100);
    }

    #[test]
    fn version_must_be_positive() {
        let spec = FieldSpec::for_column(Column::VersionNum);
        assert!(spec.parse_integer("0").is_err());
        assert_eq!(spec.parse_integer(" 3 ").unwrap(), 3);
        assert!(spec.parse_integer("three").is_err());
    }

    #[test]
    fn step_clamps_and_cycles() {
        let mut form = FormState::default();
        form.step(Column::Age, -100);
        assert_eq!(form.value(Column::Age), "0");
        form.step(Column::BusinessYear, 500);
        assert_eq!(form.value(Column::BusinessYear), "2100");
        form.step(Column::Tobacco, 1);
        assert_eq!(form.value(Column::Tobacco), "No");
        form.step(Column::Tobacco, 1);
        assert_eq!(form.value(Column::Tobacco), "Yes");
    }

    #[test]
    fn typing_respects_field_kind() {
        let mut form = FormState::default();
        form.set(Column::Age, "");
        form.push_char(Column::Age, '4');
        form.push_char(Column::Age, 'x');
        form.push_char(Column::Age, '0');
        assert_eq!(form.value(Column::Age), "40");

        form.push_char(Column::Tobacco, 'n');
        assert_eq!(form.value(Column::Tobacco), "Yes");

        form.push_char(Column::StateCode, 'C');
        form.push_char(Column::StateCode, 'A');
        form.pop_char(Column::StateCode);
        assert_eq!(form.value(Column::StateCode), "C");
    }

    #[test]
    fn record_round_trips_through_form() {
        let record = Record {
            state_code: "CA".into(),
            plan_id: "P1".into(),
            tobacco: Tobacco::No,
            age: 40,
            ..Record::default()
        };
        assert_eq!(FormState::from_record(&record).to_record().unwrap(), record);
    }
}
