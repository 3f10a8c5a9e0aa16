//! Mapping named input columns onto the canonical column order.
//!
//! Named inputs (CSV headers) may arrive in any order. They
//! are either reordered into `COLUMNS` order or rejected; a mismatched layout
//! is never passed through positionally.

use crate::domain::{COLUMNS, Column, N_FEATURES};
use crate::error::AppError;

/// For each canonical column, the position of that column in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    positions: [usize; N_FEATURES],
    width: usize,
}

impl ColumnLayout {
    /// Resolve a header list.
    ///
    /// Errors on unknown, duplicate, or missing columns.
    pub fn from_names<I, S>(names: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positions: [Option<usize>; N_FEATURES] = [None; N_FEATURES];
        let mut width = 0usize;

        for (pos, name) in names.into_iter().enumerate() {
            width += 1;
            let name = name.as_ref().trim();
            let column = Column::from_name(name)
                .ok_or_else(|| AppError::input(format!("Unknown column '{name}'.")))?;
            let slot = &mut positions[column.index()];
            if slot.is_some() {
                return Err(AppError::input(format!("Duplicate column '{name}'.")));
            }
            *slot = Some(pos);
        }

        let missing: Vec<&str> = COLUMNS
            .iter()
            .filter(|c| positions[c.index()].is_none())
            .map(|c| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::input(format!(
                "Missing required column(s): {}.",
                missing.join(", ")
            )));
        }

        let mut resolved = [0usize; N_FEATURES];
        for (dst, src) in resolved.iter_mut().zip(positions) {
            *dst = src.unwrap_or_default();
        }

        Ok(Self {
            positions: resolved,
            width,
        })
    }

    /// Input position of `column`.
    pub fn position(&self, column: Column) -> usize {
        self.positions[column.index()]
    }

    /// Whether the input already is in canonical order.
    pub fn is_canonical(&self) -> bool {
        self.positions.iter().enumerate().all(|(i, &p)| i == p)
    }

    /// Number of input columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Pick `column` out of a CSV row laid out like the headers.
    pub fn field<'a>(&self, row: &'a csv::StringRecord, column: Column) -> Option<&'a str> {
        row.get(self.position(column))
    }
}
