//! CSV batch input and prediction output.
//!
//! Input files carry the 12 record columns under their schema names, in any
//! order; `ColumnLayout` maps them onto the canonical order or rejects the
//! header. Rows are validated with the same field rules the forms use.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;
use tracing::debug;

use crate::domain::{COLUMNS, ColumnLayout, FormState, Record};
use crate::error::AppError;

/// Read records from a CSV file.
pub fn read_records(path: &Path) -> Result<Vec<Record>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_records_from(file)
}

/// Read records from any CSV source.
pub fn read_records_from<R: Read>(source: R) -> Result<Vec<Record>, AppError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let layout = ColumnLayout::from_names(headers.iter())?;
    if !layout.is_canonical() {
        debug!(columns = layout.width(), "CSV header order differs from model order; reordering");
    }

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let row = row.map_err(|e| AppError::input(format!("CSV line {line}: {e}")))?;
        let record = record_from_row(&layout, &row).map_err(|e| AppError::input(format!("CSV line {line}: {e}")))?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(AppError::input("CSV contains no rows."));
    }
    Ok(records)
}

fn record_from_row(layout: &ColumnLayout, row: &StringRecord) -> Result<Record, String> {
    if row.len() != layout.width() {
        return Err(format!("expected {} fields, found {}", layout.width(), row.len()));
    }
    let mut form = FormState::default();
    for column in COLUMNS {
        let value = layout.field(row, column).unwrap_or_default();
        form.set(column, value);
    }
    form.to_record().map_err(|e| e.to_string())
}

/// Write `row,premium` CSV.
pub fn write_predictions<W: Write>(sink: W, premiums: &[f64]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(sink);
    writer
        .write_record(["row", "premium"])
        .map_err(|e| AppError::runtime(format!("Failed to write CSV header: {e}")))?;
    for (i, premium) in premiums.iter().enumerate() {
        writer
            .write_record([(i + 1).to_string(), format!("{premium:.4}")])
            .map_err(|e| AppError::runtime(format!("Failed to write CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush CSV output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Tobacco;

    const HEADER: &str = "Age,BusinessYear,StateCode,IssuerId,SourceName,VersionNum,IssuerId2,PlanId,RatingAreaId,Tobacco,RowNumber,RateDuration";

    #[test]
    fn reads_rows_with_any_header_order() {
        let csv = format!("{HEADER}\n40,2023,CA,21989,HIOS,1,21989,P1,2,no,1,365\n");
        let records = read_records_from(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.age, 40);
        assert_eq!(r.business_year, 2023);
        assert_eq!(r.state_code, "CA");
        assert_eq!(r.tobacco, Tobacco::No);
        assert_eq!(r.rate_duration, 365);
    }

    #[test]
    fn out_of_range_values_report_the_line() {
        let csv = format!("{HEADER}\n40,1990,CA,21989,HIOS,1,21989,P1,2,No,1,365\n");
        let err = read_records_from(csv.as_bytes()).unwrap_err();
        assert!(err.message().starts_with("CSV line 2"), "{}", err.message());
        assert!(err.message().contains("Business Year"));
    }

    #[test]
    fn unknown_header_is_rejected() {
        let csv = "Age,Premium\n1,2\n";
        let err = read_records_from(csv.as_bytes()).unwrap_err();
        assert!(err.message().contains("Unknown column 'Premium'"));
    }

    #[test]
    fn writes_one_line_per_prediction() {
        let mut out = Vec::new();
        write_predictions(&mut out, &[101.5, 99.25]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "row,premium\n1,101.5000\n2,99.2500\n");
    }
}
