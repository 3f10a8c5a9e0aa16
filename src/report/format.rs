//! Plain-text and JSON rendering of prediction results.

use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::PipelineOutput;
use crate::domain::{COLUMNS, Categorical, Column, FormState, Record};
use crate::encoding::{Encoders, LabelEncoder, Substitution};
use crate::error::AppError;
use crate::io::{ArtifactPaths, Artifacts};
use crate::models::Neighbor;

/// Headline line shown after a successful prediction.
pub fn format_prediction(premium: f64) -> String {
    format!("Predicted Premium: {premium:.2}")
}

/// One warning line per replaced unseen label.
pub fn format_substitutions(substitutions: &[Substitution]) -> Vec<String> {
    substitutions
        .iter()
        .map(|s| {
            format!(
                "note: {} '{}' is not a known label; encoded as '{}'",
                s.column.name(),
                s.from,
                s.to
            )
        })
        .collect()
}

/// Table of the neighbors that produced the prediction.
pub fn format_neighbors(neighbors: &[Neighbor]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>4}  {:>8}  {:>12}  {:>12}\n", "#", "row", "distance", "premium"));
    for (i, n) in neighbors.iter().enumerate() {
        out.push_str(&format!(
            "{:>4}  {:>8}  {:>12.4}  {:>12.2}\n",
            i + 1,
            n.index,
            n.distance,
            n.target
        ));
    }
    out
}

/// Encoded model input, one `column = value` per line. Categorical codes are
/// followed by the label they decode to.
pub fn format_encoded(output: &PipelineOutput, encoders: &Encoders) -> String {
    let width = COLUMNS.iter().map(|c| c.name().len()).max().unwrap_or(0);
    COLUMNS
        .iter()
        .map(|&c| {
            let value = output.encoded.get(c);
            let decoded = Categorical::ALL
                .iter()
                .find(|cat| cat.column() == c)
                .and_then(|&cat| encoders.get(cat).label(value as i64))
                .map(|label| format!(" ({label})"))
                .unwrap_or_default();
            format!("{:<width$} = {value}{decoded}", c.name())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Serialize)]
struct PredictionJson<'a> {
    premium: f64,
    record: &'a crate::domain::Record,
    substitutions: Vec<SubstitutionJson<'a>>,
    neighbors: &'a [Neighbor],
}

#[derive(Debug, Serialize)]
struct SubstitutionJson<'a> {
    column: &'static str,
    from: &'a str,
    to: &'a str,
}

/// Machine-readable result for `predict --json`.
pub fn prediction_json(output: &PipelineOutput) -> Result<serde_json::Value, AppError> {
    let json = PredictionJson {
        premium: output.premium(),
        record: &output.record,
        substitutions: output
            .substitutions
            .iter()
            .map(|s| SubstitutionJson {
                column: s.column.name(),
                from: &s.from,
                to: &s.to,
            })
            .collect(),
        neighbors: &output.prediction.neighbors,
    };
    serde_json::to_value(json).map_err(|e| AppError::runtime(format!("Failed to render JSON: {e}")))
}

/// A `premium predict` command line that reproduces `record` against `dir`.
pub fn format_predict_command(dir: &Path, record: &Record) -> String {
    let quote = |s: &str| {
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || "-_./".contains(c)) {
            s.to_string()
        } else {
            format!("'{}'", s.replace('\'', "'\\''"))
        }
    };
    let mut args = vec![
        "premium predict".to_string(),
        format!("--artifacts {}", quote(&dir.display().to_string())),
    ];
    let form = FormState::from_record(record);
    for column in COLUMNS {
        let value = match column {
            Column::Tobacco => form.value(column).to_lowercase(),
            _ => form.value(column).to_string(),
        };
        args.push(format!("--{} {}", column.flag(), quote(&value)));
    }
    args.join(" ")
}

/// Summary printed by `inspect`.
pub fn format_inspect(artifacts: &Artifacts, paths: &ArtifactPaths) -> String {
    let model = &artifacts.model;
    let mut lines = Vec::new();

    lines.push(format!("model:   {}", paths.model.display()));
    lines.push(format!(
        "  k={} weights={:?} p={} reference_rows={}",
        model.k(),
        model.weights(),
        model.p(),
        model.n_samples()
    ));
    if let Some(ts) = model.created_at() {
        lines.push(format!("  created_at={}", ts.to_rfc3339()));
    }

    let encoders = [
        ("StateCode", &paths.state_code, &artifacts.encoders.state_code),
        ("SourceName", &paths.source_name, &artifacts.encoders.source_name),
        ("Tobacco", &paths.tobacco, &artifacts.encoders.tobacco),
        ("PlanId", &paths.plan_id, &artifacts.encoders.plan_id),
    ];
    for (name, path, encoder) in encoders {
        lines.push(format!("{name:<10} {}", path.display()));
        lines.push(format!("  {}", describe_encoder(encoder)));
    }

    lines.join("\n")
}

fn describe_encoder(encoder: &LabelEncoder) -> String {
    const PREVIEW: usize = 6;
    let classes = encoder.classes();
    let mut preview = classes.iter().take(PREVIEW).cloned().collect::<Vec<_>>().join(", ");
    if classes.len() > PREVIEW {
        preview.push_str(", ...");
    }
    let sentinel = encoder
        .unknown_label()
        .map(|s| format!(" unknown_label='{s}'"))
        .unwrap_or_default();
    format!("{} classes [{preview}]{sentinel}", classes.len())
}
