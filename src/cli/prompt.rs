//! Line-by-line form on stdin.
//!
//! This is the plain-terminal counterpart of the TUI form: each field is asked
//! for in canonical order, an empty answer keeps the default, and an invalid
//! answer is asked again. `q` cancels.

use std::io::{self, BufRead, Write};

use crate::domain::{FIELDS, FieldSpec, FormState, Record};
use crate::error::{AppError, EXIT_INPUT};

/// Prompt for every field on the process's stdin/stdout.
pub fn prompt_for_record() -> Result<Record, AppError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    prompt_with(&mut stdin.lock(), &mut stdout.lock())
}

/// Prompt using arbitrary input/output streams.
pub fn prompt_with<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<Record, AppError> {
    let mut form = FormState::default();

    for spec in FIELDS.iter() {
        let value = prompt_field(spec, input, output)?;
        form.set(spec.column, value);
    }

    form.to_record().map_err(|e| AppError::input(e.to_string()))
}

fn prompt_field<R: BufRead, W: Write>(spec: &FieldSpec, input: &mut R, output: &mut W) -> Result<String, AppError> {
    let default = spec.default_text();
    loop {
        write!(output, "{} ({}) [{}]: ", spec.label(), spec.hint(), default)
            .and_then(|_| output.flush())
            .map_err(|e| AppError::runtime(format!("Failed to write prompt: {e}")))?;

        let mut line = String::new();
        let bytes = input
            .read_line(&mut line)
            .map_err(|e| AppError::runtime(format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::new(EXIT_INPUT, "No input received."));
        }

        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::new(EXIT_INPUT, "Canceled."));
        }
        if answer.is_empty() {
            return Ok(default);
        }

        match spec.normalize(answer) {
            Ok(value) => return Ok(value),
            Err(err) => {
                writeln!(output, "{err}").map_err(|e| AppError::runtime(format!("Failed to write prompt: {e}")))?;
            }
        }
    }
}
