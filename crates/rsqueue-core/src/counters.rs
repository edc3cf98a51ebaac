//! Counters file sampling.
//!
//! The counters file starts with two header lines and then gets one
//! whitespace-separated numeric row appended per sample. The solver may be
//! halfway through an append when the file is read, so a last line without
//! its newline is never taken as a sample.

use crate::controls::SimulationMode;
use crate::progress::ProgressError;
use camino::Utf8Path;
use rsqueue_parsers::{head, tail};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

/// Header lines before the first sample row.
pub const HEADER_LINES: usize = 2;

/// Step counts from the first and latest sample rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSamples {
    pub initial: u64,
    pub current: u64,
}

/// Read the initial and current step from a counters file.
///
/// Returns [`ProgressError::MissingData`] while the file holds no complete
/// sample row yet.
pub fn read_counters(path: &Utf8Path, mode: SimulationMode) -> Result<CounterSamples, ProgressError> {
    tracing::debug!(%path, ?mode, "sampling counters file");
    let column = mode.step_column();

    let first_rows: Vec<String> =
        head(BufReader::new(File::open(path)?), HEADER_LINES + 1).collect::<io::Result<_>>()?;
    let first = match first_rows.get(HEADER_LINES) {
        Some(row) => row,
        None => {
            return Err(ProgressError::MissingData(format!(
                "{} has {} of {} lines",
                path,
                first_rows.len(),
                HEADER_LINES + 1
            )));
        }
    };
    let initial = step_in_row(first, column).ok_or_else(|| unparsable(path, first))?;

    let mut file = File::open(path)?;
    let complete = ends_with_newline(&mut file)?;
    let mut rows = tail(&mut file, 2)?;
    if !complete {
        tracing::debug!(%path, partial = ?rows.last(), "skipping unterminated counters row");
        rows.pop();
    }
    let last = rows
        .last()
        .ok_or_else(|| ProgressError::MissingData(format!("{} is empty", path)))?;
    let current = step_in_row(last, column).ok_or_else(|| unparsable(path, last))?;

    if current < initial {
        return Err(ProgressError::InconsistentSteps { initial, current });
    }

    Ok(CounterSamples { initial, current })
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.seek(SeekFrom::End(0))? == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn unparsable(path: &Utf8Path, row: &str) -> ProgressError {
    tracing::warn!(%path, row, "counters row does not parse");
    ProgressError::MissingData(format!("{}: no step in row {:?}", path, row))
}

/// Step count in `column` of a sample row.
///
/// Integral floats such as `1.2e3` are accepted; anything else is not a step.
fn step_in_row(row: &str, column: usize) -> Option<u64> {
    let field = row.split_whitespace().nth(column)?;
    if let Ok(step) = field.parse::<u64>() {
        return Some(step);
    }
    let value = field.parse::<f64>().ok()?;
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as u64)
}
