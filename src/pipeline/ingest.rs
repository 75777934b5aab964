//! Note ingestion from JSON-lines exports.
//!
//! Each line is one visit record: an object keyed by column name, one
//! column per note type. The visit id and note text columns are required;
//! the date column is optional. Every line is validated before any note is
//! handed to the pipeline.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::Note;
use crate::pipeline_config::IngestConfig;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: malformed JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line}: expected a JSON object")]
    NotAnObject { line: usize },

    #[error("Line {line}: missing column '{column}'")]
    MissingColumn { line: usize, column: String },

    #[error("Line {line}: invalid value in column '{column}'")]
    InvalidValue { line: usize, column: String },

    #[error("Line {line}: unrecognized date '{value}'")]
    InvalidDate { line: usize, value: String },

    #[error("Failed to write results: {0}")]
    Output(#[source] serde_json::Error),
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M", "%m/%d/%Y %H:%M:%S"];

/// Parse an arrival date. Time of day, when present, is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

fn parse_record(line: usize, object: &Map<String, Value>, config: &IngestConfig) -> Result<Note, IngestError> {
    let missing = |column: &str| IngestError::MissingColumn {
        line,
        column: column.to_string(),
    };
    let invalid = |column: &str| IngestError::InvalidValue {
        line,
        column: column.to_string(),
    };

    let visit_id = match object.get(&config.id_column) {
        None => return Err(missing(&config.id_column)),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => return Err(invalid(&config.id_column)),
    };

    let text = match object.get(&config.text_column) {
        None => return Err(missing(&config.text_column)),
        Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(invalid(&config.text_column)),
    };

    let date = match object.get(&config.date_column) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(parse_date(s).ok_or_else(|| IngestError::InvalidDate {
            line,
            value: s.clone(),
        })?),
        Some(_) => return Err(invalid(&config.date_column)),
    };

    Ok(Note { visit_id, date, text })
}

/// Read and validate every record. Blank lines are skipped; line numbers in
/// errors are 1-based.
pub fn read_notes<R: BufRead>(reader: R, config: &IngestConfig) -> Result<Vec<Note>, IngestError> {
    let mut notes = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line).map_err(|source| IngestError::Json { line: line_no, source })?;
        let Value::Object(object) = value else {
            return Err(IngestError::NotAnObject { line: line_no });
        };
        notes.push(parse_record(line_no, &object, config)?);
    }

    let undated = notes.iter().filter(|n| n.date.is_none()).count();
    let empty = notes.iter().filter(|n| n.text.trim().is_empty()).count();
    tracing::info!(notes = notes.len(), undated, empty, "Notes ingested");
    Ok(notes)
}

pub fn read_notes_file(path: &Path, config: &IngestConfig) -> Result<Vec<Note>, IngestError> {
    let file = File::open(path)?;
    read_notes(BufReader::new(file), config)
}
