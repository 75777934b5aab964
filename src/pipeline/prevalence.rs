//! Per-year prevalence of a text pattern across notes.
//!
//! Exploratory counterpart to the pipeline: how often does a phrase show up
//! in notes, year by year.

use std::collections::BTreeMap;

use serde::Serialize;

use super::patterns;
use super::ConfigError;
use crate::models::Note;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPrevalence {
    pub year: i32,
    /// Notes containing the pattern at least once.
    pub matched: usize,
    pub total: usize,
    pub proportion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrevalenceReport {
    pub pattern: String,
    /// Ascending by year.
    pub years: Vec<YearPrevalence>,
    /// Notes without a date, left out of every year.
    pub undated: usize,
}

/// Count notes matching `pattern` (case-insensitive regex) for each year.
pub fn pattern_prevalence(pattern: &str, notes: &[Note]) -> Result<PrevalenceReport, ConfigError> {
    let regex = patterns::compile("prevalence", 0, &format!("(?i){pattern}"))?;

    let mut by_year: BTreeMap<i32, (usize, usize)> = BTreeMap::new();
    let mut undated = 0;
    for note in notes {
        let Some(year) = note.year() else {
            undated += 1;
            continue;
        };
        let entry = by_year.entry(year).or_default();
        entry.1 += 1;
        if regex.is_match(&note.text) {
            entry.0 += 1;
        }
    }

    if undated > 0 {
        tracing::debug!(undated, "Undated notes excluded from prevalence");
    }

    let years = by_year
        .into_iter()
        .map(|(year, (matched, total))| YearPrevalence {
            year,
            matched,
            total,
            proportion: matched as f64 / total as f64,
        })
        .collect();

    Ok(PrevalenceReport {
        pattern: pattern.to_string(),
        years,
        undated,
    })
}
