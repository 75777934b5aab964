//! Batch annotation: notes in, one JSON line per note out.

use std::io::{BufRead, Write};

use serde::Serialize;

use super::ingest::{read_notes, IngestError};
use super::orchestrator::NotePipeline;
use super::serialize::{query_terms, NoteResult, QueryCase};
use crate::models::Note;
use crate::pipeline_config::IngestConfig;

/// Entity filter applied to every note's records.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Keep entities whose text contains any term. Empty keeps all.
    pub terms: Vec<String>,
    pub case: QueryCase,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub notes: usize,
    pub entities: usize,
    /// Notes that produced no entity records.
    pub notes_without_entities: usize,
}

/// Annotate notes in order.
pub fn annotate_notes(pipeline: &NotePipeline, notes: &[Note], options: &BatchOptions) -> Vec<NoteResult> {
    notes
        .iter()
        .map(|note| {
            let mut result = pipeline.annotate(note);
            if !options.terms.is_empty() {
                result.entities = query_terms(&options.terms, &result.entities, options.case)
                    .into_iter()
                    .cloned()
                    .collect();
            }
            result
        })
        .collect()
}

pub fn summarize(results: &[NoteResult]) -> BatchSummary {
    BatchSummary {
        notes: results.len(),
        entities: results.iter().map(|r| r.entities.len()).sum(),
        notes_without_entities: results.iter().filter(|r| r.entities.is_empty()).count(),
    }
}

pub fn write_jsonl<W: Write>(results: &[NoteResult], mut writer: W) -> Result<(), IngestError> {
    for result in results {
        serde_json::to_writer(&mut writer, result).map_err(IngestError::Output)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Ingest every note, then annotate and write. Nothing is written when any
/// input record is invalid.
pub fn run_batch<R: BufRead, W: Write>(
    pipeline: &NotePipeline,
    reader: R,
    writer: W,
    ingest: &IngestConfig,
    options: &BatchOptions,
) -> Result<BatchSummary, IngestError> {
    let notes = read_notes(reader, ingest)?;
    let results = annotate_notes(pipeline, &notes, options);
    write_jsonl(&results, writer)?;
    let summary = summarize(&results);
    tracing::info!(
        notes = summary.notes,
        entities = summary.entities,
        without_entities = summary.notes_without_entities,
        "Batch complete"
    );
    Ok(summary)
}
