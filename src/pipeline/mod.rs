//! Note annotation pipeline.
//!
//! Raw note → preprocess → segment → sectionize → target matching →
//! context classification → post-processing → records. Every stage is
//! built once from frozen rule tables and is shared read-only afterwards.

pub mod batch;
pub mod context;
pub mod ingest;
pub mod orchestrator;
mod patterns;
pub mod postprocess;
pub mod preprocess;
pub mod prevalence;
pub mod rule_tables;
pub mod sectionizer;
pub mod segment;
pub mod serialize;
pub mod target;
pub mod tokenize;
pub mod types;

pub use orchestrator::{AnnotatedNote, NotePipeline, TargetMode};
pub use rule_tables::RuleTables;
pub use serialize::{query, query_terms, EntityRecord, ModifierRecord, NoteResult, QueryCase};
pub use types::{Assertions, Entity, Modifier, Section, SentenceUnit, Span, UNSPECIFIED_SECTION};

use thiserror::Error;

/// Rule table or settings rejected while building the pipeline.
///
/// Always raised before any note is processed.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid {table} rule {index}: {source}")]
    InvalidPattern {
        table: &'static str,
        index: usize,
        #[source]
        source: regex::Error,
    },

    #[error("{table} rule {index} can match empty text: {pattern}")]
    ZeroWidthPattern {
        table: &'static str,
        index: usize,
        pattern: String,
    },

    #[error("{table} rule {index} can span a sentence boundary: {pattern}")]
    SpansSentenceDelimiter {
        table: &'static str,
        index: usize,
        pattern: String,
    },

    #[error("Invalid {table} rule {index}: {reason}")]
    InvalidRule {
        table: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}
