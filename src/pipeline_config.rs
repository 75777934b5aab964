//! Pipeline configuration.
//!
//! Structural settings (delimiters, scope limits, ingestion column names)
//! live here. Linguistic rule tables live in `pipeline::rule_tables`. Both
//! are loaded once, validated when the pipeline is built, and frozen.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{self, SECTION_DELIMITER_LEN_ENV, SENTENCE_MIN_WS_ENV};
use crate::pipeline::ConfigError;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Whitespace conventions of the upstream note export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Literal string separating section candidates. Defaults to nine spaces.
    pub section_delimiter: String,
    /// Shortest whitespace run that ends a sentence. A newline always does.
    pub sentence_min_whitespace: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            section_delimiter: " ".repeat(9),
            sentence_min_whitespace: 2,
        }
    }
}

/// Context scoping defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Scope limit in tokens for rules that do not set their own.
    /// `None` lets scope run to the sentence boundary.
    pub max_scope: Option<usize>,
}

/// Column names of the note export consumed by batch ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub id_column: String,
    pub text_column: String,
    pub date_column: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            id_column: "CSN".into(),
            text_column: "ED Provider Notes".into(),
            date_column: "Arrival Date".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub segmenter: SegmenterConfig,
    pub context: ContextConfig,
    pub ingest: IngestConfig,
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl PipelineConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(config::env_usize)
    }

    /// Read a JSON config file. Missing fields take their defaults;
    /// environment overrides are applied on top.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let parsed: Self = serde_json::from_str(&raw)?;
        let config = parsed.with_overrides(config::env_usize);
        config.validate()?;
        Ok(config)
    }

    /// Apply numeric overrides from `lookup` (keyed by env var name).
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<usize>) -> Self {
        if let Some(len) = lookup(SECTION_DELIMITER_LEN_ENV) {
            tracing::debug!(len, "Section delimiter length overridden");
            self.segmenter.section_delimiter = " ".repeat(len);
        }
        if let Some(min) = lookup(SENTENCE_MIN_WS_ENV) {
            tracing::debug!(min, "Sentence whitespace minimum overridden");
            self.segmenter.sentence_min_whitespace = min;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.segmenter.section_delimiter.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "segmenter.section_delimiter",
                reason: "must not be empty".into(),
            });
        }
        if self.segmenter.sentence_min_whitespace == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "segmenter.sentence_min_whitespace",
                reason: "must be at least 1".into(),
            });
        }
        if self.context.max_scope == Some(0) {
            return Err(ConfigError::InvalidSetting {
                field: "context.max_scope",
                reason: "must be at least 1 token when set".into(),
            });
        }
        let ingest = &self.ingest;
        for (field, value) in [
            ("ingest.id_column", &ingest.id_column),
            ("ingest.text_column", &ingest.text_column),
            ("ingest.date_column", &ingest.date_column),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidSetting {
                    field,
                    reason: "column name must not be blank".into(),
                });
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
