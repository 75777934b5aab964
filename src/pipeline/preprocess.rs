//! Note normalization.
//!
//! An ordered list of rewrite rules turns raw export text into the
//! normalized text every later stage works on: lower-casing, redacting the
//! leading patient name, canonicalizing header abbreviations, and recovering
//! line breaks that the export flattened into whitespace runs.
//!
//! Rules run in declaration order, each over the output of the previous one.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use super::patterns;
use super::ConfigError;
use crate::pipeline_config::SegmenterConfig;

const TABLE: &str = "preprocess";

// ═══════════════════════════════════════════════════════════
// Rule specs
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Lower-case the whole note.
    Lowercase,
    /// Regex substitution. `$1`-style group references are expanded.
    /// With `once`, only the first match is replaced; the pattern must then
    /// be anchored at the start of the note.
    Substitute {
        pattern: String,
        replacement: String,
        #[serde(default)]
        once: bool,
    },
    /// Replace whitespace runs of the sentence minimum length with `\n`,
    /// leaving runs that contain the section delimiter intact.
    LineBreaks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessRuleSpec {
    pub description: String,
    #[serde(flatten)]
    pub transform: Transform,
}

impl PreprocessRuleSpec {
    pub fn new(description: &str, transform: Transform) -> Self {
        Self {
            description: description.into(),
            transform,
        }
    }

    pub fn substitute(description: &str, pattern: &str, replacement: &str, once: bool) -> Self {
        Self::new(
            description,
            Transform::Substitute {
                pattern: pattern.into(),
                replacement: replacement.into(),
                once,
            },
        )
    }
}

/// Text that replaces the patient name at the start of a note.
pub const NAME_REDACTION: &str = "[patient name]";

const HPI_HEADER: &str = "history of presenting illness:";

/// Default rewrite rules for ED provider notes.
pub fn builtin_rules() -> Vec<PreprocessRuleSpec> {
    vec![
        PreprocessRuleSpec::new("Lowercase note text", Transform::Lowercase),
        PreprocessRuleSpec::substitute(
            "Redact leading patient name",
            r"^[a-z](.*?)presented",
            &format!("{NAME_REDACTION} presented"),
            true,
        ),
        PreprocessRuleSpec::substitute("Collapse repeated HPI header", "hpi.*hpi", HPI_HEADER, false),
        PreprocessRuleSpec::substitute("Expand HPI abbreviation", r"\bhpi\b", HPI_HEADER, false),
        PreprocessRuleSpec::substitute(
            "Terminate review of systems header",
            r"review of systems\b",
            "review of systems:",
            false,
        ),
        PreprocessRuleSpec::new("Recover line breaks", Transform::LineBreaks),
    ]
}

// ═══════════════════════════════════════════════════════════
// Compiled preprocessor
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
enum Compiled {
    Lowercase,
    Substitute {
        regex: Regex,
        replacement: String,
        once: bool,
    },
    LineBreaks {
        run: Regex,
        keep: String,
    },
}

#[derive(Debug)]
struct Rule {
    description: String,
    compiled: Compiled,
}

#[derive(Debug)]
pub struct Preprocessor {
    rules: Vec<Rule>,
}

impl Preprocessor {
    pub fn new(specs: &[PreprocessRuleSpec], segmenter: &SegmenterConfig) -> Result<Self, ConfigError> {
        let rules = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                let compiled = compile(index, &spec.transform, segmenter)?;
                Ok(Rule {
                    description: spec.description.clone(),
                    compiled,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Produce normalized text. Never fails.
    pub fn apply(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for rule in &self.rules {
            text = match &rule.compiled {
                Compiled::Lowercase => text.to_lowercase(),
                Compiled::Substitute {
                    regex,
                    replacement,
                    once,
                } => {
                    let out = if *once {
                        regex.replace(&text, replacement.as_str()).into_owned()
                    } else {
                        regex.replace_all(&text, replacement.as_str()).into_owned()
                    };
                    if *once {
                        audit_single_replacement(&rule.description, replacement, &out);
                    }
                    out
                }
                Compiled::LineBreaks { run, keep } => run
                    .replace_all(&text, |caps: &Captures<'_>| {
                        let matched = &caps[0];
                        if matched.contains(keep.as_str()) {
                            matched.to_string()
                        } else {
                            "\n".to_string()
                        }
                    })
                    .into_owned(),
            };
        }
        text
    }
}

fn compile(index: usize, transform: &Transform, segmenter: &SegmenterConfig) -> Result<Compiled, ConfigError> {
    match transform {
        Transform::Lowercase => Ok(Compiled::Lowercase),
        Transform::Substitute {
            pattern,
            replacement,
            once,
        } => {
            if pattern.is_empty() {
                return Err(ConfigError::InvalidRule {
                    table: TABLE,
                    index,
                    reason: "empty pattern".into(),
                });
            }
            if *once && !pattern.starts_with('^') {
                return Err(ConfigError::InvalidRule {
                    table: TABLE,
                    index,
                    reason: "single-replacement rules must be anchored with '^'".into(),
                });
            }
            let regex = patterns::compile(TABLE, index, pattern)?;
            patterns::reject_zero_width(TABLE, index, &regex)?;
            Ok(Compiled::Substitute {
                regex,
                replacement: replacement.clone(),
                once: *once,
            })
        }
        Transform::LineBreaks => {
            let min = segmenter.sentence_min_whitespace.max(1);
            let run = patterns::compile(TABLE, index, &format!(r"\s{{{min},}}"))?;
            Ok(Compiled::LineBreaks {
                run,
                keep: segmenter.section_delimiter.clone(),
            })
        }
    }
}

/// Warn when a single-replacement marker shows up more than once in the
/// output. Only literal replacements can be counted.
fn audit_single_replacement(description: &str, replacement: &str, out: &str) {
    if replacement.is_empty() || replacement.contains('$') {
        return;
    }
    let count = out.matches(replacement).count();
    if count > 1 {
        tracing::warn!(rule = description, count, "Redaction marker appears more than once");
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
