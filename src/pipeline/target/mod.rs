//! Target (entity) recognition.
//!
//! Two mutually exclusive sources: a rule table of literal phrases and
//! token regexes, or an external recognizer behind the
//! [`EntityRecognizer`] trait. Both yield sentence-relative matches; the
//! orchestrator turns them into entities.

pub mod recognizer;
pub mod rules;

pub use recognizer::{EntityRecognizer, RecognizedSpan};
pub use rules::{builtin_rules, TargetMatcher, TargetRuleSpec};

use thiserror::Error;

use super::types::Span;

#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("Recognizer unavailable: {0}")]
    Unavailable(String),

    #[error("Recognizer failed: {0}")]
    Failed(String),

    #[error("Malformed recognizer output: {0}")]
    Malformed(String),
}

/// One recognized mention inside a sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetMatch {
    pub text: String,
    pub label: String,
    /// Sentence-relative byte span.
    pub span: Span,
}

/// Where entities come from for a given pipeline.
pub enum EntitySource {
    Rules(TargetMatcher),
    Model(Box<dyn EntityRecognizer>),
}

impl std::fmt::Debug for EntitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rules(matcher) => f.debug_tuple("Rules").field(&matcher.len()).finish(),
            Self::Model(model) => f.debug_tuple("Model").field(&model.name()).finish(),
        }
    }
}

impl EntitySource {
    /// Matches for one sentence in text order. A failing recognizer yields
    /// no matches for that sentence; the note still completes.
    pub fn find(&self, sentence: &str, tokens: &[Span]) -> Vec<TargetMatch> {
        match self {
            Self::Rules(matcher) => matcher.find(sentence, tokens),
            Self::Model(model) => match model.recognize(sentence) {
                Ok(spans) => recognizer::to_matches(sentence, spans),
                Err(e) => {
                    tracing::warn!(recognizer = model.name(), error = %e, "Recognizer failed on sentence");
                    Vec::new()
                }
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Rules(matcher) => format!("rules({})", matcher.len()),
            Self::Model(model) => format!("model({})", model.name()),
        }
    }
}
