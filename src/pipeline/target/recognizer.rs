//! External entity recognizer boundary.
//!
//! A recognizer sees one sentence at a time and returns labeled spans in
//! character offsets. Text and labels pass through unchanged; spans that do
//! not fit the sentence are dropped.

use serde::{Deserialize, Serialize};

use super::{RecognizerError, TargetMatch};
use crate::offset::char_span_to_bytes;
use crate::pipeline::types::Span;

/// A span reported by an external recognizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedSpan {
    pub text: String,
    pub label: String,
    /// Character offset within the sentence.
    pub start_char: usize,
    pub end_char: usize,
}

/// Sentence-level named entity recognizer.
///
/// Implementations must be shareable across threads: a pipeline holds one
/// recognizer and may be used from several workers at once.
pub trait EntityRecognizer: Send + Sync {
    fn recognize(&self, sentence: &str) -> Result<Vec<RecognizedSpan>, RecognizerError>;

    fn name(&self) -> &str {
        "external"
    }
}

pub(super) fn to_matches(sentence: &str, spans: Vec<RecognizedSpan>) -> Vec<TargetMatch> {
    let mut matches: Vec<TargetMatch> = spans
        .into_iter()
        .filter_map(|s| {
            let bytes = char_span_to_bytes(sentence, s.start_char, s.end_char).filter(|(a, b)| a < b);
            match bytes {
                Some((start, end)) => Some(TargetMatch {
                    text: s.text,
                    label: s.label,
                    span: Span::new(start, end),
                }),
                None => {
                    tracing::warn!(
                        start = s.start_char,
                        end = s.end_char,
                        "Dropping recognizer span outside sentence"
                    );
                    None
                }
            }
        })
        .collect();
    matches.sort_by_key(|m| (m.span.start, m.span.end));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::target::EntitySource;
    use crate::pipeline::tokenize::tokenize;

    struct FixedRecognizer(Vec<RecognizedSpan>);

    impl EntityRecognizer for FixedRecognizer {
        fn recognize(&self, _sentence: &str) -> Result<Vec<RecognizedSpan>, RecognizerError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingRecognizer;

    impl EntityRecognizer for FailingRecognizer {
        fn recognize(&self, _sentence: &str) -> Result<Vec<RecognizedSpan>, RecognizerError> {
            Err(RecognizerError::Unavailable("model not loaded".into()))
        }
    }

    fn span(text: &str, label: &str, start: usize, end: usize) -> RecognizedSpan {
        RecognizedSpan {
            text: text.into(),
            label: label.into(),
            start_char: start,
            end_char: end,
        }
    }

    #[test]
    fn spans_pass_through_unchanged() {
        let sentence = "denies chest pain";
        let source = EntitySource::Model(Box::new(FixedRecognizer(vec![span("Chest Pain", "DISEASE", 7, 17)])));
        let found = source.find(sentence, &tokenize(sentence));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Chest Pain");
        assert_eq!(found[0].label, "DISEASE");
        assert_eq!(found[0].span, Span::new(7, 17));
    }

    #[test]
    fn out_of_range_spans_dropped() {
        let sentence = "fever";
        let found = to_matches(sentence, vec![span("x", "DISEASE", 3, 40), span("y", "DISEASE", 4, 2)]);
        assert!(found.is_empty());
    }

    #[test]
    fn char_offsets_convert_to_bytes() {
        let sentence = "fièvre élevée";
        let found = to_matches(sentence, vec![span("élevée", "DISEASE", 7, 13)]);
        assert_eq!(found[0].span.slice(sentence), "élevée");
    }

    #[test]
    fn failing_recognizer_yields_nothing() {
        let source = EntitySource::Model(Box::new(FailingRecognizer));
        assert!(source.find("headache", &tokenize("headache")).is_empty());
        assert_eq!(source.describe(), "model(external)");
    }
}
