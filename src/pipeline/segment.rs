//! Two-level segmentation of normalized note text.
//!
//! The export marks section boundaries with long runs of spaces (the
//! section delimiter). Each delimited block is a section candidate; inside a
//! candidate, shorter whitespace runs and newlines separate sentences.
//! Sentences keep their byte offsets, so concatenating them with the
//! separator text between them reproduces the normalized note exactly.

use std::ops::Range;

use regex::Regex;

use super::patterns;
use super::types::{SentenceUnit, Span};
use super::ConfigError;
use crate::pipeline_config::SegmenterConfig;

/// A delimiter-separated block of the note with at least one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCandidate {
    pub index: usize,
    /// Byte span from the first sentence start to the last sentence end.
    pub span: Span,
    pub sentences: Range<usize>,
}

/// Segmenter output for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segmentation {
    text: String,
    candidates: Vec<SectionCandidate>,
    sentences: Vec<SentenceUnit>,
}

impl Segmentation {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn candidates(&self) -> &[SectionCandidate] {
        &self.candidates
    }

    pub fn sentences(&self) -> &[SentenceUnit] {
        &self.sentences
    }

    pub fn into_sentences(self) -> Vec<SentenceUnit> {
        self.sentences
    }

    /// Text between consecutive sentences, plus the leading and trailing
    /// remainder. Always one element longer than the sentence list.
    pub fn separators(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.sentences.len() + 1);
        let mut pos = 0;
        for sentence in &self.sentences {
            out.push(&self.text[pos..sentence.span.start]);
            pos = sentence.span.end;
        }
        out.push(&self.text[pos..]);
        out
    }

    /// Rebuild the normalized text from sentences and separators.
    pub fn reassemble(&self) -> String {
        let separators = self.separators();
        let mut out = String::with_capacity(self.text.len());
        for (sentence, sep) in self.sentences.iter().zip(&separators) {
            out.push_str(sep);
            out.push_str(&sentence.text);
        }
        if let Some(last) = separators.last() {
            out.push_str(last);
        }
        out
    }
}

#[derive(Debug)]
pub struct Segmenter {
    section_delimiter: String,
    sentence_break: Regex,
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self, ConfigError> {
        if config.section_delimiter.is_empty() {
            return Err(ConfigError::InvalidSetting {
                field: "segmenter.section_delimiter",
                reason: "must not be empty".into(),
            });
        }
        if config.sentence_min_whitespace == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "segmenter.sentence_min_whitespace",
                reason: "must be at least 1".into(),
            });
        }
        let source = format!(r"\s{{{},}}|\n", config.sentence_min_whitespace);
        let sentence_break = patterns::compile("segmenter", 0, &source)?;
        Ok(Self {
            section_delimiter: config.section_delimiter.clone(),
            sentence_break,
        })
    }

    /// Split normalized text into section candidates and sentences.
    ///
    /// Blank candidates and blank sentences are dropped; sentence text is
    /// trimmed of surrounding whitespace.
    pub fn segment(&self, text: &str) -> Segmentation {
        let mut candidates = Vec::new();
        let mut sentences = Vec::new();

        for (block_start, block_end) in self.blocks(text) {
            let block = &text[block_start..block_end];
            if block.trim().is_empty() {
                continue;
            }
            let first = sentences.len();
            let candidate = candidates.len();
            let mut last = 0;
            for brk in self.sentence_break.find_iter(block) {
                push_sentence(text, block_start + last, block_start + brk.start(), candidate, &mut sentences);
                last = brk.end();
            }
            push_sentence(text, block_start + last, block_end, candidate, &mut sentences);

            if sentences.len() == first {
                continue;
            }
            let span = Span::new(sentences[first].span.start, sentences[sentences.len() - 1].span.end);
            candidates.push(SectionCandidate {
                index: candidate,
                span,
                sentences: first..sentences.len(),
            });
        }

        tracing::debug!(
            candidates = candidates.len(),
            sentences = sentences.len(),
            "Segmented note"
        );

        Segmentation {
            text: text.to_string(),
            candidates,
            sentences,
        }
    }

    /// Byte ranges of the text between section delimiters.
    fn blocks(&self, text: &str) -> Vec<(usize, usize)> {
        let mut blocks = Vec::new();
        let mut start = 0;
        for (pos, delim) in text.match_indices(self.section_delimiter.as_str()) {
            blocks.push((start, pos));
            start = pos + delim.len();
        }
        blocks.push((start, text.len()));
        blocks
    }
}

fn push_sentence(text: &str, start: usize, end: usize, candidate: usize, out: &mut Vec<SentenceUnit>) {
    let raw = &text[start..end];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let offset = start + (raw.len() - raw.trim_start().len());
    out.push(SentenceUnit {
        index: out.len(),
        candidate,
        span: Span::new(offset, offset + trimmed.len()),
        text: trimmed.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> Segmenter {
        Segmenter::new(&SegmenterConfig::default()).unwrap()
    }

    fn texts(seg: &Segmentation) -> Vec<&str> {
        seg.sentences().iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn splits_on_newline_and_double_space() {
        let seg = segmenter().segment("headache\nno vomiting  no fever");
        assert_eq!(texts(&seg), vec!["headache", "no vomiting", "no fever"]);
        assert_eq!(seg.candidates().len(), 1);
    }

    #[test]
    fn no_delimiter_yields_single_candidate() {
        let seg = segmenter().segment("patient presented with headache.");
        assert_eq!(seg.candidates().len(), 1);
        assert_eq!(seg.candidates()[0].sentences, 0..1);
    }

    #[test]
    fn section_delimiter_splits_candidates() {
        let text = format!("hpi: headache{}plan: discharge", " ".repeat(9));
        let seg = segmenter().segment(&text);
        assert_eq!(seg.candidates().len(), 2);
        assert_eq!(texts(&seg), vec!["hpi: headache", "plan: discharge"]);
        assert_eq!(seg.sentences()[1].candidate, 1);
    }

    #[test]
    fn blank_candidates_are_dropped() {
        let text = format!("a{d}{d}   {d}b", d = " ".repeat(9));
        let seg = segmenter().segment(&text);
        assert_eq!(seg.candidates().len(), 2);
        assert_eq!(seg.candidates()[1].index, 1);
    }

    #[test]
    fn sentence_spans_index_the_text() {
        let text = "  first line\n   second line  ";
        let seg = segmenter().segment(text);
        for sentence in seg.sentences() {
            assert_eq!(sentence.span.slice(text), sentence.text);
        }
    }

    #[test]
    fn reassembly_reproduces_text() {
        let text = format!(
            " [patient name] presented with headache.\nno vomiting  or fever{}review of systems: negative \n",
            " ".repeat(11)
        );
        let seg = segmenter().segment(&text);
        assert_eq!(seg.reassemble(), text);
        assert_eq!(seg.separators().len(), seg.sentences().len() + 1);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        let seg = segmenter().segment("");
        assert!(seg.sentences().is_empty());
        assert!(seg.candidates().is_empty());
        assert_eq!(seg.reassemble(), "");
    }

    #[test]
    fn sentence_indices_are_document_order() {
        let seg = segmenter().segment("a\nb\nc");
        let idx: Vec<_> = seg.sentences().iter().map(|s| s.index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn zero_whitespace_minimum_rejected() {
        let config = SegmenterConfig {
            sentence_min_whitespace: 0,
            ..SegmenterConfig::default()
        };
        assert!(Segmenter::new(&config).is_err());
    }
}
