//! Sentence tokenizer shared by target matching, context scoping and
//! post-processing windows.
//!
//! Word tokens are alphanumeric runs (inner apostrophes kept, "patient's");
//! every other non-space character is its own token, so "headache." yields
//! `headache` and `.`.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::types::Span;

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+(?:['\u{2019}]\w+)*|[^\w\s]").expect("Invalid tokenizer regex")
});

/// Split `text` into token byte spans, in order.
pub fn tokenize(text: &str) -> Vec<Span> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| Span::new(m.start(), m.end()))
        .collect()
}

/// Indices of the tokens overlapping `span`. Empty when none do.
pub fn token_range(tokens: &[Span], span: &Span) -> Range<usize> {
    let start = tokens.partition_point(|t| t.end <= span.start);
    let end = tokens.partition_point(|t| t.start < span.end);
    if start >= end {
        return start..start;
    }
    start..end
}

/// Grow `span` to the boundaries of the tokens it touches.
pub fn expand_to_tokens(tokens: &[Span], span: &Span) -> Option<Span> {
    let range = token_range(tokens, span);
    if range.is_empty() {
        return None;
    }
    Some(Span::new(tokens[range.start].start, tokens[range.end - 1].end))
}

/// True when `span` starts at a token start and ends at a token end.
pub fn is_token_aligned(tokens: &[Span], span: &Span) -> bool {
    tokens.binary_search_by_key(&span.start, |t| t.start).is_ok()
        && tokens.binary_search_by_key(&span.end, |t| t.end).is_ok()
}

/// Byte span covered by a token index range, `None` when the range is empty.
pub fn tokens_to_span(tokens: &[Span], range: Range<usize>) -> Option<Span> {
    if range.is_empty() || range.end > tokens.len() {
        return None;
    }
    Some(Span::new(tokens[range.start].start, tokens[range.end - 1].end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words<'a>(text: &'a str, tokens: &[Span]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.slice(text)).collect()
    }

    #[test]
    fn punctuation_is_split_off() {
        let text = "no vomiting noted.";
        let tokens = tokenize(text);
        assert_eq!(words(text, &tokens), vec!["no", "vomiting", "noted", "."]);
    }

    #[test]
    fn slash_abbreviations_split_into_tokens() {
        let text = "h/o migraine?";
        let tokens = tokenize(text);
        assert_eq!(words(text, &tokens), vec!["h", "/", "o", "migraine", "?"]);
    }

    #[test]
    fn inner_apostrophe_stays_in_word() {
        let text = "patient's mother";
        assert_eq!(words(text, &tokenize(text)), vec!["patient's", "mother"]);
    }

    #[test]
    fn expand_partial_match_to_token() {
        let text = "persistent vomiting today";
        let tokens = tokenize(text);
        let start = text.find("vomit").unwrap();
        let span = expand_to_tokens(&tokens, &Span::new(start, start + 5)).unwrap();
        assert_eq!(span.slice(text), "vomiting");
    }

    #[test]
    fn alignment_rejects_partial_words() {
        let text = "i know";
        let tokens = tokenize(text);
        let start = text.find("no").unwrap();
        assert!(!is_token_aligned(&tokens, &Span::new(start, start + 2)));
        assert!(is_token_aligned(&tokens, &Span::new(2, 6)));
    }

    #[test]
    fn token_range_of_gap_is_empty() {
        let text = "a  b";
        let tokens = tokenize(text);
        assert!(token_range(&tokens, &Span::new(1, 3)).is_empty());
        assert_eq!(token_range(&tokens, &Span::new(0, 4)), 0..2);
    }
}
