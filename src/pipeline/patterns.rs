//! Regex compilation and load-time checks shared by the rule tables.

use regex::Regex;

use super::ConfigError;

/// Probes for matches that consume nothing.
const ZERO_WIDTH_PROBES: &[&str] = &["", " a ", "a.b", "no  fever"];

/// Probes containing sentence delimiters.
const DELIMITER_PROBES: &[&str] = &["a  b", "a\nb", " \n ", "   ", "no  fever"];

/// Case-insensitive regex source for a literal phrase.
pub(crate) fn literal_source(literal: &str) -> String {
    format!("(?i){}", regex::escape(literal))
}

pub(crate) fn compile(table: &'static str, index: usize, source: &str) -> Result<Regex, ConfigError> {
    Regex::new(source).map_err(|source| ConfigError::InvalidPattern { table, index, source })
}

/// Compile a rule's matcher: the pattern when present, otherwise the
/// literal. Both match case-insensitively.
pub(crate) fn compile_rule(
    table: &'static str,
    index: usize,
    literal: &str,
    pattern: Option<&str>,
) -> Result<Regex, ConfigError> {
    match pattern {
        Some(p) if !p.is_empty() => compile(table, index, &format!("(?i){p}")),
        _ if literal.trim().is_empty() => Err(ConfigError::InvalidRule {
            table,
            index,
            reason: "literal and pattern are both empty".into(),
        }),
        _ => compile(table, index, &literal_source(literal)),
    }
}

/// Reject patterns that can produce empty matches.
pub(crate) fn reject_zero_width(table: &'static str, index: usize, regex: &Regex) -> Result<(), ConfigError> {
    let zero_width = ZERO_WIDTH_PROBES
        .iter()
        .any(|probe| regex.find_iter(probe).any(|m| m.is_empty()));
    if zero_width {
        return Err(ConfigError::ZeroWidthPattern {
            table,
            index,
            pattern: regex.as_str().to_string(),
        });
    }
    Ok(())
}

/// Reject patterns able to match across a sentence delimiter (a newline or
/// a run of two or more whitespace characters).
pub(crate) fn reject_delimiter_span(table: &'static str, index: usize, regex: &Regex) -> Result<(), ConfigError> {
    let spans = DELIMITER_PROBES.iter().any(|probe| {
        regex
            .find_iter(probe)
            .any(|m| m.as_str().contains('\n') || m.as_str().contains("  "))
    });
    if spans {
        return Err(ConfigError::SpansSentenceDelimiter {
            table,
            index,
            pattern: regex.as_str().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_is_escaped_and_case_insensitive() {
        let re = compile_rule("context", 0, "r/o", None).unwrap();
        assert!(re.is_match("R/O pneumonia"));
        let re = compile_rule("context", 0, "c.diff", None).unwrap();
        assert!(!re.is_match("cxdiff"));
    }

    #[test]
    fn pattern_takes_precedence_over_literal() {
        let re = compile_rule("target", 0, "headache", Some("headache|migraine")).unwrap();
        assert!(re.is_match("Migraine"));
    }

    #[test]
    fn empty_rule_rejected() {
        let err = compile_rule("target", 3, " ", None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { index: 3, .. }));
    }

    #[test]
    fn bad_regex_reports_index() {
        let err = compile_rule("section", 7, "x", Some("(unclosed")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { index: 7, .. }));
    }

    #[test]
    fn zero_width_patterns_rejected() {
        for source in ["a*", r"\b", "(?:no)?"] {
            let re = Regex::new(source).unwrap();
            assert!(reject_zero_width("context", 0, &re).is_err(), "{source}");
        }
        let re = Regex::new(r"\bno\b").unwrap();
        assert!(reject_zero_width("context", 0, &re).is_ok());
    }

    #[test]
    fn delimiter_spanning_patterns_rejected() {
        for source in [r"\s+", r"no\s+fever", ".*"] {
            let re = Regex::new(source).unwrap();
            assert!(reject_delimiter_span("context", 0, &re).is_err(), "{source}");
        }
        let re = Regex::new(r"negative\sfor").unwrap();
        assert!(reject_delimiter_span("context", 0, &re).is_ok());
    }
}
