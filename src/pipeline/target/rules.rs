use regex::Regex;
use serde::{Deserialize, Serialize};

use super::TargetMatch;
use crate::pipeline::patterns;
use crate::pipeline::tokenize::expand_to_tokens;
use crate::pipeline::types::{resolve_overlaps, Span};
use crate::pipeline::ConfigError;

const TABLE: &str = "target";

/// A target phrase. Without a pattern the literal is matched as a phrase;
/// with one, the regex is matched. Either way the match is grown to whole
/// tokens, so "vomit" captures "vomiting".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRuleSpec {
    pub literal: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl TargetRuleSpec {
    pub fn literal(literal: &str, category: &str) -> Self {
        Self {
            literal: literal.into(),
            category: category.into(),
            pattern: None,
        }
    }

    pub fn pattern(literal: &str, category: &str, pattern: &str) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::literal(literal, category)
        }
    }
}

/// Default red-flag targets.
pub fn builtin_rules() -> Vec<TargetRuleSpec> {
    vec![
        TargetRuleSpec::pattern("vomit", "PROBLEM", "vomit"),
        TargetRuleSpec::pattern("headache", "PROBLEM", "headache|migraine"),
    ]
}

#[derive(Debug)]
struct TargetRule {
    category: String,
    regex: Regex,
}

#[derive(Debug)]
pub struct TargetMatcher {
    rules: Vec<TargetRule>,
}

impl TargetMatcher {
    pub fn new(specs: &[TargetRuleSpec]) -> Result<Self, ConfigError> {
        let rules = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                if spec.category.trim().is_empty() {
                    return Err(ConfigError::InvalidRule {
                        table: TABLE,
                        index,
                        reason: "empty category".into(),
                    });
                }
                let regex = patterns::compile_rule(TABLE, index, &spec.literal, spec.pattern.as_deref())?;
                patterns::reject_zero_width(TABLE, index, &regex)?;
                Ok(TargetRule {
                    category: spec.category.clone(),
                    regex,
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

    /// Non-overlapping, token-aligned matches in text order.
    pub fn find(&self, sentence: &str, tokens: &[Span]) -> Vec<TargetMatch> {
        let mut found: Vec<(TargetMatch, usize)> = Vec::new();
        for (index, rule) in self.rules.iter().enumerate() {
            for m in rule.regex.find_iter(sentence) {
                let Some(span) = expand_to_tokens(tokens, &Span::new(m.start(), m.end())) else {
                    continue;
                };
                found.push((
                    TargetMatch {
                        text: span.slice(sentence).to_string(),
                        label: rule.category.clone(),
                        span,
                    },
                    index,
                ));
            }
        }
        resolve_overlaps(found, |(m, index)| (m.span, *index))
            .into_iter()
            .map(|(m, _)| m)
            .collect()
    }
}
