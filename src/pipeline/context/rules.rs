use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::{Direction, ModifierCategory};
use crate::pipeline::patterns;
use crate::pipeline::ConfigError;

const TABLE: &str = "context";

/// One context cue.
///
/// The literal is matched as a case-insensitive phrase unless `pattern` is
/// given. Matches must start and end on token boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextRuleSpec {
    pub literal: String,
    pub category: ModifierCategory,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Scope limit in tokens on each scanned side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_scope: Option<usize>,
    /// Entity labels this cue may modify. `None` allows all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_types: Option<Vec<String>>,
    /// Cue categories that end this cue's scope, in addition to
    /// terminate cues.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terminated_by: Vec<ModifierCategory>,
}

impl ContextRuleSpec {
    pub fn new(literal: &str, category: ModifierCategory, direction: Direction) -> Self {
        Self {
            literal: literal.into(),
            category,
            direction,
            pattern: None,
            max_scope: None,
            allowed_types: None,
            terminated_by: Vec::new(),
        }
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_max_scope(mut self, tokens: usize) -> Self {
        self.max_scope = Some(tokens);
        self
    }

    pub fn with_allowed_types(mut self, labels: &[&str]) -> Self {
        self.allowed_types = Some(labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn with_terminated_by(mut self, categories: &[ModifierCategory]) -> Self {
        self.terminated_by = categories.to_vec();
        self
    }
}

// ═══════════════════════════════════════════════════════════
// Default English clinical table
// ═══════════════════════════════════════════════════════════

fn cues(out: &mut Vec<ContextRuleSpec>, category: ModifierCategory, direction: Direction, literals: &[&str]) {
    out.extend(literals.iter().map(|l| ContextRuleSpec::new(l, category, direction)));
}

pub fn builtin_rules() -> Vec<ContextRuleSpec> {
    use Direction as D;
    use ModifierCategory as C;

    let mut rules = Vec::new();
    cues(
        &mut rules,
        C::NegatedExistence,
        D::Forward,
        &[
            "no", "not", "denies", "denied", "deny", "denying", "without", "negative for", "free of",
            "no evidence of", "no signs of", "no sign of", "absence of", "never had", "no complaints of",
            "no history of",
        ],
    );
    cues(
        &mut rules,
        C::NegatedExistence,
        D::Backward,
        &["absent", "not present", "is negative", "was negative", "were negative", "resolved"],
    );
    cues(&mut rules, C::NegatedExistence, D::Bidirectional, &["ruled out"]);
    cues(
        &mut rules,
        C::PossibleExistence,
        D::Forward,
        &[
            "possible", "possibly", "probable", "probably", "likely", "suspected", "suspicious for",
            "concern for", "concerning for", "question of", "questionable", "r/o", "rule out", "may have",
            "might", "could be", "cannot exclude", "cannot rule out", "differential includes",
        ],
    );
    cues(&mut rules, C::PossibleExistence, D::Backward, &["is possible", "is suspected", "unlikely"]);
    cues(&mut rules, C::PossibleExistence, D::Bidirectional, &["versus", "vs"]);
    cues(
        &mut rules,
        C::Historical,
        D::Forward,
        &["history of", "hx of", "h/o", "previous", "previously", "in the past"],
    );
    cues(
        &mut rules,
        C::Hypothetical,
        D::Forward,
        &["if", "return if", "return for", "should", "in case of", "come back if", "watch for", "monitor for"],
    );
    cues(&mut rules, C::Family, D::Forward, &["family history of", "family history", "fhx", "fh of"]);
    cues(
        &mut rules,
        C::Family,
        D::Bidirectional,
        &["mother", "father", "mom", "dad", "sister", "brother", "sibling", "grandmother", "grandfather", "aunt", "uncle"],
    );
    cues(
        &mut rules,
        C::Terminate,
        D::Terminate,
        &[
            "but", "however", "although", "though", "except", "aside from", "apart from", "yet", "which",
            "nevertheless", "presents with", "presented with", "complains of", ";",
        ],
    );
    // A full stop or exclamation mark followed by more text ends the clause.
    rules.push(ContextRuleSpec::new(".", C::Terminate, D::Terminate).with_pattern(r"[.!]\s"));
    cues(
        &mut rules,
        C::Pseudo,
        D::Pseudo,
        &[
            "no increase", "no change", "no significant change", "no definite change", "not only",
            "not necessarily", "not certain if", "not ruled out", "not been ruled out", "gram negative",
            "without difficulty", "not cause", "no further workup",
        ],
    );
    rules
}

// ═══════════════════════════════════════════════════════════
// Compiled rules
// ═══════════════════════════════════════════════════════════

#[derive(Debug)]
pub(super) struct ContextRule {
    pub category: ModifierCategory,
    pub direction: Direction,
    pub regex: Regex,
    pub max_scope: Option<usize>,
    pub allowed_types: Option<Vec<String>>,
    pub terminated_by: Vec<ModifierCategory>,
}

impl ContextRule {
    pub(super) fn compile(index: usize, spec: &ContextRuleSpec) -> Result<Self, ConfigError> {
        if spec.direction.is_assertion() && spec.category.flag().is_none() {
            return Err(ConfigError::InvalidRule {
                table: TABLE,
                index,
                reason: format!("{} cues cannot scan {}", spec.category, spec.direction),
            });
        }
        if spec.max_scope == Some(0) {
            return Err(ConfigError::InvalidRule {
                table: TABLE,
                index,
                reason: "max_scope must be at least 1 token".into(),
            });
        }
        let regex = patterns::compile_rule(TABLE, index, &spec.literal, spec.pattern.as_deref())?;
        patterns::reject_zero_width(TABLE, index, &regex)?;
        patterns::reject_delimiter_span(TABLE, index, &regex)?;
        Ok(Self {
            category: spec.category,
            direction: spec.direction,
            regex,
            max_scope: spec.max_scope,
            allowed_types: spec.allowed_types.clone(),
            terminated_by: spec.terminated_by.clone(),
        })
    }

    pub(super) fn allows(&self, label: &str) -> bool {
        self.allowed_types
            .as_ref()
            .map_or(true, |types| types.iter().any(|t| t.eq_ignore_ascii_case(label)))
    }

    /// True when a cue of `other` ends this rule's scope.
    pub(super) fn is_terminated_by(&self, other: &ContextRule) -> bool {
        other.direction == Direction::Terminate || self.terminated_by.contains(&other.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_compile() {
        for (i, spec) in builtin_rules().iter().enumerate() {
            assert!(ContextRule::compile(i, spec).is_ok(), "rule {i}: {}", spec.literal);
        }
    }

    #[test]
    fn builtin_covers_every_category() {
        let rules = builtin_rules();
        for cat in [
            ModifierCategory::NegatedExistence,
            ModifierCategory::PossibleExistence,
            ModifierCategory::Historical,
            ModifierCategory::Hypothetical,
            ModifierCategory::Family,
            ModifierCategory::Terminate,
            ModifierCategory::Pseudo,
        ] {
            assert!(rules.iter().any(|r| r.category == cat), "{cat}");
        }
    }

    #[test]
    fn terminate_category_cannot_scan_forward() {
        let spec = ContextRuleSpec::new("but", ModifierCategory::Terminate, Direction::Forward);
        let err = ContextRule::compile(4, &spec).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { index: 4, .. }));
    }

    #[test]
    fn zero_max_scope_rejected() {
        let spec = ContextRuleSpec::new("no", ModifierCategory::NegatedExistence, Direction::Forward).with_max_scope(0);
        assert!(ContextRule::compile(0, &spec).is_err());
    }

    #[test]
    fn whitespace_run_pattern_rejected() {
        let spec = ContextRuleSpec::new("no", ModifierCategory::NegatedExistence, Direction::Forward)
            .with_pattern(r"no\s+");
        assert!(matches!(
            ContextRule::compile(0, &spec).unwrap_err(),
            ConfigError::SpansSentenceDelimiter { .. }
        ));
    }

    #[test]
    fn allowed_types_filter_labels() {
        let spec = ContextRuleSpec::new("no", ModifierCategory::NegatedExistence, Direction::Forward)
            .with_allowed_types(&["DISEASE"]);
        let rule = ContextRule::compile(0, &spec).unwrap();
        assert!(rule.allows("disease"));
        assert!(!rule.allows("PROBLEM"));
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: ContextRuleSpec = serde_json::from_str(
            r#"{"literal": "denies", "category": "NEGATED_EXISTENCE", "direction": "FORWARD"}"#,
        )
        .unwrap();
        assert_eq!(spec.max_scope, None);
        assert!(spec.terminated_by.is_empty());
    }
}
