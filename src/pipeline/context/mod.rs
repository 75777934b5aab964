//! Context classification (ConText algorithm).
//!
//! Cues are located per sentence on token boundaries, overlaps resolved
//! (longest wins), and each assertion cue gets a scope bounded by the
//! sentence, its token limit and the nearest terminating cue. An entity in
//! scope receives the cue as a modifier unless it overlaps the cue itself.
//! When several cues of one category reach the same entity, only the
//! closest is kept.
//!
//! Cues never cross sentence boundaries.

pub mod rules;
mod scope;
pub mod termset;

pub use rules::{builtin_rules, ContextRuleSpec};
pub use termset::{NegexSource, NegexTermset, TermsetPreset};

use std::ops::Range;

use rules::ContextRule;

use super::tokenize::{is_token_aligned, token_range, tokens_to_span};
use super::types::{resolve_overlaps, Assertions, Entity, Modifier, Span};
use super::ConfigError;
use crate::models::ModifierCategory;
use crate::pipeline_config::ContextConfig;

/// A cue occurrence in a sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// Index of the rule that matched.
    pub rule: usize,
    /// Sentence-relative byte span.
    pub span: Span,
    /// Token indices covered by the cue.
    pub tokens: Range<usize>,
}

#[derive(Debug)]
pub struct ContextClassifier {
    rules: Vec<ContextRule>,
    default_max_scope: Option<usize>,
}

impl ContextClassifier {
    pub fn new(specs: &[ContextRuleSpec], config: &ContextConfig) -> Result<Self, ConfigError> {
        if config.max_scope == Some(0) {
            return Err(ConfigError::InvalidSetting {
                field: "context.max_scope",
                reason: "must be at least 1 token when set".into(),
            });
        }
        let rules = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| ContextRule::compile(index, spec))
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self {
            rules,
            default_max_scope: config.max_scope,
        })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Token-aligned, non-overlapping cues in text order. Whitespace at
    /// either end of a match is not part of the cue.
    pub fn cues(&self, sentence: &str, tokens: &[Span]) -> Vec<Cue> {
        let mut found = Vec::new();
        for (rule, compiled) in self.rules.iter().enumerate() {
            for m in compiled.regex.find_iter(sentence) {
                let text = m.as_str();
                let start = m.start() + (text.len() - text.trim_start().len());
                let span = Span::new(start, m.start() + text.trim_end().len());
                if span.is_empty() {
                    continue;
                }
                if !is_token_aligned(tokens, &span) {
                    continue;
                }
                found.push(Cue {
                    rule,
                    span,
                    tokens: token_range(tokens, &span),
                });
            }
        }
        resolve_overlaps(found, |cue| (cue.span, cue.rule))
    }

    /// Attach modifiers to the entities of one sentence and derive their
    /// assertion flags. Every entity must belong to `sentence`.
    pub fn classify(&self, sentence: &str, tokens: &[Span], entities: &mut [Entity]) {
        let cues = self.cues(sentence, tokens);
        let scopes: Vec<Option<Range<usize>>> = (0..cues.len())
            .map(|i| {
                let rule = &self.rules[cues[i].rule];
                rule.direction
                    .is_assertion()
                    .then(|| scope::scope_tokens(i, &cues, &self.rules, tokens.len(), self.default_max_scope))
            })
            .collect();

        for entity in entities.iter_mut() {
            entity.modifiers = self.modifiers_for(entity, sentence, tokens, &cues, &scopes);
            entity.assertions = Assertions::from_modifiers(&entity.modifiers);
        }
    }

    fn modifiers_for(
        &self,
        entity: &Entity,
        sentence: &str,
        tokens: &[Span],
        cues: &[Cue],
        scopes: &[Option<Range<usize>>],
    ) -> Vec<Modifier> {
        let entity_tokens = token_range(tokens, &entity.span);
        if entity_tokens.is_empty() {
            return Vec::new();
        }

        // (category, distance, rule, cue index)
        let mut best: Vec<(ModifierCategory, usize, usize, usize)> = Vec::new();
        for (i, cue) in cues.iter().enumerate() {
            let Some(scope) = &scopes[i] else { continue };
            let rule = &self.rules[cue.rule];
            let in_scope = scope.start < entity_tokens.end && entity_tokens.start < scope.end;
            if !in_scope || cue.span.overlaps(&entity.span) || !rule.allows(&entity.label) {
                continue;
            }
            let candidate = (rule.category, cue.span.distance(&entity.span), cue.rule, i);
            match best.iter_mut().find(|b| b.0 == rule.category) {
                Some(current) => {
                    if (candidate.1, candidate.2, cue.span.start) < (current.1, current.2, cues[current.3].span.start) {
                        *current = candidate;
                    }
                }
                None => best.push(candidate),
            }
        }

        let mut modifiers: Vec<Modifier> = best
            .into_iter()
            .filter_map(|(category, _, rule, i)| {
                let cue = &cues[i];
                let scope = scopes[i].clone()?;
                let direction = self.rules[rule].direction;
                let scope_span = tokens_to_span(tokens, scope).unwrap_or_else(|| {
                    let at = if direction.scans_forward() { cue.span.end } else { cue.span.start };
                    Span::new(at, at)
                });
                Some(Modifier {
                    text: cue.span.slice(sentence).to_string(),
                    category,
                    direction,
                    span: cue.span,
                    scope: scope_span,
                    rule,
                })
            })
            .collect();
        modifiers.sort_by_key(|m| m.span.start);
        modifiers
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
