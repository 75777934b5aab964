//! Entity post-processing.
//!
//! Ordered condition → action rules run after context classification.
//! Each rule sees the output of the previous one, so a removal by an early
//! rule hides the entity from later rules.

pub mod rules;

pub use rules::{builtin_rules, Action, Condition, PostprocessRuleSpec, WindowSide};

use super::tokenize::{token_range, tokens_to_span};
use super::types::{Entity, SentenceUnit, Span};
use super::ConfigError;

/// Sentences of a note with their tokens, indexed alike.
#[derive(Debug, Clone, Copy)]
pub struct SentenceView<'a> {
    pub sentences: &'a [SentenceUnit],
    pub tokens: &'a [Vec<Span>],
}

#[derive(Debug)]
pub struct Postprocessor {
    rules: Vec<PostprocessRuleSpec>,
}

impl Postprocessor {
    pub fn new(specs: &[PostprocessRuleSpec]) -> Result<Self, ConfigError> {
        for (index, spec) in specs.iter().enumerate() {
            spec.condition.validate(index)?;
        }
        Ok(Self { rules: specs.to_vec() })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn apply(&self, mut entities: Vec<Entity>, view: SentenceView<'_>) -> Vec<Entity> {
        for rule in &self.rules {
            let before = entities.len();
            entities.retain_mut(|entity| {
                if !matches(&rule.condition, entity, view) {
                    return true;
                }
                match &rule.action {
                    Action::Remove => false,
                    Action::SetFlag { flag, value } => {
                        entity.assertions.set(*flag, *value);
                        true
                    }
                }
            });
            let removed = before - entities.len();
            if removed > 0 {
                tracing::debug!(rule = %rule.description, removed, "Post-processing removed entities");
            }
        }
        entities
    }
}

fn matches(condition: &Condition, entity: &Entity, view: SentenceView<'_>) -> bool {
    match condition {
        Condition::LabelIn { labels } => labels.iter().any(|l| l.eq_ignore_ascii_case(&entity.label)),
        Condition::LabelNotIn { labels } => !labels.iter().any(|l| l.eq_ignore_ascii_case(&entity.label)),
        Condition::TextEquals { text } => entity.text.to_lowercase() == text.to_lowercase(),
        Condition::TextContains { text } => entity.text.to_lowercase().contains(&text.to_lowercase()),
        Condition::WindowContains { literal, tokens, side } => {
            token_window(entity, view, *tokens, *side).is_some_and(|w| contains_ci(w, literal))
        }
        Condition::SentenceWindowContains {
            literal,
            sentences,
            side,
        } => {
            let i = entity.sentence;
            let lo = if side.left() { i.saturating_sub(*sentences) } else { i };
            let hi = if side.right() { i.saturating_add(*sentences) } else { i };
            view.sentences
                .iter()
                .skip(lo)
                .take((hi - lo).saturating_add(1))
                .any(|s| contains_ci(&s.text, literal))
        }
        Condition::FlagIs { flag, value } => entity.assertions.get(*flag) == *value,
        Condition::All { conditions } => conditions.iter().all(|c| matches(c, entity, view)),
        Condition::Any { conditions } => conditions.iter().any(|c| matches(c, entity, view)),
    }
}

/// Sentence text covering the entity plus `n` tokens on the chosen sides.
fn token_window<'a>(entity: &Entity, view: SentenceView<'a>, n: usize, side: WindowSide) -> Option<&'a str> {
    let sentence = view.sentences.get(entity.sentence)?;
    let tokens = view.tokens.get(entity.sentence)?;
    let own = token_range(tokens, &entity.span);
    if own.is_empty() {
        return None;
    }
    let start = if side.left() { own.start.saturating_sub(n) } else { own.start };
    let end = if side.right() { own.end.saturating_add(n).min(tokens.len()) } else { own.end };
    let span = tokens_to_span(tokens, start..end)?;
    Some(span.slice(&sentence.text))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
