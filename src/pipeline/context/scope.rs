//! Cue scope computation, in token indices within one sentence.

use std::ops::Range;

use super::rules::ContextRule;
use super::Cue;

/// Token range a cue's scope covers after limits and termination.
///
/// Forward scope runs from the cue end to the sentence end, backward scope
/// from the sentence start to the cue; bidirectional scope covers both
/// sides and the cue itself. A `max_scope` limit applies per side. Scope
/// stops at the nearest terminating cue on each side.
pub(super) fn scope_tokens(
    index: usize,
    cues: &[Cue],
    rules: &[ContextRule],
    token_count: usize,
    default_max: Option<usize>,
) -> Range<usize> {
    let cue = &cues[index];
    let rule = &rules[cue.rule];
    let max = rule.max_scope.or(default_max);

    let mut right = match max {
        Some(n) => cue.tokens.end.saturating_add(n).min(token_count),
        None => token_count,
    };
    let mut left = match max {
        Some(n) => cue.tokens.start.saturating_sub(n),
        None => 0,
    };

    for (j, other) in cues.iter().enumerate() {
        if j == index || !rule.is_terminated_by(&rules[other.rule]) {
            continue;
        }
        if other.tokens.start >= cue.tokens.end {
            right = right.min(other.tokens.start);
        } else if other.tokens.end <= cue.tokens.start {
            left = left.max(other.tokens.end);
        }
    }

    let direction = rule.direction;
    let start = if direction.scans_backward() { left } else { cue.tokens.end };
    let end = if direction.scans_forward() { right } else { cue.tokens.start };
    if direction.scans_forward() && direction.scans_backward() {
        return left..right;
    }
    start..end.max(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, ModifierCategory};
    use crate::pipeline::context::rules::ContextRuleSpec;
    use crate::pipeline::types::Span;

    fn rule(category: ModifierCategory, direction: Direction, max: Option<usize>) -> ContextRule {
        let mut spec = ContextRuleSpec::new("x", category, direction);
        spec.max_scope = max;
        ContextRule::compile(0, &spec).unwrap()
    }

    fn cue(rule: usize, tokens: Range<usize>) -> Cue {
        Cue {
            rule,
            span: Span::default(),
            tokens,
        }
    }

    #[test]
    fn forward_scope_runs_to_sentence_end() {
        let rules = vec![rule(ModifierCategory::NegatedExistence, Direction::Forward, None)];
        let cues = vec![cue(0, 1..2)];
        assert_eq!(scope_tokens(0, &cues, &rules, 6, None), 2..6);
    }

    #[test]
    fn backward_scope_runs_from_sentence_start() {
        let rules = vec![rule(ModifierCategory::NegatedExistence, Direction::Backward, None)];
        let cues = vec![cue(0, 3..4)];
        assert_eq!(scope_tokens(0, &cues, &rules, 6, None), 0..3);
    }

    #[test]
    fn bidirectional_scope_covers_cue() {
        let rules = vec![rule(ModifierCategory::Family, Direction::Bidirectional, Some(1))];
        let cues = vec![cue(0, 3..4)];
        assert_eq!(scope_tokens(0, &cues, &rules, 8, None), 2..5);
    }

    #[test]
    fn terminate_cue_truncates_forward_scope() {
        let rules = vec![
            rule(ModifierCategory::NegatedExistence, Direction::Forward, None),
            rule(ModifierCategory::Terminate, Direction::Terminate, None),
        ];
        // no fever but vomiting
        let cues = vec![cue(0, 0..1), cue(1, 2..3)];
        assert_eq!(scope_tokens(0, &cues, &rules, 4, None), 1..2);
    }

    #[test]
    fn default_max_applies_without_rule_limit() {
        let rules = vec![rule(ModifierCategory::NegatedExistence, Direction::Forward, None)];
        let cues = vec![cue(0, 0..1)];
        assert_eq!(scope_tokens(0, &cues, &rules, 10, Some(3)), 1..4);
    }

    #[test]
    fn huge_max_scope_clamps_to_sentence() {
        let rules = vec![rule(ModifierCategory::NegatedExistence, Direction::Forward, Some(usize::MAX))];
        let cues = vec![cue(0, 1..2)];
        assert_eq!(scope_tokens(0, &cues, &rules, 5, None), 2..5);
        assert_eq!(scope_tokens(0, &cues, &rules, 5, Some(usize::MAX)), 2..5);
    }

    #[test]
    fn cue_at_sentence_end_has_empty_forward_scope() {
        let rules = vec![rule(ModifierCategory::NegatedExistence, Direction::Forward, None)];
        let cues = vec![cue(0, 3..4)];
        assert!(scope_tokens(0, &cues, &rules, 4, None).is_empty());
    }
}
