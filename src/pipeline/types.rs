use std::cmp::Reverse;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::models::{AssertionFlag, Direction, ModifierCategory};

/// Section category used before any section-start rule matches.
pub const UNSPECIFIED_SECTION: &str = "unspecified";

// ═══════════════════════════════════════════════════════════
// Spans
// ═══════════════════════════════════════════════════════════

/// Half-open byte span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub const fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub const fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Gap in bytes between two non-overlapping spans, zero if they touch
    /// or overlap.
    pub fn distance(&self, other: &Span) -> usize {
        if self.end <= other.start {
            other.start - self.end
        } else if other.end <= self.start {
            self.start - other.end
        } else {
            0
        }
    }

    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start..self.end).unwrap_or("")
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Drop overlapping matches. The longest span wins, then the lower rule
/// index, then the earlier start. Survivors come back in text order.
pub fn resolve_overlaps<T>(mut items: Vec<T>, key: impl Fn(&T) -> (Span, usize)) -> Vec<T> {
    items.sort_by_key(|item| {
        let (span, rule) = key(item);
        (Reverse(span.len()), rule, span.start)
    });
    let mut kept: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        let (span, _) = key(&item);
        if kept.iter().all(|k| !key(k).0.overlaps(&span)) {
            kept.push(item);
        }
    }
    kept.sort_by_key(|item| key(item).0.start);
    kept
}

// ═══════════════════════════════════════════════════════════
// Document structure
// ═══════════════════════════════════════════════════════════

/// A sentence-like unit produced by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceUnit {
    /// Position in document order.
    pub index: usize,
    /// Index of the section candidate (long-whitespace block) holding it.
    pub candidate: usize,
    /// Byte span within the normalized note text.
    pub span: Span,
    pub text: String,
}

/// A contiguous run of sentences sharing one section category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub index: usize,
    pub category: String,
    /// Matched header text, `None` for the unspecified leading section.
    pub title: Option<String>,
    /// Byte span within the normalized note text.
    pub span: Span,
    /// Indices of the sentences this section owns.
    pub sentences: Range<usize>,
}

impl Section {
    pub fn is_unspecified(&self) -> bool {
        self.title.is_none() && self.category == UNSPECIFIED_SECTION
    }
}

// ═══════════════════════════════════════════════════════════
// Entities and modifiers
// ═══════════════════════════════════════════════════════════

/// A context cue attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    /// Cue text as it appears in the sentence.
    pub text: String,
    pub category: ModifierCategory,
    pub direction: Direction,
    /// Sentence-relative byte span of the cue.
    pub span: Span,
    /// Sentence-relative byte span of the cue's scope after termination.
    pub scope: Span,
    /// Index of the context rule that produced the cue.
    pub rule: usize,
}

/// Resolved assertion flags. Every entity carries exactly one value for
/// each flag, `false` unless a modifier or a post-processing rule sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Assertions {
    pub is_negated: bool,
    pub is_uncertain: bool,
    pub is_historical: bool,
    pub is_hypothetical: bool,
    pub is_family: bool,
}

impl Assertions {
    pub fn from_modifiers(modifiers: &[Modifier]) -> Self {
        let mut assertions = Self::default();
        for flag in modifiers.iter().filter_map(|m| m.category.flag()) {
            assertions.set(flag, true);
        }
        assertions
    }

    pub fn get(&self, flag: AssertionFlag) -> bool {
        match flag {
            AssertionFlag::Negated => self.is_negated,
            AssertionFlag::Uncertain => self.is_uncertain,
            AssertionFlag::Historical => self.is_historical,
            AssertionFlag::Hypothetical => self.is_hypothetical,
            AssertionFlag::Family => self.is_family,
        }
    }

    pub fn set(&mut self, flag: AssertionFlag, value: bool) {
        match flag {
            AssertionFlag::Negated => self.is_negated = value,
            AssertionFlag::Uncertain => self.is_uncertain = value,
            AssertionFlag::Historical => self.is_historical = value,
            AssertionFlag::Hypothetical => self.is_hypothetical = value,
            AssertionFlag::Family => self.is_family = value,
        }
    }
}

/// A symptom/problem mention located inside one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
    /// Sentence-relative byte span.
    pub span: Span,
    /// Owning sentence index.
    pub sentence: usize,
    /// Owning section index.
    pub section: usize,
    pub modifiers: Vec<Modifier>,
    pub assertions: Assertions,
}

impl Entity {
    pub fn new(text: impl Into<String>, label: impl Into<String>, span: Span, sentence: usize, section: usize) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            span,
            sentence,
            section,
            modifiers: Vec::new(),
            assertions: Assertions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifier(category: ModifierCategory) -> Modifier {
        Modifier {
            text: "cue".into(),
            category,
            direction: Direction::Forward,
            span: Span::new(0, 3),
            scope: Span::new(3, 10),
            rule: 0,
        }
    }

    #[test]
    fn span_overlap_is_half_open() {
        let a = Span::new(0, 5);
        assert!(a.overlaps(&Span::new(4, 6)));
        assert!(!a.overlaps(&Span::new(5, 6)));
        assert!(a.contains(&Span::new(1, 5)));
    }

    #[test]
    fn span_distance_either_side() {
        let cue = Span::new(0, 2);
        let ent = Span::new(3, 11);
        assert_eq!(cue.distance(&ent), 1);
        assert_eq!(ent.distance(&cue), 1);
        assert_eq!(ent.distance(&Span::new(5, 7)), 0);
    }

    #[test]
    fn overlap_resolution_prefers_longest_then_rule_order() {
        // (span, rule)
        let items = vec![
            (Span::new(0, 2), 0),
            (Span::new(0, 11), 3),
            (Span::new(20, 25), 2),
            (Span::new(20, 25), 1),
        ];
        let kept = resolve_overlaps(items, |&(span, rule)| (span, rule));
        assert_eq!(kept, vec![(Span::new(0, 11), 3), (Span::new(20, 25), 1)]);
    }

    #[test]
    fn assertions_default_to_false() {
        let a = Assertions::default();
        assert!(!a.is_negated && !a.is_uncertain && !a.is_historical);
        assert!(!a.is_hypothetical && !a.is_family);
    }

    #[test]
    fn assertions_follow_modifier_categories() {
        let mods = vec![
            modifier(ModifierCategory::NegatedExistence),
            modifier(ModifierCategory::Historical),
            modifier(ModifierCategory::Terminate),
        ];
        let a = Assertions::from_modifiers(&mods);
        assert!(a.is_negated);
        assert!(a.is_historical);
        assert!(!a.is_uncertain);
    }

    #[test]
    fn assertion_set_overrides() {
        let mut a = Assertions::from_modifiers(&[modifier(ModifierCategory::PossibleExistence)]);
        assert!(a.get(AssertionFlag::Uncertain));
        a.set(AssertionFlag::Uncertain, false);
        assert!(!a.is_uncertain);
    }
}
