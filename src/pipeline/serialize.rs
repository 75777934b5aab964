//! Flat entity records and the substring query over them.
//!
//! One record per surviving entity, carrying its modifiers, the five
//! assertion flags, the surrounding sentences and its section. Offsets are
//! character offsets relative to the entity's sentence.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{Entity, Modifier, Section, SentenceUnit, Span};
use crate::offset::byte_span_to_chars;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierRecord {
    pub modifier_text: String,
    pub modifier_category: String,
    pub modifier_direction: String,
    pub modifier_start_char: usize,
    pub modifier_end_char: usize,
    pub modifier_scope_start_char: usize,
    pub modifier_scope_end_char: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub entity_text: String,
    pub entity_label: String,
    pub start_char: usize,
    pub end_char: usize,
    pub modifiers: Vec<ModifierRecord>,
    pub is_negated: bool,
    pub is_uncertain: bool,
    pub is_historical: bool,
    pub is_hypothetical: bool,
    pub is_family: bool,
    pub current_sentence_extracted: String,
    /// `None` at the start of the note.
    pub previous_sentence_extracted: Option<String>,
    /// `None` at the end of the note.
    pub next_sentence_extracted: Option<String>,
    pub section_category: String,
    pub section_title: Option<String>,
}

/// Annotated output for one note, as written by batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteResult {
    pub csn: String,
    pub date: Option<NaiveDate>,
    /// Normalized note text.
    pub text: String,
    pub entities: Vec<EntityRecord>,
}

fn char_span(text: &str, span: Span) -> (usize, usize) {
    byte_span_to_chars(text, span.start, span.end)
}

fn modifier_record(sentence: &str, m: &Modifier) -> ModifierRecord {
    let (start, end) = char_span(sentence, m.span);
    let (scope_start, scope_end) = char_span(sentence, m.scope);
    ModifierRecord {
        modifier_text: m.text.clone(),
        modifier_category: m.category.as_str().to_string(),
        modifier_direction: m.direction.as_str().to_string(),
        modifier_start_char: start,
        modifier_end_char: end,
        modifier_scope_start_char: scope_start,
        modifier_scope_end_char: scope_end,
    }
}

/// Flatten entities into records. Entities whose sentence or section index
/// is out of range are skipped.
pub fn to_records(entities: &[Entity], sentences: &[SentenceUnit], sections: &[Section]) -> Vec<EntityRecord> {
    entities
        .iter()
        .filter_map(|entity| {
            let sentence = sentences.get(entity.sentence)?;
            let section = sections.get(entity.section)?;
            let (start_char, end_char) = char_span(&sentence.text, entity.span);
            let previous = entity
                .sentence
                .checked_sub(1)
                .and_then(|i| sentences.get(i))
                .map(|s| s.text.clone());
            let next = sentences.get(entity.sentence + 1).map(|s| s.text.clone());
            let a = entity.assertions;
            Some(EntityRecord {
                entity_text: entity.text.clone(),
                entity_label: entity.label.clone(),
                start_char,
                end_char,
                modifiers: entity
                    .modifiers
                    .iter()
                    .map(|m| modifier_record(&sentence.text, m))
                    .collect(),
                is_negated: a.is_negated,
                is_uncertain: a.is_uncertain,
                is_historical: a.is_historical,
                is_hypothetical: a.is_hypothetical,
                is_family: a.is_family,
                current_sentence_extracted: sentence.text.clone(),
                previous_sentence_extracted: previous,
                next_sentence_extracted: next,
                section_category: section.category.clone(),
                section_title: section.title.clone(),
            })
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Query
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryCase {
    #[default]
    Sensitive,
    Insensitive,
}

/// Records whose entity text contains `term`, case-sensitively, in input
/// order. An empty term matches every record.
pub fn query<'a>(term: &str, records: &'a [EntityRecord]) -> Vec<&'a EntityRecord> {
    query_with(term, records, QueryCase::Sensitive)
}

pub fn query_with<'a>(term: &str, records: &'a [EntityRecord], case: QueryCase) -> Vec<&'a EntityRecord> {
    match case {
        QueryCase::Sensitive => records.iter().filter(|r| r.entity_text.contains(term)).collect(),
        QueryCase::Insensitive => {
            let term = term.to_lowercase();
            records
                .iter()
                .filter(|r| r.entity_text.to_lowercase().contains(&term))
                .collect()
        }
    }
}

/// Records matching any of `terms`, in input order. No terms matches
/// everything.
pub fn query_terms<'a, S: AsRef<str>>(terms: &[S], records: &'a [EntityRecord], case: QueryCase) -> Vec<&'a EntityRecord> {
    if terms.is_empty() {
        return records.iter().collect();
    }
    let terms: Vec<String> = terms
        .iter()
        .map(|t| match case {
            QueryCase::Sensitive => t.as_ref().to_string(),
            QueryCase::Insensitive => t.as_ref().to_lowercase(),
        })
        .collect();
    records
        .iter()
        .filter(|r| {
            let text = match case {
                QueryCase::Sensitive => r.entity_text.clone(),
                QueryCase::Insensitive => r.entity_text.to_lowercase(),
            };
            terms.iter().any(|t| text.contains(t.as_str()))
        })
        .collect()
}

/// Split a comma-separated query string into trimmed, non-empty terms.
pub fn parse_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
