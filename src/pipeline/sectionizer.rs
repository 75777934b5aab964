//! Section assignment.
//!
//! Sentences are visited candidate by candidate and tested against the
//! section rules in declaration order; the first rule that matches starts a
//! new section whose title is the matched text. Some rules only apply to the
//! first sentence of a section candidate. Sentences that match nothing
//! inherit the category of the section before them. Sentences before the
//! first header belong to an `unspecified` section.

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::patterns;
use super::segment::Segmentation;
use super::types::{Section, Span, UNSPECIFIED_SECTION};
use super::ConfigError;

const TABLE: &str = "section";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRuleSpec {
    pub category: String,
    pub literal: String,
    /// Regex used instead of `literal` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Only match at the start of a sentence.
    #[serde(default)]
    pub sentence_start: bool,
    /// Only match the first sentence of a section candidate.
    #[serde(default)]
    pub candidate_start: bool,
}

impl SectionRuleSpec {
    pub fn literal(category: &str, literal: &str) -> Self {
        Self {
            category: category.into(),
            literal: literal.into(),
            pattern: None,
            sentence_start: false,
            candidate_start: false,
        }
    }

    pub fn pattern(category: &str, literal: &str, pattern: &str) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::literal(category, literal)
        }
    }

    pub fn at_sentence_start(mut self) -> Self {
        self.sentence_start = true;
        self
    }

    pub fn at_candidate_start(mut self) -> Self {
        self.candidate_start = true;
        self
    }
}

/// Default section headers for ED provider notes. The order matters:
/// "physical" is declared before "physical exam" so it wins on sentences
/// containing both.
pub fn builtin_rules() -> Vec<SectionRuleSpec> {
    vec![
        SectionRuleSpec::pattern("visit_information", "presented", r"\S+.*?\bpresented\b")
            .at_sentence_start()
            .at_candidate_start(),
        SectionRuleSpec::literal("history_of_presenting_illness", "History of Presenting Illness"),
        SectionRuleSpec::pattern("history_of_presenting_illness", "HPI", r"\bhpi\b"),
        SectionRuleSpec::literal("past_medical_history", "Past Medical History"),
        SectionRuleSpec::pattern("past_medical_history", "PMH", r"\bpmhx?\b"),
        SectionRuleSpec::literal("patient_history", "Patient History"),
        SectionRuleSpec::literal("medication", "Current Outpatient Medications"),
        SectionRuleSpec::literal("medication", "Home Medications"),
        SectionRuleSpec::literal("review_of_systems", "Review of Systems"),
        SectionRuleSpec::pattern("review_of_systems", "ROS", r"ros(?:\s*:|$)").at_sentence_start(),
        SectionRuleSpec::pattern("physical_exam", "Physical", r"\bphysical\s*exam*"),
        SectionRuleSpec::literal("physical_exam", "Physical Exam"),
        SectionRuleSpec::pattern(
            "observation_and_plan",
            "Impression and Plan",
            r"\b(?:impression|assessment)\s*(?:and|&)\s*plan\b",
        ),
        SectionRuleSpec::pattern("observation_and_plan", "Plan", r"plan(?:\s*:|$)").at_sentence_start(),
    ]
}

#[derive(Debug)]
struct SectionRule {
    category: String,
    regex: Regex,
    candidate_start: bool,
}

#[derive(Debug)]
pub struct Sectionizer {
    rules: Vec<SectionRule>,
}

impl Sectionizer {
    pub fn new(specs: &[SectionRuleSpec]) -> Result<Self, ConfigError> {
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
                let source = match &spec.pattern {
                    Some(p) if !p.is_empty() => format!("(?i){p}"),
                    _ => patterns::literal_source(&spec.literal),
                };
                let source = if spec.sentence_start {
                    format!("^(?:{source})")
                } else {
                    source
                };
                if spec.pattern.is_none() && spec.literal.trim().is_empty() {
                    return Err(ConfigError::InvalidRule {
                        table: TABLE,
                        index,
                        reason: "literal and pattern are both empty".into(),
                    });
                }
                let regex = patterns::compile(TABLE, index, &source)?;
                patterns::reject_zero_width(TABLE, index, &regex)?;
                Ok(SectionRule {
                    category: spec.category.clone(),
                    regex,
                    candidate_start: spec.candidate_start,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    /// First matching rule for `sentence`, with the matched header text.
    /// `candidate_start` tells whether the sentence opens its candidate.
    pub fn match_header<'a>(&self, sentence: &'a str, candidate_start: bool) -> Option<(&str, &'a str)> {
        self.rules
            .iter()
            .filter(|rule| candidate_start || !rule.candidate_start)
            .find_map(|rule| rule.regex.find(sentence).map(|m| (rule.category.as_str(), m.as_str())))
    }

    /// Group the sentences of a segmented note into sections. Every
    /// sentence lands in exactly one section. With no sentences, a single
    /// empty unspecified section is returned.
    pub fn assign(&self, segmentation: &Segmentation) -> Vec<Section> {
        let sentences = segmentation.sentences();
        let mut sections: Vec<Section> = Vec::new();

        for candidate in segmentation.candidates() {
            for (position, sentence) in sentences[candidate.sentences.clone()].iter().enumerate() {
                let header = self.match_header(&sentence.text, position == 0);
                if header.is_none() {
                    if let Some(current) = sections.last_mut() {
                        current.span.end = sentence.span.end;
                        current.sentences.end = sentence.index + 1;
                        continue;
                    }
                }
                let (category, title) = match header {
                    Some((category, title)) => (category.to_string(), Some(title.to_string())),
                    None => (UNSPECIFIED_SECTION.to_string(), None),
                };
                sections.push(Section {
                    index: sections.len(),
                    category,
                    title,
                    span: sentence.span,
                    sentences: sentence.index..sentence.index + 1,
                });
            }
        }

        if sections.is_empty() {
            sections.push(Section {
                index: 0,
                category: UNSPECIFIED_SECTION.to_string(),
                title: None,
                span: Span::default(),
                sentences: 0..0,
            });
        }

        tracing::debug!(sections = sections.len(), "Assigned sections");
        sections
    }
}

/// Section index for every sentence, by position.
pub fn section_of_sentences(sections: &[Section], sentence_count: usize) -> Vec<usize> {
    let mut owners = vec![0; sentence_count];
    for section in sections {
        for i in section.sentences.clone() {
            if let Some(slot) = owners.get_mut(i) {
                *slot = section.index;
            }
        }
    }
    owners
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::segment::Segmenter;
    use crate::pipeline_config::SegmenterConfig;

    const DELIM: &str = "         ";

    fn segment(text: &str) -> Segmentation {
        Segmenter::new(&SegmenterConfig::default()).unwrap().segment(text)
    }

    fn builtin() -> Sectionizer {
        Sectionizer::new(&builtin_rules()).unwrap()
    }

    #[test]
    fn leading_sentences_are_unspecified() {
        let sections = builtin().assign(&segment("chief complaint: headache\nreview of systems: negative"));
        assert_eq!(sections.len(), 2);
        assert!(sections[0].is_unspecified());
        assert_eq!(sections[1].category, "review_of_systems");
        assert_eq!(sections[1].title.as_deref(), Some("review of systems"));
    }

    #[test]
    fn categories_propagate_until_next_header() {
        let text = "history of presenting illness: headache\nno vomiting\nplan: tylenol";
        let sections = builtin().assign(&segment(text));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].category, "history_of_presenting_illness");
        assert_eq!(sections[0].sentences, 0..2);
        assert_eq!(sections[1].category, "observation_and_plan");
    }

    #[test]
    fn physical_rule_wins_over_physical_exam() {
        let sections = builtin().assign(&segment("physical exam: alert"));
        assert_eq!(sections[0].category, "physical_exam");
        assert_eq!(sections[0].title.as_deref(), Some("physical exam"));

        let specs = vec![
            SectionRuleSpec::literal("first", "Physical"),
            SectionRuleSpec::literal("second", "Physical Exam"),
        ];
        let sections = Sectionizer::new(&specs).unwrap().assign(&segment("physical exam: alert"));
        assert_eq!(sections[0].category, "first");
        assert_eq!(sections[0].title.as_deref(), Some("physical"));
    }

    #[test]
    fn visit_information_only_at_sentence_start() {
        let s = builtin();
        let (category, _) = s.match_header("[patient name] presented with headache.", true).unwrap();
        assert_eq!(category, "visit_information");
        assert!(s.match_header("headache", true).is_none());
    }

    #[test]
    fn presented_mid_candidate_keeps_current_section() {
        let text = format!(
            "[patient name] presented with headache.{DELIM}history of presenting illness: headache\nshe presented to clinic last week"
        );
        let sections = builtin().assign(&segment(&text));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].category, "visit_information");
        assert_eq!(sections[1].category, "history_of_presenting_illness");
        assert_eq!(sections[1].sentences, 1..3);
    }

    #[test]
    fn presented_opening_a_later_candidate_starts_visit_information() {
        let text = format!("history of presenting illness: headache{DELIM}she presented with vomiting");
        let sections = builtin().assign(&segment(&text));
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].category, "visit_information");
    }

    #[test]
    fn impression_and_plan_matches() {
        let binding = builtin();
        let (category, title) = binding.match_header("assessment & plan: migraine", false).unwrap();
        assert_eq!(category, "observation_and_plan");
        assert_eq!(title, "assessment & plan");
    }

    #[test]
    fn plan_and_ros_need_header_shape() {
        let s = builtin();
        assert!(s.match_header("no plan to admit", false).is_none());
        assert!(s.match_header("plan to admit", false).is_none());
        assert!(s.match_header("ros reviewed with patient", false).is_none());
        assert_eq!(s.match_header("plan: discharge", false).unwrap().0, "observation_and_plan");
        assert_eq!(s.match_header("plan", false).unwrap().0, "observation_and_plan");
        assert_eq!(s.match_header("ros: negative", false).unwrap().0, "review_of_systems");
    }

    #[test]
    fn plan_in_prose_does_not_open_section() {
        let text = "history of presenting illness: headache\nno plan to admit";
        let sections = builtin().assign(&segment(text));
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category, "history_of_presenting_illness");
    }

    #[test]
    fn every_sentence_has_one_section() {
        let seg = segment("a\nhpi: b\nc\nphysical exam: d\ne");
        let sections = builtin().assign(&seg);
        let owners = section_of_sentences(&sections, seg.sentences().len());
        assert_eq!(owners, vec![0, 1, 1, 2, 2]);
        let covered: usize = sections.iter().map(|s| s.sentences.len()).sum();
        assert_eq!(covered, seg.sentences().len());
    }

    #[test]
    fn empty_note_gets_unspecified_section() {
        let sections = builtin().assign(&segment(""));
        assert_eq!(sections.len(), 1);
        assert!(sections[0].is_unspecified());
        assert!(sections[0].sentences.is_empty());
    }

    #[test]
    fn empty_category_rejected() {
        let specs = vec![SectionRuleSpec::literal(" ", "Plan")];
        assert!(Sectionizer::new(&specs).is_err());
    }
}
