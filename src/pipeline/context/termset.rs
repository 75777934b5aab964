//! NegEx-style termsets.
//!
//! A termset groups negation phrases by role. It converts into context
//! rules so that a negation-only configuration can reuse the same
//! classifier.

use serde::{Deserialize, Serialize};

use super::rules::ContextRuleSpec;
use crate::models::{Direction, ModifierCategory};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NegexTermset {
    /// Negations that scope over following text ("denies").
    pub preceding_negations: Vec<String>,
    /// Negations that scope over preceding text ("absent").
    pub following_negations: Vec<String>,
    /// Phrases that look like negations but are not ("no increase").
    pub pseudo_negations: Vec<String>,
    pub termination: Vec<String>,
}

/// Termsets shipped with the crate, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermsetPreset {
    EnClinical,
}

/// A termset given by preset name (`"en_clinical"`) or spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NegexSource {
    Preset(TermsetPreset),
    Custom(NegexTermset),
}

impl NegexSource {
    pub fn termset(&self) -> NegexTermset {
        match self {
            Self::Preset(TermsetPreset::EnClinical) => NegexTermset::en_clinical(),
            Self::Custom(termset) => termset.clone(),
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl NegexTermset {
    /// Clinical English termset, including the preceding "not" and
    /// following "absent" additions used for ED notes.
    pub fn en_clinical() -> Self {
        Self {
            preceding_negations: owned(&[
                "no", "not", "denies", "denied", "without", "absence of", "negative for", "free of",
                "no evidence of", "no sign of", "no signs of", "never developed", "never had", "rules out",
            ]),
            following_negations: owned(&["absent", "not present", "ruled out", "was negative", "is negative", "free"]),
            pseudo_negations: owned(&[
                "no further", "not able to be", "not certain if", "not certain whether", "not necessarily",
                "without any further", "without difficulty", "without further", "might not", "not only",
                "no increase", "no significant change", "no change", "no definite change", "not extend",
                "not cause", "gram negative",
            ]),
            termination: owned(&[
                "but", "however", "although", "though", "except", "aside from", "apart from", "yet",
                "nevertheless", "still", "which", "cause of", "source of",
            ]),
        }
    }

    pub fn add_preceding(&mut self, phrases: &[&str]) {
        self.preceding_negations.extend(owned(phrases));
    }

    pub fn add_following(&mut self, phrases: &[&str]) {
        self.following_negations.extend(owned(phrases));
    }

    pub fn is_empty(&self) -> bool {
        self.preceding_negations.is_empty()
            && self.following_negations.is_empty()
            && self.pseudo_negations.is_empty()
            && self.termination.is_empty()
    }

    /// Context rules equivalent to this termset. Blank phrases are skipped.
    pub fn to_rules(&self) -> Vec<ContextRuleSpec> {
        let groups: [(&[String], ModifierCategory, Direction); 4] = [
            (&self.preceding_negations, ModifierCategory::NegatedExistence, Direction::Forward),
            (&self.following_negations, ModifierCategory::NegatedExistence, Direction::Backward),
            (&self.pseudo_negations, ModifierCategory::Pseudo, Direction::Pseudo),
            (&self.termination, ModifierCategory::Terminate, Direction::Terminate),
        ];
        groups
            .into_iter()
            .flat_map(|(phrases, category, direction)| {
                phrases
                    .iter()
                    .filter(|p| !p.trim().is_empty())
                    .map(move |p| ContextRuleSpec::new(p.trim(), category, direction))
            })
            .collect()
    }
}
