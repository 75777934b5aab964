//! Rule tables as data.
//!
//! All five rule lists load from one JSON document. Tables missing from the
//! document fall back to the built-in defaults, so a file may override just
//! the targets. Tables are validated when the pipeline is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::context::{self, ContextRuleSpec, NegexSource};
use super::postprocess::{self, PostprocessRuleSpec};
use super::preprocess::{self, PreprocessRuleSpec};
use super::sectionizer::{self, SectionRuleSpec};
use super::target::{self, TargetRuleSpec};
use super::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTables {
    #[serde(default = "preprocess::builtin_rules")]
    pub preprocess: Vec<PreprocessRuleSpec>,
    #[serde(default = "sectionizer::builtin_rules")]
    pub sections: Vec<SectionRuleSpec>,
    #[serde(default = "target::builtin_rules")]
    pub targets: Vec<TargetRuleSpec>,
    #[serde(default = "context::builtin_rules")]
    pub context: Vec<ContextRuleSpec>,
    /// NegEx-style termset appended after the context rules, either a
    /// preset name or an explicit termset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negex: Option<NegexSource>,
    #[serde(default = "postprocess::builtin_rules")]
    pub postprocess: Vec<PostprocessRuleSpec>,
}

impl Default for RuleTables {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RuleTables {
    pub fn builtin() -> Self {
        Self {
            preprocess: preprocess::builtin_rules(),
            sections: sectionizer::builtin_rules(),
            targets: target::builtin_rules(),
            context: context::builtin_rules(),
            negex: None,
            postprocess: postprocess::builtin_rules(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tables = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            targets = tables.targets.len(),
            context = tables.context.len(),
            "Loaded rule tables"
        );
        Ok(tables)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Context rules followed by the termset's rules, if any.
    pub fn context_rules(&self) -> Vec<ContextRuleSpec> {
        let mut rules = self.context.clone();
        if let Some(source) = &self.negex {
            rules.extend(source.termset().to_rules());
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, ModifierCategory};
    use crate::pipeline::context::{NegexTermset, TermsetPreset};
    use std::io::Write;

    #[test]
    fn builtin_round_trips_through_json() {
        let json = RuleTables::builtin().to_json_pretty().unwrap();
        let parsed = RuleTables::from_json_str(&json).unwrap();
        assert_eq!(parsed, RuleTables::builtin());
    }

    #[test]
    fn missing_tables_use_defaults() {
        let tables = RuleTables::from_json_str(
            r#"{"targets": [{"literal": "syncope", "category": "PROBLEM"}]}"#,
        )
        .unwrap();
        assert_eq!(tables.targets.len(), 1);
        assert_eq!(tables.context, context::builtin_rules());
        assert_eq!(tables.sections, sectionizer::builtin_rules());
    }

    #[test]
    fn negex_rules_append_after_context() {
        let mut tables = RuleTables::builtin();
        tables.context.clear();
        let mut termset = NegexTermset::default();
        termset.add_preceding(&["not"]);
        tables.negex = Some(NegexSource::Custom(termset));
        let rules = tables.context_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].category, ModifierCategory::NegatedExistence);
    }

    #[test]
    fn clinical_preset_selected_by_name() {
        let tables = RuleTables::from_json_str(r#"{"negex": "en_clinical"}"#).unwrap();
        assert_eq!(tables.negex, Some(NegexSource::Preset(TermsetPreset::EnClinical)));
        let rules = tables.context_rules();
        assert_eq!(rules.len(), context::builtin_rules().len() + NegexTermset::en_clinical().to_rules().len());
        assert!(rules
            .iter()
            .any(|r| r.literal == "absent" && r.direction == Direction::Backward));

        let json = tables.to_json_pretty().unwrap();
        assert!(json.contains(r#""negex": "en_clinical""#));
    }

    #[test]
    fn malformed_json_is_config_error() {
        let err = RuleTables::from_json_str("{\"targets\": 3}").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"postprocess": []}}"#).unwrap();
        let tables = RuleTables::from_json_file(file.path()).unwrap();
        assert!(tables.postprocess.is_empty());
        assert_eq!(tables.targets, target::builtin_rules());
    }
}
