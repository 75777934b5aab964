use serde::{Deserialize, Serialize};

use crate::models::AssertionFlag;
use crate::pipeline::ConfigError;

const TABLE: &str = "postprocess";

/// Which side of the entity a window extends to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowSide {
    Left,
    Right,
    #[default]
    Both,
}

impl WindowSide {
    pub fn left(&self) -> bool {
        matches!(self, Self::Left | Self::Both)
    }

    pub fn right(&self) -> bool {
        matches!(self, Self::Right | Self::Both)
    }
}

fn one() -> usize {
    1
}

/// Predicate over an entity and its surroundings. Text comparisons are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    LabelIn {
        labels: Vec<String>,
    },
    LabelNotIn {
        labels: Vec<String>,
    },
    TextEquals {
        text: String,
    },
    TextContains {
        text: String,
    },
    /// `literal` occurs within `tokens` tokens of the entity, inside its
    /// sentence. The window includes the entity's own tokens.
    WindowContains {
        literal: String,
        #[serde(default = "one")]
        tokens: usize,
        #[serde(default)]
        side: WindowSide,
    },
    /// `literal` occurs in the entity's sentence or within `sentences`
    /// neighboring sentences.
    SentenceWindowContains {
        literal: String,
        #[serde(default = "one")]
        sentences: usize,
        #[serde(default)]
        side: WindowSide,
    },
    FlagIs {
        flag: AssertionFlag,
        value: bool,
    },
    All {
        conditions: Vec<Condition>,
    },
    Any {
        conditions: Vec<Condition>,
    },
}

impl Condition {
    pub(super) fn validate(&self, index: usize) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRule {
            table: TABLE,
            index,
            reason: reason.into(),
        };
        match self {
            Self::LabelIn { labels } | Self::LabelNotIn { labels } if labels.is_empty() => {
                Err(invalid("label list is empty"))
            }
            Self::TextEquals { text } | Self::TextContains { text } if text.is_empty() => {
                Err(invalid("comparison text is empty"))
            }
            Self::WindowContains { literal, tokens, .. } => {
                if literal.is_empty() {
                    return Err(invalid("window literal is empty"));
                }
                if *tokens == 0 {
                    return Err(invalid("token window must be at least 1"));
                }
                Ok(())
            }
            Self::SentenceWindowContains { literal, .. } if literal.is_empty() => {
                Err(invalid("window literal is empty"))
            }
            Self::All { conditions } | Self::Any { conditions } => {
                if conditions.is_empty() {
                    return Err(invalid("condition group is empty"));
                }
                conditions.iter().try_for_each(|c| c.validate(index))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Remove,
    SetFlag { flag: AssertionFlag, value: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostprocessRuleSpec {
    pub description: String,
    pub condition: Condition,
    pub action: Action,
}

impl PostprocessRuleSpec {
    pub fn new(description: &str, condition: Condition, action: Action) -> Self {
        Self {
            description: description.into(),
            condition,
            action,
        }
    }
}

/// Default post-processing for red-flag extraction.
pub fn builtin_rules() -> Vec<PostprocessRuleSpec> {
    vec![
        PostprocessRuleSpec::new(
            "Keep disease and problem labels only",
            Condition::LabelNotIn {
                labels: vec!["DISEASE".into(), "PROBLEM".into()],
            },
            Action::Remove,
        ),
        PostprocessRuleSpec::new(
            "Drop header fragment",
            Condition::TextEquals {
                text: "presenting illness".into(),
            },
            Action::Remove,
        ),
        PostprocessRuleSpec::new(
            "Question mark beside entity marks it uncertain",
            Condition::WindowContains {
                literal: "?".into(),
                tokens: 1,
                side: WindowSide::Both,
            },
            Action::SetFlag {
                flag: AssertionFlag::Uncertain,
                value: true,
            },
        ),
    ]
}
