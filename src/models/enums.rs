use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serde representation.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ModifierCategory {
    NegatedExistence => "NEGATED_EXISTENCE",
    PossibleExistence => "POSSIBLE_EXISTENCE",
    Historical => "HISTORICAL",
    Hypothetical => "HYPOTHETICAL",
    Family => "FAMILY",
    Terminate => "TERMINATE",
    Pseudo => "PSEUDO",
});

str_enum!(Direction {
    Forward => "FORWARD",
    Backward => "BACKWARD",
    Bidirectional => "BIDIRECTIONAL",
    Terminate => "TERMINATE",
    Pseudo => "PSEUDO",
});

str_enum!(AssertionFlag {
    Negated => "is_negated",
    Uncertain => "is_uncertain",
    Historical => "is_historical",
    Hypothetical => "is_hypothetical",
    Family => "is_family",
});

impl ModifierCategory {
    /// The entity flag this category resolves to. Terminate and pseudo cues
    /// never set a flag.
    pub fn flag(&self) -> Option<AssertionFlag> {
        match self {
            Self::NegatedExistence => Some(AssertionFlag::Negated),
            Self::PossibleExistence => Some(AssertionFlag::Uncertain),
            Self::Historical => Some(AssertionFlag::Historical),
            Self::Hypothetical => Some(AssertionFlag::Hypothetical),
            Self::Family => Some(AssertionFlag::Family),
            Self::Terminate | Self::Pseudo => None,
        }
    }
}

impl Direction {
    /// True when a cue with this direction scans text on its right.
    pub fn scans_forward(&self) -> bool {
        matches!(self, Self::Forward | Self::Bidirectional)
    }

    /// True when a cue with this direction scans text on its left.
    pub fn scans_backward(&self) -> bool {
        matches!(self, Self::Backward | Self::Bidirectional)
    }

    /// Terminate and pseudo cues do not modify entities.
    pub fn is_assertion(&self) -> bool {
        self.scans_forward() || self.scans_backward()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn modifier_category_round_trips_through_str() {
        for cat in [
            ModifierCategory::NegatedExistence,
            ModifierCategory::PossibleExistence,
            ModifierCategory::Historical,
            ModifierCategory::Hypothetical,
            ModifierCategory::Family,
            ModifierCategory::Terminate,
            ModifierCategory::Pseudo,
        ] {
            assert_eq!(ModifierCategory::from_str(cat.as_str()).unwrap(), cat);
        }
    }

    #[test]
    fn unknown_direction_is_rejected() {
        let err = Direction::from_str("SIDEWAYS").unwrap_err();
        assert!(err.to_string().contains("SIDEWAYS"));
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&ModifierCategory::NegatedExistence).unwrap();
        assert_eq!(json, "\"NEGATED_EXISTENCE\"");
        let dir: Direction = serde_json::from_str("\"BIDIRECTIONAL\"").unwrap();
        assert_eq!(dir, Direction::Bidirectional);
    }

    #[test]
    fn only_assertion_categories_map_to_flags() {
        assert_eq!(ModifierCategory::Family.flag(), Some(AssertionFlag::Family));
        assert_eq!(ModifierCategory::PossibleExistence.flag(), Some(AssertionFlag::Uncertain));
        assert_eq!(ModifierCategory::Terminate.flag(), None);
        assert_eq!(ModifierCategory::Pseudo.flag(), None);
    }

    #[test]
    fn direction_scan_sides() {
        assert!(Direction::Forward.scans_forward());
        assert!(!Direction::Forward.scans_backward());
        assert!(Direction::Bidirectional.scans_forward());
        assert!(Direction::Bidirectional.scans_backward());
        assert!(!Direction::Terminate.is_assertion());
        assert!(!Direction::Pseudo.is_assertion());
    }
}
