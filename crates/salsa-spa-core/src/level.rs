//! CEFR proficiency levels.
//!
//! `A0` is not a vocabulary level: it stands for "not in any list" and only
//! appears in grading output.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A CEFR band, ordered ascending from `A0` (none) to `C2` (mastery).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum CefrLevel {
    /// Not in vocabulary.
    A0,
    /// Beginner.
    A1,
    /// Elementary.
    A2,
    /// Intermediate.
    B1,
    /// Upper intermediate.
    B2,
    /// Advanced.
    C1,
    /// Mastery.
    C2,
}

/// Every level, ascending.
pub const ALL_LEVELS: [CefrLevel; 7] = [
    CefrLevel::A0,
    CefrLevel::A1,
    CefrLevel::A2,
    CefrLevel::B1,
    CefrLevel::B2,
    CefrLevel::C1,
    CefrLevel::C2,
];

/// Levels that can appear in a vocabulary list, ascending.
pub const KNOWN_LEVELS: [CefrLevel; 6] = [
    CefrLevel::A1,
    CefrLevel::A2,
    CefrLevel::B1,
    CefrLevel::B2,
    CefrLevel::C1,
    CefrLevel::C2,
];

/// Order in which the matcher checks levels for a candidate phrase.
///
/// An expression listed at several levels resolves to the highest one.
pub const MATCH_PRIORITY: [CefrLevel; 6] = [
    CefrLevel::C2,
    CefrLevel::C1,
    CefrLevel::B2,
    CefrLevel::B1,
    CefrLevel::A2,
    CefrLevel::A1,
];

impl CefrLevel {
    /// Returns the level code (`"A0"` .. `"C2"`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::A0 => "A0",
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    /// Position on the ordinal scale, `A0 = 0` through `C2 = 6`.
    pub const fn ordinal(&self) -> u8 {
        match self {
            Self::A0 => 0,
            Self::A1 => 1,
            Self::A2 => 2,
            Self::B1 => 3,
            Self::B2 => 4,
            Self::C1 => 5,
            Self::C2 => 6,
        }
    }

    /// Whether the level can be a vocabulary key (everything except `A0`).
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::A0)
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a CEFR code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown CEFR level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for CefrLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A0" => Ok(Self::A0),
            "A1" => Ok(Self::A1),
            "A2" => Ok(Self::A2),
            "B1" => Ok(Self::B1),
            "B2" => Ok(Self::B2),
            "C1" => Ok(Self::C1),
            "C2" => Ok(Self::C2),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}
