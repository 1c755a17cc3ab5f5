use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod achievement;
pub mod exam;
pub mod progress;
pub mod question;

/// Proficiency levels in fixed progression order. `ORDER` is the single
/// source of truth for ordering and successor lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl Level {
    pub const ORDER: [Level; 5] = [Level::A1, Level::A2, Level::B1, Level::B2, Level::C1];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
            Level::C1 => "C1",
        }
    }

    /// Position in the progression order (A1 = 0).
    pub fn rank(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|l| l == self)
            .expect("level missing from ORDER")
    }

    /// The immediate successor, or `None` for the top level.
    pub fn next(&self) -> Option<Level> {
        Self::ORDER.get(self.rank() + 1).copied()
    }

    /// Prefix used to tag lesson ids belonging to this level ("a1-", "b2-", ...).
    pub fn lesson_prefix(&self) -> String {
        format!("{}-", self.as_str().to_lowercase())
    }

    pub fn is_top(&self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown level code: {}", s))
    }
}

/// Curriculum tracks a lesson can belong to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Grammar,
    Reading,
    Writing,
    Vocabulary,
}

impl ModuleType {
    pub const ALL: [ModuleType; 4] = [
        ModuleType::Grammar,
        ModuleType::Reading,
        ModuleType::Writing,
        ModuleType::Vocabulary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Grammar => "grammar",
            ModuleType::Reading => "reading",
            ModuleType::Writing => "writing",
            ModuleType::Vocabulary => "vocabulary",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("unknown module type: {}", s))
    }
}
