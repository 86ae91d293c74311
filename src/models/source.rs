//! Known job board identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A job board with its own adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    Geekjob,
    Hh,
    Habr,
    GetMatch,
    HireHi,
}

impl SourceId {
    /// All known sources, in default harvest order.
    pub const ALL: [SourceId; 5] = [
        SourceId::Geekjob,
        SourceId::Hh,
        SourceId::Habr,
        SourceId::GetMatch,
        SourceId::HireHi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geekjob => "geekjob",
            Self::Hh => "hh",
            Self::Habr => "habr",
            Self::GetMatch => "getmatch",
            Self::HireHi => "hirehi",
        }
    }

    /// Parse a source identifier. Matching is case-insensitive and ignores
    /// surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "geekjob" => Some(Self::Geekjob),
            "hh" => Some(Self::Hh),
            "habr" => Some(Self::Habr),
            "getmatch" => Some(Self::GetMatch),
            "hirehi" => Some(Self::HireHi),
            _ => None,
        }
    }

    /// Human-readable board name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Geekjob => "Geekjob.ru",
            Self::Hh => "HH.ru",
            Self::Habr => "Habr Career",
            Self::GetMatch => "GetMatch.ru",
            Self::HireHi => "HireHi",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
