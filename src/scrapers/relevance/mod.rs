//! Keyword relevance classification.
//!
//! A posting is relevant when its normalized title and description contain at
//! least one inclusion phrase and no exclusion phrase. Matching is plain
//! substring search: a short phrase such as `ui` also matches inside longer
//! words (`build`, `guide`). That is a known precision limitation and is kept
//! as-is; callers wanting tighter matches should use longer phrases.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::text::{normalize, scan_target};

const DEFAULT_KEYWORDS: &str = include_str!("default_keywords.toml");

/// Errors loading keyword data.
#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("failed to read keywords file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML keywords: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON keywords: {0}")]
    Json(#[from] serde_json::Error),
    #[error("inclusion set is empty")]
    EmptyInclusion,
}

/// An immutable set of normalized phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    phrases: Vec<String>,
}

impl KeywordSet {
    /// Normalize, drop blanks and de-duplicate (first occurrence order kept).
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let phrases = phrases
            .into_iter()
            .map(|p| normalize(p.as_ref().trim()))
            .filter(|p| !p.is_empty())
            .filter(|p| seen.insert(p.clone()))
            .collect();
        Self { phrases }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(|s| s.as_str())
    }

    /// First phrase occurring in already-normalized `text`.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        self.phrases
            .iter()
            .find(|p| text.contains(p.as_str()))
            .map(|s| s.as_str())
    }

    /// Whether any phrase occurs in already-normalized `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }

    /// Phrases present in both sets.
    pub fn overlap(&self, other: &KeywordSet) -> Vec<String> {
        let theirs: HashSet<&str> = other.phrases().collect();
        self.phrases
            .iter()
            .filter(|p| theirs.contains(p.as_str()))
            .cloned()
            .collect()
    }
}

/// Serialized form of the two keyword sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl KeywordConfig {
    /// The bundled designer vocabulary.
    pub fn bundled() -> Result<Self, KeywordError> {
        Ok(toml::from_str(DEFAULT_KEYWORDS)?)
    }

    /// Load from a `.json` or TOML file.
    pub fn load(path: &Path) -> Result<Self, KeywordError> {
        let content = std::fs::read_to_string(path).map_err(|source| KeywordError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }
}

/// Outcome of classifying one posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Relevant { matched: String },
    NoInclusion,
    Excluded { matched: String },
}

impl Verdict {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Verdict::Relevant { .. })
    }
}

/// Inclusion/exclusion keyword rule.
#[derive(Debug, Clone)]
pub struct RelevanceClassifier {
    include: KeywordSet,
    exclude: KeywordSet,
}

impl RelevanceClassifier {
    pub fn new(include: KeywordSet, exclude: KeywordSet) -> Self {
        Self { include, exclude }
    }

    /// Build from config data, warning about phrases listed in both sets.
    pub fn from_config(config: &KeywordConfig) -> Result<Self, KeywordError> {
        let include = KeywordSet::new(&config.include);
        if include.is_empty() {
            return Err(KeywordError::EmptyInclusion);
        }
        let exclude = KeywordSet::new(&config.exclude);

        let overlap = include.overlap(&exclude);
        if !overlap.is_empty() {
            warn!(
                "Keyword sets overlap; these phrases can never match: {:?}",
                overlap
            );
        }

        Ok(Self::new(include, exclude))
    }

    pub fn bundled() -> Result<Self, KeywordError> {
        Self::from_config(&KeywordConfig::bundled()?)
    }

    pub fn include(&self) -> &KeywordSet {
        &self.include
    }

    pub fn exclude(&self) -> &KeywordSet {
        &self.exclude
    }

    /// Classify with the matched phrase, for logging.
    pub fn verdict(&self, title: &str, description: &str) -> Verdict {
        let text = scan_target(title, description);
        let Some(matched) = self.include.first_match(&text) else {
            return Verdict::NoInclusion;
        };
        let matched = matched.to_string();
        match self.exclude.first_match(&text) {
            Some(excluded) => Verdict::Excluded {
                matched: excluded.to_string(),
            },
            None => Verdict::Relevant { matched },
        }
    }

    pub fn is_relevant(&self, title: &str, description: &str) -> bool {
        self.verdict(title, description).is_relevant()
    }
}

/// Stateless form of [`RelevanceClassifier::is_relevant`].
pub fn is_relevant(title: &str, description: &str, include: &KeywordSet, exclude: &KeywordSet) -> bool {
    let text = scan_target(title, description);
    include.matches(&text) && !exclude.matches(&text)
}
