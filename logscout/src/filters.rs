//! Entry filters applied by the collector.
//!
//! Name matching is case-insensitive in both modes; content matching (done by
//! the search engine) is case-sensitive. The asymmetry is intentional.
use regex::{Regex, RegexBuilder};
use std::str::FromStr;
use std::time::SystemTime;

use crate::entry::FileEntry;
use crate::errors::{SearchError, SearchResult};

/// Inclusive modification-time window; an unset bound is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModifiedRange {
    pub from: Option<SystemTime>,
    pub to: Option<SystemTime>,
}

impl ModifiedRange {
    pub fn new(from: Option<SystemTime>, to: Option<SystemTime>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, time: SystemTime) -> bool {
        self.from.map_or(true, |from| time >= from) && self.to.map_or(true, |to| time <= to)
    }
}

/// How a name pattern is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatchMode {
    #[default]
    Substring,
    Regex,
}

impl FromStr for NameMatchMode {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "substring" | "contains" => Ok(Self::Substring),
            "regex" => Ok(Self::Regex),
            other => Err(SearchError::config_error(format!(
                "Unknown name match mode: {}",
                other
            ))),
        }
    }
}

/// Entry name predicate
#[derive(Debug, Clone)]
pub enum NameMatcher {
    /// Case-insensitive containment; holds the lower-cased needle
    Substring(String),
    /// Case-insensitive match of the whole name
    Regex(Regex),
}

impl NameMatcher {
    pub fn new(pattern: &str, mode: NameMatchMode) -> SearchResult<Self> {
        match mode {
            NameMatchMode::Substring => Ok(Self::substring(pattern)),
            NameMatchMode::Regex => Self::regex(pattern),
        }
    }

    pub fn substring(needle: &str) -> Self {
        Self::Substring(needle.to_lowercase())
    }

    /// Compiles `pattern` anchored at both ends, so it must match the full name
    pub fn regex(pattern: &str) -> SearchResult<Self> {
        let regex = RegexBuilder::new(&format!("^(?:{})$", pattern))
            .case_insensitive(true)
            .build()
            .map_err(|e| SearchError::invalid_pattern(e.to_string()))?;
        Ok(Self::Regex(regex))
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Substring(needle) => name.to_lowercase().contains(needle.as_str()),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

/// Everything a caller can constrain a collection or search by
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub modified: ModifiedRange,
    pub name_matcher: Option<NameMatcher>,
    /// Case-sensitive line term; `Some("")` matches every line
    pub content_term: Option<String>,
    pub recursive: bool,
}

impl SearchFilter {
    /// A filter that accepts every entry and does not recurse
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modified_between(mut self, from: Option<SystemTime>, to: Option<SystemTime>) -> Self {
        self.modified = ModifiedRange::new(from, to);
        self
    }

    pub fn with_name(mut self, matcher: NameMatcher) -> Self {
        self.name_matcher = Some(matcher);
        self
    }

    pub fn with_content(mut self, term: impl Into<String>) -> Self {
        self.content_term = Some(term.into());
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Checks the modified window and the name matcher
    pub fn accepts(&self, entry: &FileEntry) -> bool {
        self.modified.contains(entry.modified)
            && self
                .name_matcher
                .as_ref()
                .map_or(true, |matcher| matcher.matches(&entry.name))
    }
}
