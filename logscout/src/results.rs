/// Search output types.
///
/// A search produces one [`SearchHit`] per file with at least one matching
/// line; files without matches never appear. Hits keep the order of the
/// entries they were produced from, and matches keep line order.
use serde::Serialize;

use crate::entry::FileEntry;

/// A single matching line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineMatch {
    /// 1-based line number within the file
    pub line_number: usize,
    /// The full line text without its terminator
    pub line: String,
}

impl LineMatch {
    pub fn new(line_number: usize, line: impl Into<String>) -> Self {
        Self {
            line_number,
            line: line.into(),
        }
    }
}

/// All matching lines of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub entry: FileEntry,
    pub matches: Vec<LineMatch>,
}

/// Totals over a set of hits, for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    pub files_with_matches: usize,
    pub total_matches: usize,
}

impl SearchSummary {
    pub fn from_hits(hits: &[SearchHit]) -> Self {
        Self {
            files_with_matches: hits.len(),
            total_matches: hits.iter().map(|hit| hit.matches.len()).sum(),
        }
    }
}
