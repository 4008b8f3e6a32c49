use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::SearchError;

const KB: u64 = 1024;
const MB: u64 = KB * 1024;
const GB: u64 = MB * 1024;

/// What a path is, resolved once per traversal call by [`crate::classify::classify`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    Archive,
}

/// Uniform metadata record for a filesystem object or an archive member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// File name, or the member name for archive entries (may contain `/`)
    pub name: String,
    /// The directory or archive on disk holding this entry
    pub container_path: PathBuf,
    /// Last modification time as reported by the filesystem or the archive
    pub modified: SystemTime,
    /// Size in bytes (uncompressed size for archive members)
    pub size: u64,
    pub kind: EntryKind,
}

impl FileEntry {
    /// The real or synthetic path `container_path/name`
    pub fn path(&self) -> PathBuf {
        self.container_path.join(&self.name)
    }

    /// Whether the entry lives inside an archive rather than directly on disk
    pub fn is_archive_member(&self) -> bool {
        crate::classify::classify(&self.container_path) == EntryKind::Archive
    }

    /// Human readable size, truncated to the largest whole unit
    pub fn display_size(&self) -> String {
        display_size(self.size)
    }

    /// Modification time as an RFC 3339 timestamp with second precision
    pub fn display_modified(&self) -> String {
        let modified = if self.modified < UNIX_EPOCH {
            UNIX_EPOCH
        } else {
            self.modified
        };
        humantime::format_rfc3339_seconds(modified).to_string()
    }
}

/// Formats a byte count as "N GB", "N MB", "N KB" or "N bytes".
pub fn display_size(size: u64) -> String {
    if size / GB > 0 {
        format!("{} GB", size / GB)
    } else if size / MB > 0 {
        format!("{} MB", size / MB)
    } else if size / KB > 0 {
        format!("{} KB", size / KB)
    } else {
        format!("{} bytes", size)
    }
}

/// Ordering applied by the presentation layer; collection never sorts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMethod {
    Name,
    Size,
    Modified,
    Kind,
}

impl FromStr for SortMethod {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" | "filename" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            "modified" => Ok(Self::Modified),
            "kind" | "type" | "filetype" => Ok(Self::Kind),
            other => Err(SearchError::config_error(format!(
                "Unknown sort method: {}",
                other
            ))),
        }
    }
}

impl SortMethod {
    fn compare(self, a: &FileEntry, b: &FileEntry) -> Ordering {
        match self {
            Self::Name => a.name.cmp(&b.name),
            Self::Size => a.size.cmp(&b.size),
            Self::Modified => a.modified.cmp(&b.modified),
            Self::Kind => a.kind.cmp(&b.kind),
        }
    }
}

/// Stable sort of `entries` for display.
pub fn sort_entries(entries: &mut [FileEntry], method: SortMethod, descending: bool) {
    if descending {
        entries.sort_by(|a, b| method.compare(b, a));
    } else {
        entries.sort_by(|a, b| method.compare(a, b));
    }
}

pub(crate) fn container_of(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
