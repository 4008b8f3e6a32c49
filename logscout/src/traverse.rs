//! Lists the immediate children of a directory, or the members of an archive,
//! as uniform [`FileEntry`] records.

use std::fs;
use std::path::Path;
use tracing::{debug, trace};

use crate::archive;
use crate::classify::classify;
use crate::entry::{container_of, EntryKind, FileEntry};
use crate::errors::{SearchError, SearchResult};

/// Builds an entry for an object on disk, reading its metadata now
fn entry_from_disk(path: &Path, container: &Path) -> SearchResult<FileEntry> {
    let metadata = fs::metadata(path).map_err(|e| SearchError::from_io(path, e))?;
    let modified = metadata
        .modified()
        .map_err(|e| SearchError::from_io(path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    Ok(FileEntry {
        name,
        container_path: container.to_path_buf(),
        modified,
        size: metadata.len(),
        kind: classify(path),
    })
}

fn list_directory(path: &Path) -> SearchResult<Vec<FileEntry>> {
    let mut entries = Vec::new();
    for child in fs::read_dir(path).map_err(|e| SearchError::from_io(path, e))? {
        let child = child.map_err(|e| SearchError::from_io(path, e))?;
        let entry = entry_from_disk(&child.path(), path)?;
        trace!("Listed {:?} {}", entry.kind, entry.path().display());
        entries.push(entry);
    }
    Ok(entries)
}

fn list_archive(path: &Path) -> SearchResult<Vec<FileEntry>> {
    let mut reader = archive::open(path)?;
    let members = reader.list_entries()?;
    debug!(
        "Archive {} ({}) holds {} entries",
        path.display(),
        reader.format().name(),
        members.len()
    );

    Ok(members
        .into_iter()
        .map(|member| {
            let kind = classify(&path.join(&member.name));
            FileEntry {
                name: member.name,
                container_path: path.to_path_buf(),
                modified: member.modified,
                size: member.size,
                kind,
            }
        })
        .collect())
}

/// Lists `path` as a sequence of entries.
///
/// Directories yield their children in the order the filesystem reports them,
/// archives yield their members in container order and a plain file yields a
/// single entry describing itself. A missing path is a
/// [`SearchError::FileNotFound`]; an unreadable archive is a
/// [`SearchError::ArchiveRead`].
pub fn list(path: &Path) -> SearchResult<Vec<FileEntry>> {
    match classify(path) {
        EntryKind::Directory => list_directory(path),
        EntryKind::Archive => list_archive(path),
        EntryKind::File => Ok(vec![entry_from_disk(path, &container_of(path))?]),
    }
}
