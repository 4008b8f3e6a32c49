//! Top-down filtered collection over directories and archives.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::entry::{EntryKind, FileEntry};
use crate::errors::SearchResult;
use crate::filters::SearchFilter;
use crate::traverse::list;

struct Walk<'a> {
    filter: &'a SearchFilter,
    visited: HashSet<PathBuf>,
    out: Vec<FileEntry>,
}

impl Walk<'_> {
    fn visit(&mut self, path: &Path) -> SearchResult<()> {
        let in_archive = classify(path) == EntryKind::Archive;
        if !in_archive {
            // symlinked directories can lead back to an ancestor
            let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if !self.visited.insert(canonical) {
                warn!("Skipping already visited directory {}", path.display());
                return Ok(());
            }
        }

        for entry in list(path)? {
            let child = entry.path();
            let descend = self.filter.recursive && entry.kind != EntryKind::File;

            if self.filter.accepts(&entry) {
                self.out.push(entry);
            }

            if !descend {
                continue;
            }
            if in_archive {
                debug!(
                    "Not descending into nested container {} (archive members are not on disk)",
                    child.display()
                );
                continue;
            }
            self.visit(&child)?;
        }
        Ok(())
    }
}

/// Collects the entries under `root` that satisfy `filter`.
///
/// Entries are returned in pre-order: a directory or archive precedes the
/// entries collected from inside it. Within one listing the order is whatever
/// the filesystem or archive reports; nothing is sorted here.
///
/// The filter decides which entries are returned, not which containers are
/// entered. With `recursive` set, every directory and archive found is
/// descended into even when the container itself is filtered out, so a name
/// filter such as `.*\.log` still reaches `sub/app.log`.
pub fn collect(root: &Path, filter: &SearchFilter) -> SearchResult<Vec<FileEntry>> {
    info!(
        "Collecting entries under {} (recursive: {})",
        root.display(),
        filter.recursive
    );

    let mut walk = Walk {
        filter,
        visited: HashSet::new(),
        out: Vec::new(),
    };
    walk.visit(root)?;

    info!("Collected {} entries under {}", walk.out.len(), root.display());
    Ok(walk.out)
}
