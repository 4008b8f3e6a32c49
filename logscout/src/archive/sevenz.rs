use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use sevenz_rust::{Password, SevenZReader};

use super::{ArchiveEntry, ArchiveFormat, ArchiveReader, MemberVisitor, Wanted};
use crate::errors::{SearchError, SearchResult};

/// Dedicated reader for the 7z container
pub struct SevenZArchiveReader {
    path: PathBuf,
    reader: SevenZReader<File>,
}

impl SevenZArchiveReader {
    pub fn new(path: &Path, file: File) -> SearchResult<Self> {
        let len = file
            .metadata()
            .map_err(|e| SearchError::from_io(path, e))?
            .len();
        let reader = SevenZReader::new(file, len, Password::empty())
            .map_err(|e| SearchError::archive_read(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
        })
    }
}

impl ArchiveReader for SevenZArchiveReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::SevenZ
    }

    fn list_entries(&mut self) -> SearchResult<Vec<ArchiveEntry>> {
        Ok(self
            .reader
            .archive()
            .files
            .iter()
            .map(|entry| ArchiveEntry {
                name: entry.name().to_string(),
                size: entry.size(),
                modified: if entry.has_last_modified_date {
                    entry.last_modified_date().into()
                } else {
                    UNIX_EPOCH
                },
                is_directory: entry.is_directory(),
            })
            .collect())
    }

    /// 7z members in a solid block decode sequentially, so every member
    /// before the last requested one is decompressed. Requesting all wanted
    /// names in one call keeps a whole-archive scan to a single pass.
    fn read_entries(&mut self, names: &[&str], visit: &mut MemberVisitor<'_>) -> SearchResult<Vec<bool>> {
        let mut wanted = Wanted::new(names);
        let mut visit_error: Option<SearchError> = None;

        let outcome = self.reader.for_each_entries(|entry, data| {
            if wanted.is_done() {
                return Ok(false);
            }
            let Some(slot) = wanted.claim(entry.name()) else {
                io::copy(data, &mut io::sink())?;
                return Ok(true);
            };
            if let Err(e) = visit(slot, data) {
                visit_error = Some(e);
                return Ok(false);
            }
            Ok(!wanted.is_done())
        });

        if let Some(e) = visit_error {
            return Err(e);
        }
        outcome.map_err(|e| SearchError::archive_read(&self.path, e))?;
        Ok(wanted.into_found())
    }
}
