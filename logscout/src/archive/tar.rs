use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use super::{ArchiveEntry, ArchiveFormat, ArchiveReader, MemberVisitor, Wanted};
use crate::errors::{SearchError, SearchResult};

/// Reader for uncompressed tar streams.
///
/// A tar stream can only be walked forward once, so every operation reopens
/// the file. The handle sniffed by [`super::open`] is used for the first pass.
pub struct TarArchiveReader {
    path: PathBuf,
    pending: Option<File>,
}

impl TarArchiveReader {
    pub fn new(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            pending: Some(file),
        }
    }

    fn stream(&mut self) -> SearchResult<::tar::Archive<BufReader<File>>> {
        let file = match self.pending.take() {
            Some(file) => file,
            None => File::open(&self.path).map_err(|e| SearchError::from_io(&self.path, e))?,
        };
        Ok(::tar::Archive::new(BufReader::new(file)))
    }
}

impl ArchiveReader for TarArchiveReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Tar
    }

    fn list_entries(&mut self) -> SearchResult<Vec<ArchiveEntry>> {
        let path = self.path.clone();
        let corrupt = |e: std::io::Error| SearchError::archive_read(&path, e);

        let mut archive = self.stream()?;
        let mut entries = Vec::new();
        for member in archive.entries().map_err(corrupt)? {
            let member = member.map_err(corrupt)?;
            let header = member.header();
            entries.push(ArchiveEntry {
                name: String::from_utf8_lossy(&member.path_bytes()).into_owned(),
                size: header.size().map_err(corrupt)?,
                modified: UNIX_EPOCH + Duration::from_secs(header.mtime().map_err(corrupt)?),
                is_directory: header.entry_type().is_dir(),
            });
        }
        Ok(entries)
    }

    fn read_entries(&mut self, names: &[&str], visit: &mut MemberVisitor<'_>) -> SearchResult<Vec<bool>> {
        let path = self.path.clone();
        let corrupt = |e: std::io::Error| SearchError::archive_read(&path, e);

        let mut wanted = Wanted::new(names);
        let mut archive = self.stream()?;
        for member in archive.entries().map_err(corrupt)? {
            if wanted.is_done() {
                break;
            }
            let mut member = member.map_err(corrupt)?;
            let name = String::from_utf8_lossy(&member.path_bytes()).into_owned();
            if let Some(slot) = wanted.claim(&name) {
                visit(slot, &mut member)?;
            }
        }
        Ok(wanted.into_found())
    }
}
