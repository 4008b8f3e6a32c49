use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, trace};

use super::{ArchiveEntry, ArchiveFormat, ArchiveReader, MemberVisitor, Wanted};
use crate::errors::{SearchError, SearchResult};

/// Reader for zip (and jar) containers.
///
/// Member metadata is read through the raw accessor, so only the member being
/// streamed needs a decoder for its compression method.
pub struct ZipArchiveReader {
    path: PathBuf,
    archive: ::zip::ZipArchive<BufReader<File>>,
}

impl ZipArchiveReader {
    pub fn new(path: &Path, file: File) -> SearchResult<Self> {
        let archive = ::zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| SearchError::archive_read(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive,
        })
    }

    fn member_name(&mut self, index: usize) -> SearchResult<String> {
        let member = self
            .archive
            .by_index_raw(index)
            .map_err(|e| SearchError::archive_read(&self.path, e))?;
        Ok(member.name().to_string())
    }
}

const SECS_PER_DAY: u64 = 24 * 60 * 60;

fn is_leap(year: u64) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: u64, month: u64) -> u64 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Days from 1970-01-01 to the given civil date (years from 1970 on)
fn days_since_epoch(year: u64, month: u64, day: u64) -> u64 {
    let years: u64 = (1970..year).map(|y| if is_leap(y) { 366 } else { 365 }).sum();
    let months: u64 = (1..month).map(|m| days_in_month(year, m)).sum();
    years + months + day - 1
}

/// Zip stores DOS local time without a zone; it is read as UTC. Fields out of
/// range (possible in hand-made archives) yield the epoch.
fn to_system_time(stamp: ::zip::DateTime) -> SystemTime {
    let (year, month, day) = (
        u64::from(stamp.year()),
        u64::from(stamp.month()),
        u64::from(stamp.day()),
    );
    let (hour, minute, second) = (
        u64::from(stamp.hour()),
        u64::from(stamp.minute()),
        u64::from(stamp.second()),
    );
    let valid = year >= 1970
        && (1..=12).contains(&month)
        && day >= 1
        && day <= days_in_month(year, month)
        && hour < 24
        && minute < 60
        && second < 60;
    if !valid {
        debug!(
            "Invalid zip timestamp {}-{}-{} {}:{}:{}, using the epoch",
            year, month, day, hour, minute, second
        );
        return UNIX_EPOCH;
    }

    let secs = days_since_epoch(year, month, day) * SECS_PER_DAY + hour * 3600 + minute * 60 + second;
    UNIX_EPOCH + Duration::from_secs(secs)
}

impl ArchiveReader for ZipArchiveReader {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Zip
    }

    fn list_entries(&mut self) -> SearchResult<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let member = self
                .archive
                .by_index_raw(index)
                .map_err(|e| SearchError::archive_read(&self.path, e))?;
            trace!("zip member {}: {}", index, member.name());
            entries.push(ArchiveEntry {
                name: member.name().to_string(),
                size: member.size(),
                modified: to_system_time(member.last_modified()),
                is_directory: member.is_dir(),
            });
        }
        Ok(entries)
    }

    fn read_entries(&mut self, names: &[&str], visit: &mut MemberVisitor<'_>) -> SearchResult<Vec<bool>> {
        let mut wanted = Wanted::new(names);
        for index in 0..self.archive.len() {
            if wanted.is_done() {
                break;
            }
            let name = self.member_name(index)?;
            let Some(slot) = wanted.claim(&name) else {
                continue;
            };
            let mut member = self.archive.by_index(index).map_err(|e| {
                SearchError::archive_read(&self.path, format!("member {}: {}", name, e))
            })?;
            visit(slot, &mut member)?;
        }
        Ok(wanted.into_found())
    }
}
