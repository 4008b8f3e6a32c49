//! Archive reader strategies.
//!
//! Every supported container format implements [`ArchiveReader`], which exposes
//! exactly the two capabilities the engine needs: listing members and streaming
//! one member's bytes. [`open`] picks the strategy by sniffing the file
//! signature, so a `.zip` that is really a tar file still opens.
//!
//! Readers own their file handle. Dropping the boxed reader closes it, which
//! happens on every exit path of the calling frame.

mod sevenz;
mod tar;
mod zip;

pub use self::sevenz::SevenZArchiveReader;
pub use self::tar::TarArchiveReader;
pub use self::zip::ZipArchiveReader;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

use crate::errors::{SearchError, SearchResult};

const SIGNATURE_LEN: u64 = 512;
const ZIP_SIGNATURES: &[&[u8]] = &[b"PK\x03\x04", b"PK\x05\x06", b"PK\x07\x08"];
const SEVEN_Z_SIGNATURE: &[u8] = &[0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c];
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_MAGIC: &[u8] = b"ustar";

/// Container formats recognized by signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    SevenZ,
    Tar,
}

impl ArchiveFormat {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::SevenZ => "7z",
            Self::Tar => "tar",
        }
    }
}

/// Metadata of one archive member as stored in the container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
    pub is_directory: bool,
}

/// Visitor handed the decompressed byte stream of a single member
pub type EntryVisitor<'a> = dyn FnMut(&mut dyn Read) -> SearchResult<()> + 'a;

/// Visitor for batched reads: the index into the requested names, then the stream
pub type MemberVisitor<'a> = dyn FnMut(usize, &mut dyn Read) -> SearchResult<()> + 'a;

/// Shared capability of all archive formats
pub trait ArchiveReader {
    /// Format the reader was selected for
    fn format(&self) -> ArchiveFormat;

    /// Lists every member in container order. Only metadata is read, so
    /// members in a compression method this build cannot decode still list.
    fn list_entries(&mut self) -> SearchResult<Vec<ArchiveEntry>>;

    /// Streams, in one pass over the container, the first member matching each
    /// of `names` (ignoring case). `visit` receives the index of the requested
    /// name. Returns one flag per name telling whether it was found.
    fn read_entries(&mut self, names: &[&str], visit: &mut MemberVisitor<'_>) -> SearchResult<Vec<bool>>;

    /// Streams the first member whose name case-insensitively equals `name`
    /// into `visit`. Returns `false` when no member matched.
    fn read_entry(&mut self, name: &str, visit: &mut EntryVisitor<'_>) -> SearchResult<bool> {
        let found = self.read_entries(&[name], &mut |_, data: &mut dyn Read| visit(data))?;
        Ok(found[0])
    }
}

/// Tracks which requested member names a pass has already served
pub(crate) struct Wanted<'a> {
    names: &'a [&'a str],
    found: Vec<bool>,
    remaining: usize,
}

impl<'a> Wanted<'a> {
    pub(crate) fn new(names: &'a [&'a str]) -> Self {
        Self {
            names,
            found: vec![false; names.len()],
            remaining: names.len(),
        }
    }

    /// Index of the first unserved name matching `stored`, marking it served
    pub(crate) fn claim(&mut self, stored: &str) -> Option<usize> {
        let slot = (0..self.names.len())
            .find(|&i| !self.found[i] && names_match(stored, self.names[i]))?;
        self.found[slot] = true;
        self.remaining -= 1;
        Some(slot)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.remaining == 0
    }

    pub(crate) fn into_found(self) -> Vec<bool> {
        self.found
    }
}

/// Case-insensitive member name comparison
fn names_match(stored: &str, wanted: &str) -> bool {
    stored == wanted || stored.to_lowercase() == wanted.to_lowercase()
}

/// Detects the container format from the leading bytes of a file
pub fn detect_by_signature(header: &[u8]) -> Option<ArchiveFormat> {
    if ZIP_SIGNATURES.iter().any(|sig| header.starts_with(sig)) {
        Some(ArchiveFormat::Zip)
    } else if header.starts_with(SEVEN_Z_SIGNATURE) {
        Some(ArchiveFormat::SevenZ)
    } else if header.len() >= TAR_MAGIC_OFFSET + TAR_MAGIC.len()
        && &header[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + TAR_MAGIC.len()] == TAR_MAGIC
    {
        Some(ArchiveFormat::Tar)
    } else {
        None
    }
}

/// Reads the signature of `path` without consuming the handle
fn sniff(path: &Path, file: &mut File) -> SearchResult<ArchiveFormat> {
    let mut header = Vec::with_capacity(SIGNATURE_LEN as usize);
    file.by_ref()
        .take(SIGNATURE_LEN)
        .read_to_end(&mut header)
        .map_err(|e| SearchError::from_io(path, e))?;
    file.seek(SeekFrom::Start(0))
        .map_err(|e| SearchError::from_io(path, e))?;

    detect_by_signature(&header)
        .ok_or_else(|| SearchError::archive_read(path, "unrecognized archive signature"))
}

/// Opens `path` with the reader matching its signature
pub fn open(path: &Path) -> SearchResult<Box<dyn ArchiveReader>> {
    let mut file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
    let format = sniff(path, &mut file)?;
    debug!("Opening {} as {} archive", path.display(), format.name());

    Ok(match format {
        ArchiveFormat::Zip => Box::new(ZipArchiveReader::new(path, file)?),
        ArchiveFormat::SevenZ => Box::new(SevenZArchiveReader::new(path, file)?),
        ArchiveFormat::Tar => Box::new(TarArchiveReader::new(path, file)),
    })
}
