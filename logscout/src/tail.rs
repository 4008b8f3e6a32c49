//! Last-N-lines reader that scans backward from the end of a file.
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classify::classify;
use crate::config::EngineConfig;
use crate::content::LineDecoder;
use crate::entry::EntryKind;
use crate::errors::{SearchError, SearchResult};

/// Returned as the only line when asked to tail a file stored in an archive
pub const TAIL_UNSUPPORTED_MESSAGE: &str = "Tail is not supported for archived files";

/// `None` when the target lives inside (or is) an archive
fn resolve_target(path: &Path, entry_name: &str) -> Option<PathBuf> {
    match classify(path) {
        EntryKind::Archive => None,
        EntryKind::Directory => {
            let target = path.join(entry_name);
            (classify(&target) != EntryKind::Archive).then_some(target)
        }
        EntryKind::File => Some(path.to_path_buf()),
    }
}

/// Splits the last `max_lines` lines off the end of `data`, oldest first.
/// One trailing newline ends the last line rather than starting a new one.
fn last_lines(data: &[u8], max_lines: usize) -> Vec<&[u8]> {
    let mut end = data.len();
    if data.ends_with(b"\n") {
        end -= 1;
    }

    let mut lines = Vec::with_capacity(max_lines.min(1024));
    while lines.len() < max_lines {
        match data[..end].iter().rposition(|&b| b == b'\n') {
            Some(newline) => {
                lines.push(&data[newline + 1..end]);
                end = newline;
            }
            None => {
                lines.push(&data[..end]);
                break;
            }
        }
    }
    lines.reverse();
    lines
}

/// Returns up to `max_lines` lines from the end of a file, in file order.
///
/// `(path, entry_name)` resolves like [`crate::content::read_lines`]. Files
/// stored in an archive cannot be tailed; the result is then the single line
/// [`TAIL_UNSUPPORTED_MESSAGE`] rather than an error.
///
/// When `term` is given, lines of the window that do not contain it (ignoring
/// case) are dropped afterwards. The window is taken first, so this filters the
/// last `max_lines` lines and does not look further back for more matches.
pub fn tail(
    path: &Path,
    entry_name: &str,
    max_lines: usize,
    term: Option<&str>,
    config: &EngineConfig,
) -> SearchResult<Vec<String>> {
    let Some(target) = resolve_target(path, entry_name) else {
        debug!("Refusing to tail {} in archive {}", entry_name, path.display());
        return Ok(vec![TAIL_UNSUPPORTED_MESSAGE.to_string()]);
    };
    if classify(&target) == EntryKind::Directory {
        debug!("Tail target {} is a directory", target.display());
        return Err(SearchError::file_not_found(target));
    }
    info!("Tailing {} lines of {}", max_lines, target.display());

    let file = File::open(&target).map_err(|e| SearchError::from_io(&target, e))?;
    let len = file
        .metadata()
        .map_err(|e| SearchError::from_io(&target, e))?
        .len();
    if len == 0 || max_lines == 0 {
        return Ok(Vec::new());
    }

    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| SearchError::from_io(&target, e))?;
    let mut decoder = LineDecoder::new(&target, config.encoding_mode);
    let mut lines = last_lines(&mmap, max_lines)
        .into_iter()
        .map(|raw| decoder.decode(raw.strip_suffix(b"\r").unwrap_or(raw)))
        .collect::<SearchResult<Vec<_>>>()?;

    if let Some(term) = term {
        let needle = term.to_lowercase();
        lines.retain(|line| line.to_lowercase().contains(&needle));
    }
    debug!("Tail of {} produced {} lines", target.display(), lines.len());
    Ok(lines)
}
