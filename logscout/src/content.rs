use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::archive;
use crate::classify::classify;
use crate::config::{EncodingMode, EngineConfig, MissingEntryPolicy};
use crate::entry::EntryKind;
use crate::errors::{SearchError, SearchResult};

/// Decodes the lines of one file under the configured encoding mode
pub(crate) struct LineDecoder<'a> {
    path: &'a Path,
    encoding_mode: EncodingMode,
    replaced: bool,
}

impl<'a> LineDecoder<'a> {
    pub(crate) fn new(path: &'a Path, encoding_mode: EncodingMode) -> Self {
        Self {
            path,
            encoding_mode,
            replaced: false,
        }
    }

    pub(crate) fn decode(&mut self, bytes: &[u8]) -> SearchResult<String> {
        match self.encoding_mode {
            EncodingMode::FailFast => match std::str::from_utf8(bytes) {
                Ok(valid) => Ok(valid.to_owned()),
                Err(_) => {
                    // Rebuild as FromUtf8Error so the error carries the offending bytes
                    let err = match String::from_utf8(bytes.to_vec()) {
                        Ok(_) => unreachable!("from_utf8 already rejected these bytes"),
                        Err(e) => e,
                    };
                    Err(SearchError::encoding_error(self.path, err))
                }
            },
            EncodingMode::Lossy => {
                let cow = String::from_utf8_lossy(bytes);
                if let Cow::Owned(_) = cow {
                    if !self.replaced {
                        warn!("Invalid UTF-8 replaced in file: {}", self.path.display());
                        self.replaced = true;
                    }
                }
                Ok(cow.into_owned())
            }
        }
    }
}

/// Removes one trailing `\n` or `\r\n`
pub(crate) fn strip_line_ending(mut line: &[u8]) -> &[u8] {
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Feeds every line of `reader` to `on_line`, one buffered line at a time.
/// A final line without a terminator still counts; a trailing newline does not
/// add an empty line.
pub(crate) fn stream_lines<R: BufRead>(
    mut reader: R,
    source: &Path,
    encoding_mode: EncodingMode,
    on_line: &mut dyn FnMut(String) -> SearchResult<()>,
) -> SearchResult<()> {
    let mut decoder = LineDecoder::new(source, encoding_mode);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| SearchError::from_io(source, e))?;
        if read == 0 {
            return Ok(());
        }
        on_line(decoder.decode(strip_line_ending(&buf))?)?;
    }
}

fn stream_file(
    path: &Path,
    encoding_mode: EncodingMode,
    on_line: &mut dyn FnMut(String) -> SearchResult<()>,
) -> SearchResult<()> {
    let file = File::open(path).map_err(|e| SearchError::from_io(path, e))?;
    stream_lines(BufReader::new(file), path, encoding_mode, on_line)
}

/// Streams the lines of a file addressed as `(path, entry_name)`.
///
/// * `path` is an archive: the first member whose name equals `entry_name`
///   ignoring case is decompressed and streamed.
/// * `path` is a directory: `path/entry_name` is opened.
/// * `path` is a file: `path` itself is opened and `entry_name` is ignored.
///
/// An archive without a matching member fails with
/// [`SearchError::EntryNotFound`] unless `config.missing_entry` is
/// [`MissingEntryPolicy::Empty`], in which case no lines are produced.
pub fn visit_lines(
    path: &Path,
    entry_name: &str,
    config: &EngineConfig,
    on_line: &mut dyn FnMut(String) -> SearchResult<()>,
) -> SearchResult<()> {
    let encoding_mode = config.encoding_mode;
    match classify(path) {
        EntryKind::Archive => {
            let mut reader = archive::open(path)?;
            let source: PathBuf = path.join(entry_name);
            let found = reader.read_entry(entry_name, &mut |data: &mut dyn Read| {
                stream_lines(BufReader::new(data), &source, encoding_mode, on_line)
            })?;
            if found {
                return Ok(());
            }
            match config.missing_entry {
                MissingEntryPolicy::Fail => Err(SearchError::entry_not_found(path, entry_name)),
                MissingEntryPolicy::Empty => {
                    debug!(
                        "No member {} in {}, yielding no lines",
                        entry_name,
                        path.display()
                    );
                    Ok(())
                }
            }
        }
        EntryKind::Directory => stream_file(&path.join(entry_name), encoding_mode, on_line),
        EntryKind::File => stream_file(path, encoding_mode, on_line),
    }
}

/// Reads every line of a file addressed as `(path, entry_name)`.
/// See [`visit_lines`] for how the pair is resolved.
pub fn read_lines(path: &Path, entry_name: &str, config: &EngineConfig) -> SearchResult<Vec<String>> {
    let mut lines = Vec::new();
    visit_lines(path, entry_name, config, &mut |line| {
        lines.push(line);
        Ok(())
    })?;
    Ok(lines)
}
