use rayon::prelude::*;
use std::collections::HashMap;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, trace};

use crate::archive;
use crate::collect::collect;
use crate::config::{EngineConfig, MissingEntryPolicy};
use crate::content::{stream_lines, visit_lines};
use crate::entry::{EntryKind, FileEntry};
use crate::errors::{SearchError, SearchResult};
use crate::filters::SearchFilter;
use crate::results::{LineMatch, SearchHit};

/// Expands a directory or archive into the File entries found anywhere below it.
///
/// This is how archives become searchable: [`search`] itself only reads
/// File entries and never lists a container.
pub fn flatten(path: &Path) -> SearchResult<Vec<FileEntry>> {
    let entries = collect(path, &SearchFilter::new().recursive(true))?;
    Ok(entries
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::File)
        .collect())
}

/// Line callback recording every line that contains `term`
fn line_matcher<'a>(
    term: &'a str,
    matches: &'a mut Vec<LineMatch>,
) -> impl FnMut(String) -> SearchResult<()> + 'a {
    let mut line_number = 0;
    move |line| {
        line_number += 1;
        if line.contains(term) {
            matches.push(LineMatch::new(line_number, line));
        }
        Ok(())
    }
}

/// Hits tagged with the position of their entry in the search input
type Tagged = Vec<(usize, SearchHit)>;

/// One parallel work item
enum ScanUnit<'a> {
    /// A file on disk
    Disk(usize, &'a FileEntry),
    /// Every requested member of one archive, read in a single pass
    Archive(&'a Path, Vec<(usize, &'a FileEntry)>),
}

fn plan<'a>(files: &[&'a FileEntry]) -> Vec<ScanUnit<'a>> {
    let mut units = Vec::new();
    let mut archives: HashMap<&Path, usize> = HashMap::new();
    for (position, &entry) in files.iter().enumerate() {
        if !entry.is_archive_member() {
            units.push(ScanUnit::Disk(position, entry));
            continue;
        }
        let container = entry.container_path.as_path();
        let slot = *archives.entry(container).or_insert_with(|| {
            units.push(ScanUnit::Archive(container, Vec::new()));
            units.len() - 1
        });
        if let ScanUnit::Archive(_, members) = &mut units[slot] {
            members.push((position, entry));
        }
    }
    units
}

fn scan_disk(position: usize, entry: &FileEntry, term: &str, config: &EngineConfig) -> SearchResult<Tagged> {
    let mut matches = Vec::new();
    visit_lines(
        &entry.container_path,
        &entry.name,
        config,
        &mut line_matcher(term, &mut matches),
    )?;
    trace!("{} matches in {}", matches.len(), entry.path().display());

    if matches.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![(
        position,
        SearchHit {
            entry: entry.clone(),
            matches,
        },
    )])
}

fn scan_archive(
    container: &Path,
    members: &[(usize, &FileEntry)],
    term: &str,
    config: &EngineConfig,
) -> SearchResult<Tagged> {
    // the same member may be requested more than once
    let mut names: Vec<&str> = Vec::new();
    let mut requests: Vec<Vec<(usize, &FileEntry)>> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    for &(position, entry) in members {
        let slot = *slots.entry(entry.name.as_str()).or_insert_with(|| {
            names.push(entry.name.as_str());
            requests.push(Vec::new());
            names.len() - 1
        });
        requests[slot].push((position, entry));
    }
    debug!(
        "Scanning {} members of {} in one pass",
        names.len(),
        container.display()
    );

    let mut reader = archive::open(container)?;
    let mut hits = Vec::new();
    let found = reader.read_entries(&names, &mut |slot, data: &mut dyn Read| {
        let source = container.join(names[slot]);
        let mut matches = Vec::new();
        stream_lines(
            BufReader::new(data),
            &source,
            config.encoding_mode,
            &mut line_matcher(term, &mut matches),
        )?;
        trace!("{} matches in {}", matches.len(), source.display());
        if !matches.is_empty() {
            for &(position, entry) in &requests[slot] {
                hits.push((
                    position,
                    SearchHit {
                        entry: entry.clone(),
                        matches: matches.clone(),
                    },
                ));
            }
        }
        Ok(())
    })?;

    for (slot, present) in found.into_iter().enumerate() {
        if present {
            continue;
        }
        match config.missing_entry {
            MissingEntryPolicy::Fail => return Err(SearchError::entry_not_found(container, names[slot])),
            MissingEntryPolicy::Empty => {
                debug!("No member {} in {}, no lines searched", names[slot], container.display());
            }
        }
    }
    Ok(hits)
}

/// Searches the File entries among `entries` for lines containing `term`.
///
/// Matching is a case-sensitive substring test and an empty term matches every
/// line. Directory and Archive entries are skipped; pass them through
/// [`flatten`] first to search inside them. Files without a matching line
/// produce no hit, and hits come back in the order of `entries`.
///
/// Work runs in parallel on a pool of `config.thread_count` threads. Files on
/// disk are scanned one by one, while all requested members of one archive are
/// read in a single pass over it, so solid 7z blocks are decompressed once per
/// search rather than once per member. The first read error aborts the search.
pub fn search(entries: &[FileEntry], term: &str, config: &EngineConfig) -> SearchResult<Vec<SearchHit>> {
    let files: Vec<&FileEntry> = entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::File)
        .collect();
    let units = plan(&files);
    info!(
        "Searching {} files in {} work units ({} entries given) for {:?}",
        files.len(),
        units.len(),
        entries.len(),
        term
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.thread_count.get())
        .build()
        .map_err(|e| SearchError::config_error(format!("cannot start search threads: {}", e)))?;

    let scanned: Vec<Tagged> = pool.install(|| {
        units
            .par_iter()
            .map(|unit| match unit {
                ScanUnit::Disk(position, entry) => scan_disk(*position, entry, term, config),
                ScanUnit::Archive(container, members) => scan_archive(container, members, term, config),
            })
            .collect::<SearchResult<Vec<_>>>()
    })?;

    let mut tagged: Tagged = scanned.into_iter().flatten().collect();
    tagged.sort_by_key(|(position, _)| *position);
    let hits: Vec<SearchHit> = tagged.into_iter().map(|(_, hit)| hit).collect();
    info!("Found matches in {} of {} files", hits.len(), files.len());
    Ok(hits)
}

/// Collects the entries under `root` that pass `filter`, then searches them for
/// `filter.content_term`. Without a content term there is nothing to look for
/// and the result is empty.
pub fn search_tree(root: &Path, filter: &SearchFilter, config: &EngineConfig) -> SearchResult<Vec<SearchHit>> {
    let Some(term) = filter.content_term.as_deref() else {
        debug!("No content term given, returning empty result");
        return Ok(Vec::new());
    };
    let entries = collect(root, filter)?;
    search(&entries, term, config)
}
