use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use logscout::{
    collect, list, read_lines, search_tree, sort_entries, tail,
    config::{CliOverrides, EncodingMode, EngineConfig, MissingEntryPolicy},
    EntryKind, FileEntry, NameMatchMode, NameMatcher, SearchError, SearchFilter, SearchHit,
    SearchSummary, SortMethod,
};
use serde_json::json;
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    process,
    time::SystemTime,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over the default locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory that relative paths are resolved against
    #[arg(short = 'd', long, global = true)]
    root: Option<PathBuf>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long, global = true)]
    encoding: Option<String>,

    /// What reading an absent archive member yields (fail|empty)
    #[arg(long, global = true)]
    missing_entry: Option<String>,

    /// Number of threads to use for searching
    #[arg(short = 'j', long, global = true)]
    threads: Option<NonZeroUsize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct FilterArgs {
    /// Only entries whose name matches this pattern
    #[arg(short = 'n', long)]
    name: Option<String>,

    /// How --name is matched (substring|regex)
    #[arg(short = 'm', long = "match", default_value = "substring")]
    match_mode: String,

    /// Only entries modified at or after this time (RFC 3339, YYYY-MM-DD, or an age like 2d)
    #[arg(long, value_parser = parse_time)]
    from: Option<SystemTime>,

    /// Only entries modified at or before this time
    #[arg(long, value_parser = parse_time)]
    to: Option<SystemTime>,

    /// Descend into sub-directories and archives
    #[arg(short = 'R', long)]
    recursive: bool,
}

#[derive(Args)]
struct DisplayArgs {
    /// Sort order (name|size|modified|kind)
    #[arg(short = 's', long, default_value = "name")]
    sort: String,

    /// Reverse the sort order
    #[arg(long)]
    desc: bool,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the children of a directory or the members of an archive
    List {
        /// Directory, archive or file (relative to the root)
        path: Option<PathBuf>,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Find entries by name and modification time
    Find {
        path: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Search file contents (case-sensitive); archives are searched with -R
    Search {
        /// Text to look for; an empty string matches every line
        term: String,

        path: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Show only statistics, not matches
        #[arg(long)]
        stats: bool,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print every line of a file or archive member
    Cat {
        /// Directory or archive holding the file, or the file itself
        path: PathBuf,

        /// File name inside the directory or archive
        entry: Option<String>,
    },

    /// Print the last lines of a file
    Tail {
        path: PathBuf,

        entry: Option<String>,

        /// Number of lines (defaults to tail_lines from the configuration)
        #[arg(short = 'n', long)]
        lines: Option<usize>,

        /// Keep only lines containing this text, ignoring case
        #[arg(short = 't', long)]
        term: Option<String>,
    },
}

fn parse_time(value: &str) -> std::result::Result<SystemTime, String> {
    if let Ok(time) = humantime::parse_rfc3339_weak(value) {
        return Ok(time);
    }
    if let Ok(time) = humantime::parse_rfc3339_weak(&format!("{} 00:00:00", value)) {
        return Ok(time);
    }
    humantime::parse_duration(value)
        .map(|age| SystemTime::now() - age)
        .map_err(|_| format!("invalid time '{}': expected a date, timestamp or age", value))
}

fn parse_encoding(value: &str) -> Result<EncodingMode, SearchError> {
    match value.to_lowercase().as_str() {
        "failfast" => Ok(EncodingMode::FailFast),
        "lossy" => Ok(EncodingMode::Lossy),
        other => Err(SearchError::config_error(format!(
            "unknown encoding mode '{}' (expected failfast or lossy)",
            other
        ))),
    }
}

fn parse_missing_entry(value: &str) -> Result<MissingEntryPolicy, SearchError> {
    match value.to_lowercase().as_str() {
        "fail" => Ok(MissingEntryPolicy::Fail),
        "empty" => Ok(MissingEntryPolicy::Empty),
        other => Err(SearchError::config_error(format!(
            "unknown missing-entry policy '{}' (expected fail or empty)",
            other
        ))),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve(root: &Path, path: Option<&Path>) -> PathBuf {
    match path {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => root.join(path),
        None => root.to_path_buf(),
    }
}

impl FilterArgs {
    fn to_filter(&self) -> Result<SearchFilter> {
        let mut filter = SearchFilter::new()
            .modified_between(self.from, self.to)
            .recursive(self.recursive);
        if let Some(pattern) = &self.name {
            let mode: NameMatchMode = self.match_mode.parse()?;
            filter = filter.with_name(NameMatcher::new(pattern, mode)?);
        }
        Ok(filter)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        root_path: cli.root.clone(),
        encoding_mode: cli.encoding.as_deref().map(parse_encoding).transpose()?,
        missing_entry: cli.missing_entry.as_deref().map(parse_missing_entry).transpose()?,
        thread_count: cli.threads,
        log_level: cli.log_level.clone(),
    };
    let config = EngineConfig::load_from(cli.config.as_deref())
        .context("failed to load configuration")?
        .merge_with_cli(overrides);
    init_logging(&config.log_level);

    let root = config.root_path.clone();
    match cli.command {
        Commands::List { path, display } => {
            let entries = list(&resolve(&root, path.as_deref()))?;
            print_entries(entries, &display)
        }
        Commands::Find {
            path,
            filter,
            display,
        } => {
            let entries = collect(&resolve(&root, path.as_deref()), &filter.to_filter()?)?;
            print_entries(entries, &display)
        }
        Commands::Search {
            term,
            path,
            filter,
            stats,
            json,
        } => {
            let filter = filter.to_filter()?.with_content(term);
            let hits = search_tree(&resolve(&root, path.as_deref()), &filter, &config)?;
            print_search_results(&hits, stats, json)
        }
        Commands::Cat { path, entry } => {
            let lines = read_lines(
                &resolve(&root, Some(path.as_path())),
                entry.as_deref().unwrap_or_default(),
                &config,
            )?;
            lines.iter().for_each(|line| println!("{}", line));
            Ok(())
        }
        Commands::Tail {
            path,
            entry,
            lines,
            term,
        } => {
            let lines = tail(
                &resolve(&root, Some(path.as_path())),
                entry.as_deref().unwrap_or_default(),
                lines.unwrap_or(config.tail_lines),
                term.as_deref(),
                &config,
            )?;
            lines.iter().for_each(|line| println!("{}", line));
            Ok(())
        }
    }
}

fn print_entries(mut entries: Vec<FileEntry>, display: &DisplayArgs) -> Result<()> {
    let method: SortMethod = display.sort.parse()?;
    sort_entries(&mut entries, method, display.desc);

    if display.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        let kind = match entry.kind {
            EntryKind::File => "file".normal(),
            EntryKind::Directory => "dir".blue(),
            EntryKind::Archive => "archive".magenta(),
        };
        println!(
            "{:<8} {:>10}  {}  {}",
            kind,
            entry.display_size(),
            entry.display_modified(),
            entry.path().display()
        );
    }
    println!("\n{} entries", entries.len());
    Ok(())
}

fn print_search_results(hits: &[SearchHit], stats_only: bool, as_json: bool) -> Result<()> {
    let summary = SearchSummary::from_hits(hits);

    if as_json {
        let output = if stats_only {
            json!({ "summary": summary })
        } else {
            json!({ "hits": hits, "summary": summary })
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if !stats_only {
        for hit in hits {
            println!(
                "\n{} ({} hit)",
                hit.entry.path().display().to_string().blue(),
                hit.matches.len()
            );
            for m in &hit.matches {
                println!("{}: {}", m.line_number.to_string().green(), m.line);
            }
        }
        println!();
    }

    println!(
        "Found {} matches in {} files",
        summary.total_matches, summary.files_with_matches
    );
    Ok(())
}
