use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};

/// How invalid UTF-8 in log content is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMode {
    /// Invalid UTF-8 aborts the read with an encoding error
    #[default]
    FailFast,
    /// Invalid sequences are replaced with U+FFFD
    Lossy,
}

/// What reading an archive member that does not exist produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingEntryPolicy {
    /// Report [`SearchError::EntryNotFound`]
    #[default]
    Fail,
    /// Legacy behaviour: an empty line sequence
    Empty,
}

/// Engine configuration.
///
/// Loaded from YAML, in increasing precedence:
/// 1. `$CONFIG_DIR/logscout/config.yaml`
/// 2. `.logscout.yaml` in the current directory
/// 3. a file given explicitly (e.g. `--config`)
///
/// ```yaml
/// root_path: "/var/log/myapp"
/// encoding_mode: "lossy"
/// missing_entry: "fail"
/// thread_count: 4
/// tail_lines: 200
/// log_level: "info"
/// ```
///
/// The root path is an explicit value the caller passes around; the engine
/// keeps no "current folder" of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory the caller browses and searches from
    pub root_path: PathBuf,

    /// Text decoding applied to every line read
    pub encoding_mode: EncodingMode,

    /// Behaviour of reading an absent archive member
    pub missing_entry: MissingEntryPolicy,

    /// Number of threads used to scan entries during a search
    pub thread_count: NonZeroUsize,

    /// Default tail window for callers that do not pass one
    pub tail_lines: usize,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

pub const DEFAULT_TAIL_LINES: usize = 100;

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("."),
            encoding_mode: EncodingMode::default(),
            missing_entry: MissingEntryPolicy::default(),
            thread_count: default_thread_count(),
            tail_lines: DEFAULT_TAIL_LINES,
            log_level: default_log_level(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from the default locations
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, layering `config_path` over the default locations.
    /// An explicit path that does not exist is an error.
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("logscout/config.yaml")),
            Some(PathBuf::from(".logscout.yaml")),
        ];
        for path in defaults.iter().flatten() {
            builder = builder.add_source(File::from(path.as_path()).required(false));
        }
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| SearchError::config_error(e.to_string()))
    }

    /// CLI values take precedence over config file values
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(root) = cli.root_path {
            self.root_path = root;
        }
        if let Some(mode) = cli.encoding_mode {
            self.encoding_mode = mode;
        }
        if let Some(policy) = cli.missing_entry {
            self.missing_entry = policy;
        }
        if let Some(threads) = cli.thread_count {
            self.thread_count = threads;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }
}

/// Values a command line may override; `None` keeps the file value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_path: Option<PathBuf>,
    pub encoding_mode: Option<EncodingMode>,
    pub missing_entry: Option<MissingEntryPolicy>,
    pub thread_count: Option<NonZeroUsize>,
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::write(
            &config_path,
            r#"
            root_path: "/var/log/app"
            encoding_mode: "lossy"
            missing_entry: "empty"
            thread_count: 3
            tail_lines: 25
            log_level: "debug"
        "#,
        )
        .unwrap();

        let config = EngineConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.root_path, PathBuf::from("/var/log/app"));
        assert_eq!(config.encoding_mode, EncodingMode::Lossy);
        assert_eq!(config.missing_entry, MissingEntryPolicy::Empty);
        assert_eq!(config.thread_count, NonZeroUsize::new(3).unwrap());
        assert_eq!(config.tail_lines, 25);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::write(&config_path, "tail_lines: 10\n").unwrap();

        let config = EngineConfig::load_from(Some(&config_path)).unwrap();
        assert_eq!(config.tail_lines, 10);
        assert_eq!(config.encoding_mode, EncodingMode::FailFast);
        assert_eq!(config.missing_entry, MissingEntryPolicy::Fail);
        assert_eq!(config.thread_count, default_thread_count());
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        fs::write(
            &config_path,
            "encoding_mode: \"utf16\"\nthread_count: \"many\"\n",
        )
        .unwrap();

        let err = EngineConfig::load_from(Some(&config_path)).unwrap_err();
        assert!(matches!(err, SearchError::ConfigError(_)));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = EngineConfig::load_from(Some(Path::new("does-not-exist.yaml")));
        assert!(matches!(result, Err(SearchError::ConfigError(_))));
    }

    #[test]
    fn test_merge_with_cli() {
        let file = EngineConfig {
            root_path: PathBuf::from("/var/log"),
            thread_count: NonZeroUsize::new(2).unwrap(),
            ..EngineConfig::default()
        };
        let merged = file.merge_with_cli(CliOverrides {
            root_path: Some(PathBuf::from("/srv/logs")),
            encoding_mode: Some(EncodingMode::Lossy),
            ..CliOverrides::default()
        });

        assert_eq!(merged.root_path, PathBuf::from("/srv/logs")); // CLI value
        assert_eq!(merged.encoding_mode, EncodingMode::Lossy); // CLI value
        assert_eq!(merged.thread_count, NonZeroUsize::new(2).unwrap()); // File value
        assert_eq!(merged.log_level, "warn");
    }
}
