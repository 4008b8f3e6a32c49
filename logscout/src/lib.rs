pub mod archive;
pub mod classify;
pub mod collect;
pub mod config;
pub mod content;
pub mod entry;
pub mod errors;
pub mod filters;
pub mod results;
pub mod search;
pub mod tail;
pub mod traverse;

pub use classify::classify;
pub use collect::collect;
pub use config::{EncodingMode, EngineConfig, MissingEntryPolicy};
pub use content::{read_lines, visit_lines};
pub use entry::{display_size, sort_entries, EntryKind, FileEntry, SortMethod};
pub use errors::{SearchError, SearchResult};
pub use filters::{ModifiedRange, NameMatchMode, NameMatcher, SearchFilter};
pub use results::{LineMatch, SearchHit, SearchSummary};
pub use search::{flatten, search, search_tree};
pub use tail::{tail, TAIL_UNSUPPORTED_MESSAGE};
pub use traverse::list;
