//! Headless core: output parsing, result index, history and buffer search.

pub mod buffer_search;
pub mod history;
pub mod results;
pub mod search;
pub mod services;

pub use buffer_search::{
    find_next, find_wrapping, normalize_line_breaks, BufferMatch, SearchDirection, WrappedMatch,
};
pub use history::{History, HistoryFile, HistoryKind, HistoryList};
pub use results::{parse_line, Location, Lookup, ResultIndex, ResultLine};
pub use search::{SearchState, StatusLine, TUTORIAL_TEXT};
