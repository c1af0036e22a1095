//! Service ports: data contracts shared by the kernel and the adapters.

pub mod search;
pub mod settings;

pub use search::{
    LaunchFailure, OutputStream, SearchError, SearchMessage, SearchRequest, SessionStatus,
};
pub use settings::{Settings, DEFAULT_HISTORY_LIMIT};
