use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, SearchError>;

/// Why a search process could not be started.
#[derive(Debug)]
pub enum LaunchFailure {
    ToolNotFound { program: String },
    InvalidWorkDir(PathBuf),
    Spawn { program: String, message: String },
    MissingPipe(&'static str),
}

impl std::fmt::Display for LaunchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchFailure::ToolNotFound { program } => {
                write!(f, "search tool not found: {}", program)
            }
            LaunchFailure::InvalidWorkDir(dir) => {
                write!(f, "not a directory: {}", dir.display())
            }
            LaunchFailure::Spawn { program, message } => {
                write!(f, "failed to start {}: {}", program, message)
            }
            LaunchFailure::MissingPipe(which) => write!(f, "{} pipe unavailable", which),
        }
    }
}

#[derive(Debug)]
pub enum SearchError {
    Launch(LaunchFailure),
    Io(io::Error),
}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchError::Launch(e) => write!(f, "Launch failed: {}", e),
            SearchError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<io::Error> for SearchError {
    fn from(e: io::Error) -> Self {
        SearchError::Io(e)
    }
}

impl From<LaunchFailure> for SearchError {
    fn from(e: LaunchFailure) -> Self {
        SearchError::Launch(e)
    }
}

/// Immutable snapshot of the parameters of one search invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub work_dir: PathBuf,
    pub pattern: String,
    pub extra_args: String,
}

impl SearchRequest {
    pub fn new(
        work_dir: impl Into<PathBuf>,
        pattern: impl Into<String>,
        extra_args: impl Into<String>,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            pattern: pattern.into(),
            extra_args: extra_args.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Extra arguments split on whitespace. No quoting, no shell expansion.
    pub fn extra_arg_tokens(&self) -> impl Iterator<Item = &str> {
        self.extra_args.split_whitespace()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMessage {
    Line {
        search_id: u64,
        stream: OutputStream,
        text: String,
    },
    Complete {
        search_id: u64,
        exit_code: Option<i32>,
    },
    Cancelled {
        search_id: u64,
    },
    Failed {
        search_id: u64,
        message: String,
    },
}

impl SearchMessage {
    pub fn search_id(&self) -> u64 {
        match self {
            SearchMessage::Line { search_id, .. }
            | SearchMessage::Complete { search_id, .. }
            | SearchMessage::Cancelled { search_id }
            | SearchMessage::Failed { search_id, .. } => *search_id,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SearchMessage::Line { .. })
    }
}
