use crate::kernel::buffer_search::normalize_line_breaks;
use crate::kernel::results::{parse_line, Location, Lookup, ResultIndex, ResultLine};
use crate::kernel::services::ports::{SearchMessage, SearchRequest, SessionStatus};
use ropey::Rope;
use std::path::PathBuf;

pub const TUTORIAL_TEXT: &str = "Tutorial: space=preview, enter=edit, p=edit parent project dir";

/// Display buffer plus the index of the session that filled it.
///
/// Buffer line `n` and index entry `n` always describe the same output line.
#[derive(Debug, Clone)]
pub struct SearchState {
    pub request: Option<SearchRequest>,
    pub active_search_id: Option<u64>,
    pub status: Option<SessionStatus>,
    pub exit_code: Option<i32>,
    pub last_error: Option<String>,
    pub dropped_stale: usize,
    buffer: Rope,
    index: ResultIndex,
}

/// What the status bar shows after a navigation or cursor move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub location: Option<Location>,
    pub extra_args: String,
}

impl StatusLine {
    pub fn location_text(&self) -> String {
        match &self.location {
            Some(loc) => format!("{} +{}", loc.path.display(), loc.line),
            None => "unavailable".to_string(),
        }
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.location_text())?;
        if !self.extra_args.is_empty() {
            write!(f, "  [{}]", self.extra_args)?;
        }
        Ok(())
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::with_banner(TUTORIAL_TEXT)
    }
}

impl SearchState {
    /// Buffer holding one unbound line that belongs to no session.
    pub fn with_banner(text: &str) -> Self {
        let mut state = Self {
            request: None,
            active_search_id: None,
            status: None,
            exit_code: None,
            last_error: None,
            dropped_stale: 0,
            buffer: Rope::new(),
            index: ResultIndex::detached(PathBuf::new()),
        };
        state.push_line(ResultLine::unbound(text));
        state
    }

    pub fn buffer(&self) -> &Rope {
        &self.buffer
    }

    pub fn index(&self) -> &ResultIndex {
        &self.index
    }

    pub fn line_count(&self) -> usize {
        self.index.len()
    }

    pub fn line_text(&self, buffer_line: usize) -> Option<String> {
        if buffer_line >= self.index.len() {
            return None;
        }
        let line = self.buffer.line(buffer_line).to_string();
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }

    pub fn is_searching(&self) -> bool {
        self.status == Some(SessionStatus::Running)
    }

    /// Replaces the display with an empty buffer owned by `search_id`.
    pub fn begin(&mut self, search_id: u64, request: SearchRequest) {
        self.index.freeze();
        self.index = ResultIndex::new(search_id, request.work_dir.clone());
        self.buffer = Rope::new();
        self.request = Some(request);
        self.active_search_id = Some(search_id);
        self.status = Some(SessionStatus::Running);
        self.exit_code = None;
        self.last_error = None;
    }

    pub fn fail_launch(&mut self, request: SearchRequest, message: String) {
        self.index.freeze();
        self.index = ResultIndex::detached(request.work_dir.clone());
        self.buffer = Rope::new();
        self.request = Some(request);
        self.active_search_id = None;
        self.status = Some(SessionStatus::Failed);
        self.exit_code = None;
        self.last_error = Some(message);
    }

    /// Detaches `search_id`: its index is frozen and later output is stale.
    pub fn mark_cancelled(&mut self, search_id: u64) -> bool {
        if self.active_search_id != Some(search_id) {
            return false;
        }
        self.active_search_id = None;
        self.index.freeze();
        if self.is_searching() {
            self.status = Some(SessionStatus::Cancelled);
        }
        true
    }

    pub fn apply_message(&mut self, msg: SearchMessage) -> bool {
        let search_id = msg.search_id();
        if self.active_search_id != Some(search_id) {
            self.dropped_stale += 1;
            tracing::trace!(search_id, active = ?self.active_search_id, "stale search output dropped");
            return false;
        }

        match msg {
            SearchMessage::Line { text, .. } => self.push_line(parse_line(&text)),
            SearchMessage::Complete { exit_code, .. } => {
                self.index.freeze();
                self.status = Some(SessionStatus::Completed);
                self.exit_code = exit_code;
                true
            }
            SearchMessage::Cancelled { .. } => {
                self.index.freeze();
                let changed = self.status != Some(SessionStatus::Cancelled);
                self.status = Some(SessionStatus::Cancelled);
                changed
            }
            SearchMessage::Failed { message, .. } => {
                self.index.freeze();
                self.status = Some(SessionStatus::Failed);
                self.last_error = Some(message);
                true
            }
        }
    }

    fn push_line(&mut self, line: ResultLine) -> bool {
        if self.index.append(&line).is_none() {
            return false;
        }
        // 缓冲区只允许 LF 断行，否则行号与索引错位
        let end = self.buffer.len_chars();
        self.buffer.insert(end, &normalize_line_breaks(&line.text));
        self.buffer.insert_char(self.buffer.len_chars(), '\n');
        true
    }

    pub fn lookup(&self, buffer_line: usize, relative: bool) -> Lookup {
        self.index.lookup(buffer_line, relative)
    }

    pub fn status_line(&self, cursor_line: usize, extra_args: &str) -> StatusLine {
        StatusLine {
            location: self.lookup(cursor_line, true).into_location(),
            extra_args: extra_args.to_string(),
        }
    }

    pub fn status_text(&self) -> String {
        match self.status {
            None => "Ready".to_string(),
            Some(SessionStatus::Running) => "Running".to_string(),
            Some(SessionStatus::Completed) => format!("Completed ({} lines)", self.line_count()),
            Some(SessionStatus::Cancelled) => "Cancelled".to_string(),
            Some(SessionStatus::Failed) => format!(
                "Failed: {}",
                self.last_error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/search.rs"]
mod tests;
