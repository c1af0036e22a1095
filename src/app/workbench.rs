//! 工作台：持有用户输入（目录、模式、额外参数）与历史
//!
//! 职责：
//! - 提交时生成不可变的 SearchRequest 快照并交给编排器
//! - 提交成功后记录并持久化历史
//! - 把结果行解析为位置，分发预览/编辑/打开项目
//! - 结果缓冲区内查找（带回绕）

use super::orchestrator::SearchOrchestrator;
use crate::kernel::buffer_search::{find_wrapping, SearchDirection, WrappedMatch};
use crate::kernel::history::{History, HistoryKind};
use crate::kernel::results::{Location, Lookup};
use crate::kernel::search::{SearchState, StatusLine};
use crate::kernel::services::adapters::storage::save_history_to;
use crate::kernel::services::adapters::{
    EditorLauncher, NavigationError, PreviewTarget, SearchLauncher,
};
use crate::kernel::services::ports::{SearchError, SearchRequest, Settings};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationAction {
    Preview,
    Edit,
    OpenProject,
}

#[derive(Debug)]
pub enum NavigationOutcome {
    Previewed(PreviewTarget),
    Edited(Location),
    OpenedProject { root: PathBuf, location: Location },
    /// The line carries no location; nothing was launched.
    Skipped(Lookup),
}

pub struct Workbench {
    settings: Settings,
    work_dir: PathBuf,
    pattern: String,
    extra_args: String,
    history: History,
    history_path: Option<PathBuf>,
    orchestrator: SearchOrchestrator,
    editor: EditorLauncher,
    cursor_line: usize,
    find_offset: usize,
}

impl Workbench {
    pub fn new(
        runtime: tokio::runtime::Handle,
        settings: Settings,
        history: History,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        let launcher = SearchLauncher::from_settings(runtime, &settings);
        let orchestrator = SearchOrchestrator::new(launcher, settings.channel_capacity);
        let editor = EditorLauncher::new(settings.editor.clone());
        let extra_args = settings.extra_args.clone();

        Self {
            settings,
            work_dir: work_dir.into(),
            pattern: String::new(),
            extra_args,
            history,
            history_path: None,
            orchestrator,
            editor,
            cursor_line: 0,
            find_offset: 0,
        }
    }

    /// Persist history to `path` after every successful submission.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn set_work_dir(&mut self, dir: impl Into<PathBuf>) {
        self.work_dir = dir.into();
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn set_pattern(&mut self, pattern: impl Into<String>) {
        self.pattern = pattern.into();
    }

    pub fn extra_args(&self) -> &str {
        &self.extra_args
    }

    pub fn set_extra_args(&mut self, extra_args: impl Into<String>) {
        self.extra_args = extra_args.into();
    }

    pub fn presets(&self) -> &[String] {
        &self.settings.extra_args_presets
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn orchestrator(&self) -> &SearchOrchestrator {
        &self.orchestrator
    }

    pub fn state(&self) -> &SearchState {
        self.orchestrator.state()
    }

    pub fn cursor_line(&self) -> usize {
        self.cursor_line
    }

    pub fn snapshot(&self) -> SearchRequest {
        SearchRequest::new(
            self.work_dir.clone(),
            self.pattern.clone(),
            self.extra_args.clone(),
        )
    }

    pub fn submit(&mut self) -> Result<u64, SearchError> {
        let request = self.snapshot();
        let search_id = self.orchestrator.launch(request)?;
        self.cursor_line = 0;
        self.find_offset = 0;

        let dir = self.work_dir.display().to_string();
        self.history.remember(HistoryKind::Directory, &dir);
        self.history.remember(HistoryKind::Pattern, &self.pattern);
        self.persist_history();
        Ok(search_id)
    }

    fn persist_history(&self) {
        let Some(path) = self.history_path.as_deref() else {
            return;
        };
        if let Err(e) = save_history_to(path, &self.history) {
            tracing::warn!(path = %path.display(), error = %e, "save history failed");
        }
    }

    pub fn abort(&mut self) -> bool {
        self.orchestrator.abort_active()
    }

    /// 由主循环调用
    pub fn tick(&mut self) -> bool {
        self.orchestrator.pump()
    }

    pub fn wait_for_search(&mut self, timeout: Duration) -> bool {
        self.orchestrator.pump_until_finished(timeout)
    }

    pub fn status_line(&self) -> StatusLine {
        self.state().status_line(self.cursor_line, &self.extra_args)
    }

    pub fn set_cursor_line(&mut self, buffer_line: usize) -> StatusLine {
        self.cursor_line = buffer_line;
        let buffer = self.state().buffer();
        let line = buffer_line.min(buffer.len_lines().saturating_sub(1));
        self.find_offset = buffer.line_to_char(line);
        self.status_line()
    }

    pub fn navigate(
        &mut self,
        action: NavigationAction,
        buffer_line: usize,
    ) -> Result<NavigationOutcome, NavigationError> {
        self.set_cursor_line(buffer_line);
        let location = match self.state().lookup(buffer_line, false) {
            Lookup::Bound(location) => location,
            other => {
                tracing::debug!(buffer_line, ?action, "navigation on line without location");
                return Ok(NavigationOutcome::Skipped(other));
            }
        };

        match action {
            NavigationAction::Preview => {
                let pattern = self
                    .state()
                    .request
                    .as_ref()
                    .map(|r| r.pattern.as_str())
                    .filter(|p| !p.is_empty());
                PreviewTarget::load(&location, pattern).map(NavigationOutcome::Previewed)
            }
            NavigationAction::Edit => {
                self.editor.edit(&location)?;
                Ok(NavigationOutcome::Edited(location))
            }
            NavigationAction::OpenProject => {
                let root = self.editor.open_project(&location)?;
                Ok(NavigationOutcome::OpenedProject { root, location })
            }
        }
    }

    /// Finds `text` in the result buffer from the last find position, wrapping
    /// at the boundary. The cursor moves to the matched line.
    pub fn find_in_buffer(
        &mut self,
        text: &str,
        direction: SearchDirection,
    ) -> Option<WrappedMatch> {
        let hit = find_wrapping(self.state().buffer(), self.find_offset, text, direction)?;
        self.cursor_line = hit.found.line;
        self.find_offset = match direction {
            SearchDirection::Forward => hit.found.end,
            SearchDirection::Backward => hit.found.start,
        };
        Some(hit)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/app/workbench.rs"]
mod tests;
