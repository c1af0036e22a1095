//! 预览：读取整个文件并定位到目标行
//!
//! 渲染由外部负责，这里只给出文本、行首位置和行内第一个关键词命中。

use super::editor::NavigationError;
use crate::kernel::buffer_search::{
    find_next, normalize_line_breaks, BufferMatch, SearchDirection,
};
use crate::kernel::results::Location;
use ropey::Rope;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PreviewTarget {
    pub path: PathBuf,
    pub line: usize,
    pub text: Rope,
    /// Char offset of the start of `line`.
    pub line_start: usize,
    /// First occurrence of the search pattern at or after `line_start`.
    pub highlight: Option<BufferMatch>,
}

impl PreviewTarget {
    pub fn load(location: &Location, pattern: Option<&str>) -> Result<Self, NavigationError> {
        let data = std::fs::read(&location.path)?;
        // 搜索工具只按 LF 计行
        let text = Rope::from_str(&normalize_line_breaks(&String::from_utf8_lossy(&data)));
        Self::from_rope(location, text, pattern)
    }

    pub fn from_rope(
        location: &Location,
        text: Rope,
        pattern: Option<&str>,
    ) -> Result<Self, NavigationError> {
        let line_idx = location.line.saturating_sub(1);
        if location.line == 0 || line_idx >= text.len_lines() {
            return Err(NavigationError::LineOutOfRange {
                path: location.path.clone(),
                line: location.line,
            });
        }

        let line_start = text.line_to_char(line_idx);
        let highlight = pattern
            .and_then(|p| find_next(&text, line_start, p, SearchDirection::Forward));

        Ok(Self {
            path: location.path.clone(),
            line: location.line,
            text,
            line_start,
            highlight,
        })
    }

    /// 0-based first line of a window of `height` lines centred on the target.
    pub fn window_start(&self, height: usize) -> usize {
        let target = self.line.saturating_sub(1);
        let half = height / 2;
        let max_start = self.text.len_lines().saturating_sub(height);
        target.saturating_sub(half).min(max_start)
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/preview.rs"]
mod tests;
