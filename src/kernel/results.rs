//! 结果行解析与行号索引
//!
//! - `parse_line`: 把搜索工具输出的一行归类为匹配行（带位置）或装饰行
//! - `ResultIndex`: 显示行号 -> 源文件位置，随输出增量追加

use memchr::memchr_iter;
use std::path::{Component, Path, PathBuf};

/// A concrete source location. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// `path:line`, the locator handed to editors.
    pub fn locator(&self) -> String {
        format!("{}:{}", self.path.display(), self.line)
    }
}

/// One output line, classified. The buffer line number is assigned by
/// `ResultIndex::append`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub text: String,
    pub location: Option<Location>,
}

impl ResultLine {
    pub fn unbound(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            location: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.location.is_some()
    }
}

/// Best-effort classifier for `path:line:text` output. Never fails.
pub fn parse_line(raw: &str) -> ResultLine {
    let text = raw.trim_end_matches(['\n', '\r']);
    ResultLine {
        location: parse_location(text),
        text: text.to_string(),
    }
}

fn parse_location(text: &str) -> Option<Location> {
    let bytes = text.as_bytes();
    for sep in memchr_iter(b':', bytes) {
        if sep == 0 {
            continue;
        }
        let rest = &bytes[sep + 1..];
        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 || rest.get(digits) != Some(&b':') {
            continue;
        }

        // 形如匹配行但行号非法：按装饰行处理
        let line = text[sep + 1..sep + 1 + digits].parse::<usize>().ok()?;
        if line == 0 {
            return None;
        }
        return Some(Location::new(&text[..sep], line));
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Bound(Location),
    Unbound,
    NotYetAvailable,
}

impl Lookup {
    pub fn location(&self) -> Option<&Location> {
        match self {
            Lookup::Bound(loc) => Some(loc),
            _ => None,
        }
    }

    pub fn into_location(self) -> Option<Location> {
        match self {
            Lookup::Bound(loc) => Some(loc),
            _ => None,
        }
    }
}

/// Append-only map from displayed line number to source location.
///
/// Written only by the consumer that owns the display buffer. Once frozen
/// (its session was superseded or aborted) appends are rejected while
/// lookups keep answering for whatever is still on screen.
#[derive(Debug, Clone)]
pub struct ResultIndex {
    search_id: Option<u64>,
    work_dir: PathBuf,
    lines: Vec<Option<Location>>,
    frozen: bool,
}

impl ResultIndex {
    pub fn new(search_id: u64, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_id: Some(search_id),
            work_dir: normalize(&work_dir.into()),
            lines: Vec::new(),
            frozen: false,
        }
    }

    /// Index for buffer content that belongs to no session (banners).
    pub fn detached(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_id: None,
            work_dir: normalize(&work_dir.into()),
            lines: Vec::new(),
            frozen: false,
        }
    }

    pub fn search_id(&self) -> Option<u64> {
        self.search_id
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Records `line` and returns its buffer line number, or `None` if frozen.
    pub fn append(&mut self, line: &ResultLine) -> Option<usize> {
        if self.frozen {
            tracing::trace!(search_id = ?self.search_id, "append to frozen index dropped");
            return None;
        }
        let buffer_line = self.lines.len();
        self.lines.push(line.location.clone());
        Some(buffer_line)
    }

    pub fn match_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_some()).count()
    }

    pub fn lookup(&self, buffer_line: usize, relative: bool) -> Lookup {
        let Some(entry) = self.lines.get(buffer_line) else {
            return Lookup::NotYetAvailable;
        };
        let Some(loc) = entry else {
            return Lookup::Unbound;
        };

        let absolute = self.absolute_path(&loc.path);
        let path = if relative {
            absolute
                .strip_prefix(&self.work_dir)
                .map(Path::to_path_buf)
                .unwrap_or(absolute)
        } else {
            absolute
        };
        Lookup::Bound(Location::new(path, loc.line))
    }

    fn absolute_path(&self, path: &Path) -> PathBuf {
        normalize(&self.work_dir.join(path))
    }
}

// 去掉 `./` 片段，保证 strip_prefix 能命中
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/results.rs"]
mod tests;
