//! 搜索历史：目录历史与关键词历史
//!
//! 最近使用的排在最前，去重，超过上限时淘汰最久未用的条目。

use crate::kernel::services::ports::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Directory,
    Pattern,
}

/// Bounded MRU list of unique strings, most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryList {
    entries: Vec<String>,
    limit: usize,
}

impl HistoryList {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Builds a list from persisted entries (most recent first), dropping
    /// later duplicates and anything past the limit.
    pub fn from_entries<I, S>(entries: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new(limit);
        for entry in entries {
            let entry = entry.into();
            if entry.is_empty() || list.entries.contains(&entry) {
                continue;
            }
            if list.entries.len() >= list.limit {
                break;
            }
            list.entries.push(entry);
        }
        list
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn most_recent(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    /// Moves `value` to the front. Returns false for empty values and for
    /// values that already are the most recent entry.
    pub fn remember(&mut self, value: &str) -> bool {
        if value.is_empty() {
            return false;
        }
        if self.most_recent() == Some(value) {
            return false;
        }

        if let Some(pos) = self.entries.iter().position(|e| e == value) {
            let entry = self.entries.remove(pos);
            self.entries.insert(0, entry);
        } else {
            self.entries.insert(0, value.to_string());
            if self.entries.len() > self.limit {
                let evicted = self.entries.split_off(self.limit);
                tracing::debug!(evicted = evicted.len(), "history evicted");
            }
        }
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }
}

/// On-disk shape of `history.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFile {
    #[serde(default)]
    pub directories: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    directories: HistoryList,
    patterns: HistoryList,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            directories: HistoryList::new(limit),
            patterns: HistoryList::new(limit),
        }
    }

    pub fn from_file(file: HistoryFile, limit: usize) -> Self {
        Self {
            directories: HistoryList::from_entries(file.directories, limit),
            patterns: HistoryList::from_entries(file.patterns, limit),
        }
    }

    pub fn to_file(&self) -> HistoryFile {
        HistoryFile {
            directories: self.directories.as_slice().to_vec(),
            patterns: self.patterns.as_slice().to_vec(),
        }
    }

    pub fn list(&self, kind: HistoryKind) -> &HistoryList {
        match kind {
            HistoryKind::Directory => &self.directories,
            HistoryKind::Pattern => &self.patterns,
        }
    }

    fn list_mut(&mut self, kind: HistoryKind) -> &mut HistoryList {
        match kind {
            HistoryKind::Directory => &mut self.directories,
            HistoryKind::Pattern => &mut self.patterns,
        }
    }

    pub fn remember(&mut self, kind: HistoryKind, value: &str) -> bool {
        self.list_mut(kind).remember(value)
    }

    /// Most recent first.
    pub fn all(&self, kind: HistoryKind) -> Vec<&str> {
        self.list(kind).iter().collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/history.rs"]
mod tests;
