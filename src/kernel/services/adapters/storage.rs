//! 应用数据目录与历史记录持久化
//!
//! 跨平台的数据目录：
//! - macOS: ~/Library/Application Support/grepnav/
//! - Linux: ~/.local/share/grepnav/
//! - Windows: %APPDATA%\grepnav\

use crate::kernel::history::{History, HistoryFile};
use std::io;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "grepnav";
const LOG_DIR: &str = "logs";
const HISTORY_FILE: &str = "history.json";

#[derive(Debug)]
pub enum StateError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateError::Io(e) => write!(f, "IO error: {}", e),
            StateError::Json(e) => write!(f, "Invalid JSON: {}", e),
        }
    }
}

impl std::error::Error for StateError {}

impl From<io::Error> for StateError {
    fn from(e: io::Error) -> Self {
        StateError::Io(e)
    }
}

impl From<serde_json::Error> for StateError {
    fn from(e: serde_json::Error) -> Self {
        StateError::Json(e)
    }
}

/// 获取应用数据目录
pub fn get_app_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME").ok().map(|home| {
            PathBuf::from(home)
                .join("Library/Application Support")
                .join(APP_NAME)
        })
    }

    #[cfg(target_os = "linux")]
    {
        // 优先使用 XDG_DATA_HOME，否则使用 ~/.local/share
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            Some(PathBuf::from(xdg).join(APP_NAME))
        } else {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".local/share").join(APP_NAME))
        }
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_NAME))
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

pub fn get_log_dir() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(LOG_DIR))
}

pub fn get_history_path() -> Option<PathBuf> {
    get_app_data_dir().map(|p| p.join(HISTORY_FILE))
}

/// 确保日志目录存在
pub fn ensure_log_dir() -> io::Result<PathBuf> {
    let dir = get_log_dir().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine log directory")
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }

    Ok(dir)
}

/// A missing file is an empty history, not an error.
pub fn load_history_from(path: &Path, limit: usize) -> Result<History, StateError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(History::new(limit)),
        Err(e) => return Err(e.into()),
    };
    let file: HistoryFile = serde_json::from_str(&data)?;
    Ok(History::from_file(file, limit))
}

/// 先写临时文件再 rename，避免写到一半的文件
pub fn save_history_to(path: &Path, history: &History) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&history.to_file())?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads the default history file, falling back to an empty history.
pub fn load_history(limit: usize) -> History {
    let Some(path) = get_history_path() else {
        return History::new(limit);
    };
    match load_history_from(&path, limit) {
        Ok(history) => history,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "load history failed");
            History::new(limit)
        }
    }
}

pub fn save_history(history: &History) -> Result<PathBuf, StateError> {
    let path = get_history_path().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, "Cannot determine data directory")
    })?;
    save_history_to(&path, history)?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/storage.rs"]
mod tests;
