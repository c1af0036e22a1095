//! 外部编辑器跳转
//!
//! - `code -g path:line` 打开文件并定位到行
//! - 向上查找项目标记文件，找到后以该目录为根打开

use crate::kernel::results::Location;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const PROJECT_MARKERS: [&str; 5] = ["package.json", "*.csproj", "*.fsproj", ".gitignore", "*.sln"];

#[derive(Debug)]
pub enum NavigationError {
    Io(io::Error),
    NoProject(PathBuf),
    LineOutOfRange { path: PathBuf, line: usize },
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::Io(e) => write!(f, "IO error: {}", e),
            NavigationError::NoProject(path) => {
                write!(f, "no project directory above {}", path.display())
            }
            NavigationError::LineOutOfRange { path, line } => {
                write!(f, "{} has no line {}", path.display(), line)
            }
        }
    }
}

impl std::error::Error for NavigationError {}

impl From<io::Error> for NavigationError {
    fn from(e: io::Error) -> Self {
        NavigationError::Io(e)
    }
}

fn marker_matches(marker: &str, file_name: &str) -> bool {
    match marker.strip_prefix('*') {
        Some(suffix) => file_name.len() > suffix.len() && file_name.ends_with(suffix),
        None => file_name == marker,
    }
}

fn dir_has_marker(dir: &Path, markers: &[&str]) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    let names: Vec<String> = entries
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    markers
        .iter()
        .any(|marker| names.iter().any(|name| marker_matches(marker, name)))
}

/// Walks the ancestors of `file` (starting at its parent directory) and
/// returns the first directory that contains a project marker.
pub fn find_project_root(file: &Path) -> Option<PathBuf> {
    find_project_root_with(file, &PROJECT_MARKERS)
}

pub fn find_project_root_with(file: &Path, markers: &[&str]) -> Option<PathBuf> {
    file.ancestors()
        .skip(1)
        .filter(|dir| !dir.as_os_str().is_empty())
        .find(|dir| dir_has_marker(dir, markers))
        .map(Path::to_path_buf)
}

pub struct EditorLauncher {
    program: String,
}

impl EditorLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn edit_args(&self, location: &Location) -> Vec<String> {
        vec!["-g".to_string(), location.locator()]
    }

    pub fn project_args(&self, root: &Path, location: &Location) -> Vec<String> {
        vec![
            root.display().to_string(),
            "-g".to_string(),
            location.locator(),
        ]
    }

    pub fn edit(&self, location: &Location) -> Result<(), NavigationError> {
        self.spawn(self.edit_args(location))
    }

    /// Returns the project directory the editor was opened in.
    pub fn open_project(&self, location: &Location) -> Result<PathBuf, NavigationError> {
        let root = find_project_root(&location.path)
            .ok_or_else(|| NavigationError::NoProject(location.path.clone()))?;
        self.spawn(self.project_args(&root, location))?;
        Ok(root)
    }

    // 不等待编辑器进程退出，由后台线程回收
    fn spawn(&self, args: Vec<String>) -> Result<(), NavigationError> {
        tracing::info!(program = %self.program, args = ?args, "launch editor");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        if let Err(e) = std::thread::Builder::new()
            .name("grepnav-editor-reaper".to_string())
            .spawn(move || {
                let _ = child.wait();
            })
        {
            tracing::warn!(error = %e, "spawn editor reaper thread failed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/editor.rs"]
mod tests;
