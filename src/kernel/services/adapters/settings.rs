use crate::kernel::services::ports::settings::Settings;
use std::path::{Path, PathBuf};

const SETTINGS_DIR: &str = "grepnav";
const SETTINGS_FILE: &str = "settings.json";

pub fn get_settings_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(SETTINGS_DIR).join(SETTINGS_FILE))
}

pub fn ensure_settings_file() -> std::io::Result<PathBuf> {
    let path = get_settings_path().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Cannot determine settings directory",
        )
    })?;
    write_default_settings(&path)?;
    Ok(path)
}

/// Creates `path` with default settings unless it already exists.
pub fn write_default_settings(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        let content =
            serde_json::to_string_pretty(&Settings::default()).unwrap_or_else(|_| "{}".to_string());
        std::fs::write(path, content)?;
    }
    Ok(())
}

pub fn load_settings() -> Option<Settings> {
    let path = get_settings_path()?;
    load_settings_from(&path)
}

pub fn load_settings_from(path: &Path) -> Option<Settings> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid settings file");
            None
        }
    }
}

fn get_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support"));
    }

    #[cfg(target_os = "linux")]
    {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg));
        }
        return std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".config"));
    }

    #[cfg(target_os = "windows")]
    {
        return std::env::var("APPDATA").ok().map(PathBuf::from);
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/settings.rs"]
mod tests;
