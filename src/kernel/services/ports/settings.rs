use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_tool")]
    pub tool: String,
    #[serde(default = "default_base_args")]
    pub base_args: Vec<String>,
    #[serde(default)]
    pub extra_args: String,
    #[serde(default = "default_extra_args_presets")]
    pub extra_args_presets: Vec<String>,
    #[serde(default = "default_editor")]
    pub editor: String,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_tool() -> String {
    "rg".to_string()
}

fn default_base_args() -> Vec<String> {
    ["--no-heading", "--with-filename", "--line-number", "--color", "never"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn default_extra_args_presets() -> Vec<String> {
    [
        "--files",
        "-m 5 --smart-case",
        "-M 1000",
        "-g *.cs -g *.csproj",
        "--no-ignore",
        "--context 2",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_editor() -> String {
    "code".to_string()
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            base_args: default_base_args(),
            extra_args: String::new(),
            extra_args_presets: default_extra_args_presets(),
            editor: default_editor(),
            history_limit: default_history_limit(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Settings {
    /// `GREPNAV_TOOL` / `GREPNAV_EDITOR` take precedence over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(tool) = non_empty_env("GREPNAV_TOOL") {
            self.tool = tool;
        }
        if let Some(editor) = non_empty_env("GREPNAV_EDITOR") {
            self.editor = editor;
        }
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/settings.rs"]
mod tests;
