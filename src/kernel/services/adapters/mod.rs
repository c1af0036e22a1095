//! Service adapters: OS/runtime specific implementations (processes, files).

pub mod editor;
pub mod preview;
pub mod search;
pub mod settings;
pub mod storage;

pub use editor::{find_project_root, EditorLauncher, NavigationError, PROJECT_MARKERS};
pub use preview::PreviewTarget;
pub use search::{SearchLauncher, SearchSession};
pub use settings::{ensure_settings_file, get_settings_path, load_settings};
pub use storage::{
    ensure_log_dir, get_history_path, get_log_dir, load_history, save_history, StateError,
};
