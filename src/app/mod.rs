//! 应用层：搜索编排与工作台

mod orchestrator;
mod runtime;
mod workbench;

pub use orchestrator::{SearchOrchestrator, MAX_SEARCH_DRAIN_PER_TICK};
pub use runtime::build_runtime;
pub use workbench::{NavigationAction, NavigationOutcome, Workbench};
