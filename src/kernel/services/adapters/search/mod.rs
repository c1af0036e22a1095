//! 搜索服务模块
//!
//! - SearchLauncher: 启动外部搜索工具并逐行回传输出
//! - SearchSession: 单次搜索的句柄（序号、状态、取消）

mod launcher;

pub use launcher::{SearchLauncher, SearchSession};
