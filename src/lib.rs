//! grepnav - 搜索工具前端：启动外部搜索、解析输出并按行导航
//!
//! 模块结构：
//! - kernel: 无 IO 的核心（结果解析与索引、历史、缓冲区查找）与服务层
//! - app: 编排层（SearchOrchestrator, Workbench）

pub mod app;
pub mod kernel;
