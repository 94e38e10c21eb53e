// ==========================================
// 门店货架空间规划 - 配置层
// ==========================================
// 职责: 规划常量默认值 + 数据库覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod planner_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use planner_config::PlannerConfig;
