// ==========================================
// 门店货架空间规划 - 核心库
// ==========================================
// 核心: 货架段装箱规划（地面层全局装箱 + 逐层装箱）
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 规划规则
pub mod engine;

// 配置层 - 规划常量
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 调用边界
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CategoryKind, DistributionType, LevelNum, PlanBadge};

// 领域实体
pub use domain::{Aisle, Article, Level, Pair, Placement, PlanRequest, PlanResult, Section, Store};

// 引擎
pub use engine::{BinPlanner, PlanningMode, UnassignService};

// API
pub use api::{LayoutApi, PlanApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "门店货架空间规划";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
