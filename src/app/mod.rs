// ==========================================
// 门店货架空间规划 - 应用层
// ==========================================
// 职责: 由数据库路径装配仓储与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
