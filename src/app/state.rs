// ==========================================
// 门店货架空间规划 - 应用状态
// ==========================================
// 职责: 打开数据库、建表，并装配共享的仓储与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{LayoutApi, PlanApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::PlannerRepositories;

/// 应用状态
///
/// 所有仓储共享同一个连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 规划 API
    pub plan_api: Arc<PlanApi>,

    /// 布局 API
    pub layout_api: Arc<LayoutApi>,

    /// 规划引擎仓储（商品导入等直接数据访问）
    pub repos: PlannerRepositories,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开连接并应用统一 PRAGMA
    /// 2. 幂等建表
    /// 3. 创建仓储与 API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let repos = PlannerRepositories::from_connection(conn.clone());
        let config_manager = Arc::new(ConfigManager::from_connection(conn));

        let plan_api = Arc::new(PlanApi::new(repos.clone(), config_manager.clone()));
        let layout_api = Arc::new(LayoutApi::new(repos.layout_repo.clone()));

        tracing::info!("AppState初始化完成");
        Ok(Self {
            db_path,
            plan_api,
            layout_api,
            repos,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 STORE_SPACE_PLANNER_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("STORE_SPACE_PLANNER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./store_space_planner.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("store-space-planner");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("store_space_planner.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_state_initializes_schema() {
        let file = NamedTempFile::new().unwrap();
        let db_path = file.path().to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);

        let store = state.layout_api.create_store(42, Some("Malmo")).unwrap();
        assert_eq!(store.store_num, 42);
        assert!(state.config_manager.load_planner_config().is_ok());
    }
}
