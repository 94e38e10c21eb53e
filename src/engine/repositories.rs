// ==========================================
// 门店货架空间规划 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合规划引擎所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ArticleRepository, LayoutRepository, LevelRepository, PlacementRepository,
};

/// 规划引擎仓储集合
///
/// # 包含的仓储
/// - `article_repo`: 商品
/// - `layout_repo`: 门店 / 货架对 / 货架段 / 货架格
/// - `level_repo`: 层板
/// - `placement_repo`: 货位分配 + 批次提交
#[derive(Clone)]
pub struct PlannerRepositories {
    pub article_repo: Arc<ArticleRepository>,
    pub layout_repo: Arc<LayoutRepository>,
    pub level_repo: Arc<LevelRepository>,
    pub placement_repo: Arc<PlacementRepository>,
}

impl PlannerRepositories {
    pub fn new(
        article_repo: Arc<ArticleRepository>,
        layout_repo: Arc<LayoutRepository>,
        level_repo: Arc<LevelRepository>,
        placement_repo: Arc<PlacementRepository>,
    ) -> Self {
        Self {
            article_repo,
            layout_repo,
            level_repo,
            placement_repo,
        }
    }

    /// 全部仓储共享同一连接
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            article_repo: Arc::new(ArticleRepository::from_connection(conn.clone())),
            layout_repo: Arc::new(LayoutRepository::from_connection(conn.clone())),
            level_repo: Arc::new(LevelRepository::from_connection(conn.clone())),
            placement_repo: Arc::new(PlacementRepository::from_connection(conn)),
        }
    }
}
