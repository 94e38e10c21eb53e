// ==========================================
// 门店货架空间规划 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod article_repo;
pub mod error;
pub mod layout_repo;
pub mod level_repo;
pub mod placement_repo;

// 重导出核心仓储
pub use article_repo::ArticleRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use layout_repo::LayoutRepository;
pub use level_repo::LevelRepository;
pub use placement_repo::PlacementRepository;
