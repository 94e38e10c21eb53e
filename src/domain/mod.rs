// ==========================================
// 门店货架空间规划 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、容量约束接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod article;
pub mod capacity;
pub mod layout;
pub mod placement;
pub mod plan;
pub mod types;

// 重导出核心类型
pub use article::Article;
pub use capacity::{Clearance, Footprint, LevelLoad, SectionCapacity, SpaceConstraint};
pub use layout::{
    Aisle, AisleDimensions, AisleDraft, Level, NewPair, Pair, Section, SectionDraft, Store,
};
pub use placement::{ArticleRestate, LevelCommit, PlacedArticle, Placement};
pub use plan::{CategoryFilter, DimensionLimits, PlanRequest, PlanResult, VelocityFilter};
pub use types::{CategoryKind, DistributionType, LevelNum, PlanBadge};
