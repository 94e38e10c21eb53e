// ==========================================
// 门店货架空间规划 - 引擎层
// ==========================================
// 职责: 实现规划规则,不拼 SQL
// 红线: Engine 不拼 SQL, 跳过商品必须记录原因
// ==========================================

pub mod badge;
pub mod error;
pub mod ground_packer;
pub mod layout;
pub mod planner;
pub mod queue;
pub mod repositories;
pub mod resolver;
pub mod strategy;
pub mod tier_packer;
pub mod unassign;

// 重导出核心引擎
pub use badge::{BadgeDecision, BadgeEvaluator};
pub use error::{PlannerError, PlannerResult};
pub use ground_packer::GroundPacker;
pub use layout::LayoutBuilder;
pub use planner::{BinPlanner, PlanOutcome};
pub use queue::{PlanQueue, QueueBuilder, QueueEntry};
pub use repositories::PlannerRepositories;
pub use resolver::{ArticleResolver, ResolveSkip, ResolvedArticle};
pub use strategy::PlanningMode;
pub use tier_packer::TierPacker;
pub use unassign::{PlannedState, UnassignService};
