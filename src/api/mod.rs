// ==========================================
// 门店货架空间规划 - API 层
// ==========================================
// 职责: 对外调用边界，错误统一转换为 ApiError / PlanResult
// ==========================================

pub mod error;
pub mod layout_api;
pub mod plan_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use layout_api::LayoutApi;
pub use plan_api::{ArticleBadgesView, BadgeView, PlanApi};
