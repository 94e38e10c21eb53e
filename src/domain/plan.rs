// ==========================================
// 门店货架空间规划 - 规划请求与结果
// ==========================================
// 职责: 显式枚举全部规划选项（模式、筛选、模式专属上限）
// ==========================================

use crate::domain::types::CategoryKind;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanRequest - 单次规划调用参数
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    /// 规划模式名（non_opul / opul / countertop / voss / pallet，可带 "_mode" 后缀）
    pub mode: Option<String>,
    /// 商品名前缀（不区分大小写）
    pub name_prefix: Option<String>,
    /// PA / HFB 品类筛选
    pub category: Option<CategoryFilter>,
    /// 销量高低筛选
    pub velocity: VelocityFilter,
    /// VOSS 模式: 箱规尺寸上限
    pub voss_limits: DimensionLimits,
    /// 整托模式: 整托尺寸上限
    pub pallet_limits: DimensionLimits,
}

impl PlanRequest {
    pub fn for_mode(mode: &str) -> Self {
        Self {
            mode: Some(mode.to_string()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryFilter {
    pub kind: CategoryKind,
    pub value: String,
}

/// 销量筛选（EXPSALE 高低分界由配置决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum VelocityFilter {
    #[default]
    Any,
    Low,
    High {
        #[serde(default)]
        pallet_only: bool,
    },
}

/// 模式专属上限（None 表示不限制）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionLimits {
    pub height_max: Option<f64>,
    pub length_max: Option<f64>,
    pub width_max: Option<f64>,
    pub rssq_max: Option<f64>,
    pub expsale_max: Option<f64>,
    pub weight_g_max: Option<f64>,
}

impl DimensionLimits {
    pub fn is_empty(&self) -> bool {
        self.height_max.is_none()
            && self.length_max.is_none()
            && self.width_max.is_none()
            && self.rssq_max.is_none()
            && self.expsale_max.is_none()
            && self.weight_g_max.is_none()
    }
}

// ==========================================
// PlanResult - 对外结构化结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub success: bool,
    pub planned_count: usize,
    pub unplanned_count: usize,
    /// 因尺寸数据缺失被排除的商品数
    pub skipped_count: usize,
    pub message: String,
    pub mode: Option<String>,
    pub run_id: Option<String>,
}

impl PlanResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            planned_count: 0,
            unplanned_count: 0,
            skipped_count: 0,
            message: message.into(),
            mode: None,
            run_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_request_deserialize_with_defaults() {
        let raw = r#"{"mode":"voss_mode","velocity":{"kind":"high","pallet_only":true},"voss_limits":{"height_max":400.0}}"#;
        let req: PlanRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.mode.as_deref(), Some("voss_mode"));
        assert_eq!(req.velocity, VelocityFilter::High { pallet_only: true });
        assert_eq!(req.voss_limits.height_max, Some(400.0));
        assert!(req.pallet_limits.is_empty());
        assert!(req.category.is_none());
    }

    #[test]
    fn test_failure_result() {
        let res = PlanResult::failure("bad");
        assert!(!res.success);
        assert_eq!(res.planned_count, 0);
    }
}
