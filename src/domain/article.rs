// ==========================================
// 门店货架空间规划 - 商品领域模型
// ==========================================
// 职责: 商品主数据 + 规划状态
// 红线: 货位要么为空, 要么 section/level 成对且属于同一货架段
// ==========================================

use crate::domain::types::{DistributionType, PlanBadge};
use serde::{Deserialize, Serialize};

// ==========================================
// Article - 商品
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    // ===== 主键 =====
    pub id: i64,
    pub store_id: i64,
    pub artno: i64,                      // 商品编号（唯一）
    pub name: Option<String>,            // 商品名称

    // ===== 分类 =====
    pub hfb: Option<String>,             // 业务大类
    pub pa: Option<String>,              // 产品区域
    pub sales_method: Option<String>,    // 销售方式（OPUL 判定）
    pub expsale: Option<f64>,            // 预期销量

    // ===== 销量与包装数量 =====
    pub rssq: Option<i64>,               // 销量驱动数量
    pub split_rssq: Option<i64>,         // 稳定化 RSSQ（首次入库时取 rssq）
    pub mpq: Option<i64>,                // 箱规数量
    pub palq: Option<i64>,               // 整托数量
    pub dt: Option<DistributionType>,           // 配送类型
    pub effective_dt: Option<DistributionType>, // 首次规划时冻结的配送类型

    // ===== 箱规尺寸 (Case-pack) =====
    pub weight_g: Option<f64>,
    pub cp_width: Option<f64>,
    pub cp_length: Option<f64>,
    pub cp_height: Option<f64>,

    // ===== 整托尺寸 (Unit-load) =====
    pub ul_width: Option<f64>,
    pub ul_length: Option<f64>,
    pub ul_height: Option<f64>,

    // ===== 规划状态 =====
    pub planned: bool,
    pub part_planned: bool,
    pub planned_quantity_remainder: Option<i64>,
    pub section_id: Option<i64>,
    pub level_id: Option<i64>,
    pub plan_badge: Option<String>,
}

impl Article {
    /// 稳定化销量（split_rssq 缺失时回退 rssq）
    pub fn stabilized_rssq(&self) -> f64 {
        self.split_rssq.or(self.rssq).unwrap_or(0) as f64
    }

    /// 规划使用的配送类型（优先冻结值）
    pub fn effective_distribution(&self) -> Option<DistributionType> {
        self.effective_dt.or(self.dt)
    }

    pub fn is_pallet_class(&self) -> bool {
        self.effective_distribution() == Some(DistributionType::Pallet)
    }

    pub fn is_case_pick(&self) -> bool {
        self.effective_distribution() == Some(DistributionType::CasePick)
    }

    pub fn weight(&self) -> f64 {
        self.weight_g.unwrap_or(0.0)
    }

    pub fn pallet_quantity(&self) -> f64 {
        self.palq.unwrap_or(0) as f64
    }

    /// 销量/整托比（palq 非正时返回 None）
    pub fn sales_to_pallet_ratio(&self) -> Option<f64> {
        let palq = self.pallet_quantity();
        if palq > 0.0 {
            Some(self.stabilized_rssq() / palq)
        } else {
            None
        }
    }

    /// M/B 徽章门槛: 稳定化销量严格大于 palq × ratio
    pub fn passes_badge_gate(&self, ratio: f64) -> bool {
        let palq = self.pallet_quantity();
        palq > 0.0 && self.stabilized_rssq() > palq * ratio
    }

    pub fn badges(&self) -> Vec<PlanBadge> {
        self.plan_badge
            .as_deref()
            .map(PlanBadge::decode)
            .unwrap_or_default()
    }

    pub fn has_badge(&self) -> bool {
        !self.badges().is_empty()
    }

    /// 可展示徽章: O 总是可见, M/B 仅在仍满足门槛时可见
    pub fn visible_plan_badges(&self, gate_ratio: f64) -> Vec<PlanBadge> {
        self.badges()
            .into_iter()
            .filter(|badge| match badge {
                PlanBadge::Opul => true,
                PlanBadge::Multiple | PlanBadge::Behind => self.passes_badge_gate(gate_ratio),
            })
            .collect()
    }

    /// CSV 导出格式, 例如 "O|M"
    pub fn plan_badges_csv(&self, gate_ratio: f64) -> String {
        self.visible_plan_badges(gate_ratio)
            .iter()
            .map(|b| b.code().to_string())
            .collect::<Vec<_>>()
            .join("|")
    }

    pub fn is_located(&self) -> bool {
        self.section_id.is_some() && self.level_id.is_some()
    }

    /// 入库前补齐稳定化销量
    pub fn with_default_split_rssq(mut self) -> Self {
        if self.split_rssq.is_none() {
            self.split_rssq = self.rssq;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Article {
        Article {
            id: 1,
            store_id: 1,
            artno: 1001,
            rssq: Some(30),
            palq: Some(20),
            dt: Some(DistributionType::CasePick),
            ..Default::default()
        }
    }

    #[test]
    fn test_stabilized_rssq_falls_back_to_rssq() {
        let mut art = sample();
        assert_eq!(art.stabilized_rssq(), 30.0);
        art.split_rssq = Some(12);
        assert_eq!(art.stabilized_rssq(), 12.0);
    }

    #[test]
    fn test_badge_gate_is_strict() {
        let mut art = sample();
        // 30 > 20 * 1.5 = 30 不成立
        assert!(!art.passes_badge_gate(1.5));
        art.rssq = Some(31);
        assert!(art.passes_badge_gate(1.5));
        art.palq = Some(0);
        assert!(!art.passes_badge_gate(1.5));
    }

    #[test]
    fn test_visible_badges_hide_stale_mb() {
        let mut art = sample();
        art.plan_badge = Some("OM".to_string());
        assert_eq!(art.visible_plan_badges(1.5), vec![PlanBadge::Opul]);
        assert_eq!(art.plan_badges_csv(1.5), "O");

        art.rssq = Some(100);
        assert_eq!(art.plan_badges_csv(1.5), "O|M");
    }

    #[test]
    fn test_effective_distribution_prefers_frozen_value() {
        let mut art = sample();
        art.effective_dt = Some(DistributionType::Pallet);
        assert!(art.is_pallet_class());
        assert!(!art.is_case_pick());
    }
}
