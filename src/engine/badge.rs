// ==========================================
// 门店货架空间规划 - 徽章评估器
// ==========================================
// 规则:
// 1) 门槛: 稳定化销量 > palq × ratio（严格大于）
// 2) 通过门槛: ul_length × 2 > 货架格进深 → M，否则 B
// 3) OPUL 模式下 OPUL 商品附加 O
// 4) M 徽章: 占用宽度 = 解析宽度 × ceil(稳定化销量 / palq)
// ==========================================

use crate::domain::article::Article;
use crate::domain::capacity::Footprint;
use crate::domain::types::PlanBadge;
use crate::engine::queue::QueueEntry;
use crate::engine::resolver::ResolvedArticle;
use crate::engine::strategy::PlanningMode;

/// 徽章评估结果
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeDecision {
    pub badges: Vec<PlanBadge>,
    pub width_multiplier: f64,
}

impl BadgeDecision {
    pub fn none() -> Self {
        Self {
            badges: Vec::new(),
            width_multiplier: 1.0,
        }
    }

    pub fn has_badge(&self) -> bool {
        !self.badges.is_empty()
    }

    /// 存储格式，例如 "OM"
    pub fn encoded(&self) -> Option<String> {
        PlanBadge::encode(&self.badges)
    }
}

// ==========================================
// BadgeEvaluator - 徽章评估器
// ==========================================
pub struct BadgeEvaluator {
    mode: PlanningMode,
    gate_ratio: f64,
}

impl BadgeEvaluator {
    pub fn new(mode: PlanningMode, gate_ratio: f64) -> Self {
        Self { mode, gate_ratio }
    }

    pub fn gate_ratio(&self) -> f64 {
        self.gate_ratio
    }

    /// 针对目标货架格评估徽章
    pub fn evaluate(
        &self,
        article: &Article,
        resolved: &ResolvedArticle,
        section_depth: f64,
    ) -> BadgeDecision {
        if !self.mode.awards_badges() {
            return BadgeDecision::none();
        }

        let mut decision = BadgeDecision::none();
        if self.mode.tags_opul() && resolved.opul {
            decision.badges.push(PlanBadge::Opul);
        }

        if article.passes_badge_gate(self.gate_ratio) {
            let ul_length = article.ul_length.unwrap_or(0.0);
            if ul_length * 2.0 > section_depth {
                decision.badges.push(PlanBadge::Multiple);
                decision.width_multiplier =
                    (article.stabilized_rssq() / article.pallet_quantity()).ceil();
            } else {
                decision.badges.push(PlanBadge::Behind);
            }
        }

        decision
    }

    /// 占用宽度（含 M 徽章放大）
    pub fn packing_width(&self, resolved: &ResolvedArticle, decision: &BadgeDecision) -> f64 {
        resolved.width * decision.width_multiplier
    }

    /// 针对目标货架格计算占用（高余量: 带徽章或整托类）
    pub fn footprint(&self, entry: &QueueEntry, section_depth: f64) -> (Footprint, BadgeDecision) {
        let decision = self.evaluate(&entry.article, &entry.resolved, section_depth);
        let footprint = Footprint {
            width: self.packing_width(&entry.resolved, &decision),
            length: entry.resolved.length,
            height: entry.resolved.height,
            tall: decision.has_badge() || entry.article.is_pallet_class(),
        };
        (footprint, decision)
    }
}
