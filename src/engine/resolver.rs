// ==========================================
// 门店货架空间规划 - 商品属性解析器
// ==========================================
// 红线: OPUL 商品任何模式下都不可落地（00 层）
// ==========================================
// 职责: 按模式计算 (宽, 长, 高) + 落地资格 + 深货分类
// 输入: 商品 + 规划模式 + 规划常量
// 输出: ResolvedArticle（不修改商品本身）
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::article::Article;
use crate::engine::strategy::PlanningMode;
use serde::{Deserialize, Serialize};

/// 解析后的商品尺寸（单次规划内不可变）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArticle {
    pub width: f64,
    pub length: f64,
    pub height: f64,
    /// 是否只能放 00 层
    pub ground_eligible: bool,
    /// 进深超过阈值（仅影响排序）
    pub deep: bool,
    /// 是否 OPUL 商品
    pub opul: bool,
    /// 尺寸来源是否为整托
    pub unit_load: bool,
}

/// 数据质量排除原因
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveSkip {
    pub article_id: i64,
    pub reason: String,
}

// ==========================================
// ArticleResolver - 商品属性解析器
// ==========================================
pub struct ArticleResolver {
    config: PlannerConfig,
    mode: PlanningMode,
}

impl ArticleResolver {
    pub fn new(config: PlannerConfig, mode: PlanningMode) -> Self {
        Self { config, mode }
    }

    pub fn mode(&self) -> PlanningMode {
        self.mode
    }

    pub fn is_opul(&self, article: &Article) -> bool {
        self.config
            .is_opul_sales_method(article.sales_method.as_deref())
    }

    /// 落地规则:
    /// 整托类，或箱拣类且（重量 > 重货阈值 或 稳定化销量 ≥ palq × 比例）
    pub fn sacred_rule(&self, article: &Article) -> bool {
        if article.is_pallet_class() {
            return true;
        }
        if !article.is_case_pick() {
            return false;
        }
        if article.weight() > self.config.sacred_heavy_weight_g {
            return true;
        }
        let palq = article.pallet_quantity();
        palq > 0.0 && article.stabilized_rssq() >= palq * self.config.ground_sales_ratio
    }

    /// 按模式判定落地资格
    pub fn ground_eligible(&self, article: &Article) -> bool {
        if self.is_opul(article) {
            return false;
        }
        match self.mode {
            PlanningMode::NonOpul | PlanningMode::Opul | PlanningMode::Pallet => {
                self.sacred_rule(article)
            }
            PlanningMode::Countertop => {
                article.is_pallet_class()
                    || article.weight() > self.config.countertop_heavy_weight_g
            }
            PlanningMode::Voss => false,
        }
    }

    /// 解析商品尺寸
    ///
    /// # 返回
    /// - Ok(ResolvedArticle): 可参与规划
    /// - Err(ResolveSkip): 宽或长缺失/非正，排除出本次规划
    pub fn resolve(&self, article: &Article) -> Result<ResolvedArticle, ResolveSkip> {
        let opul = self.is_opul(article);
        let ground_eligible = self.ground_eligible(article);

        let unit_load = match self.mode {
            PlanningMode::NonOpul | PlanningMode::Pallet => ground_eligible,
            PlanningMode::Opul => ground_eligible || opul,
            PlanningMode::Countertop => article.is_pallet_class(),
            PlanningMode::Voss => false,
        };

        let (width, length, height) = if unit_load {
            (
                article.ul_width,
                article.ul_length,
                article.ul_height.unwrap_or(0.0),
            )
        } else {
            let packs = article.mpq.unwrap_or(1).max(1) as f64;
            let scaled = article.stabilized_rssq() / packs * article.cp_height.unwrap_or(0.0);
            (article.cp_width, article.cp_length, scaled)
        };

        let width = Self::positive(width).ok_or_else(|| ResolveSkip {
            article_id: article.id,
            reason: format!("宽度无效: {:?} (unit_load={})", width, unit_load),
        })?;
        let length = Self::positive(length).ok_or_else(|| ResolveSkip {
            article_id: article.id,
            reason: format!("进深无效: {:?} (unit_load={})", length, unit_load),
        })?;
        let height = if height.is_finite() { height.max(0.0) } else { 0.0 };

        Ok(ResolvedArticle {
            width,
            length,
            height,
            ground_eligible,
            deep: length > self.config.deep_length_threshold,
            opul,
            unit_load,
        })
    }

    fn positive(value: Option<f64>) -> Option<f64> {
        value.filter(|v| v.is_finite() && *v > 0.0)
    }
}
