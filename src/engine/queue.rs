// ==========================================
// 门店货架空间规划 - 待规划队列构建
// ==========================================
// 筛选顺序:
// 1) 门店内未规划商品
// 2) 商品名前缀（不区分大小写）
// 3) PA / HFB 品类
// 4) 销量高低（可选仅整托）
// 5) 模式门控（VOSS / 整托上限、OPUL 剔除）
// 排序: 浅货在前，深货在后（稳定）
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::article::Article;
use crate::domain::plan::{DimensionLimits, PlanRequest, VelocityFilter};
use crate::domain::types::CategoryKind;
use crate::engine::resolver::{ArticleResolver, ResolvedArticle};
use crate::engine::strategy::PlanningMode;
use tracing::{debug, instrument};

/// 队列条目: 商品 + 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub article: Article,
    pub resolved: ResolvedArticle,
}

/// 队列构建结果
#[derive(Debug, Clone, Default)]
pub struct PlanQueue {
    pub entries: Vec<QueueEntry>,
    /// 因尺寸数据缺失被排除的商品数
    pub skipped: usize,
}

// ==========================================
// QueueBuilder - 队列构建器
// ==========================================
pub struct QueueBuilder {
    mode: PlanningMode,
    expsale_split: f64,
}

impl QueueBuilder {
    pub fn new(mode: PlanningMode, config: &PlannerConfig) -> Self {
        Self {
            mode,
            expsale_split: config.expsale_split,
        }
    }

    /// 构建队列
    ///
    /// # 参数
    /// - store_id: 货架段所属门店
    /// - articles: 候选商品（通常为门店内未规划商品）
    /// - request: 规划参数
    /// - resolver: 当前模式的属性解析器
    #[instrument(skip(self, articles, request, resolver), fields(
        mode = %self.mode,
        candidates = articles.len()
    ))]
    pub fn build(
        &self,
        store_id: i64,
        articles: Vec<Article>,
        request: &PlanRequest,
        resolver: &ArticleResolver,
    ) -> PlanQueue {
        let prefix = request
            .name_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_lowercase);

        let mut shallow = Vec::new();
        let mut deep = Vec::new();
        let mut skipped = 0usize;

        for article in articles {
            if article.store_id != store_id || article.planned {
                continue;
            }
            if let Some(prefix) = prefix.as_deref() {
                if !Self::matches_prefix(&article, prefix) {
                    continue;
                }
            }
            if !Self::matches_category(&article, request) {
                continue;
            }
            if !self.matches_velocity(&article, request.velocity) {
                continue;
            }
            if !self.passes_mode_gates(&article, request, resolver) {
                continue;
            }

            match resolver.resolve(&article) {
                Ok(resolved) => {
                    let entry = QueueEntry { article, resolved };
                    if resolved.deep {
                        deep.push(entry);
                    } else {
                        shallow.push(entry);
                    }
                }
                Err(skip) => {
                    debug!(article_id = skip.article_id, reason = %skip.reason, "商品尺寸数据缺失，排除出本次规划");
                    skipped += 1;
                }
            }
        }

        shallow.extend(deep);
        PlanQueue {
            entries: shallow,
            skipped,
        }
    }

    fn matches_prefix(article: &Article, prefix: &str) -> bool {
        article
            .name
            .as_deref()
            .map(|name| name.trim_start().to_lowercase().starts_with(prefix))
            .unwrap_or(false)
    }

    fn matches_category(article: &Article, request: &PlanRequest) -> bool {
        let Some(filter) = request.category.as_ref() else {
            return true;
        };
        let wanted = filter.value.trim();
        if wanted.is_empty() {
            return true;
        }
        let actual = match filter.kind {
            CategoryKind::Pa => article.pa.as_deref(),
            CategoryKind::Hfb => article.hfb.as_deref(),
        };
        actual.map(|v| v.trim() == wanted).unwrap_or(false)
    }

    fn matches_velocity(&self, article: &Article, velocity: VelocityFilter) -> bool {
        match velocity {
            VelocityFilter::Any => true,
            VelocityFilter::Low => article
                .expsale
                .map(|e| e < self.expsale_split)
                .unwrap_or(false),
            VelocityFilter::High { pallet_only } => {
                let high = article
                    .expsale
                    .map(|e| e > self.expsale_split)
                    .unwrap_or(false);
                high && (!pallet_only || article.is_pallet_class())
            }
        }
    }

    fn passes_mode_gates(
        &self,
        article: &Article,
        request: &PlanRequest,
        resolver: &ArticleResolver,
    ) -> bool {
        if self.mode.excludes_opul() && resolver.is_opul(article) {
            return false;
        }
        if let Some(required) = self.mode.required_distribution() {
            if article.effective_distribution() != Some(required) {
                return false;
            }
        }
        match self.mode {
            PlanningMode::Voss => Self::within_limits(
                &request.voss_limits,
                article,
                (article.cp_height, article.cp_length, article.cp_width),
            ),
            PlanningMode::Pallet => Self::within_limits(
                &request.pallet_limits,
                article,
                (article.ul_height, article.ul_length, article.ul_width),
            ),
            _ => true,
        }
    }

    /// 上限检查（值缺失而上限已设置时视为不通过）
    fn within_limits(
        limits: &DimensionLimits,
        article: &Article,
        (height, length, width): (Option<f64>, Option<f64>, Option<f64>),
    ) -> bool {
        if limits.is_empty() {
            return true;
        }
        let checks = [
            (limits.height_max, height),
            (limits.length_max, length),
            (limits.width_max, width),
            (limits.rssq_max, article.rssq.map(|v| v as f64)),
            (limits.expsale_max, article.expsale),
            (limits.weight_g_max, article.weight_g),
        ];
        checks.iter().all(|(max, value)| match (max, value) {
            (None, _) => true,
            (Some(max), Some(value)) => value <= max,
            (Some(_), None) => false,
        })
    }
}
