// ==========================================
// 门店货架空间规划 - 手工取消分配
// ==========================================
// 红线: planned 与 part_planned 互斥
// ==========================================
// 职责:
// - 取消单个商品（删除全部 placements，清空货位）
// - 取消单个 placement（按剩余 placements 重算规划标志）
// 删除与商品状态回写在同一事务内完成
// - 清空整个货架段（商品、placements、层板）
// ==========================================

use crate::domain::placement::{ArticleRestate, Placement};
use crate::engine::error::{PlannerError, PlannerResult};
use crate::engine::repositories::PlannerRepositories;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// 由剩余 placements 推导的规划状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedState {
    pub planned: bool,
    pub part_planned: bool,
    pub remainder: i64,
}

impl PlannedState {
    /// 规则:
    /// - 合计 ≥ 需求 → 已规划，剩余 0
    /// - 合计 = 0 → 未规划，剩余 = 需求
    /// - 其余 → 部分规划，剩余 = 需求 - 合计
    pub fn derive(required: f64, placed_qty: f64) -> Self {
        let required = required.max(0.0);
        if placed_qty <= 0.0 {
            Self {
                planned: false,
                part_planned: false,
                remainder: required.round() as i64,
            }
        } else if placed_qty >= required {
            Self {
                planned: true,
                part_planned: false,
                remainder: 0,
            }
        } else {
            Self {
                planned: false,
                part_planned: true,
                remainder: (required - placed_qty).round() as i64,
            }
        }
    }
}

// ==========================================
// UnassignService - 取消分配服务
// ==========================================
pub struct UnassignService {
    repos: PlannerRepositories,
}

impl UnassignService {
    pub fn new(repos: PlannerRepositories) -> Self {
        Self { repos }
    }

    /// 取消单个商品的全部分配
    ///
    /// # 返回
    /// - Ok(usize): 删除的 placement 数
    #[instrument(skip(self))]
    pub fn unassign_article(&self, article_id: i64) -> PlannerResult<usize> {
        if self.repos.article_repo.find_by_id(article_id)?.is_none() {
            return Err(not_found("Article", article_id));
        }
        let removed = self.repos.placement_repo.unassign_article(article_id)?;
        info!(article_id, removed, "商品已取消分配");
        Ok(removed)
    }

    /// 取消单个 placement 并重算商品规划状态
    #[instrument(skip(self))]
    pub fn unassign_placement(&self, placement_id: i64) -> PlannerResult<PlannedState> {
        let placement = self
            .repos
            .placement_repo
            .find_by_id(placement_id)?
            .ok_or_else(|| not_found("Placement", placement_id))?;
        let article = self
            .repos
            .article_repo
            .find_by_id(placement.article_id)?
            .ok_or_else(|| not_found("Article", placement.article_id))?;

        let remaining: Vec<Placement> = self
            .repos
            .placement_repo
            .list_by_article(article.id)?
            .into_iter()
            .filter(|p| p.id != placement_id)
            .collect();
        let placed_qty: f64 = remaining.iter().map(|p| p.planned_qty).sum();
        let state = PlannedState::derive(article.stabilized_rssq(), placed_qty);

        let restated = if remaining.is_empty() || placed_qty <= 0.0 {
            ArticleRestate {
                planned: false,
                part_planned: false,
                remainder: state.remainder,
                location: None,
                plan_badge: None,
            }
        } else {
            // 货位移到仍存在的 placement（优先保留当前货位）
            let survivor = remaining
                .iter()
                .find(|p| Some(p.level_id) == article.level_id)
                .or_else(|| remaining.last());
            ArticleRestate {
                planned: state.planned,
                part_planned: state.part_planned,
                remainder: state.remainder,
                location: survivor.map(|p| (p.section_id, p.level_id)),
                plan_badge: survivor.and_then(|p| p.badge.clone()),
            }
        };
        self.repos
            .placement_repo
            .unassign_placement(placement_id, article.id, &restated)?;

        info!(
            placement_id,
            article_id = article.id,
            planned = state.planned,
            part_planned = state.part_planned,
            remainder = state.remainder,
            "placement 已取消"
        );
        Ok(state)
    }

    /// 清空货架段: 商品置为未规划，删除 placements 与层板
    ///
    /// # 返回
    /// - Ok(usize): 被清空的商品数
    #[instrument(skip(self))]
    pub fn unassign_aisle(&self, aisle_id: i64) -> PlannerResult<usize> {
        if self.repos.layout_repo.find_aisle(aisle_id)?.is_none() {
            return Err(PlannerError::AisleNotFound(aisle_id));
        }
        let section_ids: Vec<i64> = self
            .repos
            .layout_repo
            .list_sections(aisle_id)?
            .iter()
            .map(|s| s.id)
            .collect();
        let cleared = self.repos.placement_repo.clear_sections(&section_ids)?;
        info!(aisle_id, sections = section_ids.len(), cleared, "货架段已清空");
        Ok(cleared)
    }
}

fn not_found(entity: &str, id: i64) -> PlannerError {
    PlannerError::Repository(RepositoryError::NotFound {
        entity: entity.to_string(),
        id: id.to_string(),
    })
}
