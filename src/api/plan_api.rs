// ==========================================
// 门店货架空间规划 - 规划 API
// ==========================================
// 职责: 规划调用边界、取消分配、徽章展示
// 红线: plan_aisle 永不返回 Err，永不 panic；所有错误转为 PlanResult
// 约束: 同一货架段的规划调用串行执行
// ==========================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::plan::{PlanRequest, PlanResult};
use crate::engine::{BinPlanner, PlannedState, PlannerRepositories, UnassignService};

/// 徽章展示
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeView {
    pub code: String,
    pub label: String,
}

/// 商品徽章展示（M/B 仅在仍满足门槛时可见）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleBadgesView {
    pub article_id: i64,
    pub badges: Vec<BadgeView>,
    /// CSV 导出格式, 例如 "O|M"
    pub csv: String,
}

// ==========================================
// PlanApi - 规划 API
// ==========================================
pub struct PlanApi {
    repos: PlannerRepositories,
    config_manager: Arc<ConfigManager>,
    unassign: UnassignService,
    running: Mutex<HashSet<i64>>,
}

/// 货架段规划占用（离开作用域时释放）
struct AisleGuard<'a> {
    running: &'a Mutex<HashSet<i64>>,
    aisle_id: i64,
}

impl Drop for AisleGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut running) = self.running.lock() {
            running.remove(&self.aisle_id);
        }
    }
}

impl PlanApi {
    pub fn new(repos: PlannerRepositories, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            unassign: UnassignService::new(repos.clone()),
            repos,
            config_manager,
            running: Mutex::new(HashSet::new()),
        }
    }

    // ==========================================
    // 规划
    // ==========================================

    /// 规划单个货架段
    ///
    /// # 返回
    /// 总是返回 PlanResult；失败时 success=false 并携带原因
    pub fn plan_aisle(&self, aisle_id: i64, request: &PlanRequest) -> PlanResult {
        let mut result = match self.try_plan_aisle(aisle_id, request) {
            Ok(result) => result,
            Err(e) => {
                error!(aisle_id, mode = ?request.mode, error = %e, "规划失败");
                PlanResult::failure(e.to_string())
            }
        };
        if result.mode.is_none() {
            result.mode = request.mode.clone();
        }
        result
    }

    /// 以 JSON 形式的请求规划
    pub fn plan_aisle_json(&self, aisle_id: i64, request_json: &str) -> PlanResult {
        match serde_json::from_str::<PlanRequest>(request_json) {
            Ok(request) => self.plan_aisle(aisle_id, &request),
            Err(e) => {
                warn!(aisle_id, error = %e, "规划请求解析失败");
                PlanResult::failure(ApiError::InvalidInput(format!("规划请求解析失败: {}", e)).to_string())
            }
        }
    }

    fn try_plan_aisle(&self, aisle_id: i64, request: &PlanRequest) -> ApiResult<PlanResult> {
        // 模式校验先于一切写入
        BinPlanner::parse_mode(request)?;

        let _guard = self.acquire(aisle_id)?;
        let config = self.config_manager.load_planner_config()?;
        let planner = BinPlanner::new(self.repos.clone(), config);
        let outcome = planner.plan_aisle(aisle_id, request)?;

        let mut message = format!(
            "已规划 {} 个商品，{} 个未规划",
            outcome.planned_count, outcome.unplanned_count
        );
        if outcome.skipped_count > 0 {
            message.push_str(&format!("，{} 个因尺寸数据缺失被排除", outcome.skipped_count));
        }
        info!(aisle_id, run_id = %outcome.run_id, %message, "规划调用完成");

        Ok(PlanResult {
            success: true,
            planned_count: outcome.planned_count,
            unplanned_count: outcome.unplanned_count,
            skipped_count: outcome.skipped_count,
            message,
            mode: Some(outcome.mode.as_str().to_string()),
            run_id: Some(outcome.run_id),
        })
    }

    fn acquire(&self, aisle_id: i64) -> ApiResult<AisleGuard<'_>> {
        let mut running = self
            .running
            .lock()
            .map_err(|e| ApiError::InternalError(format!("规划锁获取失败: {}", e)))?;
        if !running.insert(aisle_id) {
            return Err(ApiError::InvalidInput(format!(
                "货架段正在规划中: aisle_id={}",
                aisle_id
            )));
        }
        Ok(AisleGuard {
            running: &self.running,
            aisle_id,
        })
    }

    // ==========================================
    // 取消分配
    // ==========================================

    pub fn unassign_article(&self, article_id: i64) -> ApiResult<usize> {
        Ok(self.unassign.unassign_article(article_id)?)
    }

    pub fn unassign_placement(&self, placement_id: i64) -> ApiResult<PlannedState> {
        Ok(self.unassign.unassign_placement(placement_id)?)
    }

    pub fn unassign_aisle(&self, aisle_id: i64) -> ApiResult<usize> {
        let _guard = self.acquire(aisle_id)?;
        Ok(self.unassign.unassign_aisle(aisle_id)?)
    }

    // ==========================================
    // 徽章展示
    // ==========================================

    pub fn article_badges(&self, article_id: i64) -> ApiResult<ArticleBadgesView> {
        let article = self
            .repos
            .article_repo
            .find_by_id(article_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Article(id={})不存在", article_id)))?;
        let gate = self.config_manager.load_planner_config()?.badge_gate_ratio;

        let badges = article
            .visible_plan_badges(gate)
            .into_iter()
            .map(|b| BadgeView {
                code: b.code().to_string(),
                label: b.label().to_string(),
            })
            .collect();
        Ok(ArticleBadgesView {
            article_id,
            badges,
            csv: article.plan_badges_csv(gate),
        })
    }
}
