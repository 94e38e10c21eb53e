// ==========================================
// 门店货架空间规划 - 规划编排器
// ==========================================
// 主流程（单个货架段，同步执行）:
// 1) 解析模式（失败时不产生任何写入）
// 2) 加载货架格与已有层板，建立本次规划的容量表
// 3) 构建队列（筛选 + 解析 + 浅货优先）
// 4) 00 层全局装箱 → 逐批提交
// 5) 01..N 层逐层装箱 → 逐批提交
// 说明: 每个批次独立事务，中途失败不回滚已提交批次
// ==========================================

use crate::config::PlannerConfig;
use crate::domain::capacity::{LevelLoad, SectionCapacity};
use crate::domain::layout::Section;
use crate::domain::placement::LevelCommit;
use crate::domain::plan::PlanRequest;
use crate::engine::badge::BadgeEvaluator;
use crate::engine::error::{PlannerError, PlannerResult};
use crate::engine::ground_packer::GroundPacker;
use crate::engine::queue::QueueBuilder;
use crate::engine::repositories::PlannerRepositories;
use crate::engine::resolver::ArticleResolver;
use crate::engine::strategy::PlanningMode;
use crate::engine::tier_packer::TierPacker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, info, instrument};
use uuid::Uuid;

// ==========================================
// PlanOutcome - 单次规划结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    pub run_id: String,
    pub mode: PlanningMode,
    pub planned_count: usize,
    pub unplanned_count: usize,
    pub skipped_count: usize,
    pub batches_committed: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}

// ==========================================
// BinPlanner - 规划编排器
// ==========================================
pub struct BinPlanner {
    repos: PlannerRepositories,
    config: PlannerConfig,
}

impl BinPlanner {
    pub fn new(repos: PlannerRepositories, config: PlannerConfig) -> Self {
        Self { repos, config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// 解析请求中的规划模式
    pub fn parse_mode(request: &PlanRequest) -> PlannerResult<PlanningMode> {
        let raw = request
            .mode
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(PlannerError::MissingMode)?;
        PlanningMode::from_str(raw).map_err(|_| PlannerError::InvalidMode(raw.to_string()))
    }

    /// 规划单个货架段
    #[instrument(skip(self, request), fields(mode = ?request.mode, run_id = tracing::field::Empty))]
    pub fn plan_aisle(&self, aisle_id: i64, request: &PlanRequest) -> PlannerResult<PlanOutcome> {
        let mode = Self::parse_mode(request)?;
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        tracing::Span::current().record("run_id", run_id.as_str());

        let aisle = self
            .repos
            .layout_repo
            .find_aisle(aisle_id)?
            .ok_or(PlannerError::AisleNotFound(aisle_id))?;
        let sections = self.repos.layout_repo.list_sections(aisle_id)?;

        let resolver = ArticleResolver::new(self.config.clone(), mode);
        let badges = BadgeEvaluator::new(mode, self.config.badge_gate_ratio_for(mode.as_str()));
        let section_order: Vec<i64> = sections.iter().map(|s| s.id).collect();
        let mut arena = self.load_capacity(&sections)?;

        // ===== 队列 =====
        let candidates = self
            .repos
            .article_repo
            .find_unplanned_by_store(aisle.store_id)?;
        let plan_queue =
            QueueBuilder::new(mode, &self.config).build(aisle.store_id, candidates, request, &resolver);
        let skipped_count = plan_queue.skipped;
        let mut queue = plan_queue.entries;
        info!(
            mode = %mode,
            store_id = aisle.store_id,
            sections = sections.len(),
            queue_len = queue.len(),
            skipped = skipped_count,
            "规划队列构建完成"
        );

        let mut planned_count = 0usize;
        let mut batches_committed = 0usize;

        // ===== 00 层 =====
        let ground_batches = GroundPacker::new(self.config.clearance()).pack(
            &mut queue,
            &section_order,
            &mut arena,
            &badges,
        )?;
        for batch in &ground_batches {
            planned_count += self.commit(batch)?;
            batches_committed += 1;
        }
        info!(
            batches = ground_batches.len(),
            planned = planned_count,
            "00 层装箱完成"
        );

        // ===== 01..N 层 =====
        let tier_batches = TierPacker::new(self.config.clearance(), self.config.level_cap).pack(
            &mut queue,
            &section_order,
            &mut arena,
            &badges,
        );
        for batch in &tier_batches {
            planned_count += self.commit(batch)?;
            batches_committed += 1;
        }

        let outcome = PlanOutcome {
            run_id,
            mode,
            planned_count,
            unplanned_count: queue.len(),
            skipped_count,
            batches_committed,
            started_at,
            elapsed_ms: (Utc::now() - started_at).num_milliseconds(),
        };
        info!(
            planned = outcome.planned_count,
            unplanned = outcome.unplanned_count,
            batches = outcome.batches_committed,
            elapsed_ms = outcome.elapsed_ms,
            "规划完成"
        );
        Ok(outcome)
    }

    /// 按已有层板初始化容量表
    ///
    /// 已有层: 已用宽度与最高商品均取落位时记录的值，不随本次模式变化
    fn load_capacity(&self, sections: &[Section]) -> PlannerResult<HashMap<i64, SectionCapacity>> {
        let mut arena = HashMap::with_capacity(sections.len());
        for section in sections {
            let mut cap = SectionCapacity::new(
                section.id,
                section.section_num,
                section.section_width,
                section.section_depth,
                section.section_height,
            );
            for level in self.repos.level_repo.list_by_section(section.id)? {
                let used_width = self.repos.placement_repo.used_width_by_level(level.id)?;
                let max_article_height = self.repos.placement_repo.max_height_by_level(level.id)?;
                let occupants = self.repos.article_repo.find_by_level(level.id)?;
                let tall = occupants
                    .iter()
                    .any(|a| a.has_badge() || a.is_pallet_class());
                cap.levels.insert(
                    level.level_num,
                    LevelLoad {
                        level_id: Some(level.id),
                        committed_height: level.level_height,
                        used_width,
                        max_article_height,
                        tall,
                    },
                );
            }
            debug!(
                section_id = section.id,
                existing_levels = cap.levels.len(),
                "货架格容量已加载"
            );
            arena.insert(section.id, cap);
        }
        Ok(arena)
    }

    fn commit(&self, batch: &LevelCommit) -> PlannerResult<usize> {
        let level_id = self.repos.placement_repo.commit_level_batch(batch)?;
        debug!(
            section_id = batch.section_id,
            level_num = %batch.level_num,
            level_id,
            placed = batch.placements.len(),
            "层板批次已提交"
        );
        Ok(batch.placements.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_errors() {
        let req = PlanRequest::default();
        assert!(matches!(
            BinPlanner::parse_mode(&req),
            Err(PlannerError::MissingMode)
        ));

        let req = PlanRequest::for_mode("  ");
        assert!(matches!(
            BinPlanner::parse_mode(&req),
            Err(PlannerError::MissingMode)
        ));

        let req = PlanRequest::for_mode("teleport_mode");
        match BinPlanner::parse_mode(&req) {
            Err(PlannerError::InvalidMode(name)) => assert_eq!(name, "teleport_mode"),
            other => panic!("unexpected: {:?}", other),
        }

        let req = PlanRequest::for_mode("opul_mode");
        assert_eq!(BinPlanner::parse_mode(&req).unwrap(), PlanningMode::Opul);
    }
}
