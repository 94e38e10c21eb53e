// ==========================================
// 门店货架空间规划 - 00 层全局装箱
// ==========================================
// 红线: OPUL 商品出现在 00 层为致命错误
// ==========================================
// 职责: 货架段内全部货架格作为共享箱体，落位落地商品
// 输入: 队列 + 货架格容量（本次规划内的累加器）
// 输出: 每个货架格一个 00 层批次；已落位商品移出队列
// 规则:
// 1) 候选 = 落地商品，按占用宽度降序（含 M 徽章放大，稳定）
// 2) 逐个选择第一个满足 进深 / 宽度 / 高度 的货架格
// 3) 无处可放的商品保持未规划，不回退到 01 层
// ==========================================

use crate::domain::capacity::{Clearance, SectionCapacity, SpaceConstraint};
use crate::domain::placement::{LevelCommit, PlacedArticle};
use crate::domain::types::LevelNum;
use crate::engine::badge::BadgeEvaluator;
use crate::engine::error::{PlannerError, PlannerResult};
use crate::engine::queue::QueueEntry;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

// ==========================================
// GroundPacker - 00 层装箱器
// ==========================================
pub struct GroundPacker {
    clearance: Clearance,
}

impl GroundPacker {
    pub fn new(clearance: Clearance) -> Self {
        Self { clearance }
    }

    /// 执行 00 层装箱
    ///
    /// # 参数
    /// - queue: 待规划队列（已落位商品会被移除）
    /// - section_order: 按 section_num 升序的货架格ID
    /// - arena: 本次规划的货架格容量
    /// - badges: 徽章评估器
    ///
    /// # 返回
    /// - Ok(Vec<LevelCommit>): 按货架格顺序的 00 层批次
    /// - Err(InvariantViolation): 候选中出现 OPUL 商品
    #[instrument(skip_all, fields(queue_len = queue.len(), sections = section_order.len()))]
    pub fn pack(
        &self,
        queue: &mut Vec<QueueEntry>,
        section_order: &[i64],
        arena: &mut HashMap<i64, SectionCapacity>,
        badges: &BadgeEvaluator,
    ) -> PlannerResult<Vec<LevelCommit>> {
        // 同一货架段内货架格进深一致，按首个货架格评估徽章放大
        let depth = section_order
            .first()
            .and_then(|id| arena.get(id))
            .map(|cap| cap.depth)
            .unwrap_or(0.0);
        let mut candidates: Vec<(usize, f64)> = queue
            .iter()
            .enumerate()
            .filter(|(_, e)| e.resolved.ground_eligible)
            .map(|(i, e)| (i, badges.footprint(e, depth).0.width))
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut per_section: BTreeMap<usize, Vec<PlacedArticle>> = BTreeMap::new();
        let mut taken: HashSet<usize> = HashSet::new();

        for (idx, _) in candidates {
            let entry = &queue[idx];
            if entry.resolved.opul {
                return Err(PlannerError::InvariantViolation(format!(
                    "OPUL 商品不可落位 00 层: article_id={}",
                    entry.article.id
                )));
            }

            let mut placed = false;
            for (order, section_id) in section_order.iter().enumerate() {
                let Some(cap) = arena.get_mut(section_id) else {
                    continue;
                };
                let (footprint, decision) = badges.footprint(entry, cap.depth);
                if !cap.can_place(LevelNum::GROUND, &footprint, &self.clearance) {
                    continue;
                }
                cap.place(LevelNum::GROUND, &footprint, &self.clearance);
                per_section.entry(order).or_default().push(PlacedArticle {
                    article_id: entry.article.id,
                    planned_qty: entry.article.stabilized_rssq(),
                    width_used: footprint.width,
                    height_used: footprint.height,
                    badge: decision.encoded(),
                });
                taken.insert(idx);
                placed = true;
                break;
            }

            if !placed {
                debug!(
                    article_id = entry.article.id,
                    width = entry.resolved.width,
                    "落地商品无可用货架格，保持未规划"
                );
            }
        }

        let batches = per_section
            .into_iter()
            .filter_map(|(order, placements)| {
                let section_id = section_order[order];
                arena.get(&section_id).map(|cap| LevelCommit {
                    section_id,
                    level_num: LevelNum::GROUND,
                    level_height: cap.committed_height(LevelNum::GROUND),
                    placements,
                })
            })
            .collect();

        let mut idx = 0usize;
        queue.retain(|_| {
            let keep = !taken.contains(&idx);
            idx += 1;
            keep
        });

        Ok(batches)
    }
}
