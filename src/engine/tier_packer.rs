// ==========================================
// 门店货架空间规划 - 01..N 层逐层装箱
// ==========================================
// 职责: 非落地商品按层号、货架格顺序贪心填充
// 规则:
// 1) 层号 1..=level_cap 依次处理，无候选时提前结束
// 2) 货架格按 section_num 升序
// 3) 剩余高度 ≤ 0 且该层尚无记录时跳过该货架格
// 4) 候选按占用宽度降序（含 M 徽章放大），满足 进深 / 宽度 / 高度增量 即落位
// 5) 层高 = 层内全部商品（含历史）最高有效高度 + 余量，只增不减
// ==========================================

use crate::domain::capacity::{Clearance, SectionCapacity, SpaceConstraint};
use crate::domain::placement::{LevelCommit, PlacedArticle};
use crate::domain::types::LevelNum;
use crate::engine::badge::BadgeEvaluator;
use crate::engine::queue::QueueEntry;
use std::collections::HashMap;
use tracing::{debug, instrument};

// ==========================================
// TierPacker - 货架层装箱器
// ==========================================
pub struct TierPacker {
    clearance: Clearance,
    level_cap: u8,
}

impl TierPacker {
    pub fn new(clearance: Clearance, level_cap: u8) -> Self {
        Self {
            clearance,
            level_cap,
        }
    }

    /// 执行 01..N 层装箱
    ///
    /// # 返回
    /// 按 (层号, 货架格顺序) 排列的批次；已落位商品移出队列
    #[instrument(skip_all, fields(queue_len = queue.len(), level_cap = self.level_cap))]
    pub fn pack(
        &self,
        queue: &mut Vec<QueueEntry>,
        section_order: &[i64],
        arena: &mut HashMap<i64, SectionCapacity>,
        badges: &BadgeEvaluator,
    ) -> Vec<LevelCommit> {
        let mut batches = Vec::new();

        for n in 1..=self.level_cap {
            let level = LevelNum(n);
            if !queue.iter().any(|e| !e.resolved.ground_eligible) {
                break;
            }

            for section_id in section_order {
                let Some(cap) = arena.get_mut(section_id) else {
                    continue;
                };
                if cap.remaining_height() <= 0.0 && !cap.has_level(level) {
                    continue;
                }

                let depth = cap.depth;
                let mut candidates: Vec<(usize, f64)> = queue
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| !e.resolved.ground_eligible)
                    .map(|(i, e)| (i, badges.footprint(e, depth).0.width))
                    .collect();
                if candidates.is_empty() {
                    break;
                }
                candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

                let mut placements = Vec::new();
                let mut taken = vec![false; queue.len()];
                for (idx, _) in candidates {
                    let entry = &queue[idx];
                    let (footprint, decision) = badges.footprint(entry, cap.depth);
                    if !cap.can_place(level, &footprint, &self.clearance) {
                        continue;
                    }
                    cap.place(level, &footprint, &self.clearance);
                    placements.push(PlacedArticle {
                        article_id: entry.article.id,
                        planned_qty: entry.article.stabilized_rssq(),
                        width_used: footprint.width,
                        height_used: footprint.height,
                        badge: decision.encoded(),
                    });
                    taken[idx] = true;
                }

                if placements.is_empty() {
                    continue;
                }

                debug!(
                    section_id = *section_id,
                    level_num = %level,
                    placed = placements.len(),
                    level_height = cap.committed_height(level),
                    "货架层批次完成"
                );
                batches.push(LevelCommit {
                    section_id: *section_id,
                    level_num: level,
                    level_height: cap.committed_height(level),
                    placements,
                });

                let mut idx = 0usize;
                queue.retain(|_| {
                    let keep = !taken[idx];
                    idx += 1;
                    keep
                });
            }
        }

        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::domain::article::Article;
    use crate::domain::capacity::LevelLoad;
    use crate::domain::types::DistributionType;
    use crate::engine::resolver::ArticleResolver;
    use crate::engine::strategy::PlanningMode;

    fn case_pick(id: i64, width: f64, length: f64, height: f64) -> Article {
        Article {
            id,
            artno: id,
            rssq: Some(1),
            mpq: Some(1),
            palq: Some(100),
            dt: Some(DistributionType::CasePick),
            cp_width: Some(width),
            cp_length: Some(length),
            cp_height: Some(height),
            ..Default::default()
        }
    }

    fn queue_of(articles: Vec<Article>) -> Vec<QueueEntry> {
        let resolver = ArticleResolver::new(PlannerConfig::default(), PlanningMode::NonOpul);
        articles
            .into_iter()
            .map(|article| {
                let resolved = resolver.resolve(&article).unwrap();
                QueueEntry { article, resolved }
            })
            .collect()
    }

    fn setup(sections: &[(i64, f64, f64, f64)]) -> (Vec<i64>, HashMap<i64, SectionCapacity>) {
        let order = sections.iter().map(|s| s.0).collect();
        let map = sections
            .iter()
            .enumerate()
            .map(|(i, (id, w, d, h))| (*id, SectionCapacity::new(*id, i as i64 + 1, *w, *d, *h)))
            .collect();
        (order, map)
    }

    fn packer() -> (TierPacker, BadgeEvaluator) {
        let cfg = PlannerConfig::default();
        (
            TierPacker::new(cfg.clearance(), cfg.level_cap),
            BadgeEvaluator::new(PlanningMode::NonOpul, 1.5),
        )
    }

    #[test]
    fn test_width_overflow_defers_to_next_level() {
        let (p, b) = packer();
        let mut queue = queue_of(vec![
            case_pick(1, 1600.0, 400.0, 300.0),
            case_pick(2, 1600.0, 400.0, 300.0),
        ]);
        let (order, mut arena) = setup(&[(10, 3000.0, 900.0, 2000.0)]);
        let batches = p.pack(&mut queue, &order, &mut arena, &b);

        assert!(queue.is_empty());
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].level_num, LevelNum(1));
        assert_eq!(batches[0].placements.len(), 1);
        assert_eq!(batches[1].level_num, LevelNum(2));
        assert_eq!(batches[0].level_height, 427.0);
    }

    #[test]
    fn test_sections_visited_in_order_within_level() {
        let (p, b) = packer();
        let mut queue = queue_of(vec![
            case_pick(1, 1600.0, 400.0, 300.0),
            case_pick(2, 1600.0, 400.0, 300.0),
        ]);
        let (order, mut arena) = setup(&[(10, 3000.0, 900.0, 2000.0), (11, 3000.0, 900.0, 2000.0)]);
        let batches = p.pack(&mut queue, &order, &mut arena, &b);
        assert_eq!(batches.len(), 2);
        assert_eq!((batches[0].section_id, batches[0].level_num), (10, LevelNum(1)));
        assert_eq!((batches[1].section_id, batches[1].level_num), (11, LevelNum(1)));
    }

    #[test]
    fn test_depth_constraint_leaves_article_unplanned() {
        let (p, b) = packer();
        let mut queue = queue_of(vec![case_pick(1, 100.0, 950.0, 100.0)]);
        let (order, mut arena) = setup(&[(10, 3000.0, 900.0, 2000.0)]);
        let batches = p.pack(&mut queue, &order, &mut arena, &b);
        assert!(batches.is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_height_budget_exhausted_stops_new_levels() {
        let (p, b) = packer();
        // 每层 900 + 127 = 1027，2000 高只够一层
        let mut queue = queue_of(vec![
            case_pick(1, 2000.0, 400.0, 900.0),
            case_pick(2, 2000.0, 400.0, 900.0),
        ]);
        let (order, mut arena) = setup(&[(10, 3000.0, 900.0, 2000.0)]);
        let batches = p.pack(&mut queue, &order, &mut arena, &b);
        assert_eq!(batches.len(), 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_existing_level_reuses_remaining_width_and_keeps_height() {
        let (p, b) = packer();
        let mut queue = queue_of(vec![case_pick(1, 1000.0, 400.0, 200.0)]);
        let (order, mut arena) = setup(&[(10, 3000.0, 900.0, 2000.0)]);
        if let Some(cap) = arena.get_mut(&10) {
            cap.levels.insert(
                LevelNum(1),
                LevelLoad {
                    level_id: Some(5),
                    committed_height: 600.0,
                    used_width: 2500.0,
                    max_article_height: 473.0,
                    tall: false,
                },
            );
        }
        let batches = p.pack(&mut queue, &order, &mut arena, &b);
        // 01 层仅剩 500 宽，落到 02 层
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].level_num, LevelNum(2));
        assert_eq!(arena[&10].committed_height(LevelNum(1)), 600.0);
    }

    #[test]
    fn test_level_cap_bounds_the_run() {
        let cfg = PlannerConfig::default();
        let p = TierPacker::new(cfg.clearance(), 2);
        let b = BadgeEvaluator::new(PlanningMode::NonOpul, 1.5);
        let mut queue = queue_of(
            (1..=3)
                .map(|i| case_pick(i, 3000.0, 400.0, 10.0))
                .collect(),
        );
        let (order, mut arena) = setup(&[(10, 3000.0, 900.0, 5000.0)]);
        let batches = p.pack(&mut queue, &order, &mut arena, &b);
        assert_eq!(batches.len(), 2);
        assert_eq!(queue.len(), 1);
    }
}
