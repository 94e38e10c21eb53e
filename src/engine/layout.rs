// ==========================================
// 门店货架空间规划 - 布局生成
// ==========================================
// 规则:
// 1) 货架对按逗号拆分货架段编号，每个编号一个货架段
// 2) 货架段进深 = 货架对进深 / 2，其余尺寸沿用货架对
// 3) 货架格编号 1..n，尺寸取货架段尺寸
// 4) 追加货架格从当前最大编号之后继续
// 5) 货架段尺寸变更同步到全部货架格
// ==========================================

use crate::domain::layout::{
    Aisle, AisleDimensions, AisleDraft, NewPair, Pair, Section, SectionDraft,
};
use crate::engine::error::{PlannerError, PlannerResult};
use crate::repository::LayoutRepository;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// LayoutBuilder - 布局生成器
// ==========================================
pub struct LayoutBuilder {
    layout_repo: Arc<LayoutRepository>,
}

impl LayoutBuilder {
    pub fn new(layout_repo: Arc<LayoutRepository>) -> Self {
        Self { layout_repo }
    }

    /// 展开货架对为货架段草稿（纯计算）
    pub fn draft_pair(pair: &NewPair) -> PlannerResult<Vec<AisleDraft>> {
        let numbers: Vec<String> = pair
            .pair_nums
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if numbers.is_empty() {
            return Err(PlannerError::InvalidLayout(format!(
                "货架段编号为空: {:?}",
                pair.pair_nums
            )));
        }
        if pair.pair_sections < 0 {
            return Err(PlannerError::InvalidLayout(format!(
                "货架格数量不可为负: {}",
                pair.pair_sections
            )));
        }

        let dimensions = AisleDimensions {
            aisle_depth: pair.pair_depth / 2.0,
            aisle_height: pair.pair_height,
            aisle_section_width: pair.pair_section_width,
        };
        validate_dimensions(&dimensions)?;

        Ok(numbers
            .into_iter()
            .map(|aisle_num| AisleDraft {
                aisle_num,
                dimensions,
                aisle_sections: pair.pair_sections,
                sections: draft_sections(1, pair.pair_sections, &dimensions),
            })
            .collect())
    }

    /// 创建货架对及其货架段、货架格
    #[instrument(skip(self, pair), fields(store_id = pair.store_id, pair_nums = %pair.pair_nums))]
    pub fn create_pair(&self, pair: &NewPair) -> PlannerResult<(Pair, Vec<Aisle>)> {
        let drafts = Self::draft_pair(pair)?;
        let created = self.layout_repo.insert_pair_layout(pair, &drafts)?;
        let aisles = self.layout_repo.list_aisles_by_pair(created.id)?;
        info!(pair_id = created.id, aisles = aisles.len(), "货架对已创建");
        Ok((created, aisles))
    }

    /// 追加货架格
    #[instrument(skip(self))]
    pub fn add_sections(&self, aisle_id: i64, count: i64) -> PlannerResult<Vec<Section>> {
        if count <= 0 {
            return Err(PlannerError::InvalidLayout(format!(
                "追加数量必须为正: {}",
                count
            )));
        }
        let aisle = self
            .layout_repo
            .find_aisle(aisle_id)?
            .ok_or(PlannerError::AisleNotFound(aisle_id))?;
        let dimensions = AisleDimensions {
            aisle_depth: aisle.aisle_depth,
            aisle_height: aisle.aisle_height,
            aisle_section_width: aisle.aisle_section_width,
        };
        let next_num = self.layout_repo.max_section_num(aisle_id)? + 1;
        let drafts = draft_sections(next_num, count, &dimensions);
        self.layout_repo.insert_sections(aisle_id, &drafts)?;
        info!(aisle_id, first = next_num, count, "货架格已追加");
        Ok(self.layout_repo.list_sections(aisle_id)?)
    }

    /// 更新货架段尺寸并同步货架格
    ///
    /// # 返回
    /// - Ok(usize): 同步的货架格数
    #[instrument(skip(self))]
    pub fn update_aisle_dimensions(
        &self,
        aisle_id: i64,
        dimensions: AisleDimensions,
    ) -> PlannerResult<usize> {
        validate_dimensions(&dimensions)?;
        if self.layout_repo.find_aisle(aisle_id)?.is_none() {
            return Err(PlannerError::AisleNotFound(aisle_id));
        }
        let synced = self
            .layout_repo
            .update_aisle_dimensions(aisle_id, &dimensions)?;
        info!(aisle_id, synced, "货架段尺寸已同步");
        Ok(synced)
    }
}

/// 生成连续编号的货架格草稿
pub fn draft_sections(start_num: i64, count: i64, dims: &AisleDimensions) -> Vec<SectionDraft> {
    (0..count.max(0))
        .map(|i| SectionDraft {
            section_num: start_num + i,
            section_width: dims.aisle_section_width,
            section_depth: dims.aisle_depth,
            section_height: dims.aisle_height,
        })
        .collect()
}

fn validate_dimensions(dims: &AisleDimensions) -> PlannerResult<()> {
    let fields = [
        ("aisle_depth", dims.aisle_depth),
        ("aisle_height", dims.aisle_height),
        ("aisle_section_width", dims.aisle_section_width),
    ];
    for (name, value) in fields {
        if !value.is_finite() || value <= 0.0 {
            return Err(PlannerError::InvalidLayout(format!(
                "{} 必须为正数: {}",
                name, value
            )));
        }
    }
    Ok(())
}
