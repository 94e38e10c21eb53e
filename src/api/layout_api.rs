// ==========================================
// 门店货架空间规划 - 布局 API
// ==========================================
// 职责: 门店、货架对、货架段、货架格的创建与维护
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::layout::{Aisle, AisleDimensions, NewPair, Pair, Section, Store};
use crate::engine::LayoutBuilder;
use crate::repository::LayoutRepository;

pub struct LayoutApi {
    layout_repo: Arc<LayoutRepository>,
    builder: LayoutBuilder,
}

impl LayoutApi {
    pub fn new(layout_repo: Arc<LayoutRepository>) -> Self {
        Self {
            builder: LayoutBuilder::new(layout_repo.clone()),
            layout_repo,
        }
    }

    pub fn create_store(&self, store_num: i64, store_loc: Option<&str>) -> ApiResult<Store> {
        Ok(self.layout_repo.create_store(store_num, store_loc)?)
    }

    /// 创建货架对（展开为货架段与货架格）
    pub fn create_pair(&self, pair: &NewPair) -> ApiResult<(Pair, Vec<Aisle>)> {
        if self.layout_repo.find_store(pair.store_id)?.is_none() {
            return Err(ApiError::NotFound(format!("Store(id={})不存在", pair.store_id)));
        }
        Ok(self.builder.create_pair(pair)?)
    }

    pub fn get_aisle(&self, aisle_id: i64) -> ApiResult<Aisle> {
        self.layout_repo
            .find_aisle(aisle_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Aisle(id={})不存在", aisle_id)))
    }

    pub fn list_sections(&self, aisle_id: i64) -> ApiResult<Vec<Section>> {
        self.get_aisle(aisle_id)?;
        Ok(self.layout_repo.list_sections(aisle_id)?)
    }

    pub fn add_sections(&self, aisle_id: i64, count: i64) -> ApiResult<Vec<Section>> {
        Ok(self.builder.add_sections(aisle_id, count)?)
    }

    pub fn update_aisle_dimensions(
        &self,
        aisle_id: i64,
        dimensions: AisleDimensions,
    ) -> ApiResult<usize> {
        Ok(self.builder.update_aisle_dimensions(aisle_id, dimensions)?)
    }
}
