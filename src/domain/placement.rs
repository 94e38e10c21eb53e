// ==========================================
// 门店货架空间规划 - 货位分配记录
// ==========================================
// 红线: 同一层板上 width_used 之和不得超过货架格宽度
// ==========================================

use crate::domain::types::LevelNum;
use serde::{Deserialize, Serialize};

/// 已落库的货位分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: i64,
    pub article_id: i64,
    pub section_id: i64,
    pub level_id: i64,
    pub planned_qty: f64,
    pub width_used: f64,
    pub height_used: f64, // 落位时的有效高度
    pub badge: Option<String>,
}

/// 单个商品的落位
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedArticle {
    pub article_id: i64,
    pub planned_qty: f64,
    pub width_used: f64,
    pub height_used: f64,
    pub badge: Option<String>,
}

/// 单个货架格单层的落位批次（整体提交）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelCommit {
    pub section_id: i64,
    pub level_num: LevelNum,
    pub level_height: f64,
    pub placements: Vec<PlacedArticle>,
}

/// 取消 placement 后商品的规划状态
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRestate {
    pub planned: bool,
    pub part_planned: bool,
    pub remainder: i64,
    pub location: Option<(i64, i64)>, // (section_id, level_id)
    pub plan_badge: Option<String>,
}
