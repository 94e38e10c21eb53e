// ==========================================
// 门店货架空间规划 - 物理布局领域模型
// ==========================================
// 层级: Store → Pair → Aisle → Section → Level
// ==========================================

use crate::domain::types::LevelNum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: i64,
    pub store_num: i64,
    pub store_loc: Option<String>,
}

/// 双面货架对（包含一个或多个货架段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub id: i64,
    pub store_id: i64,
    pub pair_nums: String,          // 逗号分隔的货架段编号, 例如 "12,13"
    pub pair_depth: f64,
    pub pair_height: f64,
    pub pair_section_width: f64,
    pub pair_sections: i64,
}

impl Pair {
    /// 拆分货架段编号
    pub fn aisle_numbers(&self) -> Vec<String> {
        self.pair_nums
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// 货架段: 单次规划的作用域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aisle {
    pub id: i64,
    pub pair_id: i64,
    pub store_id: i64,
    pub aisle_num: String,
    pub aisle_depth: f64,
    pub aisle_height: f64,
    pub aisle_section_width: f64,
    pub aisle_sections: i64,
}

/// 货架格: 固定宽/深/高
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: i64,
    pub aisle_id: i64,
    pub section_num: i64,
    pub section_width: f64,
    pub section_depth: f64,
    pub section_height: f64,
}

/// 层板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub id: i64,
    pub section_id: i64,
    pub level_num: LevelNum,
    pub level_height: f64,
}

/// 新建货架对的参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPair {
    pub store_id: i64,
    pub pair_nums: String,
    pub pair_depth: f64,
    pub pair_height: f64,
    pub pair_section_width: f64,
    pub pair_sections: i64,
}

/// 货架段尺寸（变更后同步到全部货架格）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AisleDimensions {
    pub aisle_depth: f64,
    pub aisle_height: f64,
    pub aisle_section_width: f64,
}

/// 待创建的货架格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionDraft {
    pub section_num: i64,
    pub section_width: f64,
    pub section_depth: f64,
    pub section_height: f64,
}

/// 待创建的货架段（含货架格）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AisleDraft {
    pub aisle_num: String,
    pub dimensions: AisleDimensions,
    pub aisle_sections: i64,
    pub sections: Vec<SectionDraft>,
}
