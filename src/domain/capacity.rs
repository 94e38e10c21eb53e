// ==========================================
// 门店货架空间规划 - 货架格容量模型
// ==========================================
// 红线: 宽度、深度、高度三重约束同时满足才可落位
// 用途: 单次规划内的剩余宽度/剩余高度累加器
// ==========================================

use crate::domain::types::LevelNum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// Clearance - 层高余量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Clearance {
    pub standard: f64, // 普通层余量
    pub tall: f64,     // 含徽章/整托商品时的余量
}

impl Clearance {
    pub fn for_level(&self, tall: bool) -> f64 {
        if tall {
            self.tall
        } else {
            self.standard
        }
    }
}

// ==========================================
// Footprint - 单件商品的占用
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub width: f64,  // 占用宽度（含 M 徽章放大）
    pub length: f64, // 进深
    pub height: f64, // 有效高度
    pub tall: bool,  // 是否触发高余量
}

// ==========================================
// LevelLoad - 单层已用空间
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelLoad {
    pub level_id: Option<i64>,     // 已落库的层板ID
    pub committed_height: f64,     // 已承诺层高（只增不减）
    pub used_width: f64,           // 已用宽度
    pub max_article_height: f64,   // 层内最高商品
    pub tall: bool,                // 层内是否有高余量商品
}

// ==========================================
// SectionCapacity - 货架格容量
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionCapacity {
    pub section_id: i64,
    pub section_num: i64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub levels: BTreeMap<LevelNum, LevelLoad>,
}

// ==========================================
// Trait: SpaceConstraint
// ==========================================
// 用途: 装箱器的约束检查接口
pub trait SpaceConstraint {
    /// 指定层剩余宽度
    fn remaining_width(&self, level: LevelNum) -> f64;

    /// 货架格剩余高度预算（扣除全部已承诺层高）
    fn remaining_height(&self) -> f64;

    /// 放入后该层需要的高度
    fn required_height(&self, level: LevelNum, footprint: &Footprint, clearance: &Clearance) -> f64;

    /// 检查是否可落位
    fn can_place(&self, level: LevelNum, footprint: &Footprint, clearance: &Clearance) -> bool;
}

impl SectionCapacity {
    pub fn new(section_id: i64, section_num: i64, width: f64, depth: f64, height: f64) -> Self {
        Self {
            section_id,
            section_num,
            width,
            depth,
            height,
            levels: BTreeMap::new(),
        }
    }

    pub fn level(&self, level: LevelNum) -> Option<&LevelLoad> {
        self.levels.get(&level)
    }

    pub fn has_level(&self, level: LevelNum) -> bool {
        self.levels.contains_key(&level)
    }

    /// 记录落位，返回本次层高增量（已扣减剩余高度）
    pub fn place(&mut self, level: LevelNum, footprint: &Footprint, clearance: &Clearance) -> f64 {
        let required = self.required_height(level, footprint, clearance);
        let load = self.levels.entry(level).or_default();
        load.used_width += footprint.width;
        load.max_article_height = load.max_article_height.max(footprint.height);
        load.tall |= footprint.tall;

        let delta = (required - load.committed_height).max(0.0);
        load.committed_height = load.committed_height.max(required);
        delta
    }

    pub fn committed_height(&self, level: LevelNum) -> f64 {
        self.levels
            .get(&level)
            .map(|l| l.committed_height)
            .unwrap_or(0.0)
    }
}

impl SpaceConstraint for SectionCapacity {
    fn remaining_width(&self, level: LevelNum) -> f64 {
        let used = self.levels.get(&level).map(|l| l.used_width).unwrap_or(0.0);
        (self.width - used).max(0.0)
    }

    fn remaining_height(&self) -> f64 {
        let used: f64 = self.levels.values().map(|l| l.committed_height).sum();
        self.height - used
    }

    fn required_height(&self, level: LevelNum, footprint: &Footprint, clearance: &Clearance) -> f64 {
        let (max_height, tall) = match self.levels.get(&level) {
            Some(load) => (
                load.max_article_height.max(footprint.height),
                load.tall || footprint.tall,
            ),
            None => (footprint.height, footprint.tall),
        };
        max_height + clearance.for_level(tall)
    }

    /// 规则:
    /// 1) 进深 ≤ 货架格深度
    /// 2) 占用宽度 ≤ 该层剩余宽度
    /// 3) 层高增量 ≤ 剩余高度预算
    fn can_place(&self, level: LevelNum, footprint: &Footprint, clearance: &Clearance) -> bool {
        if footprint.length > self.depth {
            return false;
        }
        if footprint.width > self.remaining_width(level) {
            return false;
        }
        let required = self.required_height(level, footprint, clearance);
        let delta = (required - self.committed_height(level)).max(0.0);
        delta <= self.remaining_height()
    }
}
