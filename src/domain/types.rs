// ==========================================
// 门店货架空间规划 - 领域类型定义
// ==========================================
// 职责: 配送类型、货位徽章、层号、品类筛选维度
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 配送类型 (Distribution Type, DT)
// ==========================================
// 数据库存储: 0 = 拆箱拣货, 1 = 整托/散装
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DistributionType {
    CasePick, // dt=0
    Pallet,   // dt=1
}

impl DistributionType {
    /// 从数据库整数值转换（未知值返回 None）
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(DistributionType::CasePick),
            1 => Some(DistributionType::Pallet),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            DistributionType::CasePick => 0,
            DistributionType::Pallet => 1,
        }
    }
}

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionType::CasePick => write!(f, "CASE_PICK"),
            DistributionType::Pallet => write!(f, "PALLET"),
        }
    }
}

// ==========================================
// 货位徽章 (Plan Badge)
// ==========================================
// 存储格式: 单字符代码拼接, 例如 "O" / "OM"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanBadge {
    Opul,     // O: 仅超储位
    Multiple, // M: 多货位拆分
    Behind,   // B: 主陈列位后方备货
}

impl PlanBadge {
    pub fn code(&self) -> char {
        match self {
            PlanBadge::Opul => 'O',
            PlanBadge::Multiple => 'M',
            PlanBadge::Behind => 'B',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'O' => Some(PlanBadge::Opul),
            'M' => Some(PlanBadge::Multiple),
            'B' => Some(PlanBadge::Behind),
            _ => None,
        }
    }

    /// 展示名称
    pub fn label(&self) -> &'static str {
        match self {
            PlanBadge::Opul => "Opul",
            PlanBadge::Multiple => "Multiple Locations",
            PlanBadge::Behind => "Behind",
        }
    }

    /// 将徽章列表编码为存储字符串（空列表返回 None）
    pub fn encode(badges: &[PlanBadge]) -> Option<String> {
        if badges.is_empty() {
            return None;
        }
        Some(badges.iter().map(PlanBadge::code).collect())
    }

    /// 解析存储字符串，忽略未知字符
    pub fn decode(raw: &str) -> Vec<PlanBadge> {
        raw.chars().filter_map(PlanBadge::from_code).collect()
    }
}

impl fmt::Display for PlanBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 层号 (Level Number)
// ==========================================
// 00 = 地面/托盘层, 01+ = 货架层
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LevelNum(pub u8);

impl LevelNum {
    pub const GROUND: LevelNum = LevelNum(0);

    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }

    /// 两位数字的存储格式
    pub fn as_code(&self) -> String {
        format!("{:02}", self.0)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u8>().ok().map(LevelNum)
    }
}

impl fmt::Display for LevelNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

// ==========================================
// 品类筛选维度
// ==========================================
// PA 与 HFB 互斥，每次只按其中一种筛选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryKind {
    Pa,
    Hfb,
}

impl std::str::FromStr for CategoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PA" => Ok(CategoryKind::Pa),
            "HFB" => Ok(CategoryKind::Hfb),
            other => Err(format!("未知品类筛选类型: {}", other)),
        }
    }
}
