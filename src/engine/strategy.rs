// ==========================================
// 门店货架空间规划 - 规划模式定义
// ==========================================
// 用途: 五种规划模式，每种模式是一组规则参数
// 消费方: ArticleResolver / BadgeEvaluator / QueueBuilder
// ==========================================

use crate::domain::types::DistributionType;
use serde::{Deserialize, Serialize};

/// 规划模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningMode {
    NonOpul,
    Opul,
    Countertop,
    Voss,
    Pallet,
}

impl PlanningMode {
    pub const ALL: [PlanningMode; 5] = [
        PlanningMode::NonOpul,
        PlanningMode::Opul,
        PlanningMode::Countertop,
        PlanningMode::Voss,
        PlanningMode::Pallet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanningMode::NonOpul => "non_opul",
            PlanningMode::Opul => "opul",
            PlanningMode::Countertop => "countertop",
            PlanningMode::Voss => "voss",
            PlanningMode::Pallet => "pallet",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            PlanningMode::NonOpul => "标准（非 OPUL）",
            PlanningMode::Opul => "OPUL",
            PlanningMode::Countertop => "柜台",
            PlanningMode::Voss => "VOSS",
            PlanningMode::Pallet => "整托",
        }
    }

    /// 是否发放 M/B 徽章
    pub fn awards_badges(&self) -> bool {
        matches!(
            self,
            PlanningMode::NonOpul | PlanningMode::Opul | PlanningMode::Pallet
        )
    }

    /// 是否为 OPUL 商品附加 "O" 徽章
    pub fn tags_opul(&self) -> bool {
        matches!(self, PlanningMode::Opul)
    }

    /// 是否在入队时剔除 OPUL 商品
    pub fn excludes_opul(&self) -> bool {
        matches!(self, PlanningMode::NonOpul | PlanningMode::Pallet)
    }

    /// 模式限定的配送类型
    pub fn required_distribution(&self) -> Option<DistributionType> {
        match self {
            PlanningMode::Voss => Some(DistributionType::CasePick),
            PlanningMode::Pallet => Some(DistributionType::Pallet),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanningMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PlanningMode {
    type Err = String;

    /// 接受带或不带 "_mode" 后缀的名称，例如 "voss" / "voss_mode"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        let key = normalized.strip_suffix("_mode").unwrap_or(&normalized);
        match key {
            "non_opul" | "nonopul" | "standard" => Ok(PlanningMode::NonOpul),
            "opul" => Ok(PlanningMode::Opul),
            "countertop" => Ok(PlanningMode::Countertop),
            "voss" => Ok(PlanningMode::Voss),
            "pallet" => Ok(PlanningMode::Pallet),
            _ => Err(format!("未知规划模式: {}", s.trim())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_with_and_without_suffix() {
        assert_eq!(PlanningMode::from_str("voss_mode"), Ok(PlanningMode::Voss));
        assert_eq!(PlanningMode::from_str("VOSS"), Ok(PlanningMode::Voss));
        assert_eq!(PlanningMode::from_str("non-opul-mode"), Ok(PlanningMode::NonOpul));
        assert_eq!(PlanningMode::from_str(" pallet "), Ok(PlanningMode::Pallet));
        assert!(PlanningMode::from_str("mystery").is_err());
        assert!(PlanningMode::from_str("").is_err());
    }

    #[test]
    fn test_round_trip_names() {
        for mode in PlanningMode::ALL {
            assert_eq!(PlanningMode::from_str(mode.as_str()), Ok(mode));
        }
    }

    #[test]
    fn test_strategy_table() {
        assert!(PlanningMode::Opul.tags_opul());
        assert!(!PlanningMode::Countertop.awards_badges());
        assert!(!PlanningMode::Voss.awards_badges());
        assert!(PlanningMode::Pallet.excludes_opul());
        assert_eq!(
            PlanningMode::Voss.required_distribution(),
            Some(DistributionType::CasePick)
        );
    }
}
