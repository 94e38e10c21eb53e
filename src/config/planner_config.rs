// ==========================================
// 门店货架空间规划 - 规划常量
// ==========================================
// 职责: 汇总全部规划阈值，提供默认值
// 覆写: ConfigManager 从 config_kv 读取
// ==========================================

use crate::domain::capacity::Clearance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 规划常量集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// 落地规则: 重货阈值（克，严格大于）
    pub sacred_heavy_weight_g: f64,
    /// 落地规则: 稳定化销量 ≥ palq × 该比例
    pub ground_sales_ratio: f64,
    /// 柜台模式重货阈值（克，严格大于）
    pub countertop_heavy_weight_g: f64,
    /// 进深超过该值视为深货
    pub deep_length_threshold: f64,
    /// 普通层余量
    pub clearance_standard: f64,
    /// 含徽章/整托商品的层余量
    pub clearance_tall: f64,
    /// 货架层上限（01..=level_cap）
    pub level_cap: u8,
    /// M/B 徽章门槛（稳定化销量严格大于 palq × ratio）
    pub badge_gate_ratio: f64,
    /// 按模式覆写徽章门槛，键为模式名（如 "opul"）
    pub badge_gate_overrides: HashMap<String, f64>,
    /// OPUL 销售方式标签（不区分大小写）
    pub opul_sales_methods: Vec<String>,
    /// EXPSALE 高低销量分界
    pub expsale_split: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            sacred_heavy_weight_g: 18_143.7,
            ground_sales_ratio: 0.45,
            countertop_heavy_weight_g: 27_215.5,
            deep_length_threshold: 1524.0,
            clearance_standard: 127.0,
            clearance_tall: 254.0,
            level_cap: 19,
            badge_gate_ratio: 1.5,
            badge_gate_overrides: HashMap::new(),
            opul_sales_methods: vec!["OPUL".to_string()],
            expsale_split: 5.0,
        }
    }
}

impl PlannerConfig {
    pub fn clearance(&self) -> Clearance {
        Clearance {
            standard: self.clearance_standard,
            tall: self.clearance_tall,
        }
    }

    /// 指定模式的徽章门槛（无覆写时取全局值）
    pub fn badge_gate_ratio_for(&self, mode_key: &str) -> f64 {
        self.badge_gate_overrides
            .get(mode_key)
            .copied()
            .unwrap_or(self.badge_gate_ratio)
    }

    /// 销售方式是否属于 OPUL 标签
    pub fn is_opul_sales_method(&self, sales_method: Option<&str>) -> bool {
        match sales_method.map(str::trim) {
            Some(method) if !method.is_empty() => self
                .opul_sales_methods
                .iter()
                .any(|tag| tag.trim().eq_ignore_ascii_case(method)),
            _ => false,
        }
    }
}
