// ==========================================
// 门店货架空间规划 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::planner_config::PlannerConfig;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 加载规划常量（缺失或无法解析的键保留默认值）
    pub fn load_planner_config(&self) -> RepositoryResult<PlannerConfig> {
        let mut cfg = PlannerConfig::default();

        self.override_f64(config_keys::SACRED_HEAVY_WEIGHT_G, &mut cfg.sacred_heavy_weight_g)?;
        self.override_f64(config_keys::GROUND_SALES_RATIO, &mut cfg.ground_sales_ratio)?;
        self.override_f64(
            config_keys::COUNTERTOP_HEAVY_WEIGHT_G,
            &mut cfg.countertop_heavy_weight_g,
        )?;
        self.override_f64(config_keys::DEEP_LENGTH_THRESHOLD, &mut cfg.deep_length_threshold)?;
        self.override_f64(config_keys::CLEARANCE_STANDARD, &mut cfg.clearance_standard)?;
        self.override_f64(config_keys::CLEARANCE_TALL, &mut cfg.clearance_tall)?;
        self.override_f64(config_keys::BADGE_GATE_RATIO, &mut cfg.badge_gate_ratio)?;
        self.override_f64(config_keys::EXPSALE_SPLIT, &mut cfg.expsale_split)?;

        if let Some(raw) = self.get_global_config_value(config_keys::LEVEL_CAP)? {
            match raw.trim().parse::<u8>() {
                Ok(cap) if cap > 0 => cfg.level_cap = cap,
                _ => warn!(key = config_keys::LEVEL_CAP, value = %raw, "配置值非法，使用默认值"),
            }
        }

        if let Some(raw) = self.get_global_config_value(config_keys::OPUL_SALES_METHODS)? {
            let tags = parse_tag_list(&raw);
            if tags.is_empty() {
                warn!(key = config_keys::OPUL_SALES_METHODS, value = %raw, "配置值为空，使用默认值");
            } else {
                cfg.opul_sales_methods = tags;
            }
        }

        cfg.badge_gate_overrides = self.load_badge_gate_overrides()?;
        Ok(cfg)
    }

    /// 读取 badge_gate_ratio/{mode} 形式的按模式覆写
    fn load_badge_gate_overrides(&self) -> RepositoryResult<HashMap<String, f64>> {
        let conn = self.get_conn()?;
        let prefix = format!("{}/", config_keys::BADGE_GATE_RATIO);
        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' AND key LIKE ?1 ORDER BY key",
        )?;
        let rows = stmt.query_map(params![format!("{}%", prefix)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut overrides = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            let mode = key.trim_start_matches(prefix.as_str()).trim().to_lowercase();
            match value.trim().parse::<f64>() {
                Ok(ratio) if ratio.is_finite() && ratio >= 0.0 && !mode.is_empty() => {
                    overrides.insert(mode, ratio);
                }
                _ => warn!(key = %key, value = %value, "徽章门槛覆写非法，已忽略"),
            }
        }
        Ok(overrides)
    }

    fn override_f64(&self, key: &str, target: &mut f64) -> RepositoryResult<()> {
        if let Some(raw) = self.get_global_config_value(key)? {
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => *target = v,
                _ => warn!(key = key, value = %raw, "配置值非法，使用默认值"),
            }
        }
        Ok(())
    }
}

/// 标签列表: 支持 JSON 数组或逗号分隔
fn parse_tag_list(raw: &str) -> Vec<String> {
    let tags: Vec<String> = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(_) => raw.split(',').map(str::to_string).collect(),
    };
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 落地规则
    pub const SACRED_HEAVY_WEIGHT_G: &str = "sacred_heavy_weight_g";
    pub const GROUND_SALES_RATIO: &str = "ground_sales_ratio";
    pub const COUNTERTOP_HEAVY_WEIGHT_G: &str = "countertop_heavy_weight_g";

    // 尺寸
    pub const DEEP_LENGTH_THRESHOLD: &str = "deep_length_threshold";
    pub const CLEARANCE_STANDARD: &str = "clearance_standard";
    pub const CLEARANCE_TALL: &str = "clearance_tall";
    pub const LEVEL_CAP: &str = "level_cap";

    // 徽章（按模式覆写: badge_gate_ratio/{mode}）
    pub const BADGE_GATE_RATIO: &str = "badge_gate_ratio";

    // 筛选
    pub const OPUL_SALES_METHODS: &str = "opul_sales_methods"; // JSON 数组或逗号分隔
    pub const EXPSALE_SPLIT: &str = "expsale_split";
}
